use serde::{Deserialize, Serialize};

use super::{required, required_bounded, FieldError, MAX_AUTHOR_CHARS};

/// Body for both top-level comments and replies.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCommentRequest {
    pub author: String,
    pub content: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommentFields {
    pub author: String,
    pub content: String,
}

impl CreateCommentRequest {
    pub fn new(author: &str, content: &str) -> Self {
        Self {
            author: author.to_string(),
            content: content.to_string(),
        }
    }

    pub fn validate(&self) -> Result<NewCommentFields, FieldError> {
        let author = required_bounded("Author", &self.author, MAX_AUTHOR_CHARS)?;
        required("Content", &self.content)?;

        Ok(NewCommentFields {
            author: author.to_string(),
            content: self.content.clone(),
        })
    }
}

impl UpdateCommentRequest {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    pub fn validate(&self) -> Result<&str, FieldError> {
        required("Content", &self.content)?;
        Ok(&self.content)
    }
}
