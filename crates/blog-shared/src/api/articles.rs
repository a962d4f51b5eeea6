use serde::{Deserialize, Serialize};

use super::{required, required_bounded, FieldError, MAX_AUTHOR_CHARS, MAX_TITLE_CHARS};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateArticleRequest {
    pub title: String,
    pub author: String,
    pub content: String,
}

/// Fields of a new article after validation. Title and author are trimmed,
/// content keeps its original whitespace and newlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub author: String,
    pub content: String,
}

impl CreateArticleRequest {
    pub fn new(title: &str, author: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            content: content.to_string(),
        }
    }

    pub fn validate(&self) -> Result<NewArticle, FieldError> {
        let title = required_bounded("Title", &self.title, MAX_TITLE_CHARS)?;
        let author = required_bounded("Author", &self.author, MAX_AUTHOR_CHARS)?;
        required("Content", &self.content)?;

        Ok(NewArticle {
            title: title.to_string(),
            author: author.to_string(),
            content: self.content.clone(),
        })
    }
}
