mod articles;
mod comments;

pub use articles::*;
pub use comments::*;

use serde::{Deserialize, Serialize};

pub const MAX_TITLE_CHARS: usize = 255;
pub const MAX_AUTHOR_CHARS: usize = 100;

/// Body returned by delete endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Trims `value` and rejects it when empty.
pub fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Missing(field));
    }
    Ok(trimmed)
}

pub fn required_bounded<'a>(
    field: &'static str,
    value: &'a str,
    max: usize,
) -> Result<&'a str, FieldError> {
    let trimmed = required(field, value)?;
    if trimmed.chars().count() > max {
        return Err(FieldError::TooLong { field, max });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("Title", "  hi \n"), Ok("hi"));
        assert_eq!(required("Title", " \t\n"), Err(FieldError::Missing("Title")));
    }

    #[test]
    fn bounded_counts_chars_not_bytes() {
        let name = "ż".repeat(MAX_AUTHOR_CHARS);
        assert!(required_bounded("Author", &name, MAX_AUTHOR_CHARS).is_ok());

        let longer = format!("{name}x");
        assert_eq!(
            required_bounded("Author", &longer, MAX_AUTHOR_CHARS),
            Err(FieldError::TooLong {
                field: "Author",
                max: MAX_AUTHOR_CHARS
            })
        );
    }

    #[test]
    fn field_error_messages() {
        assert_eq!(FieldError::Missing("Content").to_string(), "Content is required");
        assert_eq!(
            FieldError::TooLong { field: "Title", max: 255 }.to_string(),
            "Title must be at most 255 characters"
        );
    }
}
