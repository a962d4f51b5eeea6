pub mod articles;
pub mod comments;

use crate::error::AppError;

/// Ids in paths that do not parse as integers can never match anything.
fn parse_id(raw: &str, not_found: fn() -> AppError) -> Result<i64, AppError> {
    raw.parse().map_err(|_| not_found())
}
