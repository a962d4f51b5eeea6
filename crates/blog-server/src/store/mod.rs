use async_trait::async_trait;
use blog_shared::{api::NewArticle, Article, ArticleSummary, Comment};
use chrono::{DateTime, Utc};

use crate::error::AppError;

mod file;
mod postgres;

pub use file::FileStore;
pub use postgres::PgStore;

/// A comment ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub article_id: i64,
    pub parent_id: Option<i64>,
    pub author: String,
    pub content: String,
}

/// Persistence for articles and their comments.
///
/// Stores hand comments out flat; nesting is rebuilt by `blog_shared::tree`.
/// Every method is a single atomic unit: either all of its effects are
/// persisted or none are.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Articles newest first, with their top-level comment counts.
    async fn list_articles(&self) -> Result<Vec<ArticleSummary>, AppError>;

    async fn get_article(&self, id: i64) -> Result<Option<Article>, AppError>;

    /// All comments of an article, parent-referencing, in any order.
    async fn list_comments(&self, article_id: i64) -> Result<Vec<Comment>, AppError>;

    /// The article and all of its comments, read from one consistent state
    /// of the store.
    async fn get_article_with_comments(
        &self,
        id: i64,
    ) -> Result<Option<(Article, Vec<Comment>)>, AppError>;

    async fn insert_article(
        &self,
        article: NewArticle,
        now: DateTime<Utc>,
    ) -> Result<Article, AppError>;

    /// Removes the article and all of its comments. Returns `false` if the
    /// article did not exist.
    async fn delete_article(&self, id: i64) -> Result<bool, AppError>;

    /// Returns `None` when the article is missing, or when the parent is
    /// missing or belongs to another article.
    async fn insert_comment(
        &self,
        comment: NewComment,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError>;

    /// Replaces the content of a comment of `article_id` and bumps its
    /// `updated_at`.
    async fn update_comment(
        &self,
        article_id: i64,
        comment_id: i64,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError>;

    /// Deletes the given comments of `article_id` together with anything
    /// still hanging below them. Returns the number of comments removed.
    async fn delete_comments(&self, article_id: i64, ids: &[i64]) -> Result<u64, AppError>;
}
