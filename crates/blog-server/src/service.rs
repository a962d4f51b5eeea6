use std::sync::Arc;

use blog_shared::{
    api::{CreateArticleRequest, CreateCommentRequest, UpdateCommentRequest},
    tree, Article, ArticleSummary, ArticleWithComments, Comment, CommentNode,
};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::store::{BlogStore, NewComment};

pub const WELCOME_TITLE: &str = "Welcome! This is the first article";
pub const WELCOME_AUTHOR: &str = "Administrator";
pub const WELCOME_CONTENT: &str =
    "The blog is up and running. You can comment, reply, edit and delete comments and articles!";

/// Articles and their comment trees.
///
/// Writers are serialized through `write_gate`: each mutating call reads,
/// validates and persists before the next one starts. Reads go straight to
/// the store.
pub struct BlogService {
    store: Arc<dyn BlogStore>,
    write_gate: Mutex<()>,
}

impl BlogService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self {
            store,
            write_gate: Mutex::new(()),
        }
    }

    pub async fn list_articles(&self) -> Result<Vec<ArticleSummary>, AppError> {
        self.store.list_articles().await
    }

    pub async fn get_article(&self, id: i64) -> Result<ArticleWithComments, AppError> {
        let (article, flat) = self
            .store
            .get_article_with_comments(id)
            .await?
            .ok_or_else(AppError::article_not_found)?;
        let comments = nest_comments(id, flat);
        Ok(ArticleWithComments { article, comments })
    }

    pub async fn create_article(&self, req: &CreateArticleRequest) -> Result<Article, AppError> {
        let new = req.validate()?;

        let _gate = self.write_gate.lock().await;
        let article = self.store.insert_article(new, Utc::now()).await?;

        tracing::info!(article_id = article.id, "Created article");
        Ok(article)
    }

    pub async fn delete_article(&self, id: i64) -> Result<(), AppError> {
        let _gate = self.write_gate.lock().await;

        if !self.store.delete_article(id).await? {
            return Err(AppError::article_not_found());
        }

        tracing::info!(article_id = id, "Deleted article with its comments");
        Ok(())
    }

    pub async fn create_comment(
        &self,
        article_id: i64,
        req: &CreateCommentRequest,
    ) -> Result<CommentNode, AppError> {
        let _gate = self.write_gate.lock().await;

        self.require_article(article_id).await?;
        let fields = req.validate()?;

        let comment = self
            .store
            .insert_comment(
                NewComment {
                    article_id,
                    parent_id: None,
                    author: fields.author,
                    content: fields.content,
                },
                Utc::now(),
            )
            .await?
            .ok_or_else(AppError::article_not_found)?;

        tracing::debug!(article_id, comment_id = comment.id, "Created comment");
        Ok(CommentNode::leaf(comment))
    }

    /// Replies may target any comment of the article, at any depth.
    pub async fn create_reply(
        &self,
        article_id: i64,
        parent_id: i64,
        req: &CreateCommentRequest,
    ) -> Result<CommentNode, AppError> {
        let _gate = self.write_gate.lock().await;

        self.require_article(article_id).await?;
        let fields = req.validate()?;

        let forest = self.comment_forest(article_id).await?;
        if tree::find_node(&forest, parent_id).is_none() {
            return Err(AppError::NotFound("Parent comment not found"));
        }

        let reply = self
            .store
            .insert_comment(
                NewComment {
                    article_id,
                    parent_id: Some(parent_id),
                    author: fields.author,
                    content: fields.content,
                },
                Utc::now(),
            )
            .await?
            .ok_or(AppError::NotFound("Parent comment not found"))?;

        tracing::debug!(article_id, parent_id, comment_id = reply.id, "Created reply");
        Ok(CommentNode::leaf(reply))
    }

    /// Returns the edited comment together with its replies.
    pub async fn update_comment(
        &self,
        article_id: i64,
        comment_id: i64,
        req: &UpdateCommentRequest,
    ) -> Result<CommentNode, AppError> {
        let _gate = self.write_gate.lock().await;

        self.require_article(article_id).await?;
        let content = req.validate()?;

        let mut forest = self.comment_forest(article_id).await?;
        let node = tree::find_node_mut(&mut forest, comment_id)
            .ok_or_else(AppError::comment_not_found)?;

        node.comment = self
            .store
            .update_comment(article_id, comment_id, content, Utc::now())
            .await?
            .ok_or_else(AppError::comment_not_found)?;

        tracing::debug!(article_id, comment_id, "Updated comment");
        Ok(node.clone())
    }

    /// Removes the comment and every reply below it.
    pub async fn delete_comment(&self, article_id: i64, comment_id: i64) -> Result<(), AppError> {
        let _gate = self.write_gate.lock().await;

        self.require_article(article_id).await?;

        let forest = self.comment_forest(article_id).await?;
        let node = tree::find_node(&forest, comment_id).ok_or_else(AppError::comment_not_found)?;
        let ids = tree::subtree_ids(node);

        let removed = self.store.delete_comments(article_id, &ids).await?;
        if removed == 0 {
            return Err(AppError::comment_not_found());
        }

        tracing::debug!(article_id, comment_id, removed, "Deleted comment subtree");
        Ok(())
    }

    /// Inserts the welcome article when there are no articles at all.
    /// Returns the article when one was created.
    pub async fn seed_if_empty(&self) -> Result<Option<Article>, AppError> {
        let _gate = self.write_gate.lock().await;

        if !self.store.list_articles().await?.is_empty() {
            return Ok(None);
        }

        let new = CreateArticleRequest::new(WELCOME_TITLE, WELCOME_AUTHOR, WELCOME_CONTENT)
            .validate()?;
        let article = self.store.insert_article(new, Utc::now()).await?;

        tracing::info!(article_id = article.id, "Seeded welcome article");
        Ok(Some(article))
    }

    async fn require_article(&self, id: i64) -> Result<Article, AppError> {
        self.store
            .get_article(id)
            .await?
            .ok_or_else(AppError::article_not_found)
    }

    async fn comment_forest(&self, article_id: i64) -> Result<Vec<CommentNode>, AppError> {
        let flat = self.store.list_comments(article_id).await?;
        Ok(nest_comments(article_id, flat))
    }
}

fn nest_comments(article_id: i64, flat: Vec<Comment>) -> Vec<CommentNode> {
    let forest = tree::build_forest(flat);

    if !forest.orphans.is_empty() {
        tracing::warn!(
            article_id,
            orphans = ?forest.orphans,
            "Comments reference missing parents, showing them at top level"
        );
    }

    forest.roots
}
