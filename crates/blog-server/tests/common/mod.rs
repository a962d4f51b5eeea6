#![allow(dead_code)]

use std::sync::Arc;

use blog_server::{store::FileStore, BlogService};
use blog_shared::{
    api::{CreateArticleRequest, CreateCommentRequest},
    Article, CommentNode,
};
use tempfile::TempDir;

/// A service over a file store living in its own temporary directory.
pub struct TestBlog {
    pub dir: TempDir,
    pub blog: Arc<BlogService>,
}

impl TestBlog {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let blog = open_service(&dir).await;
        Self { dir, blog }
    }

    /// Opens a second service over the same data file, as a restart would.
    pub async fn reopen(&self) -> Arc<BlogService> {
        open_service(&self.dir).await
    }

    pub async fn article(&self, title: &str) -> Article {
        self.blog
            .create_article(&CreateArticleRequest::new(title, "author", "content"))
            .await
            .unwrap()
    }

    pub async fn comment(&self, article_id: i64, content: &str) -> CommentNode {
        self.blog
            .create_comment(article_id, &CreateCommentRequest::new("commenter", content))
            .await
            .unwrap()
    }

    pub async fn reply(&self, article_id: i64, parent_id: i64, content: &str) -> CommentNode {
        self.blog
            .create_reply(
                article_id,
                parent_id,
                &CreateCommentRequest::new("replier", content),
            )
            .await
            .unwrap()
    }
}

pub async fn open_service(dir: &TempDir) -> Arc<BlogService> {
    let store = FileStore::open(dir.path().join("database.json"))
        .await
        .unwrap();
    Arc::new(BlogService::new(Arc::new(store)))
}

/// Ids of a forest in pre-order, each paired with its depth.
pub fn shape(forest: &[CommentNode]) -> Vec<(usize, i64)> {
    blog_shared::tree::walk(forest)
        .into_iter()
        .map(|(depth, node)| (depth, node.id()))
        .collect()
}
