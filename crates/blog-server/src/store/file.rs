use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use async_trait::async_trait;
use blog_shared::{
    api::NewArticle, tree, Article, ArticleSummary, ArticleWithComments, Comment, CommentNode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

use super::{BlogStore, NewComment};
use crate::error::AppError;

/// The whole database as one JSON document. Replies are nested inside their
/// parent comment, articles are kept newest first.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    /// Highest id ever handed out, so deleted ids are never reused.
    last_id: i64,
    articles: Vec<ArticleWithComments>,
}

impl Document {
    fn article(&self, id: i64) -> Option<&ArticleWithComments> {
        self.articles.iter().find(|a| a.article.id == id)
    }

    fn article_mut(&mut self, id: i64) -> Option<&mut ArticleWithComments> {
        self.articles.iter_mut().find(|a| a.article.id == id)
    }

    /// Ids are derived from the clock in milliseconds, bumped past anything
    /// already used.
    fn next_id(&mut self, now: DateTime<Utc>) -> i64 {
        let highest = self
            .articles
            .iter()
            .map(|a| tree::max_id(&a.comments).map_or(a.article.id, |c| c.max(a.article.id)))
            .max()
            .unwrap_or(0)
            .max(self.last_id);

        let id = now.timestamp_millis().max(highest + 1);
        self.last_id = id;
        id
    }
}

// On-disk shape as read back. Older documents lack `updatedAt`, `articleId`
// and `parentId`, and may omit or null out fields that were never filled in.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredDocument {
    #[serde(deserialize_with = "null_as_default")]
    last_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    articles: Vec<StoredArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredArticle {
    id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    content: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    comments: Vec<StoredComment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredComment {
    id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    content: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    replies: Vec<StoredComment>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<StoredDocument> for Document {
    fn from(stored: StoredDocument) -> Self {
        let mut articles: Vec<ArticleWithComments> = stored
            .articles
            .into_iter()
            .map(|a| ArticleWithComments {
                article: Article {
                    id: a.id,
                    title: a.title,
                    author: a.author,
                    content: a.content,
                    created_at: a.created_at,
                    updated_at: a.updated_at.unwrap_or(a.created_at),
                },
                comments: nest(a.comments, a.id, None),
            })
            .collect();
        sort_newest_first(&mut articles);

        Document {
            last_id: stored.last_id,
            articles,
        }
    }
}

// The nesting is authoritative: article and parent ids come from where a
// comment sits, whatever the record itself claims.
fn nest(comments: Vec<StoredComment>, article_id: i64, parent_id: Option<i64>) -> Vec<CommentNode> {
    comments
        .into_iter()
        .map(|c| CommentNode {
            replies: nest(c.replies, article_id, Some(c.id)),
            comment: Comment {
                id: c.id,
                article_id,
                author: c.author,
                content: c.content,
                parent_id,
                created_at: c.created_at,
                updated_at: c.updated_at.unwrap_or(c.created_at),
            },
        })
        .collect()
}

fn sort_newest_first(articles: &mut [ArticleWithComments]) {
    articles.sort_by(|a, b| {
        b.article
            .created_at
            .cmp(&a.article.created_at)
            .then(b.article.id.cmp(&a.article.id))
    });
}

/// Stores everything in a single JSON file.
///
/// The last persisted document is cached in memory. Writers work on a copy,
/// write it to a temporary file, rename it over the data file and only then
/// publish the copy, so a failed write changes neither disk nor memory.
pub struct FileStore {
    path: PathBuf,
    snapshot: RwLock<Document>,
}

impl FileStore {
    /// Opens the document at `path`, creating an empty one if it is missing.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();

        let document = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let stored: StoredDocument = serde_json::from_slice(&bytes)?;
                let document = Document::from(stored);
                tracing::info!(
                    "Loaded {} articles from {}",
                    document.articles.len(),
                    path.display()
                );
                document
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let document = Document::default();
                write_document(&path, &document).await?;
                tracing::info!("Created empty database at {}", path.display());
                document
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            snapshot: RwLock::new(document),
        })
    }

    /// Applies `change` to a copy of the document and persists it when the
    /// change reports a result. `None` leaves everything untouched.
    async fn mutate<T: Send>(
        &self,
        change: impl FnOnce(&mut Document) -> Option<T> + Send,
    ) -> Result<Option<T>, AppError> {
        let mut current = self.snapshot.write().await;
        let mut next = Document::clone(&current);

        let Some(result) = change(&mut next) else {
            return Ok(None);
        };

        write_document(&self.path, &next).await?;
        *current = next;
        Ok(Some(result))
    }
}

async fn write_document(path: &Path, document: &Document) -> Result<(), AppError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }

    let bytes = serde_json::to_vec_pretty(document)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl BlogStore for FileStore {
    async fn list_articles(&self) -> Result<Vec<ArticleSummary>, AppError> {
        let document = self.snapshot.read().await;
        Ok(document
            .articles
            .iter()
            .map(|a| ArticleSummary {
                article: a.article.clone(),
                comment_count: a.comments.len(),
            })
            .collect())
    }

    async fn get_article(&self, id: i64) -> Result<Option<Article>, AppError> {
        let document = self.snapshot.read().await;
        Ok(document.article(id).map(|a| a.article.clone()))
    }

    async fn list_comments(&self, article_id: i64) -> Result<Vec<Comment>, AppError> {
        let document = self.snapshot.read().await;
        Ok(document
            .article(article_id)
            .map(|a| tree::flatten(&a.comments))
            .unwrap_or_default())
    }

    async fn get_article_with_comments(
        &self,
        id: i64,
    ) -> Result<Option<(Article, Vec<Comment>)>, AppError> {
        let document = self.snapshot.read().await;
        Ok(document
            .article(id)
            .map(|a| (a.article.clone(), tree::flatten(&a.comments))))
    }

    async fn insert_article(
        &self,
        new: NewArticle,
        now: DateTime<Utc>,
    ) -> Result<Article, AppError> {
        self.mutate(|doc| {
            let article = Article {
                id: doc.next_id(now),
                title: new.title,
                author: new.author,
                content: new.content,
                created_at: now,
                updated_at: now,
            };
            doc.articles.push(ArticleWithComments {
                article: article.clone(),
                comments: Vec::new(),
            });
            sort_newest_first(&mut doc.articles);
            Some(article)
        })
        .await?
        .ok_or_else(|| anyhow!("article insert produced no record").into())
    }

    async fn delete_article(&self, id: i64) -> Result<bool, AppError> {
        let removed = self
            .mutate(|doc| {
                let pos = doc.articles.iter().position(|a| a.article.id == id)?;
                Some(doc.articles.remove(pos))
            })
            .await?;

        Ok(removed.is_some())
    }

    async fn insert_comment(
        &self,
        new: NewComment,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError> {
        self.mutate(|doc| {
            doc.article(new.article_id)?;
            if let Some(parent_id) = new.parent_id {
                tree::find_node(&doc.article(new.article_id)?.comments, parent_id)?;
            }

            let comment = Comment {
                id: doc.next_id(now),
                article_id: new.article_id,
                author: new.author,
                content: new.content,
                parent_id: new.parent_id,
                created_at: now,
                updated_at: now,
            };

            let article = doc.article_mut(new.article_id)?;
            let siblings = match new.parent_id {
                Some(parent_id) => &mut tree::find_node_mut(&mut article.comments, parent_id)?.replies,
                None => &mut article.comments,
            };
            siblings.push(CommentNode::leaf(comment.clone()));
            Some(comment)
        })
        .await
    }

    async fn update_comment(
        &self,
        article_id: i64,
        comment_id: i64,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError> {
        self.mutate(|doc| {
            let article = doc.article_mut(article_id)?;
            let node = tree::find_node_mut(&mut article.comments, comment_id)?;
            node.comment.content = content.to_string();
            node.comment.updated_at = now;
            Some(node.comment.clone())
        })
        .await
    }

    async fn delete_comments(&self, article_id: i64, ids: &[i64]) -> Result<u64, AppError> {
        let ids: HashSet<i64> = ids.iter().copied().collect();
        let removed = self
            .mutate(|doc| {
                let article = doc.article_mut(article_id)?;
                match tree::prune(&mut article.comments, &ids) {
                    0 => None,
                    n => Some(n as u64),
                }
            })
            .await?;

        Ok(removed.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_document_is_normalised() {
        let json = r#"{
            "articles": [
                {
                    "id": 1,
                    "title": "Welcome",
                    "author": "Administrator",
                    "content": "Hello",
                    "createdAt": "2024-01-01T10:00:00.000Z",
                    "comments": [
                        {
                            "id": 10,
                            "author": "ann",
                            "content": "first",
                            "createdAt": "2024-01-01T11:00:00.000Z",
                            "replies": [
                                {
                                    "id": 11,
                                    "author": "bob",
                                    "content": "reply",
                                    "createdAt": "2024-01-01T12:00:00.000Z",
                                    "replies": []
                                }
                            ]
                        }
                    ]
                }
            ]
        }"#;

        let stored: StoredDocument = serde_json::from_str(json).unwrap();
        let doc = Document::from(stored);
        let article = &doc.articles[0];

        assert_eq!(article.article.updated_at, article.article.created_at);
        let reply = &article.comments[0].replies[0].comment;
        assert_eq!(reply.article_id, 1);
        assert_eq!(reply.parent_id, Some(10));
        assert_eq!(article.comments[0].comment.parent_id, None);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let json = r#"{"articles":[{"id":5,"createdAt":"2024-01-01T10:00:00Z"}]}"#;
        let doc = Document::from(serde_json::from_str::<StoredDocument>(json).unwrap());
        assert_eq!(doc.articles[0].article.title, "");
        assert!(doc.articles[0].comments.is_empty());
    }

    #[test]
    fn next_id_never_goes_backwards() {
        let mut doc = Document::default();
        let now = Utc::now();

        let first = doc.next_id(now);
        let second = doc.next_id(now);
        assert_eq!(first, now.timestamp_millis());
        assert_eq!(second, first + 1);

        // the high-water mark survives even when nothing holds that id anymore
        let earlier = now - chrono::Duration::hours(1);
        assert_eq!(doc.next_id(earlier), second + 1);
    }

    #[tokio::test]
    async fn null_fields_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        let json = r#"{"articles":[{
            "id": 7,
            "title": "kept",
            "author": null,
            "content": null,
            "createdAt": "2024-01-01T10:00:00Z",
            "comments": [{
                "id": 8,
                "author": "ann",
                "content": null,
                "createdAt": "2024-01-01T11:00:00Z",
                "replies": null
            }]
        }]}"#;
        std::fs::write(&path, json).unwrap();

        let store = FileStore::open(&path).await.unwrap();
        let (article, comments) = store.get_article_with_comments(7).await.unwrap().unwrap();
        assert_eq!(article.title, "kept");
        assert_eq!(article.author, "");
        assert_eq!(article.content, "");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author, "ann");
        assert_eq!(comments[0].content, "");
    }

    #[test]
    fn articles_are_sorted_newest_first_on_load() {
        let json = r#"{"articles":[
            {"id":1,"title":"old","createdAt":"2024-01-01T10:00:00Z"},
            {"id":2,"title":"new","createdAt":"2024-02-01T10:00:00Z"}
        ]}"#;
        let doc = Document::from(serde_json::from_str::<StoredDocument>(json).unwrap());
        let titles: Vec<_> = doc.articles.iter().map(|a| a.article.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old"]);
    }
}
