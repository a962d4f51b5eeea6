use async_trait::async_trait;
use blog_shared::{api::NewArticle, Article, ArticleSummary, Comment};
use chrono::{DateTime, Utc};

use super::{BlogStore, NewComment};
use crate::db::DbPool;
use crate::error::AppError;

type ArticleSummaryRow = (
    i64,           // id
    String,        // title
    String,        // author
    String,        // content
    DateTime<Utc>, // created_at
    DateTime<Utc>, // updated_at
    i64,           // top-level comment count
);

fn row_to_summary(row: ArticleSummaryRow) -> ArticleSummary {
    ArticleSummary {
        article: Article {
            id: row.0,
            title: row.1,
            author: row.2,
            content: row.3,
            created_at: row.4,
            updated_at: row.5,
        },
        comment_count: row.6.max(0) as usize,
    }
}

const SELECT_ARTICLE: &str =
    "SELECT id, title, author, content, created_at, updated_at FROM articles WHERE id = $1";

const SELECT_COMMENTS: &str = r#"
    SELECT id, article_id, author, content, parent_id, created_at, updated_at
    FROM comments
    WHERE article_id = $1
    ORDER BY created_at ASC, id ASC
"#;

/// Relational storage: one row per article and per comment, replies refer to
/// their parent through `parent_id`.
#[derive(Clone)]
pub struct PgStore {
    db: DbPool,
}

impl PgStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlogStore for PgStore {
    async fn list_articles(&self) -> Result<Vec<ArticleSummary>, AppError> {
        let rows: Vec<ArticleSummaryRow> = sqlx::query_as(
            r#"
            SELECT a.id, a.title, a.author, a.content, a.created_at, a.updated_at,
                   (SELECT COUNT(*) FROM comments c
                    WHERE c.article_id = a.id AND c.parent_id IS NULL)
            FROM articles a
            ORDER BY a.created_at DESC, a.id DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(row_to_summary).collect())
    }

    async fn get_article(&self, id: i64) -> Result<Option<Article>, AppError> {
        let article = sqlx::query_as::<_, Article>(SELECT_ARTICLE)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(article)
    }

    async fn list_comments(&self, article_id: i64) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(SELECT_COMMENTS)
            .bind(article_id)
            .fetch_all(&self.db)
            .await?;

        Ok(comments)
    }

    async fn get_article_with_comments(
        &self,
        id: i64,
    ) -> Result<Option<(Article, Vec<Comment>)>, AppError> {
        // Both reads share one snapshot.
        let mut tx = self.db.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let article = sqlx::query_as::<_, Article>(SELECT_ARTICLE)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let result = match article {
            Some(article) => {
                let comments = sqlx::query_as::<_, Comment>(SELECT_COMMENTS)
                    .bind(id)
                    .fetch_all(&mut *tx)
                    .await?;
                Some((article, comments))
            }
            None => None,
        };

        tx.commit().await?;
        Ok(result)
    }

    async fn insert_article(
        &self,
        new: NewArticle,
        now: DateTime<Utc>,
    ) -> Result<Article, AppError> {
        let article = sqlx::query_as::<_, Article>(
            r#"
            INSERT INTO articles (title, author, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, title, author, content, created_at, updated_at
            "#,
        )
        .bind(&new.title)
        .bind(&new.author)
        .bind(&new.content)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        Ok(article)
    }

    async fn delete_article(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.db.begin().await?;

        // Comments go first so the cascade does not depend on the FK action.
        sqlx::query("DELETE FROM comments WHERE article_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn insert_comment(
        &self,
        new: NewComment,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError> {
        // The parent check and the insert run as one statement.
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (article_id, author, content, parent_id, created_at, updated_at)
            SELECT a.id, $2, $3, $4::BIGINT, $5::TIMESTAMPTZ, $5::TIMESTAMPTZ
            FROM articles a
            WHERE a.id = $1
              AND ($4::BIGINT IS NULL
                   OR EXISTS (SELECT 1 FROM comments p WHERE p.id = $4 AND p.article_id = $1))
            RETURNING id, article_id, author, content, parent_id, created_at, updated_at
            "#,
        )
        .bind(new.article_id)
        .bind(&new.author)
        .bind(&new.content)
        .bind(new.parent_id)
        .bind(now)
        .fetch_optional(&self.db)
        .await?;

        Ok(comment)
    }

    async fn update_comment(
        &self,
        article_id: i64,
        comment_id: i64,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET content = $1, updated_at = $2
            WHERE id = $3 AND article_id = $4
            RETURNING id, article_id, author, content, parent_id, created_at, updated_at
            "#,
        )
        .bind(content)
        .bind(now)
        .bind(comment_id)
        .bind(article_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(comment)
    }

    async fn delete_comments(&self, article_id: i64, ids: &[i64]) -> Result<u64, AppError> {
        // Walk down from the requested ids so replies added since the caller
        // read the tree are removed as well.
        let result = sqlx::query(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id FROM comments WHERE article_id = $1 AND id = ANY($2)
                UNION
                SELECT c.id FROM comments c JOIN subtree s ON c.parent_id = s.id
            )
            DELETE FROM comments WHERE id IN (SELECT id FROM subtree)
            "#,
        )
        .bind(article_id)
        .bind(ids)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }
}
