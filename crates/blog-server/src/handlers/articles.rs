use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use blog_shared::{
    api::{CreateArticleRequest, SuccessResponse},
    Article, ArticleSummary, ArticleWithComments,
};

use super::parse_id;
use crate::error::AppError;
use crate::routes::AppState;

/// GET /api/articles
pub async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<ArticleSummary>>, AppError> {
    let articles = state.blog.list_articles().await?;
    Ok(Json(articles))
}

/// GET /api/articles/:id
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArticleWithComments>, AppError> {
    let id = parse_id(&id, AppError::article_not_found)?;
    let article = state.blog.get_article(id).await?;
    Ok(Json(article))
}

/// POST /api/articles
pub async fn create_article(
    State(state): State<AppState>,
    payload: Result<Json<CreateArticleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Article>), AppError> {
    let Json(req) = payload?;
    let article = state.blog.create_article(&req).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

/// DELETE /api/articles/:id
pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let id = parse_id(&id, AppError::article_not_found)?;
    state.blog.delete_article(id).await?;
    Ok(Json(SuccessResponse::ok()))
}
