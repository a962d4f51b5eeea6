use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use blog_shared::{
    api::{CreateCommentRequest, SuccessResponse, UpdateCommentRequest},
    CommentNode,
};

use super::parse_id;
use crate::error::AppError;
use crate::routes::AppState;

fn parse_ids(article_id: &str, comment_id: &str) -> Result<(i64, i64), AppError> {
    Ok((
        parse_id(article_id, AppError::article_not_found)?,
        parse_id(comment_id, AppError::comment_not_found)?,
    ))
}

/// POST /api/articles/:id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Path(article_id): Path<String>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CommentNode>), AppError> {
    let article_id = parse_id(&article_id, AppError::article_not_found)?;
    let Json(req) = payload?;

    let comment = state.blog.create_comment(article_id, &req).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// POST /api/articles/:article_id/comments/:comment_id/replies
pub async fn create_reply(
    State(state): State<AppState>,
    Path((article_id, comment_id)): Path<(String, String)>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CommentNode>), AppError> {
    let (article_id, parent_id) = parse_ids(&article_id, &comment_id)?;
    let Json(req) = payload?;

    let reply = state.blog.create_reply(article_id, parent_id, &req).await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

/// PUT /api/articles/:article_id/comments/:comment_id
pub async fn update_comment(
    State(state): State<AppState>,
    Path((article_id, comment_id)): Path<(String, String)>,
    payload: Result<Json<UpdateCommentRequest>, JsonRejection>,
) -> Result<Json<CommentNode>, AppError> {
    let (article_id, comment_id) = parse_ids(&article_id, &comment_id)?;
    let Json(req) = payload?;

    let comment = state.blog.update_comment(article_id, comment_id, &req).await?;
    Ok(Json(comment))
}

/// DELETE /api/articles/:article_id/comments/:comment_id
pub async fn delete_comment(
    State(state): State<AppState>,
    Path((article_id, comment_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, AppError> {
    let (article_id, comment_id) = parse_ids(&article_id, &comment_id)?;
    state.blog.delete_comment(article_id, comment_id).await?;
    Ok(Json(SuccessResponse::ok()))
}
