use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{articles as article_handlers, comments as comment_handlers};
use crate::service::BlogService;

#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
}

pub fn create_router(blog: Arc<BlogService>) -> Router {
    let state = AppState { blog };

    let article_routes = Router::new()
        .route(
            "/",
            get(article_handlers::list_articles).post(article_handlers::create_article),
        )
        .route(
            "/:id",
            get(article_handlers::get_article).delete(article_handlers::delete_article),
        );

    // Comment routes (nested under articles)
    let comment_routes = Router::new()
        .route("/", post(comment_handlers::create_comment))
        .route(
            "/:comment_id",
            put(comment_handlers::update_comment).delete(comment_handlers::delete_comment),
        )
        .route("/:comment_id/replies", post(comment_handlers::create_reply));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/articles", article_routes)
        .nest("/api/articles/:id/comments", comment_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
