use blog_shared::{
    api::{
        CreateArticleRequest, CreateCommentRequest, ErrorResponse, SuccessResponse,
        UpdateCommentRequest,
    },
    Article, ArticleSummary, ArticleWithComments, CommentNode,
};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Thin client over the blog's REST API.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        handle_response(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        handle_response(response).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.client.put(self.url(path)).json(body).send().await?;
        handle_response(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let response = self.client.delete(self.url(path)).send().await?;
        let _: SuccessResponse = handle_response(response).await?;
        Ok(())
    }

    pub async fn list_articles(&self) -> Result<Vec<ArticleSummary>, ApiError> {
        self.get("/articles").await
    }

    pub async fn get_article(&self, id: i64) -> Result<ArticleWithComments, ApiError> {
        self.get(&format!("/articles/{}", id)).await
    }

    pub async fn create_article(&self, req: &CreateArticleRequest) -> Result<Article, ApiError> {
        self.post("/articles", req).await
    }

    pub async fn delete_article(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/articles/{}", id)).await
    }

    pub async fn create_comment(
        &self,
        article_id: i64,
        author: &str,
        content: &str,
    ) -> Result<CommentNode, ApiError> {
        let req = CreateCommentRequest::new(author, content);
        self.post(&format!("/articles/{}/comments", article_id), &req)
            .await
    }

    pub async fn create_reply(
        &self,
        article_id: i64,
        parent_id: i64,
        author: &str,
        content: &str,
    ) -> Result<CommentNode, ApiError> {
        let req = CreateCommentRequest::new(author, content);
        self.post(
            &format!("/articles/{}/comments/{}/replies", article_id, parent_id),
            &req,
        )
        .await
    }

    pub async fn update_comment(
        &self,
        article_id: i64,
        comment_id: i64,
        content: &str,
    ) -> Result<CommentNode, ApiError> {
        let req = UpdateCommentRequest::new(content);
        self.put(
            &format!("/articles/{}/comments/{}", article_id, comment_id),
            &req,
        )
        .await
    }

    pub async fn delete_comment(&self, article_id: i64, comment_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/articles/{}/comments/{}", article_id, comment_id))
            .await
    }
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(ApiError::Network);
    }

    let text = response.text().await.unwrap_or_default();
    Err(classify(status, &text))
}

/// Maps an error response to an [`ApiError`], preferring the server's
/// `{"error": ...}` message over the raw body.
fn classify(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        _ => ApiError::Server(format!("{}: {}", status, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_uses_error_body() {
        let err = classify(StatusCode::NOT_FOUND, r#"{"error":"Article not found"}"#);
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Article not found"));
        assert_eq!(err.to_string(), "Article not found");
    }

    #[test]
    fn classify_falls_back_to_raw_text() {
        let err = classify(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert_eq!(err.to_string(), "Server error: 500 Internal Server Error: boom");

        let err = classify(StatusCode::BAD_REQUEST, r#"{"error":"Title is required"}"#);
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn base_url_is_normalised() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(client.url("/articles"), "http://localhost:3000/api/articles");
    }
}
