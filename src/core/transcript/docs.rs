//! Google Docs v1 client used by the transcript logger.

use async_trait::async_trait;

use crate::api::docs::{BatchUpdateRequest, Document};
use crate::core::chat_stream::format_api_error;
use crate::core::transcript::LoggingError;
use crate::utils::auth::add_bearer_auth;
use crate::utils::url::construct_api_url;

/// The two document operations the logger needs.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Index at which appended text should be inserted.
    async fn end_offset(&self, token: &str, document_id: &str) -> Result<i64, LoggingError>;

    async fn insert_text(
        &self,
        token: &str,
        document_id: &str,
        index: i64,
        text: &str,
    ) -> Result<(), LoggingError>;
}

#[derive(Debug, Clone)]
pub struct GoogleDocsClient {
    base_url: String,
    http: reqwest::Client,
}

impl GoogleDocsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LoggingError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(LoggingError::Http {
        status,
        detail: format_api_error(&body),
    })
}

#[async_trait]
impl DocumentApi for GoogleDocsClient {
    async fn end_offset(&self, token: &str, document_id: &str) -> Result<i64, LoggingError> {
        let url = construct_api_url(&self.base_url, &format!("documents/{document_id}"));
        let request = self
            .http
            .get(url)
            .query(&[("fields", "body(content(endIndex))")]);
        let response = add_bearer_auth(request, token)
            .send()
            .await
            .map_err(LoggingError::transport)?;
        let document: Document = check_status(response)
            .await?
            .json()
            .await
            .map_err(|err| LoggingError::Decode(err.to_string()))?;
        Ok(document.append_index())
    }

    async fn insert_text(
        &self,
        token: &str,
        document_id: &str,
        index: i64,
        text: &str,
    ) -> Result<(), LoggingError> {
        let url = construct_api_url(&self.base_url, &format!("documents/{document_id}:batchUpdate"));
        let request = self
            .http
            .post(url)
            .json(&BatchUpdateRequest::insert_at(text, index));
        let response = add_bearer_auth(request, token)
            .send()
            .await
            .map_err(LoggingError::transport)?;
        check_status(response).await?;
        Ok(())
    }
}
