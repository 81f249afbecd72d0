//! HTTP client for a running registry server.

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::RemoteStore;
use crate::errors::{AppError, ErrorResponse};
use crate::models::{Document, DocumentPatch, NewDocument};

/// Path of the document collection relative to the server base URL.
pub const DOCUMENTS_PATH: &str = "/api/documents";

/// [`RemoteStore`] backed by the `/api/documents` endpoints.
///
/// A 404 maps to [`AppError::NotFound`]; every other non-2xx response, and
/// any connection failure, maps to [`AppError::Transport`]. No timeout is
/// set, so a stalled server stalls the caller.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    documents_url: Url,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let documents_url = Url::parse(&format!("{}{}", base_url, DOCUMENTS_PATH))
            .map_err(|e| AppError::Validation(format!("Invalid server URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("doc-registry/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            documents_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn document_url(&self, id: &str) -> Result<Url, AppError> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal(format!("Cannot build URL for document {}", id)))?
            .push(id);
        Ok(url)
    }

    /// Send a request and decode a successful JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        id: Option<&str>,
    ) -> Result<T, AppError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(AppError::document_not_found(id));
            }
        }

        let fallback = status.canonical_reason().unwrap_or("request failed").to_string();
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => fallback,
        };
        tracing::error!(status = status.as_u16(), "Remote store error: {}", message);

        Err(AppError::Transport {
            status: Some(status.as_u16()),
            message,
        })
    }
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn list(&self) -> Result<Vec<Document>, AppError> {
        let request = self.client.get(self.documents_url.clone());
        self.send(request, None).await
    }

    async fn get(&self, id: &str) -> Result<Document, AppError> {
        let request = self.client.get(self.document_url(id)?);
        self.send(request, Some(id)).await
    }

    async fn create(&self, data: &NewDocument) -> Result<Document, AppError> {
        let request = self.client.post(self.documents_url.clone()).json(data);
        self.send(request, None).await
    }

    async fn update(&self, id: &str, patch: &DocumentPatch) -> Result<Document, AppError> {
        let request = self.client.put(self.document_url(id)?).json(patch);
        self.send(request, Some(id)).await
    }

    async fn delete(&self, id: &str) -> Result<Document, AppError> {
        let request = self.client.delete(self.document_url(id)?);
        self.send(request, Some(id)).await
    }

    fn describe(&self) -> String {
        format!("server {}", self.base_url())
    }
}
