use crate::{
    API_PREFIX, Backend, EMBEDDING_PATH, EmbeddingRequest, EmbeddingResponse, HEALTH_PATH,
    HealthResponse, RemoteError, SEARCH_PATH, SearchRequest, SearchResponse,
};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// reqwest-backed client for the embedding/search service.
///
/// Requests are never retried; a failed call is reported once and the
/// caller decides whether to try again.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    http: reqwest::Client,
    request_timeout: Option<Duration>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }

    /// Ping the service root.
    pub async fn health(&self) -> Result<HealthResponse, RemoteError> {
        let mut builder = self.http.get(self.endpoint(HEALTH_PATH));
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        self.send(builder).await
    }

    async fn post<Req, Resp>(&self, path: &str, req: &Req) -> Result<Resp, RemoteError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let mut builder = self.http.post(self.endpoint(path)).json(req);
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        self.send(builder).await
    }

    async fn send<Resp>(&self, builder: reqwest::RequestBuilder) -> Result<Resp, RemoteError>
    where
        Resp: DeserializeOwned,
    {
        let resp = builder.send().await.map_err(|e| {
            warn!("request to {} failed: {e}", self.base_url);
            RemoteError::Transport(e.to_string())
        })?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        if !status.is_success() {
            let err = RemoteError::from_body(status.as_u16(), &body);
            warn!("service rejected request: {err}");
            return Err(err);
        }

        serde_json::from_slice(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

impl Backend for HttpClient {
    async fn embed(&self, req: EmbeddingRequest) -> Result<EmbeddingResponse, RemoteError> {
        self.post(EMBEDDING_PATH, &req).await
    }

    async fn search(&self, req: SearchRequest) -> Result<SearchResponse, RemoteError> {
        self.post(SEARCH_PATH, &req).await
    }
}
