//! In-crate fakes shared by the stage tests.

use crate::error::WorkflowError;
use crate::voice::{Capture, CaptureFeed, SpeechRecognizer};
use api::{
    Backend, EmbeddingRequest, EmbeddingResponse, RemoteError, SearchRequest, SearchResponse,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Backend answering from canned replies and recording every request.
#[derive(Debug)]
pub struct FakeBackend {
    embed_reply: Mutex<Result<EmbeddingResponse, RemoteError>>,
    search_reply: Mutex<Result<SearchResponse, RemoteError>>,
    pub embed_requests: Mutex<Vec<EmbeddingRequest>>,
    pub search_requests: Mutex<Vec<SearchRequest>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            embed_reply: Mutex::new(Ok(EmbeddingResponse::default())),
            search_reply: Mutex::new(Ok(SearchResponse::default())),
            embed_requests: Mutex::new(Vec::new()),
            search_requests: Mutex::new(Vec::new()),
        }
    }
}

impl FakeBackend {
    pub fn embedding_session(id: &str) -> Self {
        let backend = Self::default();
        backend.reply_embed(Ok(EmbeddingResponse {
            session_id: Some(id.into()),
            message: None,
        }));
        backend
    }

    pub fn reply_embed(&self, reply: Result<EmbeddingResponse, RemoteError>) {
        *self.embed_reply.lock().unwrap() = reply;
    }

    pub fn reply_search(&self, reply: Result<SearchResponse, RemoteError>) {
        *self.search_reply.lock().unwrap() = reply;
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_requests.lock().unwrap().len()
    }

    pub fn search_calls(&self) -> usize {
        self.search_requests.lock().unwrap().len()
    }
}

impl Backend for FakeBackend {
    async fn embed(&self, req: EmbeddingRequest) -> Result<EmbeddingResponse, RemoteError> {
        self.embed_requests.lock().unwrap().push(req);
        self.embed_reply.lock().unwrap().clone()
    }

    async fn search(&self, req: SearchRequest) -> Result<SearchResponse, RemoteError> {
        self.search_requests.lock().unwrap().push(req);
        self.search_reply.lock().unwrap().clone()
    }
}

/// Recognizer handing out captures whose feeds the test drives by hand.
#[derive(Debug, Clone, Default)]
pub struct FakeRecognizer {
    pub starts: Arc<AtomicUsize>,
    pub feeds: Arc<Mutex<Vec<CaptureFeed>>>,
    pub fail_with: Option<String>,
}

impl FakeRecognizer {
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn take_feed(&self) -> CaptureFeed {
        self.feeds.lock().unwrap().remove(0)
    }
}

impl SpeechRecognizer for FakeRecognizer {
    fn start(&mut self, _language: &str) -> Result<Capture, WorkflowError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.fail_with {
            return Err(WorkflowError::MediaCaptureFailure(reason.clone()));
        }
        let (feed, capture) = Capture::channel();
        self.feeds.lock().unwrap().push(feed);
        Ok(capture)
    }
}
