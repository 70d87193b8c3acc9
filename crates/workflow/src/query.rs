//! Query submitter and the query stage model.

use crate::error::WorkflowError;
use crate::flight::{InFlight, Operation};
use crate::notify::{Notification, Notifier};
use crate::presenter::ResultPresenter;
use crate::session::SessionStore;
use crate::voice::VoiceInput;
use api::{Backend, SearchRequest};
use core_types::{Limit, Query, SearchResultSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shown when the service reports success without a message.
pub const DEFAULT_SEARCH_MESSAGE: &str = "Data processed successfully";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub results: SearchResultSet,
    pub message: Option<String>,
}

/// Sends queries scoped to the stored session.
pub struct QuerySubmitter<B> {
    backend: Arc<B>,
    sessions: Arc<dyn SessionStore>,
}

impl<B> Clone for QuerySubmitter<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<B: Backend> QuerySubmitter<B> {
    pub fn new(backend: Arc<B>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { backend, sessions }
    }

    /// Run one search. Callers are expected to skip blank queries.
    pub async fn search(&self, query: &Query) -> Result<SearchOutcome, WorkflowError> {
        let session_id = self.sessions.get();
        debug!(limit = query.limit.get(), has_session = session_id.is_some(), "searching");

        let resp = self
            .backend
            .search(SearchRequest {
                query: query.text.clone(),
                session_id,
                limit: query.limit.get(),
            })
            .await
            .map_err(|err| {
                warn!(error = %err, "search request failed");
                WorkflowError::RemoteSearchFailure(err.user_message())
            })?;

        Ok(SearchOutcome {
            results: SearchResultSet {
                results: resp.results.unwrap_or_default(),
                summary: resp.summary.unwrap_or_default(),
            },
            message: resp.message,
        })
    }
}

/// The query stage: query text, limit, voice input and the latest results.
pub struct QueryStage<B> {
    submitter: QuerySubmitter<B>,
    text: String,
    limit: Limit,
    voice: VoiceInput,
    flight: InFlight,
    has_searched: bool,
    results: SearchResultSet,
}

impl<B: Backend> QueryStage<B> {
    pub fn new(submitter: QuerySubmitter<B>, voice: VoiceInput) -> Self {
        Self {
            submitter,
            text: String::new(),
            limit: Limit::DEFAULT,
            voice,
            flight: InFlight::new(Operation::Search),
            has_searched: false,
            results: SearchResultSet::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn limit(&self) -> Limit {
        self.limit
    }

    pub fn set_limit(&mut self, limit: Limit) {
        self.limit = limit;
    }

    /// Raw numeric input from the user; clamped to at least 1.
    pub fn set_limit_input(&mut self, raw: i64) {
        self.limit = Limit::clamped(raw);
    }

    pub fn voice(&self) -> &VoiceInput {
        &self.voice
    }

    pub fn is_searching(&self) -> bool {
        self.flight.is_busy()
    }

    pub fn has_searched(&self) -> bool {
        self.has_searched
    }

    pub fn results(&self) -> &SearchResultSet {
        &self.results
    }

    /// Whether the search trigger should be enabled.
    pub fn can_search(&self) -> bool {
        !self.text.trim().is_empty() && !self.is_searching()
    }

    /// Presenter over the latest results; `None` until a search succeeded.
    pub fn presenter(&self) -> Option<ResultPresenter<'_>> {
        self.has_searched.then(|| ResultPresenter::new(&self.results))
    }

    /// Toggle voice capture.
    pub fn toggle_voice(&mut self) {
        self.voice.toggle();
    }

    /// Wait for the active voice capture and merge its transcript into the
    /// query text.
    pub async fn listen(&mut self) -> bool {
        self.voice.listen(&mut self.text).await
    }

    /// Run one search with the current text and limit.
    ///
    /// On failure the previous results and `has_searched` stay as they were.
    pub async fn submit(&mut self, notifier: &mut impl Notifier) -> bool {
        if self.text.trim().is_empty() {
            return false;
        }
        let _guard = match self.flight.try_acquire() {
            Ok(guard) => guard,
            Err(err) => {
                debug!(error = %err, "search trigger ignored");
                return false;
            }
        };

        let query = Query::new(self.text.clone(), self.limit);
        match self.submitter.search(&query).await {
            Ok(outcome) => {
                self.results = outcome.results;
                self.has_searched = true;
                notifier.notify(Notification::success(
                    outcome
                        .message
                        .unwrap_or_else(|| DEFAULT_SEARCH_MESSAGE.to_string()),
                ));
                true
            }
            Err(err) => {
                notifier.notify(Notification::error(err.to_string()));
                false
            }
        }
    }
}
