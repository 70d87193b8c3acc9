//! Import submitter and the import stage model.

use crate::acquisition::CandidateDocument;
use crate::error::WorkflowError;
use crate::flight::{InFlight, Operation};
use crate::notify::{Notification, Notifier};
use crate::session::SessionStore;
use api::{Backend, EmbeddingRequest};
use core_serialization::parse_document;
use core_types::SessionId;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shown when the service reports success without a message.
pub const DEFAULT_IMPORT_MESSAGE: &str = "Data processed successfully";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub session_id: SessionId,
    pub message: Option<String>,
}

/// Validates a candidate, sends it to the embedding endpoint and binds the
/// returned session.
pub struct ImportSubmitter<B> {
    backend: Arc<B>,
    sessions: Arc<dyn SessionStore>,
}

impl<B> Clone for ImportSubmitter<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<B: Backend> ImportSubmitter<B> {
    pub fn new(backend: Arc<B>, sessions: Arc<dyn SessionStore>) -> Self {
        Self { backend, sessions }
    }

    /// Submit one candidate.
    ///
    /// Malformed JSON fails before any request is made. On success the
    /// session store is overwritten with the returned identifier; on any
    /// failure it is not touched.
    pub async fn submit(&self, candidate: &CandidateDocument) -> Result<ImportOutcome, WorkflowError> {
        let user_data = parse_document(candidate.text()).map_err(WorkflowError::InvalidJson)?;
        let session_id = self.sessions.get();
        debug!(has_session = session_id.is_some(), "submitting candidate for embedding");

        let resp = self
            .backend
            .embed(EmbeddingRequest {
                user_data,
                session_id,
            })
            .await
            .map_err(|err| {
                warn!(error = %err, "embedding request failed");
                WorkflowError::RemoteImportFailure(err.user_message())
            })?;

        let Some(new_id) = resp.session_id else {
            warn!("embedding response carried no session id");
            return Err(WorkflowError::RemoteImportFailure(
                "The server did not return a session id".to_string(),
            ));
        };

        self.sessions.set(new_id.clone())?;
        info!(session = %new_id, "session bound");
        Ok(ImportOutcome {
            session_id: new_id,
            message: resp.message,
        })
    }
}

/// Where the caller goes after an import attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTransition {
    /// Nothing submitted, or the import failed; stay on the import stage.
    Stay,
    /// Session bound; move on to querying.
    Query(ImportOutcome),
}

/// The import stage: candidate document plus the in-flight flag.
pub struct ImportStage<B> {
    submitter: ImportSubmitter<B>,
    candidate: CandidateDocument,
    flight: InFlight,
}

impl<B: Backend> ImportStage<B> {
    pub fn new(submitter: ImportSubmitter<B>) -> Self {
        Self {
            submitter,
            candidate: CandidateDocument::default(),
            flight: InFlight::new(Operation::Import),
        }
    }

    pub fn candidate(&self) -> &CandidateDocument {
        &self.candidate
    }

    pub fn candidate_mut(&mut self) -> &mut CandidateDocument {
        &mut self.candidate
    }

    pub fn is_importing(&self) -> bool {
        self.flight.is_busy()
    }

    /// Whether the "next" trigger should be enabled.
    pub fn can_submit(&self) -> bool {
        self.candidate.can_submit() && !self.is_importing()
    }

    /// Run one import and report the result through `notifier`.
    pub async fn next(&mut self, notifier: &mut impl Notifier) -> ImportTransition {
        if !self.candidate.can_submit() {
            debug!("import skipped: candidate is empty or unmodified");
            return ImportTransition::Stay;
        }
        let _guard = match self.flight.try_acquire() {
            Ok(guard) => guard,
            Err(err) => {
                debug!(error = %err, "import trigger ignored");
                return ImportTransition::Stay;
            }
        };

        match self.submitter.submit(&self.candidate).await {
            Ok(outcome) => {
                let message = outcome
                    .message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_IMPORT_MESSAGE.to_string());
                notifier.notify(Notification::success(message));
                ImportTransition::Query(outcome)
            }
            Err(err) => {
                notifier.notify(Notification::error(err.to_string()));
                ImportTransition::Stay
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Level;
    use crate::session::MemorySessionStore;
    use crate::testing::FakeBackend;
    use api::{EmbeddingResponse, RemoteError};
    use proptest::prelude::*;
    use serde_json::json;

    fn submitter(backend: &Arc<FakeBackend>, store: &Arc<MemorySessionStore>) -> ImportSubmitter<FakeBackend> {
        ImportSubmitter::new(Arc::clone(backend), Arc::clone(store) as Arc<dyn SessionStore>)
    }

    fn candidate(text: &str) -> CandidateDocument {
        let mut doc = CandidateDocument::default();
        doc.set_from_text(text);
        doc
    }

    #[tokio::test]
    async fn first_import_binds_returned_session() {
        let backend = Arc::new(FakeBackend::embedding_session("S1"));
        let store = Arc::new(MemorySessionStore::new());

        let outcome = submitter(&backend, &store)
            .submit(&candidate(r#"{"a":1}"#))
            .await
            .unwrap();

        assert_eq!(outcome.session_id, SessionId::new("S1"));
        assert_eq!(store.get(), Some(SessionId::new("S1")));
        assert_eq!(backend.embed_calls(), 1);
        let sent = backend.embed_requests.lock().unwrap()[0].clone();
        assert_eq!(sent.user_data, json!({"a": 1}));
        assert!(sent.session_id.is_none());
    }

    #[tokio::test]
    async fn user_data_keeps_document_key_order() {
        let backend = Arc::new(FakeBackend::embedding_session("S1"));
        let store = Arc::new(MemorySessionStore::new());

        submitter(&backend, &store)
            .submit(&candidate(r#"[{"status":"pending","orderId":"ORD-101","amount":5400}]"#))
            .await
            .unwrap();

        let sent = backend.embed_requests.lock().unwrap()[0].clone();
        assert_eq!(
            serde_json::to_string(&sent).unwrap(),
            r#"{"userData":[{"status":"pending","orderId":"ORD-101","amount":5400}],"session_id":null}"#
        );
    }

    #[tokio::test]
    async fn malformed_json_never_reaches_the_network() {
        let backend = Arc::new(FakeBackend::embedding_session("S1"));
        let store = Arc::new(MemorySessionStore::new());

        let err = submitter(&backend, &store)
            .submit(&candidate("not json"))
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::InvalidJson(_)));
        assert_eq!(backend.embed_calls(), 0);
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn existing_session_is_sent_and_replaced() {
        let backend = Arc::new(FakeBackend::embedding_session("S2"));
        let store = Arc::new(MemorySessionStore::with_session("S1"));

        submitter(&backend, &store)
            .submit(&candidate("[1]"))
            .await
            .unwrap();

        let sent = backend.embed_requests.lock().unwrap()[0].clone();
        assert_eq!(sent.session_id, Some(SessionId::new("S1")));
        assert_eq!(store.get(), Some(SessionId::new("S2")));
    }

    #[tokio::test]
    async fn remote_failure_keeps_prior_session_and_server_message() {
        let backend = Arc::new(FakeBackend::default());
        backend.reply_embed(Err(RemoteError::Status {
            status: 400,
            message: Some("No userData provided".into()),
        }));
        let store = Arc::new(MemorySessionStore::with_session("S1"));

        let err = submitter(&backend, &store)
            .submit(&candidate("[]"))
            .await
            .unwrap_err();

        match err {
            WorkflowError::RemoteImportFailure(msg) => assert_eq!(msg, "No userData provided"),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(store.get(), Some(SessionId::new("S1")));
    }

    #[tokio::test]
    async fn success_without_session_id_is_a_failure() {
        let backend = Arc::new(FakeBackend::default());
        backend.reply_embed(Ok(EmbeddingResponse {
            session_id: None,
            message: Some("ok".into()),
        }));
        let store = Arc::new(MemorySessionStore::new());

        let err = submitter(&backend, &store)
            .submit(&candidate("[]"))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::RemoteImportFailure(_)));
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn stage_ignores_placeholder_and_reports_outcomes() {
        let backend = Arc::new(FakeBackend::embedding_session("S9"));
        let store = Arc::new(MemorySessionStore::new());
        let mut stage = ImportStage::new(submitter(&backend, &store));
        let mut notes: Vec<Notification> = Vec::new();

        assert!(!stage.can_submit());
        assert_eq!(stage.next(&mut notes).await, ImportTransition::Stay);
        assert_eq!(backend.embed_calls(), 0);
        assert!(notes.is_empty());

        stage.candidate_mut().set_from_text("not json");
        assert_eq!(stage.next(&mut notes).await, ImportTransition::Stay);
        assert_eq!(notes[0].level, Level::Error);
        assert!(notes[0].message.starts_with("Invalid JSON"));
        assert!(!stage.is_importing());

        stage.candidate_mut().set_from_text(r#"[{"orderId":"ORD-101"}]"#);
        let transition = stage.next(&mut notes).await;
        assert!(matches!(transition, ImportTransition::Query(ref o) if o.session_id.as_str() == "S9"));
        assert_eq!(notes[1], Notification::success(DEFAULT_IMPORT_MESSAGE));
        assert!(!stage.is_importing());
    }

    proptest! {
        #[test]
        fn any_prior_session_is_overwritten(prior in proptest::option::of("[A-Za-z0-9-]{1,16}"), fresh in "[A-Za-z0-9-]{1,16}") {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let backend = Arc::new(FakeBackend::embedding_session(&fresh));
            let store = Arc::new(match prior {
                Some(id) => MemorySessionStore::with_session(id.as_str()),
                None => MemorySessionStore::new(),
            });
            rt.block_on(submitter(&backend, &store).submit(&candidate(r#"{"a":1}"#))).unwrap();
            prop_assert_eq!(store.get(), Some(SessionId::new(fresh)));
            prop_assert_eq!(backend.embed_calls(), 1);
        }

        #[test]
        fn malformed_candidates_make_no_calls(text in "[a-z ]{1,24}[{}\\[]?") {
            prop_assume!(serde_json::from_str::<serde_json::Value>(&text).is_err());
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let backend = Arc::new(FakeBackend::embedding_session("S1"));
            let store = Arc::new(MemorySessionStore::new());
            let result = rt.block_on(submitter(&backend, &store).submit(&candidate(&text)));
            prop_assert!(matches!(result, Err(WorkflowError::InvalidJson(_))));
            prop_assert_eq!(backend.embed_calls(), 0);
        }
    }
}
