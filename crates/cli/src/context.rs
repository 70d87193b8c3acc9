//! Wiring from configuration to the workflow stages.

use api::HttpClient;
use core_types::config::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use workflow::{
    FileSessionStore, ImportStage, ImportSubmitter, QueryStage, QuerySubmitter, SessionStore,
    VoiceInput,
};

use crate::clipboard::SystemClipboard;

/// Shared handles for one CLI invocation. Both stages read the same session
/// file, so a session bound by `import` is picked up by a later `search`.
pub struct AppContext {
    pub config: AppConfig,
    pub backend: Arc<HttpClient>,
    pub sessions: Arc<FileSessionStore>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Self {
        let mut client = HttpClient::new(config.server.url.clone());
        if let Some(secs) = config.server.request_timeout_secs {
            client = client.with_request_timeout(Duration::from_secs(secs));
        }
        let sessions = Arc::new(FileSessionStore::new(config.session_file()));
        Self {
            config,
            backend: Arc::new(client),
            sessions,
        }
    }

    fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.sessions) as Arc<dyn SessionStore>
    }

    pub fn import_stage(&self) -> ImportStage<HttpClient> {
        ImportStage::new(ImportSubmitter::new(Arc::clone(&self.backend), self.store()))
    }

    /// Query stage seeded with the configured default limit and voice input.
    pub fn query_stage(&self) -> QueryStage<HttpClient> {
        let mut stage = QueryStage::new(
            QuerySubmitter::new(Arc::clone(&self.backend), self.store()),
            VoiceInput::from_config(&self.config.voice),
        );
        stage.set_limit(self.config.default_limit());
        stage
    }

    pub fn clipboard(&self) -> SystemClipboard {
        SystemClipboard::from_config(&self.config.clipboard)
    }
}
