//! Input acquisition: inline text, file picker, drag-and-drop and stdin all
//! land in one [`CandidateDocument`].
//!
//! Nothing here parses or validates JSON; that happens on import. File-based
//! sources fail silently: an unreadable file leaves the document untouched
//! and the setter returns `false`.

use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

/// Sample content the import stage starts with. Importing it unchanged is
/// not allowed.
pub const PLACEHOLDER_DOCUMENT: &str = r#"[
  {
    "orderId": "ORD-101",
    "customer": "Rahul",
    "status": "pending",
    "amount": 5400
  },
  {
    "orderId": "ORD-102",
    "customer": "Sarah",
    "status": "completed",
    "amount": 1250
  }
]"#;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Text a user intends to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDocument {
    text: String,
    file_name: Option<String>,
    placeholder: bool,
}

impl Default for CandidateDocument {
    fn default() -> Self {
        Self {
            text: PLACEHOLDER_DOCUMENT.to_string(),
            file_name: None,
            placeholder: true,
        }
    }
}

impl CandidateDocument {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Import precondition: non-empty and changed from the placeholder.
    pub fn can_submit(&self) -> bool {
        !self.placeholder && !self.text.trim().is_empty()
    }

    /// Inline edit. Typing the placeholder back in counts as unmodified.
    pub fn set_from_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.placeholder = self.text == PLACEHOLDER_DOCUMENT;
    }

    /// File picker source.
    pub async fn set_from_file(&mut self, path: &Path) -> bool {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "could not read candidate file");
                return false;
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        self.accept_bytes(bytes, name)
    }

    /// Drag-and-drop source: only files declared as JSON are read.
    pub async fn set_from_drop(&mut self, path: &Path) -> bool {
        if !is_json_media_type(path) {
            debug!(path = %path.display(), "dropped file is not declared as JSON");
            return false;
        }
        self.set_from_file(path).await
    }

    /// Stream source (stdin for the CLI).
    pub async fn set_from_reader<R>(&mut self, mut reader: R, name: Option<&str>) -> bool
    where
        R: AsyncRead + Unpin,
    {
        let mut bytes = Vec::new();
        if let Err(err) = reader.read_to_end(&mut bytes).await {
            debug!(error = %err, "could not read candidate stream");
            return false;
        }
        self.accept_bytes(bytes, name.map(str::to_string))
    }

    fn accept_bytes(&mut self, bytes: Vec<u8>, name: Option<String>) -> bool {
        match String::from_utf8(bytes) {
            Ok(text) => {
                self.text = text;
                self.file_name = name;
                self.placeholder = false;
                true
            }
            Err(err) => {
                debug!(error = %err, "candidate content is not UTF-8 text");
                false
            }
        }
    }
}

fn is_json_media_type(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .is_some_and(|mime| mime.essence_str() == JSON_MEDIA_TYPE)
}
