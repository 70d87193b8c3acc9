//! The import-and-query workflow.
//!
//! Data moves through the stages in one direction:
//! [`acquisition`] -> [`import`] -> [`session`] -> [`query`] -> [`presenter`],
//! with [`voice`] feeding the query text alongside typed input. The two
//! stage models ([`ImportStage`], [`QueryStage`]) own the in-flight flags and
//! turn every failure into a [`Notification`], so callers never see a
//! permanently busy stage.

pub mod acquisition;
pub mod error;
pub mod flight;
pub mod import;
pub mod notify;
pub mod presenter;
pub mod query;
mod render;
pub mod session;
pub mod voice;

pub use acquisition::{CandidateDocument, PLACEHOLDER_DOCUMENT};
pub use error::WorkflowError;
pub use flight::{FlightGuard, InFlight, Operation};
pub use import::{ImportOutcome, ImportStage, ImportSubmitter, ImportTransition};
pub use notify::{Level, Notification, Notifier};
pub use presenter::{Clipboard, ResultPresenter, NO_SUMMARY, NOT_SEARCHED, SEARCH_RESULTS_FILE};
pub use query::{QueryStage, QuerySubmitter, SearchOutcome};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use voice::{Capture, CaptureFeed, CommandRecognizer, SpeechEvent, SpeechRecognizer, VoiceInput};

#[cfg(test)]
pub(crate) mod testing;
