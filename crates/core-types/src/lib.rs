//! Core identifiers and shared lightweight types for VectorVista.
//!
//! These types carry no HTTP or storage dependencies and are shared by the
//! wire models, the workflow stages and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// A matched record as returned by the backend. The client never looks
/// inside it; records are only displayed and re-serialized.
pub type Record = serde_json::Value;

/// Opaque token scoping an imported dataset on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Maximum number of matches requested from the search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Limit(NonZeroU32);

impl Limit {
    pub const DEFAULT: Limit = match NonZeroU32::new(5) {
        Some(n) => Limit(n),
        None => Limit(NonZeroU32::MIN),
    };

    /// Build a limit from raw user input, clamping anything below 1 up to 1.
    pub fn clamped(raw: i64) -> Self {
        let value = raw.clamp(1, i64::from(u32::MAX)) as u32;
        // value >= 1 after clamping
        Self(NonZeroU32::new(value).unwrap_or(NonZeroU32::MIN))
    }

    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A natural-language query with its result-count limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub limit: Limit,
}

impl Query {
    pub fn new(text: impl Into<String>, limit: Limit) -> Self {
        Self {
            text: text.into(),
            limit,
        }
    }

    /// Queries are only sent when they contain something besides whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Summary plus matched records returned by one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    pub results: Vec<Record>,
    pub summary: String,
}

impl SearchResultSet {
    pub fn match_count(&self) -> usize {
        self.results.len()
    }
}

/// State of the voice capture gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Listening,
}

pub mod config;
