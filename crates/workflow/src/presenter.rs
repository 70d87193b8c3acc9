//! Result presentation: summary rendering, match badge and JSON export.
//!
//! Everything here is a pure function of the fetched [`SearchResultSet`];
//! exporting twice produces the same bytes.

use crate::error::WorkflowError;
use crate::notify::{Notification, Notifier};
use crate::render::render_markdown;
use core_serialization::records_to_json;
use core_types::SearchResultSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name used by [`ResultPresenter::download_as_file`].
pub const SEARCH_RESULTS_FILE: &str = "search-results.json";
/// Shown in place of an empty summary.
pub const NO_SUMMARY: &str = "No summary available for this query.";
/// Shown before the first successful search.
pub const NOT_SEARCHED: &str = "Submit a query to view semantic results.";

/// Destination for copied text.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), WorkflowError>;
}

#[derive(Debug, Clone, Copy)]
pub struct ResultPresenter<'a> {
    results: &'a SearchResultSet,
}

impl<'a> ResultPresenter<'a> {
    pub fn new(results: &'a SearchResultSet) -> Self {
        Self { results }
    }

    /// Raw summary text, or [`NO_SUMMARY`] when the service sent none.
    pub fn summary_text(&self) -> &'a str {
        if self.results.summary.trim().is_empty() {
            NO_SUMMARY
        } else {
            &self.results.summary
        }
    }

    /// Summary rendered as styled terminal text.
    pub fn render_summary(&self) -> String {
        render_markdown(self.summary_text())
    }

    pub fn match_count(&self) -> usize {
        self.results.match_count()
    }

    pub fn match_badge(&self) -> String {
        format!("{} Matches Found", self.match_count())
    }

    /// Matched records as 2-space indented JSON.
    pub fn export_json(&self) -> Result<String, WorkflowError> {
        Ok(records_to_json(&self.results.results)?)
    }

    pub fn copy_to_clipboard(
        &self,
        clipboard: &mut impl Clipboard,
        notifier: &mut impl Notifier,
    ) -> Result<(), WorkflowError> {
        let outcome = self
            .export_json()
            .and_then(|json| clipboard.write_text(&json));
        match &outcome {
            Ok(()) => notifier.notify(Notification::success("Copied to clipboard")),
            Err(err) => notifier.notify(Notification::error(format!("Copy failed: {err}"))),
        }
        outcome
    }

    /// Write the export to `dir/search-results.json`, replacing any earlier
    /// export there.
    pub fn download_as_file(
        &self,
        dir: &Path,
        notifier: &mut impl Notifier,
    ) -> Result<PathBuf, WorkflowError> {
        let path = dir.join(SEARCH_RESULTS_FILE);
        let outcome = self.export_json().and_then(|json| {
            std::fs::create_dir_all(dir)?;
            std::fs::write(&path, json)?;
            Ok(())
        });
        match outcome {
            Ok(()) => {
                info!(path = %path.display(), matches = self.match_count(), "exported results");
                notifier.notify(Notification::success("Exported JSON"));
                Ok(path)
            }
            Err(err) => {
                notifier.notify(Notification::error(format!("Export failed: {err}")));
                Err(err)
            }
        }
    }
}
