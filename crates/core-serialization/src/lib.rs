//! Common serialization helpers shared across the workspace.
//!
//! Import parses candidate text with [`parse_document`]; export renders the
//! result array with [`to_pretty_json`]. Both sides go through `serde_json`
//! so what is exported parses back to the same value.

use core_types::Record;
use serde::Serialize;

/// Indentation used for every exported JSON artifact.
const INDENT: &[u8] = b"  ";

/// Parse candidate text as a JSON document.
///
/// Returns the parser's message on failure so it can be shown to the user
/// verbatim.
pub fn parse_document(text: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(text).map_err(|err| err.to_string())
}

/// Serialize a value as 2-space indented JSON.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::with_capacity(128);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render matched records exactly as they are exported.
pub fn records_to_json(records: &[Record]) -> serde_json::Result<String> {
    to_pretty_json(records)
}
