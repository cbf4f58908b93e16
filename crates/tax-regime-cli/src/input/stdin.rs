use serde_json::Value;
use std::io::{self, Read};

use super::file::parse_document;

/// Piped entity or request document (JSON or YAML).
///
/// `None` when stdin is a terminal or carries only whitespace, so commands
/// can fall back to their flags.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        return Ok(None);
    }

    parse_document(&buffer, None)
        .map(Some)
        .map_err(|e| format!("Failed to parse stdin: {e}").into())
}
