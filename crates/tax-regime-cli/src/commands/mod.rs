pub mod compare;
pub mod lookup;
pub mod regimes;

use serde_json::Value;

use crate::input;

/// Request document from `--input`, else from piped stdin.
pub(crate) fn read_payload(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(Some(input::file::read_document_value(path)?)),
        None => input::stdin::read_stdin(),
    }
}
