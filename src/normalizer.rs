use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};

/// Parameter payload after lenient JSON parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedParams {
    /// Body parsed as JSON
    Parsed(Value),
    /// Body that was not valid JSON, kept verbatim
    Raw(String),
}

impl ParsedParams {
    /// Parameter object for an operation call.
    ///
    /// A JSON `null` or a blank body counts as "no parameters", matching how
    /// the SDK treats a missing params argument.
    pub fn into_object(self) -> Result<Map<String, Value>> {
        match self {
            ParsedParams::Parsed(Value::Object(map)) => Ok(map),
            ParsedParams::Parsed(Value::Null) => Ok(Map::new()),
            ParsedParams::Raw(raw) if raw.trim().is_empty() => Ok(Map::new()),
            _ => Err(Error::InvalidParameters(
                "Expected params to be a structure".to_string(),
            )),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, ParsedParams::Raw(_))
    }
}

/// Parse a raw body as JSON, falling back to the raw string.
pub fn parse(raw: &str) -> ParsedParams {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => ParsedParams::Parsed(value),
        Err(e) => {
            if !raw.trim().is_empty() {
                warn!(error = %e, "request body is not valid JSON, passing it through as a string");
            }
            ParsedParams::Raw(raw.to_string())
        }
    }
}
