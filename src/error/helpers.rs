//! Helpers that turn raw Gemini failures into [`AssistError`] values.

use serde::Deserialize;

use super::types::AssistError;

/// Message shown when the remote service rejects the configured key.
pub const INVALID_API_KEY_MESSAGE: &str =
    "Invalid or unauthorized Gemini API key. Please check your key and permissions.";

const INVALID_KEY_MARKERS: &[&str] = &["api key not valid", "api key is not valid", "invalid api key"];

/// Gemini error envelope: `{ "error": { "code", "message", "status" } }`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Whether a vendor message says the API key was rejected.
pub fn is_invalid_key_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    INVALID_KEY_MARKERS.iter().any(|m| lower.contains(m))
}

/// Classify a non-success HTTP response.
///
/// `body` is the raw response text; it is parsed as a Gemini error envelope when
/// possible and otherwise used verbatim.
pub fn classify_api_failure(status: u16, body: &str) -> AssistError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let envelope = parsed
        .as_ref()
        .and_then(|v| serde_json::from_value::<ErrorEnvelope>(v.clone()).ok());

    let message = match &envelope {
        Some(ErrorEnvelope {
            error: ErrorBody {
                message: Some(m), ..
            },
        }) => m.clone(),
        Some(ErrorEnvelope {
            error: ErrorBody {
                status: Some(s), ..
            },
        }) => s.clone(),
        _ if body.trim().is_empty() => format!("HTTP {status}"),
        _ => body.trim().to_string(),
    };

    if is_invalid_key_message(&message) || status == 401 {
        return AssistError::AuthenticationError(INVALID_API_KEY_MESSAGE.to_string());
    }

    match parsed {
        Some(details) => AssistError::api_error_with_details(status, message, details),
        None => AssistError::api_error(status, message),
    }
}
