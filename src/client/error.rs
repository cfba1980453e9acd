//! Errors surfaced by the request dispatcher

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when calling the backend
///
/// The error is `Clone` so that every caller sharing a coalesced request
/// receives the same failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status
    #[error("API Error: {status} {status_text} - {detail}")]
    Http {
        status: u16,
        status_text: String,
        detail: String,
    },

    /// The call was cancelled by the caller or hit its timeout
    #[error("Request to {endpoint} was aborted")]
    Aborted { endpoint: String },

    /// The request could not be sent or the response could not be read
    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The response body was not valid JSON
    #[error("Failed to parse JSON response: {0}")]
    Decode(String),

    /// The request body could not be serialized
    #[error("Failed to serialize request body: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Whether this error came from cancellation or a timeout
    pub fn is_abort(&self) -> bool {
        matches!(self, ApiError::Aborted { .. })
    }

    pub(crate) fn aborted(endpoint: &str) -> Self {
        ApiError::Aborted {
            endpoint: endpoint.to_string(),
        }
    }

    /// Builds the error for a non-success response from its raw body.
    ///
    /// A JSON body contributes its `detail` field, else its `message` field,
    /// else the whole object, serialized back to JSON. A body that doesn't
    /// parse is used verbatim.
    pub fn from_status(status: u16, status_text: &str, body: &str) -> Self {
        let detail = match serde_json::from_str::<Value>(body) {
            Ok(json) => {
                let picked = [json.get("detail"), json.get("message")]
                    .into_iter()
                    .flatten()
                    .find(|v| is_truthy(v))
                    .unwrap_or(&json);
                serde_json::to_string(picked).unwrap_or_else(|_| body.to_string())
            }
            Err(_) => body.to_string(),
        };

        ApiError::Http {
            status,
            status_text: status_text.to_string(),
            detail,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_field_is_preferred() {
        let err = ApiError::from_status(
            404,
            "Not Found",
            r#"{"detail":"Product not found","message":"ignored"}"#,
        );
        assert_eq!(
            err.to_string(),
            r#"API Error: 404 Not Found - "Product not found""#
        );
    }

    #[test]
    fn test_message_field_used_without_detail() {
        let err = ApiError::from_status(500, "Internal Server Error", r#"{"message":"boom"}"#);
        assert_eq!(
            err.to_string(),
            r#"API Error: 500 Internal Server Error - "boom""#
        );
    }

    #[test]
    fn test_empty_detail_falls_through_to_message() {
        let err = ApiError::from_status(400, "Bad Request", r#"{"detail":"","message":"bad"}"#);
        assert!(err.to_string().ends_with(r#"- "bad""#));
    }

    #[test]
    fn test_whole_object_used_without_known_fields() {
        let err = ApiError::from_status(422, "Unprocessable Entity", r#"{"error":"x"}"#);
        assert_eq!(
            err.to_string(),
            r#"API Error: 422 Unprocessable Entity - {"error":"x"}"#
        );
    }

    #[test]
    fn test_structured_detail_is_serialized() {
        let err = ApiError::from_status(
            422,
            "Unprocessable Entity",
            r#"{"detail":[{"loc":["body","messages"],"msg":"field required"}]}"#,
        );
        assert!(err.to_string().contains(r#"[{"loc":["body","messages"],"msg":"field required"}]"#));
    }

    #[test]
    fn test_raw_text_used_when_not_json() {
        let err = ApiError::from_status(502, "Bad Gateway", "upstream exploded");
        assert_eq!(
            err.to_string(),
            "API Error: 502 Bad Gateway - upstream exploded"
        );
    }

    #[test]
    fn test_is_abort() {
        assert!(ApiError::aborted("/chat").is_abort());
        assert!(!ApiError::Transport("refused".into()).is_abort());
        assert_eq!(
            ApiError::aborted("/chat").to_string(),
            "Request to /chat was aborted"
        );
    }
}
