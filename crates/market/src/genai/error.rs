//! Error types for the generative-endpoint client.

use thiserror::Error;

use artvaani_core::MarketError;

/// Errors that can occur when calling the generative endpoint.
#[derive(Debug, Error)]
pub enum GenAiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The response carried no candidate output.
    #[error("model returned no output")]
    MissingOutput,

    /// The output did not parse as the declared shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<GenAiError> for MarketError {
    fn from(err: GenAiError) -> Self {
        Self::RemoteFailure(err.to_string())
    }
}

/// Error response body from the endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genai_error_display() {
        let err = GenAiError::Api {
            status: 429,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (429): quota exceeded");
        assert_eq!(GenAiError::MissingOutput.to_string(), "model returned no output");
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{
            "error": {
                "code": 403,
                "message": "Generative Language API has not been used in this project"
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(response.error.code, 403);
        assert!(response.error.message.contains("Generative Language API"));
    }
}
