//! Hosted generative-endpoint client.
//!
//! Speaks the `generateContent` REST shape: prompt parts (text plus optional
//! inline media) in, candidates out, with a response schema forcing JSON
//! output. The API key travels in a default header.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::config::GenAiConfig;

use super::error::{ApiErrorResponse, GenAiError};
use super::{GenerateRequest, Generator};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Generative endpoint client.
#[derive(Clone)]
pub struct GenAiClient {
    inner: Arc<GenAiClientInner>,
}

struct GenAiClientInner {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GenAiClient {
    /// Create a new client.
    ///
    /// # Panics
    ///
    /// Panics if the API key contains invalid header characters.
    #[must_use]
    pub fn new(config: &GenAiConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(config.api_key.expose_secret())
                .expect("Invalid API key for header"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(GenAiClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_owned(),
                model: config.model.clone(),
            }),
        }
    }

}

/// Extract the first candidate's text, or map the failure.
async fn handle_response(response: reqwest::Response) -> Result<String, GenAiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map_or_else(|_| body.chars().take(200).collect(), |e| e.error.message);
        return Err(GenAiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: GenerateContentResponse =
        serde_json::from_str(&body).map_err(|e| GenAiError::Parse(e.to_string()))?;

    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or(GenAiError::MissingOutput)
}

#[async_trait]
impl Generator for GenAiClient {
    #[instrument(skip(self, request), fields(model = %self.inner.model))]
    async fn generate(&self, request: GenerateRequest) -> Result<Value, GenAiError> {
        let mut parts = vec![Part::text(request.prompt)];
        if let Some(media) = request.media {
            parts.push(Part::inline_data(&media)?);
        }

        let structured = request.response_schema.is_some();
        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: request.response_schema.map(|schema| GenerationConfig {
                response_mime_type: "application/json".to_owned(),
                response_schema: schema,
            }),
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.inner.base_url, self.inner.model
        );
        let response = self.inner.client.post(&url).json(&body).send().await?;
        let text = handle_response(response).await?;

        if structured {
            serde_json::from_str(&text).map_err(|e| GenAiError::Parse(e.to_string()))
        } else {
            Ok(serde_json::json!({ "text": text }))
        }
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    fn text(text: String) -> Self {
        Self::Text { text }
    }

    /// Split a `data:<mime>;base64,<data>` URI into its wire form.
    fn inline_data(data_uri: &str) -> Result<Self, GenAiError> {
        let rest = data_uri
            .strip_prefix("data:")
            .ok_or_else(|| GenAiError::Parse(format!("not a data URI: {data_uri:.32}")))?;
        let (mime_type, data) = rest
            .split_once(";base64,")
            .ok_or_else(|| GenAiError::Parse("data URI is not base64-encoded".to_owned()))?;
        Ok(Self::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.to_owned(),
                data: data.to_owned(),
            },
        })
    }
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_data_parses_data_uri() {
        let part = Part::inline_data("data:image/png;base64,aGVsbG8=").expect("parse");
        let json = serde_json::to_value(&part).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "inlineData": {"mimeType": "image/png", "data": "aGVsbG8="}
            })
        );
    }

    #[test]
    fn test_inline_data_rejects_plain_text() {
        assert!(Part::inline_data("https://example.com/a.png").is_err());
        assert!(Part::inline_data("data:image/png,raw").is_err());
    }

    #[test]
    fn test_response_text_extraction() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "{\"title\": \"Clay pot\"}"}]}}
            ]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).expect("deserialize");
        assert_eq!(
            parsed.candidates[0].content.parts[0].text,
            "{\"title\": \"Clay pot\"}"
        );
    }
}
