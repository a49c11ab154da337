//! Gemini `generateContent` client

use super::{GenerationParams, GenerativeBackend};
use crate::config::{BackendConfig, Secret};
use crate::error::BackendError;
use crate::redact::Redactor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use synapse_manifest::preview;

/// Longest error body kept in a `BackendError::Status`
const MAX_ERROR_BODY: usize = 500;

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// HTTP backend for Gemini models
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    url: String,
    api_key: Secret,
    timeout_secs: u64,
    redactor: Redactor,
}

impl GeminiBackend {
    /// Create backend from configuration
    ///
    /// # Errors
    /// - `BackendError::NotConfigured` if no API key is set
    /// - `BackendError::Unavailable` if the HTTP client cannot be built
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_blank())
            .ok_or_else(|| BackendError::NotConfigured("GEMINI_API_KEY is not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let url = format!(
            "{}/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );
        let redactor = Redactor::new().with_secret(api_key.expose());

        Ok(Self {
            client,
            url,
            api_key,
            timeout_secs: config.timeout_secs,
            redactor,
        })
    }

    fn request_body<'a>(prompt: &'a str, params: &GenerationParams) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                top_p: params.top_p,
                max_output_tokens: params.max_output_tokens,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                })
                .collect(),
        }
    }

    fn transport_error(&self, err: &reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            BackendError::Unavailable(self.redactor.redact(&err.to_string()))
        }
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        tracing::debug!(
            url = %self.url,
            prompt_chars = prompt.chars().count(),
            max_output_tokens = params.max_output_tokens,
            "Calling Gemini"
        );

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&Self::request_body(prompt, params))
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            let body = self.redactor.redact(preview(&body, MAX_ERROR_BODY));
            tracing::error!(status = status.as_u16(), "Gemini request failed");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        let text = parsed.into_text().ok_or_else(|| {
            BackendError::MalformedResponse("missing candidates[0].content.parts[0].text".into())
        })?;

        tracing::info!(response_chars = text.chars().count(), "Received Gemini response");
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let body = GeminiBackend::request_body("hello", &GenerationParams::project());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(json["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(
            json["safetySettings"][0]["threshold"],
            "BLOCK_MEDIUM_AND_ABOVE"
        );
    }

    #[test]
    fn response_text_path() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"out"}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("out"));

        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(blocked.into_text().is_none());

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.into_text().is_none());
    }

    #[test]
    fn missing_key_is_not_configured() {
        let result = GeminiBackend::new(&BackendConfig::default());
        assert!(matches!(result, Err(BackendError::NotConfigured(_))));
    }

    #[test]
    fn url_joins_endpoint_and_model() {
        let backend = GeminiBackend::new(
            &BackendConfig::default()
                .with_endpoint("http://localhost:9000/v1/")
                .with_api_key("key-1234"),
        )
        .unwrap();
        assert_eq!(
            backend.url,
            "http://localhost:9000/v1/models/gemini-1.5-flash:generateContent"
        );
    }
}
