//! Gemini `generateContent` client for receipts and dictation.

use crate::{
    config::recognition::RecognitionSettings,
    core::receipt::{DictatedItem, RecognizedReceipt},
    errors::{Error, Result},
    recognition::{ListTranscriber, ReceiptRecognizer, decode},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

const RECEIPT_PROMPT: &str = "Lee este ticket de supermercado. Devuelve solo JSON con la forma \
{\"store\": \"nombre del supermercado o null\", \"items\": [{\"name\": \"producto\", \"price\": 1.23}]}. \
Usa el precio final de cada línea como número con punto decimal. No incluyas totales, \
subtotales, IVA ni formas de pago.";

const DICTATION_PROMPT: &str = "Convierte este texto dictado en una lista de la compra. Devuelve \
solo JSON con la forma {\"items\": [{\"name\": \"producto\", \"quantity\": 1}]}. Si no se dice \
una cantidad usa 1. Texto: ";

/// Longest upstream body echoed into an error message.
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
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
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Maps a non-success HTTP status to an error kind.
///
/// Gemini reports a bad key as `400` with an "API key not valid" message, so
/// that case counts as a credential failure too.
fn status_error(status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::InvalidCredentials,
        StatusCode::BAD_REQUEST if body.contains("API key not valid") => Error::InvalidCredentials,
        _ => Error::Upstream {
            message: format!(
                "{status}: {}",
                body.chars().take(MAX_ERROR_BODY).collect::<String>()
            ),
        },
    }
}

/// Concatenated text of the first candidate.
fn response_text(response: GenerateResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::NoDetection);
    }
    Ok(text)
}

/// HTTP client for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    settings: RecognitionSettings,
}

impl GeminiClient {
    /// Creates a client with its own connection pool.
    #[must_use]
    pub fn new(settings: RecognitionSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    /// The configured model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url, self.settings.model
        )
    }

    #[instrument(skip(self, parts), fields(model = %self.settings.model))]
    async fn generate(&self, parts: Vec<Part>) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.0,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Recognition request failed with {}", status);
            return Err(status_error(status, &body));
        }

        let reply: GenerateResponse = response.json().await?;
        let text = response_text(reply)?;
        debug!("Recognition returned {} characters", text.len());
        Ok(text)
    }
}

impl ReceiptRecognizer for GeminiClient {
    async fn recognize_receipt(&self, image: &[u8], mime_type: &str) -> Result<RecognizedReceipt> {
        let parts = vec![
            Part::Text {
                text: RECEIPT_PROMPT.to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.to_string(),
                    data: STANDARD.encode(image),
                },
            },
        ];
        let text = self.generate(parts).await?;
        decode::decode_receipt(&text)
    }
}

impl ListTranscriber for GeminiClient {
    async fn transcribe_list(&self, text: &str) -> Result<Vec<DictatedItem>> {
        let parts = vec![Part::Text {
            text: format!("{DICTATION_PROMPT}{text}"),
        }];
        let answer = self.generate(parts).await?;
        decode::decode_dictation(&answer)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn settings() -> RecognitionSettings {
        RecognitionSettings {
            api_key: "test-key".to_string(),
            model: "gemini-test".to_string(),
            base_url: "http://localhost:9".to_string(),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            Error::RateLimited
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, ""),
            Error::InvalidCredentials
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "API key not valid. Please pass a valid API key."),
            Error::InvalidCredentials
        ));
        match status_error(StatusCode::INTERNAL_SERVER_ERROR, &"x".repeat(500)) {
            Error::Upstream { message } => {
                assert!(message.starts_with("500"));
                assert!(message.len() < 300);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_response_text() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "{\"items\":"}, {"text": "[]}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(response).unwrap(), "{\"items\":[]}");

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(response_text(empty), Err(Error::NoDetection)));

        let blocked: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(response_text(blocked), Err(Error::NoDetection)));
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: "hola".to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".to_string(),
                            data: STANDARD.encode(b"png"),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.0,
            },
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "hola");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["data"], "cG5n");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(settings());
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/models/gemini-test:generateContent"
        );
        assert_eq!(client.model(), "gemini-test");
    }
}
