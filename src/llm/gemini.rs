use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{GenerativeModel, ModelError, ModelRequest};
use crate::config::GeminiConfig;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model_name: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
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

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model_name: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn build_request(request: ModelRequest) -> GeminiRequest {
        let mut parts = vec![Part::Text {
            text: request.prompt,
        }];
        if let Some(image) = request.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type,
                    data: general_purpose::STANDARD.encode(&image.data),
                },
            });
        }
        if let Some(context) = request.context {
            parts.push(Part::Text { text: context });
        }

        GeminiRequest {
            contents: vec![Content { parts }],
            generation_config: request.expect_json.then(|| GenerationConfig {
                response_mime_type: "application/json".to_string(),
            }),
        }
    }

    async fn call_gemini_api(&self, request: GeminiRequest) -> Result<String, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model_name
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "gemini request failed");
                ModelError::Transport(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "gemini returned an error");
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        reply_text(&body)
    }
}

/// Joins the text parts of the first candidate.
fn reply_text(body: &str) -> Result<String, ModelError> {
    let parsed: GeminiResponse =
        serde_json::from_str(body).map_err(|e| ModelError::Decode(e.to_string()))?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ModelError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: ModelRequest) -> Result<String, ModelError> {
        debug!(
            model = %self.model_name,
            has_image = request.image.is_some(),
            expect_json = request.expect_json,
            "calling gemini"
        );
        let request = Self::build_request(request);
        self.call_gemini_api(request).await
    }
}

#[cfg(test)]
mod gemini_tests {
    use super::*;
    use crate::llm::InlineImage;
    use bytes::Bytes;

    #[test]
    fn request_puts_prompt_image_then_context() {
        let req = ModelRequest::text("identify")
            .with_image(InlineImage {
                mime_type: "image/png".into(),
                data: Bytes::from_static(b"abc"),
            })
            .with_context("menu says pad thai")
            .json();

        let json = serde_json::to_value(GeminiClient::build_request(req)).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "identify");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "YWJj");
        assert_eq!(parts[2]["text"], "menu says pad thai");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn plain_text_request_has_no_generation_config() {
        let json = serde_json::to_value(GeminiClient::build_request(ModelRequest::text("hi")))
            .unwrap();
        assert!(json.get("generationConfig").is_none());
        assert_eq!(json["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn reply_text_joins_parts_of_first_candidate() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}},
                       {"content":{"parts":[{"text":"ignored"}]}}]}"#;
        assert_eq!(reply_text(body).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn reply_text_without_candidates_is_empty_response() {
        assert!(matches!(
            reply_text(r#"{"candidates":[]}"#),
            Err(ModelError::EmptyResponse)
        ));
        assert!(matches!(
            reply_text(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#),
            Err(ModelError::EmptyResponse)
        ));
    }

    #[test]
    fn reply_text_rejects_garbage() {
        assert!(matches!(reply_text("<html>"), Err(ModelError::Decode(_))));
    }
}
