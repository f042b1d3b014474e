use anyhow::Context;
use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};

use super::{ContentPart, ExtractionModel, GenerationParams};

pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

fn request_body(instruction: &str, content: &[ContentPart]) -> Value {
    let parts: Vec<Value> = content
        .iter()
        .map(|part| match part {
            ContentPart::Text(text) => json!({ "text": text }),
            ContentPart::InlineImage { media_type, data } => json!({
                "inlineData": {
                    "mimeType": media_type,
                    "data": base64::engine::general_purpose::STANDARD.encode(data),
                }
            }),
        })
        .collect();

    json!({
        "systemInstruction": {
            "parts": [{ "text": instruction }],
        },
        "contents": [{
            "role": "user",
            "parts": parts,
        }],
        "generationConfig": GenerationParams::EXTRACTION,
    })
}

fn decode_response(status: reqwest::StatusCode, body: &str) -> anyhow::Result<String> {
    if !status.is_success() {
        anyhow::bail!("Gemini API error ({}): {}", status, body.trim());
    }

    let data: Value = serde_json::from_str(body).context("failed to parse Gemini response")?;
    response_text(&data)
}

fn response_text(data: &Value) -> anyhow::Result<String> {
    if let Some(reason) = data["promptFeedback"]["blockReason"].as_str() {
        anyhow::bail!("Gemini blocked the request: {reason}");
    }

    let text = data["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(text)
}

#[async_trait]
impl ExtractionModel for GeminiProvider {
    async fn extract(&self, instruction: &str, content: &[ContentPart]) -> anyhow::Result<String> {
        let body = request_body(instruction, content);

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call Gemini API")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("failed to read Gemini response")?;

        decode_response(status, &body)
    }
}
