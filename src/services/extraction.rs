use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::errors::ExtractionError;
use crate::models::{InputRequest, NormalizedResult, ResultShape};
use crate::services::ai::gemini::GeminiProvider;
use crate::services::ai::{ContentPart, ExtractionModel};
use crate::services::clock::{Clock, SystemClock};
use crate::services::prompt;

const IMAGE_MARKER: &str = "Input image contains the appointment request.";

#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Runs one request through the model and always hands back a usable result
/// or a distinct configuration/service error.
pub struct Extractor {
    settings: ExtractionSettings,
    model: Arc<dyn ExtractionModel>,
    clock: Arc<dyn Clock>,
}

impl Extractor {
    pub fn new(settings: ExtractionSettings, model: Arc<dyn ExtractionModel>) -> Self {
        Self {
            settings,
            model,
            clock: Arc::new(SystemClock),
        }
    }

    /// Coordinator backed by the Gemini API described by `settings`.
    pub fn gemini(settings: ExtractionSettings) -> Self {
        let provider = GeminiProvider::new(
            settings.api_key.clone().unwrap_or_default(),
            settings.model.clone(),
            settings.base_url.clone(),
        );
        Self::new(settings, Arc::new(provider))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.settings
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    pub async fn process(&self, input: &InputRequest) -> Result<NormalizedResult, ExtractionError> {
        self.process_with_timeout(input, self.settings.timeout).await
    }

    pub async fn process_with_timeout(
        &self,
        input: &InputRequest,
        timeout: Duration,
    ) -> Result<NormalizedResult, ExtractionError> {
        if !self.has_credential() {
            return Err(ExtractionError::Configuration(
                "GEMINI_API_KEY is not configured".to_string(),
            ));
        }

        let now = self.clock.now();
        let instruction = prompt::compose_instruction(now);
        let content = build_content(input);

        tracing::debug!(
            parts = content.len(),
            has_image = input.image.is_some(),
            now = %prompt::kolkata_timestamp(now),
            "calling extraction model"
        );

        let raw = match tokio::time::timeout(timeout, self.model.extract(&instruction, &content)).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(ExtractionError::ExternalService(format!("{e:#}"))),
            Err(_) => {
                return Err(ExtractionError::ExternalService(format!(
                    "no response within {}ms",
                    timeout.as_millis()
                )))
            }
        };

        Ok(interpret_model_output(&raw, input.raw_text()))
    }
}

/// User content for the model: the labelled text first, then the image
/// marker and the image itself.
pub fn build_content(input: &InputRequest) -> Vec<ContentPart> {
    let mut parts = Vec::new();

    if let Some(text) = &input.text {
        parts.push(ContentPart::Text(format!("Input text: {text}")));
    }

    if let Some(image) = &input.image {
        parts.push(ContentPart::Text(IMAGE_MARKER.to_string()));
        parts.push(ContentPart::InlineImage {
            media_type: image.media_type().to_string(),
            data: image.bytes.clone(),
        });
    }

    parts
}

/// Strips surrounding whitespace and a leading/trailing code fence, with or
/// without a `json` tag.
pub fn sanitize_model_output(raw: &str) -> &str {
    let mut text = raw.trim();

    match text.get(..7) {
        Some(head) if head.eq_ignore_ascii_case("```json") => text = text[7..].trim_start(),
        _ => {
            if let Some(rest) = text.strip_prefix("```") {
                text = rest;
            }
        }
    }

    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Turns raw model text into a result. Anything other than a JSON object
/// becomes the clarification fallback echoing `raw_text`.
pub fn interpret_model_output(raw: &str, raw_text: &str) -> NormalizedResult {
    let cleaned = sanitize_model_output(raw);
    if cleaned.is_empty() {
        tracing::warn!("extraction model returned no content, asking for clarification");
        return NormalizedResult::ambiguous(raw_text);
    }

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => {
            let result = NormalizedResult::Extracted(map);
            if result.shape() == ResultShape::Unrecognized {
                tracing::warn!("model output matches neither response shape, passing through");
            }
            result
        }
        Ok(_) => {
            tracing::warn!("model output is JSON but not an object, asking for clarification");
            NormalizedResult::ambiguous(raw_text)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse model output as JSON, asking for clarification");
            NormalizedResult::ambiguous(raw_text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageInput, CLARIFICATION_MESSAGE};

    const OBJECT: &str = r#"{"status":"needs clarification","message":"x","raw_text":"y"}"#;

    #[test]
    fn test_sanitize_plain() {
        assert_eq!(sanitize_model_output(&format!("  {OBJECT}\n")), OBJECT);
    }

    #[test]
    fn test_sanitize_fence_variants() {
        let cases = [
            format!("```json\n{OBJECT}\n```"),
            format!("```JSON {OBJECT}```"),
            format!("```\n{OBJECT}\n```"),
            format!("```json\n{OBJECT}"),
            format!("```{OBJECT}"),
            format!("{OBJECT}\n```"),
            format!("\n\n```json\n{OBJECT}\n```\n"),
        ];
        for case in &cases {
            assert_eq!(sanitize_model_output(case), OBJECT, "case: {case:?}");
        }
    }

    #[test]
    fn test_sanitize_bare_fence_is_empty() {
        assert_eq!(sanitize_model_output("```"), "");
        assert_eq!(sanitize_model_output("```json\n```"), "");
        assert_eq!(sanitize_model_output("   "), "");
    }

    #[test]
    fn test_fenced_and_plain_parse_alike() {
        let plain = interpret_model_output(OBJECT, "t");
        let fenced = interpret_model_output(&format!("```json\n{OBJECT}\n```"), "t");
        assert_eq!(plain, fenced);
    }

    #[test]
    fn test_empty_output_falls_back() {
        let result = interpret_model_output("", "hello");
        match result {
            NormalizedResult::NeedsClarification(c) => {
                assert_eq!(c.message, CLARIFICATION_MESSAGE);
                assert_eq!(c.raw_text, "hello");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let result = interpret_model_output("{\"appointment\": ", "");
        assert_eq!(result, NormalizedResult::ambiguous(""));

        let result = interpret_model_output("Sure! Here is your appointment.", "book it");
        assert_eq!(result, NormalizedResult::ambiguous("book it"));
    }

    #[test]
    fn test_non_object_json_falls_back() {
        for raw in ["[1,2]", "\"text\"", "42", "null", "true"] {
            assert_eq!(
                interpret_model_output(raw, "x"),
                NormalizedResult::ambiguous("x"),
                "raw: {raw}"
            );
        }
    }

    #[test]
    fn test_any_object_passes_through() {
        let raw = r#"{"unexpected":"keys","n":3}"#;
        let result = interpret_model_output(raw, "x");
        assert_eq!(serde_json::to_string(&result).unwrap(), raw);
    }

    #[test]
    fn test_content_text_only() {
        let parts = build_content(&InputRequest::text("dentist at 3pm"));
        assert_eq!(parts, vec![ContentPart::Text("Input text: dentist at 3pm".to_string())]);
    }

    #[test]
    fn test_content_text_then_image() {
        let input = InputRequest::new(
            Some("see image"),
            Some(ImageInput {
                bytes: vec![9, 9],
                media_type: None,
            }),
        );
        let parts = build_content(&input);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], ContentPart::Text("Input text: see image".to_string()));
        assert_eq!(parts[1], ContentPart::Text(IMAGE_MARKER.to_string()));
        assert_eq!(
            parts[2],
            ContentPart::InlineImage {
                media_type: "image/png".to_string(),
                data: vec![9, 9],
            }
        );
    }
}
