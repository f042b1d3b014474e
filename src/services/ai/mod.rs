pub mod gemini;

use async_trait::async_trait;
use serde::Serialize;

/// One segment of the user content sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    InlineImage { media_type: String, data: Vec<u8> },
}

/// Sampling settings for extraction calls. Kept low-temperature and bounded
/// so repeated calls behave alike.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_output_tokens: u32,
    pub response_mime_type: &'static str,
}

impl GenerationParams {
    pub const EXTRACTION: GenerationParams = GenerationParams {
        temperature: 0.2,
        top_p: 0.95,
        max_output_tokens: 1024,
        response_mime_type: "application/json",
    };
}

/// The external extraction capability: instruction plus user content in,
/// raw model text out.
#[async_trait]
pub trait ExtractionModel: Send + Sync {
    async fn extract(&self, instruction: &str, content: &[ContentPart]) -> anyhow::Result<String>;
}
