use serde::Deserialize;

pub const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/png";

#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub media_type: Option<String>,
}

impl ImageInput {
    pub fn media_type(&self) -> &str {
        self.media_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_IMAGE_MEDIA_TYPE)
    }
}

/// One user request. Text is stored trimmed and only when non-empty.
#[derive(Debug, Clone, Default)]
pub struct InputRequest {
    pub text: Option<String>,
    pub image: Option<ImageInput>,
}

impl InputRequest {
    pub fn new(text: Option<&str>, image: Option<ImageInput>) -> Self {
        let text = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Self { text, image }
    }

    pub fn text(text: &str) -> Self {
        Self::new(Some(text), None)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image.is_none()
    }

    /// Text echoed back in clarification results.
    pub fn raw_text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Body of a JSON or form-encoded schedule request.
#[derive(Debug, Deserialize)]
pub struct SchedulePayload {
    #[serde(default)]
    pub text: Option<String>,
}
