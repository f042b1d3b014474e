use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CLARIFICATION_MESSAGE: &str = "Ambiguous date/time or department";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ClarificationStatus {
    #[serde(rename = "needs clarification")]
    NeedsClarification,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clarification {
    pub status: ClarificationStatus,
    pub message: String,
    pub raw_text: String,
}

impl Clarification {
    pub fn new(message: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            status: ClarificationStatus::NeedsClarification,
            message: message.into(),
            raw_text: raw_text.into(),
        }
    }

    pub fn ambiguous(raw_text: impl Into<String>) -> Self {
        Self::new(CLARIFICATION_MESSAGE, raw_text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub department: String,
    pub date: String,
    pub time: String,
    pub tz: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionMetadata {
    pub raw_text: String,
    pub confidence: f64,
}

/// The success shape the model is instructed to produce.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledAppointment {
    pub appointment: Appointment,
    pub metadata: ExtractionMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultShape {
    Appointment,
    Clarification,
    Unrecognized,
}

/// Outcome of one extraction. Serializes as the bare JSON object, with no
/// wrapper or tag.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum NormalizedResult {
    /// JSON object returned by the model, passed through untouched.
    Extracted(Map<String, Value>),
    /// Fallback built locally when the model output cannot be used.
    NeedsClarification(Clarification),
}

impl NormalizedResult {
    pub fn ambiguous(raw_text: impl Into<String>) -> Self {
        NormalizedResult::NeedsClarification(Clarification::ambiguous(raw_text))
    }

    /// Classifies the result by its discriminating keys.
    pub fn shape(&self) -> ResultShape {
        match self {
            NormalizedResult::NeedsClarification(_) => ResultShape::Clarification,
            NormalizedResult::Extracted(map) => classify_object(map),
        }
    }

    pub fn is_clarification(&self) -> bool {
        self.shape() == ResultShape::Clarification
    }

    /// Typed view of the success shape, if the result carries one.
    pub fn appointment(&self) -> Option<ScheduledAppointment> {
        match self {
            NormalizedResult::Extracted(map) => {
                serde_json::from_value::<ScheduledAppointment>(Value::Object(map.clone()))
                    .ok()
                    .filter(|a| a.appointment.status == "ok")
            }
            NormalizedResult::NeedsClarification(_) => None,
        }
    }
}

pub(crate) fn classify_object(map: &Map<String, Value>) -> ResultShape {
    if map.get("appointment").is_some_and(Value::is_object) {
        return ResultShape::Appointment;
    }
    match map.get("status").and_then(Value::as_str) {
        Some("needs clarification") => ResultShape::Clarification,
        _ => ResultShape::Unrecognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_clarification_serializes_with_spaced_status() {
        let result = NormalizedResult::ambiguous("hello");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            json!({
                "status": "needs clarification",
                "message": "Ambiguous date/time or department",
                "raw_text": "hello"
            })
        );
    }

    #[test]
    fn test_extracted_serializes_verbatim() {
        let map = object(json!({"zeta": 1, "alpha": {"nested": true}}));
        let result = NormalizedResult::Extracted(map);
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"zeta":1,"alpha":{"nested":true}}"#
        );
    }

    #[test]
    fn test_shape_and_typed_appointment() {
        let result = NormalizedResult::Extracted(object(json!({
            "appointment": {
                "department": "Dentistry",
                "date": "2025-06-15",
                "time": "15:00",
                "tz": "Asia/Kolkata",
                "status": "ok"
            },
            "metadata": {"raw_text": "dentist tomorrow 3pm", "confidence": 0.9}
        })));
        assert_eq!(result.shape(), ResultShape::Appointment);
        let booked = result.appointment().unwrap();
        assert_eq!(booked.appointment.department, "Dentistry");
        assert_eq!(booked.appointment.time, "15:00");
        assert!(!result.is_clarification());
    }

    #[test]
    fn test_model_clarification_is_recognized() {
        let result = NormalizedResult::Extracted(object(json!({
            "status": "needs clarification",
            "message": "Ambiguous date/time or department",
            "raw_text": "hi"
        })));
        assert!(result.is_clarification());
        assert!(result.appointment().is_none());
    }

    #[test]
    fn test_unrecognized_object() {
        let result = NormalizedResult::Extracted(object(json!({"foo": "bar"})));
        assert_eq!(result.shape(), ResultShape::Unrecognized);
        assert!(result.appointment().is_none());
    }
}
