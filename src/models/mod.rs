pub mod request;
pub mod result;

pub use request::{ImageInput, InputRequest, SchedulePayload, DEFAULT_IMAGE_MEDIA_TYPE};
pub use result::{
    Appointment, Clarification, ExtractionMetadata, NormalizedResult, ResultShape,
    ScheduledAppointment, CLARIFICATION_MESSAGE,
};
