use chrono::{DateTime, FixedOffset, Utc};

pub const TIMEZONE: &str = "Asia/Kolkata";
pub const TIMEZONE_OFFSET: &str = "+05:30";

const KOLKATA: FixedOffset = match FixedOffset::east_opt(5 * 3600 + 30 * 60) {
    Some(offset) => offset,
    None => panic!("invalid Asia/Kolkata offset"),
};

const SUCCESS_SCHEMA: &str = r#"{"appointment":{"department":"Dentistry","date":"YYYY-MM-DD","time":"HH:MM","tz":"Asia/Kolkata","status":"ok"},"metadata":{"raw_text":"...","confidence":0.0}}"#;

const CLARIFICATION_SCHEMA: &str = r#"{"status":"needs clarification","message":"Ambiguous date/time or department","raw_text":"..."}"#;

/// Renders `instant` as wall-clock time in Asia/Kolkata, e.g.
/// `2024-03-01T09:15:00+05:30`. The zone has no daylight saving, so a fixed
/// offset is exact.
pub fn kolkata_timestamp(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&KOLKATA)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// Builds the system instruction for the extraction model. Pure function of
/// `instant`.
pub fn compose_instruction(instant: DateTime<Utc>) -> String {
    let now = kolkata_timestamp(instant);

    [
        "You are an appointment scheduler.".to_string(),
        format!("The current date and time in {TIMEZONE} is {now}."),
        "Read the user input, which is text, an image of a written request, or both. For an image, first read the text it contains.".to_string(),
        "From that text extract the entities date_phrase, time_phrase and department.".to_string(),
        format!("Normalize the date to YYYY-MM-DD and the time to 24-hour HH:MM, both relative to the {TIMEZONE} timezone."),
        "Normalize the department to a clean title-case name (example: dentist -> Dentistry).".to_string(),
        "If the date, the time or the department cannot be determined with confidence, answer with status 'needs clarification' and message 'Ambiguous date/time or department'.".to_string(),
        "Answer with JSON matching exactly one of these schemas.".to_string(),
        format!("Success schema: {SUCCESS_SCHEMA}"),
        format!("Needs clarification schema: {CLARIFICATION_SCHEMA}"),
        "Return JSON only. Do not wrap it in markdown code fences, do not add commentary, do not add extra keys.".to_string(),
    ]
    .join("\n")
}
