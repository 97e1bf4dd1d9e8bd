use serde::Serialize;
use thiserror::Error;

use crate::availability::SlotKind;

/// Everything a malformed record, request, or configuration can be rejected
/// for. Record assembly skips invalid rows with a warning instead of failing;
/// requests and configuration return these to the caller.
#[derive(Error, Serialize, Debug, Clone, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ValidationError {
    #[error("Invalid hour range {start}..{end}. Hours are end-exclusive within 0..=24 and must not be reversed")]
    InvalidHourRange { start: u8, end: u8 },
    #[error("Availability slot {id} ({kind}) requires both a start and an end hour")]
    MissingHours { id: String, kind: SlotKind },
    #[error("External event slot {id} is all-day and must not carry hours")]
    AllDayWithHours { id: String },
    #[error("Reservation {id} ends at or before it starts")]
    ReversedClockSpan { id: String },
    #[error("Event {id} runs past midnight")]
    PastMidnight { id: String },
    #[error("Duration must be at least one minute")]
    ZeroDuration,
    #[error("Requested duration of {minutes} minutes does not fit in a venue day")]
    DurationTooLong { minutes: u16 },
    #[error("Preferred hour {hour} is outside 0..=23")]
    PreferredHourOutOfRange { hour: u8 },
    #[error("Invalid configuration: {field} must not be zero")]
    InvalidConfig { field: &'static str },
}
