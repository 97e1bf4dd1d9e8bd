use std::fmt;

use chrono::NaiveDate;
use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::{MergeSpans, TimeSpan};

/// Role an availability record is declared for.
///
/// `Gm` and `Reception` records carry an hour range; `ExternalEvent` records
/// are all-day flags with no hours.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SlotKind {
    Gm,
    Reception,
    ExternalEvent,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKind::Gm => write!(f, "GM"),
            SlotKind::Reception => write!(f, "reception"),
            SlotKind::ExternalEvent => write!(f, "external event"),
        }
    }
}

/// One availability row as fetched from the backend: a user declares a role
/// for one date, either over a whole-hour range or (for external events) for
/// the entire day.
///
/// Hours are end-exclusive, the way the booking form's hour dropdowns produce
/// them: `startHour: 10, endHour: 17` declares 10:00 through 16:59.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub kind: SlotKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_hour: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_hour: Option<u8>,
}

/// Converts an end-exclusive whole-hour range into an inclusive minute span.
///
/// # Examples
/// ```
/// use dienstplan::availability::hour_span;
/// use dienstplan::time::TimeSpan;
///
/// assert_eq!(hour_span(10, 17), Ok(TimeSpan::new(600, 1019)));
/// assert!(hour_span(17, 10).is_err());
/// assert!(hour_span(10, 25).is_err());
/// ```
pub fn hour_span(start: u8, end: u8) -> Result<TimeSpan<u16>, ValidationError> {
    if start >= end || end > 24 {
        return Err(ValidationError::InvalidHourRange { start, end });
    }

    Ok(TimeSpan(
        u16::from(start) * 60,
        u16::from(end) * 60 - 1,
    ))
}

impl AvailabilitySlot {
    /// Constructs an hour-range record for the GM or reception role.
    pub fn hours(
        id: &str,
        user_id: &str,
        date: NaiveDate,
        kind: SlotKind,
        start_hour: u8,
        end_hour: u8,
    ) -> AvailabilitySlot {
        AvailabilitySlot {
            id: id.to_string(),
            user_id: user_id.to_string(),
            date,
            kind,
            start_hour: Some(start_hour),
            end_hour: Some(end_hour),
        }
    }

    /// Constructs an all-day external-event record.
    pub fn all_day(id: &str, user_id: &str, date: NaiveDate) -> AvailabilitySlot {
        AvailabilitySlot {
            id: id.to_string(),
            user_id: user_id.to_string(),
            date,
            kind: SlotKind::ExternalEvent,
            start_hour: None,
            end_hour: None,
        }
    }

    /// Validates the kind/hours pairing and converts the record to a minute
    /// span. All-day records yield `Ok(None)`.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use dienstplan::availability::{AvailabilitySlot, SlotKind};
    /// use dienstplan::time::TimeSpan;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
    ///
    /// let shift = AvailabilitySlot::hours("a1", "u1", date, SlotKind::Reception, 10, 17);
    /// assert_eq!(shift.day_span(), Ok(Some(TimeSpan::new(600, 1019))));
    ///
    /// let fair = AvailabilitySlot::all_day("a2", "u1", date);
    /// assert_eq!(fair.day_span(), Ok(None));
    /// ```
    pub fn day_span(&self) -> Result<Option<TimeSpan<u16>>, ValidationError> {
        match self.kind {
            SlotKind::ExternalEvent => {
                if self.start_hour.is_some() || self.end_hour.is_some() {
                    Err(ValidationError::AllDayWithHours {
                        id: self.id.clone(),
                    })
                } else {
                    Ok(None)
                }
            }
            kind => match (self.start_hour, self.end_hour) {
                (Some(start), Some(end)) => hour_span(start, end).map(Some),
                _ => Err(ValidationError::MissingHours {
                    id: self.id.clone(),
                    kind,
                }),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.day_span().map(|_| ())
    }
}

/// Filters one date's records of one kind, dropping rows that fail
/// validation with a warning. Rows from other dates or roles pass silently.
fn day_slots<'a>(
    slots: &'a [AvailabilitySlot],
    date: NaiveDate,
    kind: SlotKind,
) -> impl Iterator<Item = (&'a AvailabilitySlot, Option<TimeSpan<u16>>)> {
    slots
        .iter()
        .filter(move |slot| slot.date == date && slot.kind == kind)
        .filter_map(|slot| match slot.day_span() {
            Ok(span) => Some((slot, span)),
            Err(error) => {
                warn!("skipping availability slot {}: {}", slot.id, error);
                None
            }
        })
}

/// Every user's declared time for one role on one date, merged into a
/// minimal span set. This is the merge step behind the calendar's per-role
/// rows.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use dienstplan::availability::{role_spans, AvailabilitySlot, SlotKind};
/// use dienstplan::time::TimeSpan;
///
/// let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
/// let slots = vec![
///     AvailabilitySlot::hours("a1", "u1", date, SlotKind::Gm, 10, 14),
///     AvailabilitySlot::hours("a2", "u2", date, SlotKind::Gm, 14, 18),
///     AvailabilitySlot::hours("a3", "u3", date, SlotKind::Gm, 20, 22),
/// ];
///
/// assert_eq!(
///     role_spans(&slots, date, SlotKind::Gm),
///     vec![TimeSpan::new(600, 1079), TimeSpan::new(1200, 1319)]
/// );
/// ```
pub fn role_spans(
    slots: &[AvailabilitySlot],
    date: NaiveDate,
    kind: SlotKind,
) -> Vec<TimeSpan<u16>> {
    let spans: Vec<TimeSpan<u16>> = day_slots(slots, date, kind)
        .filter_map(|(_, span)| span)
        .collect();

    spans.iter().merge_spans()
}

/// One user's merged spans for a role on a date.
pub fn user_role_spans(
    slots: &[AvailabilitySlot],
    user_id: &str,
    date: NaiveDate,
    kind: SlotKind,
) -> Vec<TimeSpan<u16>> {
    let spans: Vec<TimeSpan<u16>> = day_slots(slots, date, kind)
        .filter(|(slot, _)| slot.user_id == user_id)
        .filter_map(|(_, span)| span)
        .collect();

    spans.iter().merge_spans()
}

/// Distinct user ids with any valid availability for a role on a date,
/// sorted. Feeds the roster's cover suggestions.
pub fn available_users<'a>(
    slots: &'a [AvailabilitySlot],
    date: NaiveDate,
    kind: SlotKind,
) -> Vec<&'a str> {
    day_slots(slots, date, kind)
        .map(|(slot, _)| slot.user_id.as_str())
        .sorted_unstable()
        .dedup()
        .collect()
}
