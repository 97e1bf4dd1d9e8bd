use std::ops::Range;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::availability::{available_users, hour_span, role_spans, AvailabilitySlot, SlotKind};
use crate::error::ValidationError;
use crate::time::TimeSpan;

/// End-exclusive venue opening hours. The calendar grid renders one block
/// per hour between `open_hour` and `close_hour`.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct VenueHours {
    pub open_hour: u8,
    pub close_hour: u8,
}

impl Default for VenueHours {
    fn default() -> Self {
        VenueHours {
            open_hour: 10,
            close_hour: 23,
        }
    }
}

impl VenueHours {
    pub fn new(open_hour: u8, close_hour: u8) -> VenueHours {
        VenueHours {
            open_hour,
            close_hour,
        }
    }

    /// The whole venue day as an inclusive minute span.
    ///
    /// # Examples
    /// ```
    /// use dienstplan::calendar::VenueHours;
    /// use dienstplan::time::TimeSpan;
    ///
    /// assert_eq!(VenueHours::default().day_span(), Ok(TimeSpan::new(600, 1379)));
    /// assert!(VenueHours::new(23, 10).day_span().is_err());
    /// ```
    pub fn day_span(&self) -> Result<TimeSpan<u16>, ValidationError> {
        hour_span(self.open_hour, self.close_hour)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.day_span().map(|_| ())
    }

    /// The grid's hour labels, open through close.
    pub fn hours(&self) -> Range<u8> {
        self.open_hour..self.close_hour
    }

    pub fn hour_count(&self) -> usize {
        usize::from(self.close_hour.saturating_sub(self.open_hour))
    }
}

/// All roles' availability on one date, merged: the single-day view the
/// booking page renders.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub date: NaiveDate,
    pub gm: Vec<TimeSpan<u16>>,
    pub reception: Vec<TimeSpan<u16>>,
    /// Users flying the all-day external-event flag.
    pub external_events: Vec<String>,
}

/// One calendar-grid row: a boolean per venue hour per role. A block is set
/// when any availability covers part of that hour.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayBlocks {
    pub date: NaiveDate,
    pub gm: Vec<bool>,
    pub reception: Vec<bool>,
    pub external_event: bool,
}

fn hour_blocks(spans: &[TimeSpan<u16>], venue: &VenueHours) -> Vec<bool> {
    venue
        .hours()
        .map(|hour| {
            let cell = TimeSpan(u16::from(hour) * 60, u16::from(hour) * 60 + 59);
            spans.iter().any(|span| span.overlaps(cell))
        })
        .collect()
}

impl DayView {
    /// Renders the day into grid booleans for the venue's opening hours.
    /// Spans outside the venue day fall off the grid.
    pub fn blocks(&self, venue: &VenueHours) -> Result<DayBlocks, ValidationError> {
        venue.validate()?;

        Ok(DayBlocks {
            date: self.date,
            gm: hour_blocks(&self.gm, venue),
            reception: hour_blocks(&self.reception, venue),
            external_event: !self.external_events.is_empty(),
        })
    }
}

/// Merges every role's records into one day's view.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use dienstplan::availability::{AvailabilitySlot, SlotKind};
/// use dienstplan::calendar::day_view;
/// use dienstplan::time::TimeSpan;
///
/// let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
/// let slots = vec![
///     AvailabilitySlot::hours("a1", "u1", date, SlotKind::Gm, 10, 14),
///     AvailabilitySlot::hours("a2", "u2", date, SlotKind::Reception, 10, 17),
///     AvailabilitySlot::all_day("a3", "u3", date),
/// ];
///
/// let view = day_view(&slots, date);
///
/// assert_eq!(view.gm, vec![TimeSpan::new(600, 839)]);
/// assert_eq!(view.reception, vec![TimeSpan::new(600, 1019)]);
/// assert_eq!(view.external_events, vec!["u3".to_string()]);
/// ```
pub fn day_view(slots: &[AvailabilitySlot], date: NaiveDate) -> DayView {
    DayView {
        date,
        gm: role_spans(slots, date, SlotKind::Gm),
        reception: role_spans(slots, date, SlotKind::Reception),
        external_events: available_users(slots, date, SlotKind::ExternalEvent)
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

/// Grid rows for `days` consecutive dates starting at `from`. Dates without
/// records yield all-false rows, so the UI can chunk the result into weeks
/// without gaps.
pub fn calendar_days(
    slots: &[AvailabilitySlot],
    from: NaiveDate,
    days: u32,
    venue: &VenueHours,
) -> Result<Vec<DayBlocks>, ValidationError> {
    venue.validate()?;

    let mut rows = Vec::with_capacity(days as usize);

    for offset in 0..days {
        let date = match from.checked_add_signed(Duration::days(i64::from(offset))) {
            Some(date) => date,
            None => break,
        };

        rows.push(day_view(slots, date).blocks(venue)?);
    }

    Ok(rows)
}
