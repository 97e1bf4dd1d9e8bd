use chrono::{NaiveDate, NaiveTime, Timelike};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::availability::{user_role_spans, AvailabilitySlot, SlotKind};
use crate::calendar::VenueHours;
use crate::error::ValidationError;
use crate::time::{FreeTime, MergeSpans, TimeSpan, MINUTES_PER_DAY};

/// Lifecycle of a booking. Pending and confirmed reservations block time;
/// cancelled ones do not.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// One booking row: a room, optionally a GM running it, and an end-exclusive
/// clock-time range on one date. `end` of `00:00` means the booking runs to
/// midnight.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub room_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gm_id: Option<String>,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub status: ReservationStatus,
}

pub(crate) fn minute_of_day(time: NaiveTime) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}

impl Reservation {
    pub fn new(
        id: &str,
        room_id: &str,
        gm_id: Option<&str>,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        status: ReservationStatus,
    ) -> Reservation {
        Reservation {
            id: id.to_string(),
            room_id: room_id.to_string(),
            gm_id: gm_id.map(str::to_string),
            date,
            start,
            end,
            status,
        }
    }

    /// Converts the end-exclusive clock times into an inclusive minute span.
    ///
    /// # Examples
    /// ```
    /// use chrono::{NaiveDate, NaiveTime};
    /// use dienstplan::reservation::{Reservation, ReservationStatus};
    /// use dienstplan::time::TimeSpan;
    ///
    /// let booking = Reservation::new(
    ///     "r1",
    ///     "room-a",
    ///     Some("u1"),
    ///     NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
    ///     NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
    ///     NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
    ///     ReservationStatus::Confirmed,
    /// );
    ///
    /// assert_eq!(booking.span(), Ok(TimeSpan::new(1080, 1199)));
    /// ```
    pub fn span(&self) -> Result<TimeSpan<u16>, ValidationError> {
        let start = minute_of_day(self.start);
        let end = match minute_of_day(self.end) {
            0 => MINUTES_PER_DAY,
            minute => minute,
        };

        if end <= start {
            return Err(ValidationError::ReversedClockSpan {
                id: self.id.clone(),
            });
        }

        Ok(TimeSpan(start, end - 1))
    }

    pub fn is_blocking(&self) -> bool {
        self.status != ReservationStatus::Cancelled
    }
}

/// Merged spans of the non-cancelled reservations on `date` that pass
/// `filter`. Malformed rows are skipped with a warning.
pub fn blocking_spans<F>(
    reservations: &[Reservation],
    date: NaiveDate,
    filter: F,
) -> Vec<TimeSpan<u16>>
where
    F: Fn(&Reservation) -> bool,
{
    let spans: Vec<TimeSpan<u16>> = reservations
        .iter()
        .filter(|reservation| reservation.date == date && reservation.is_blocking())
        .filter(|reservation| filter(reservation))
        .filter_map(|reservation| match reservation.span() {
            Ok(span) => Some(span),
            Err(error) => {
                warn!("skipping reservation {}: {}", reservation.id, error);
                None
            }
        })
        .collect();

    spans.iter().merge_spans()
}

/// Spans blocked in one room on one date.
pub fn room_spans(
    reservations: &[Reservation],
    room_id: &str,
    date: NaiveDate,
) -> Vec<TimeSpan<u16>> {
    blocking_spans(reservations, date, |reservation| {
        reservation.room_id == room_id
    })
}

/// Spans one GM is already booked for on one date.
pub fn gm_spans(
    reservations: &[Reservation],
    user_id: &str,
    date: NaiveDate,
) -> Vec<TimeSpan<u16>> {
    blocking_spans(reservations, date, |reservation| {
        reservation.gm_id.as_deref() == Some(user_id)
    })
}

/// A GM's declared hours minus the reservations already assigned to them.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use dienstplan::availability::{AvailabilitySlot, SlotKind};
/// use dienstplan::reservation::{gm_free_ranges, Reservation, ReservationStatus};
/// use dienstplan::time::TimeSpan;
///
/// let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
/// let slots = vec![AvailabilitySlot::hours("a1", "u1", date, SlotKind::Gm, 10, 22)];
/// let reservations = vec![Reservation::new(
///     "r1",
///     "room-a",
///     Some("u1"),
///     date,
///     NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
///     NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
///     ReservationStatus::Confirmed,
/// )];
///
/// assert_eq!(
///     gm_free_ranges(&slots, &reservations, "u1", date),
///     vec![TimeSpan::new(600, 719), TimeSpan::new(840, 1319)]
/// );
/// ```
pub fn gm_free_ranges(
    slots: &[AvailabilitySlot],
    reservations: &[Reservation],
    user_id: &str,
    date: NaiveDate,
) -> Vec<TimeSpan<u16>> {
    let declared = user_role_spans(slots, user_id, date, SlotKind::Gm);
    let reserved = gm_spans(reservations, user_id, date);

    reserved.iter().free_within(&declared)
}

/// Venue opening hours minus the blocked spans of one room.
pub fn room_free_ranges(
    reservations: &[Reservation],
    room_id: &str,
    date: NaiveDate,
    venue: &VenueHours,
) -> Result<Vec<TimeSpan<u16>>, ValidationError> {
    let declared = vec![venue.day_span()?];
    let reserved = room_spans(reservations, room_id, date);

    Ok(reserved.iter().free_within(&declared))
}
