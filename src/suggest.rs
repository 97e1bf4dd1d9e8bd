use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::availability::AvailabilitySlot;
use crate::calendar::VenueHours;
use crate::error::ValidationError;
use crate::reservation::{gm_free_ranges, room_free_ranges, Reservation};
use crate::time::{SlotWindows, TimeSpan, MINUTES_PER_DAY};

/// Tuning for the slot search: candidate starts snap to `step_minutes`,
/// every day further out costs `day_weight` score points, and the search
/// covers `horizon_days` starting at the requested date.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestConfig {
    pub step_minutes: u16,
    pub day_weight: u32,
    pub horizon_days: u32,
    pub max_results: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        SuggestConfig {
            step_minutes: 30,
            day_weight: 120,
            horizon_days: 14,
            max_results: 5,
        }
    }
}

impl SuggestConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.step_minutes == 0 {
            return Err(ValidationError::InvalidConfig {
                field: "stepMinutes",
            });
        }
        if self.horizon_days == 0 {
            return Err(ValidationError::InvalidConfig {
                field: "horizonDays",
            });
        }
        if self.max_results == 0 {
            return Err(ValidationError::InvalidConfig {
                field: "maxResults",
            });
        }

        Ok(())
    }
}

/// What the caller is trying to book: a duration on a date, ideally starting
/// at `preferred_hour`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub date: NaiveDate,
    pub duration_minutes: u16,
    pub preferred_hour: u8,
}

impl SlotRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.duration_minutes == 0 {
            Err(ValidationError::ZeroDuration)
        } else if self.duration_minutes > MINUTES_PER_DAY {
            Err(ValidationError::DurationTooLong {
                minutes: self.duration_minutes,
            })
        } else if self.preferred_hour > 23 {
            Err(ValidationError::PreferredHourOutOfRange {
                hour: self.preferred_hour,
            })
        } else {
            Ok(())
        }
    }
}

/// A ranked candidate slot. Lower scores are better; score `0` is the
/// preferred start on the requested date.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub date: NaiveDate,
    pub span: TimeSpan<u16>,
    pub score: u32,
}

/// Ranks every step-aligned window of the requested duration inside
/// `free_by_day` over the horizon. A candidate scores the distance in
/// minutes between its start and the preferred start, plus `day_weight` per
/// day past the requested date; the best `max_results` come back ordered by
/// `(score, date, start)`.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use chrono::NaiveDate;
/// use dienstplan::suggest::{suggest_slots, SlotRequest, SuggestConfig};
/// use dienstplan::time::TimeSpan;
///
/// let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
/// let mut free_by_day = BTreeMap::new();
/// free_by_day.insert(date, vec![TimeSpan::new(600u16, 1379)]);
///
/// let request = SlotRequest {
///     date,
///     duration_minutes: 120,
///     preferred_hour: 18,
/// };
///
/// let best = suggest_slots(&request, &free_by_day, &SuggestConfig::default()).unwrap();
///
/// assert_eq!(best[0].span, TimeSpan::new(1080, 1199));
/// assert_eq!(best[0].score, 0);
/// assert_eq!(best.len(), 5);
/// ```
pub fn suggest_slots(
    request: &SlotRequest,
    free_by_day: &BTreeMap<NaiveDate, Vec<TimeSpan<u16>>>,
    config: &SuggestConfig,
) -> Result<Vec<Suggestion>, ValidationError> {
    request.validate()?;
    config.validate()?;

    let preferred = u16::from(request.preferred_hour) * 60;
    let mut candidates = vec![];

    for offset in 0..config.horizon_days {
        let date = match request
            .date
            .checked_add_signed(Duration::days(i64::from(offset)))
        {
            Some(date) => date,
            None => break,
        };

        let free = match free_by_day.get(&date) {
            Some(free) => free,
            None => continue,
        };

        let windows = free.iter().slot_windows(request.duration_minutes);
        debug!("{}: {} candidate windows", date, windows.len());

        candidates.extend(
            windows
                .into_iter()
                .filter(|window| window.start() % config.step_minutes == 0)
                .map(|window| Suggestion {
                    date,
                    span: window,
                    score: u32::from(window.start().abs_diff(preferred))
                        .saturating_add(offset.saturating_mul(config.day_weight)),
                }),
        );
    }

    Ok(candidates
        .into_iter()
        .sorted_unstable_by(|a, b| {
            (a.score, a.date, a.span.start()).cmp(&(b.score, b.date, b.span.start()))
        })
        .take(config.max_results)
        .collect())
}

/// Builds a GM's free time over the horizon from their declared hours and
/// assigned bookings, then ranks slots in it.
pub fn gm_slot_suggestions(
    request: &SlotRequest,
    user_id: &str,
    slots: &[AvailabilitySlot],
    reservations: &[Reservation],
    config: &SuggestConfig,
) -> Result<Vec<Suggestion>, ValidationError> {
    let mut free_by_day = BTreeMap::new();

    for offset in 0..config.horizon_days {
        let date = match request
            .date
            .checked_add_signed(Duration::days(i64::from(offset)))
        {
            Some(date) => date,
            None => break,
        };

        let free = gm_free_ranges(slots, reservations, user_id, date);
        if !free.is_empty() {
            free_by_day.insert(date, free);
        }
    }

    suggest_slots(request, &free_by_day, config)
}

/// Builds a room's free time over the horizon from the venue hours and its
/// bookings, then ranks slots in it.
pub fn room_slot_suggestions(
    request: &SlotRequest,
    room_id: &str,
    reservations: &[Reservation],
    venue: &VenueHours,
    config: &SuggestConfig,
) -> Result<Vec<Suggestion>, ValidationError> {
    let mut free_by_day = BTreeMap::new();

    for offset in 0..config.horizon_days {
        let date = match request
            .date
            .checked_add_signed(Duration::days(i64::from(offset)))
        {
            Some(date) => date,
            None => break,
        };

        let free = room_free_ranges(reservations, room_id, date, venue)?;
        if !free.is_empty() {
            free_by_day.insert(date, free);
        }
    }

    suggest_slots(request, &free_by_day, config)
}
