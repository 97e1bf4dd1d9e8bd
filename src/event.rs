use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use itertools::Itertools;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::reservation::minute_of_day;
use crate::time::{TimeSpan, MINUTES_PER_DAY};

/// Which matching weekday of the month a monthly event falls on.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MonthWeek {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

/// How often a recurring event repeats. Fortnightly events are anchored at
/// their first occurrence on or after `starts_on`.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Cadence {
    Weekly,
    Fortnightly,
    MonthlyNth(MonthWeek),
}

/// A recurring in-house event: open table night, tournament, league evening.
/// Definitions are expanded into dated occurrences for the calendar and the
/// sign-up sheets.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    pub id: String,
    pub title: String,
    pub weekday: Weekday,
    pub cadence: Cadence,
    pub start: NaiveTime,
    pub duration_minutes: u16,
    pub capacity: u32,
    pub starts_on: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cancelled_on: Vec<NaiveDate>,
}

/// One dated instance of a recurring event.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub event_id: String,
    pub date: NaiveDate,
    pub span: TimeSpan<u16>,
    pub capacity: u32,
}

fn default_party() -> u32 {
    1
}

/// A sign-up row for one occurrence. `partySize` defaults to 1 when the row
/// predates the group sign-up field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
    pub id: String,
    pub event_id: String,
    pub date: NaiveDate,
    pub user_id: String,
    #[serde(default = "default_party")]
    pub party_size: u32,
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        _ => 28,
    }
}

fn month_week_matches(date: NaiveDate, week: MonthWeek) -> bool {
    let index = (date.day() - 1) / 7;

    match week {
        MonthWeek::First => index == 0,
        MonthWeek::Second => index == 1,
        MonthWeek::Third => index == 2,
        MonthWeek::Fourth => index == 3,
        MonthWeek::Last => date.day() + 7 > days_in_month(date.year(), date.month()),
    }
}

fn first_weekday_on_or_after(date: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let ahead = (7 + weekday.num_days_from_monday() - date.weekday().num_days_from_monday()) % 7;

    date.checked_add_signed(Duration::days(i64::from(ahead)))
}

impl EventDefinition {
    /// The event's clock time as an inclusive minute span.
    pub fn day_span(&self) -> Result<TimeSpan<u16>, ValidationError> {
        if self.duration_minutes == 0 {
            return Err(ValidationError::ZeroDuration);
        }

        let start = minute_of_day(self.start);

        if u32::from(start) + u32::from(self.duration_minutes) > u32::from(MINUTES_PER_DAY) {
            return Err(ValidationError::PastMidnight {
                id: self.id.clone(),
            });
        }

        Ok(TimeSpan(start, start + self.duration_minutes - 1))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.day_span().map(|_| ())
    }

    fn falls_on(&self, date: NaiveDate, anchor: NaiveDate) -> bool {
        match self.cadence {
            Cadence::Weekly => true,
            Cadence::Fortnightly => (date - anchor).num_days() % 14 == 0,
            Cadence::MonthlyNth(week) => month_week_matches(date, week),
        }
    }

    /// Expands the definition into occurrences within `[from, to]`, honoring
    /// the anchor date, the optional end date, and cancelled dates. Malformed
    /// definitions expand to nothing, with a warning.
    ///
    /// # Examples
    /// ```
    /// use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
    /// use dienstplan::event::{Cadence, EventDefinition};
    ///
    /// let definition = EventDefinition {
    ///     id: "e1".to_string(),
    ///     title: "Open table night".to_string(),
    ///     weekday: Weekday::Mon,
    ///     cadence: Cadence::Weekly,
    ///     start: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
    ///     duration_minutes: 180,
    ///     capacity: 20,
    ///     starts_on: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
    ///     ends_on: None,
    ///     cancelled_on: vec![NaiveDate::from_ymd_opt(2024, 6, 17).unwrap()],
    /// };
    ///
    /// let occurrences = definition.occurrences_between(
    ///     NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    ///     NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
    /// );
    ///
    /// assert_eq!(
    ///     occurrences.iter().map(|o| o.date.day()).collect::<Vec<_>>(),
    ///     vec![3, 10, 24]
    /// );
    /// ```
    pub fn occurrences_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<Occurrence> {
        let span = match self.day_span() {
            Ok(span) => span,
            Err(error) => {
                warn!("skipping event {}: {}", self.id, error);
                return vec![];
            }
        };

        let anchor = match first_weekday_on_or_after(self.starts_on, self.weekday) {
            Some(anchor) => anchor,
            None => return vec![],
        };

        let lower = from.max(self.starts_on);
        let upper = match self.ends_on {
            Some(ends_on) => to.min(ends_on),
            None => to,
        };

        let mut date = match first_weekday_on_or_after(lower, self.weekday) {
            Some(date) => date,
            None => return vec![],
        };

        let mut occurrences = vec![];

        while date <= upper {
            if self.falls_on(date, anchor) && !self.cancelled_on.contains(&date) {
                occurrences.push(Occurrence {
                    event_id: self.id.clone(),
                    date,
                    span,
                    capacity: self.capacity,
                });
            }

            date = match date.checked_add_signed(Duration::days(7)) {
                Some(next) => next,
                None => break,
            };
        }

        occurrences
    }
}

/// Expands every definition over the window, ordered by date, start, then
/// event id.
pub fn occurrences_between(
    definitions: &[EventDefinition],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<Occurrence> {
    definitions
        .iter()
        .flat_map(|definition| definition.occurrences_between(from, to))
        .sorted_unstable_by(|a, b| {
            (a.date, a.span.start(), a.event_id.as_str())
                .cmp(&(b.date, b.span.start(), b.event_id.as_str()))
        })
        .collect()
}

impl Occurrence {
    /// Seats left after summing matching sign-ups' party sizes.
    pub fn remaining_capacity(&self, signups: &[SignUp]) -> u32 {
        let taken = signups
            .iter()
            .filter(|signup| signup.event_id == self.event_id && signup.date == self.date)
            .fold(0u32, |total, signup| total.saturating_add(signup.party_size));

        self.capacity.saturating_sub(taken)
    }

    pub fn is_full(&self, signups: &[SignUp]) -> bool {
        self.remaining_capacity(signups) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn definition(cadence: Cadence) -> EventDefinition {
        EventDefinition {
            id: "e1".to_string(),
            title: "League evening".to_string(),
            weekday: Weekday::Mon,
            cadence,
            start: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            duration_minutes: 180,
            capacity: 20,
            starts_on: ymd(2024, 6, 3),
            ends_on: None,
            cancelled_on: vec![],
        }
    }

    fn dates(occurrences: &[Occurrence]) -> Vec<NaiveDate> {
        occurrences.iter().map(|o| o.date).collect()
    }

    #[test]
    fn weekly_events_hit_every_matching_weekday() {
        let def = definition(Cadence::Weekly);

        assert_eq!(
            dates(&def.occurrences_between(ymd(2024, 6, 1), ymd(2024, 6, 30))),
            vec![
                ymd(2024, 6, 3),
                ymd(2024, 6, 10),
                ymd(2024, 6, 17),
                ymd(2024, 6, 24),
            ]
        );
    }

    #[test]
    fn occurrences_carry_the_clock_span() {
        let def = definition(Cadence::Weekly);
        let occurrences = def.occurrences_between(ymd(2024, 6, 3), ymd(2024, 6, 3));

        assert_eq!(occurrences.len(), 1);
        // 19:00 for 180 minutes runs through 21:59.
        assert_eq!(occurrences[0].span, TimeSpan::new(1140, 1319));
        assert_eq!(occurrences[0].capacity, 20);
    }

    #[test]
    fn fortnightly_parity_counts_from_the_anchor() {
        let def = definition(Cadence::Fortnightly);

        assert_eq!(
            dates(&def.occurrences_between(ymd(2024, 6, 1), ymd(2024, 7, 15))),
            vec![
                ymd(2024, 6, 3),
                ymd(2024, 6, 17),
                ymd(2024, 7, 1),
                ymd(2024, 7, 15),
            ]
        );
    }

    #[test]
    fn fortnightly_anchor_skips_to_the_first_matching_weekday() {
        // Starts mid-week; the anchor is the following Monday.
        let mut def = definition(Cadence::Fortnightly);
        def.starts_on = ymd(2024, 6, 5);

        assert_eq!(
            dates(&def.occurrences_between(ymd(2024, 6, 1), ymd(2024, 6, 30))),
            vec![ymd(2024, 6, 10), ymd(2024, 6, 24)]
        );
    }

    #[test]
    fn monthly_first_and_last_resolve_per_month() {
        let first = definition(Cadence::MonthlyNth(MonthWeek::First));
        let last = definition(Cadence::MonthlyNth(MonthWeek::Last));

        assert_eq!(
            dates(&first.occurrences_between(ymd(2024, 6, 1), ymd(2024, 7, 31))),
            vec![ymd(2024, 6, 3), ymd(2024, 7, 1)]
        );
        assert_eq!(
            dates(&last.occurrences_between(ymd(2024, 6, 1), ymd(2024, 7, 31))),
            vec![ymd(2024, 6, 24), ymd(2024, 7, 29)]
        );
    }

    #[test]
    fn monthly_second_and_third_pick_the_middle_weeks() {
        let second = definition(Cadence::MonthlyNth(MonthWeek::Second));
        let third = definition(Cadence::MonthlyNth(MonthWeek::Third));

        assert_eq!(
            dates(&second.occurrences_between(ymd(2024, 6, 1), ymd(2024, 7, 31))),
            vec![ymd(2024, 6, 10), ymd(2024, 7, 8)]
        );
        assert_eq!(
            dates(&third.occurrences_between(ymd(2024, 6, 1), ymd(2024, 7, 31))),
            vec![ymd(2024, 6, 17), ymd(2024, 7, 15)]
        );
    }

    #[test]
    fn fourth_is_not_always_last() {
        // June 2024 has five Saturdays; the fourth is the 22nd, the last the
        // 29th.
        let mut fourth = definition(Cadence::MonthlyNth(MonthWeek::Fourth));
        fourth.weekday = Weekday::Sat;
        fourth.starts_on = ymd(2024, 6, 1);
        let mut last = definition(Cadence::MonthlyNth(MonthWeek::Last));
        last.weekday = Weekday::Sat;
        last.starts_on = ymd(2024, 6, 1);

        assert_eq!(
            dates(&fourth.occurrences_between(ymd(2024, 6, 1), ymd(2024, 6, 30))),
            vec![ymd(2024, 6, 22)]
        );
        assert_eq!(
            dates(&last.occurrences_between(ymd(2024, 6, 1), ymd(2024, 6, 30))),
            vec![ymd(2024, 6, 29)]
        );
    }

    #[test]
    fn the_window_and_the_end_date_both_clip() {
        let mut def = definition(Cadence::Weekly);
        def.ends_on = Some(ymd(2024, 6, 15));

        assert_eq!(
            dates(&def.occurrences_between(ymd(2024, 5, 1), ymd(2024, 6, 30))),
            vec![ymd(2024, 6, 3), ymd(2024, 6, 10)]
        );
    }

    #[test]
    fn malformed_definitions_expand_to_nothing() {
        let mut zero = definition(Cadence::Weekly);
        zero.duration_minutes = 0;
        let mut late = definition(Cadence::Weekly);
        late.start = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        late.duration_minutes = 120;

        assert!(zero
            .occurrences_between(ymd(2024, 6, 1), ymd(2024, 6, 30))
            .is_empty());
        assert!(late
            .occurrences_between(ymd(2024, 6, 1), ymd(2024, 6, 30))
            .is_empty());
    }

    #[test]
    fn all_definitions_expand_in_date_then_start_order() {
        let mut late = definition(Cadence::Weekly);
        late.id = "e2".to_string();
        late.start = NaiveTime::from_hms_opt(21, 0, 0).unwrap();
        let defs = vec![late, definition(Cadence::Weekly)];

        let all = occurrences_between(&defs, ymd(2024, 6, 3), ymd(2024, 6, 10));

        assert_eq!(
            all.iter()
                .map(|o| (o.date, o.event_id.as_str()))
                .collect::<Vec<_>>(),
            vec![
                (ymd(2024, 6, 3), "e1"),
                (ymd(2024, 6, 3), "e2"),
                (ymd(2024, 6, 10), "e1"),
                (ymd(2024, 6, 10), "e2"),
            ]
        );
    }

    #[test]
    fn sign_ups_consume_capacity_by_party_size() {
        let def = definition(Cadence::Weekly);
        let occurrence = &def.occurrences_between(ymd(2024, 6, 3), ymd(2024, 6, 3))[0];

        let signups = vec![
            SignUp {
                id: "s1".to_string(),
                event_id: "e1".to_string(),
                date: ymd(2024, 6, 3),
                user_id: "u1".to_string(),
                party_size: 4,
            },
            SignUp {
                id: "s2".to_string(),
                event_id: "e1".to_string(),
                date: ymd(2024, 6, 3),
                user_id: "u2".to_string(),
                party_size: 3,
            },
            SignUp {
                id: "s3".to_string(),
                event_id: "e1".to_string(),
                date: ymd(2024, 6, 10),
                user_id: "u3".to_string(),
                party_size: 5,
            },
        ];

        assert_eq!(occurrence.remaining_capacity(&signups), 13);
        assert!(!occurrence.is_full(&signups));
    }

    #[test]
    fn oversubscription_saturates_at_zero() {
        let def = definition(Cadence::Weekly);
        let occurrence = &def.occurrences_between(ymd(2024, 6, 3), ymd(2024, 6, 3))[0];

        let signups = vec![SignUp {
            id: "s1".to_string(),
            event_id: "e1".to_string(),
            date: ymd(2024, 6, 3),
            user_id: "u1".to_string(),
            party_size: 25,
        }];

        assert_eq!(occurrence.remaining_capacity(&signups), 0);
        assert!(occurrence.is_full(&signups));
    }

    #[test]
    fn party_size_defaults_to_one_on_the_wire() {
        let signup: SignUp = serde_json::from_str(
            r#"{
                "id": "s1",
                "eventId": "e1",
                "date": "2024-06-03",
                "userId": "u1"
            }"#,
        )
        .unwrap();

        assert_eq!(signup.party_size, 1);
    }
}
