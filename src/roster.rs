use std::fmt;

use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::availability::{available_users, user_role_spans, AvailabilitySlot, SlotKind};

/// Staff duty on a date. Runners are drawn from the reception pool, so both
/// duties reconcile against reception availability.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Duty {
    Reception,
    Runner,
}

impl fmt::Display for Duty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duty::Reception => write!(f, "reception"),
            Duty::Runner => write!(f, "runner"),
        }
    }
}

/// One roster row: a user committed to a duty on a date.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RosterAssignment {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub duty: Duty,
}

impl RosterAssignment {
    pub fn new(id: &str, user_id: &str, date: NaiveDate, duty: Duty) -> RosterAssignment {
        RosterAssignment {
            id: id.to_string(),
            user_id: user_id.to_string(),
            date,
            duty,
        }
    }
}

/// The roster table's row for one date.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RosterDay {
    pub date: NaiveDate,
    pub reception: Vec<String>,
    pub runners: Vec<String>,
}

/// A mismatch between the roster and the availability records.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum RosterIssue {
    /// Assigned without any reception availability declared for that date.
    #[serde(rename_all = "camelCase")]
    Unavailable {
        user_id: String,
        date: NaiveDate,
        duty: Duty,
    },
    /// The same user holds more than one duty on the same date.
    #[serde(rename_all = "camelCase")]
    DoubleBooked { user_id: String, date: NaiveDate },
    /// A required duty nobody is assigned to.
    Uncovered { date: NaiveDate, duty: Duty },
}

fn duty_users(assignments: &[RosterAssignment], date: NaiveDate, duty: Duty) -> Vec<String> {
    assignments
        .iter()
        .filter(|assignment| assignment.date == date && assignment.duty == duty)
        .map(|assignment| assignment.user_id.clone())
        .sorted_unstable()
        .dedup()
        .collect()
}

/// The roster table for `days` consecutive dates starting at `from`.
pub fn roster_days(
    assignments: &[RosterAssignment],
    from: NaiveDate,
    days: u32,
) -> Vec<RosterDay> {
    let mut rows = Vec::with_capacity(days as usize);

    for offset in 0..days {
        let date = match from.checked_add_signed(Duration::days(i64::from(offset))) {
            Some(date) => date,
            None => break,
        };

        rows.push(RosterDay {
            date,
            reception: duty_users(assignments, date, Duty::Reception),
            runners: duty_users(assignments, date, Duty::Runner),
        });
    }

    rows
}

/// Checks the roster against the availability records over a window.
///
/// Per date, in order: `Uncovered` for each `required` duty without an
/// assignee, `DoubleBooked` for users holding more than one duty, and
/// `Unavailable` for assignments whose user declared no reception
/// availability that date.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use dienstplan::availability::{AvailabilitySlot, SlotKind};
/// use dienstplan::roster::{reconcile, Duty, RosterAssignment, RosterIssue};
///
/// let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
/// let slots = vec![AvailabilitySlot::hours("a1", "ann", date, SlotKind::Reception, 10, 17)];
/// let assignments = vec![RosterAssignment::new("s1", "ann", date, Duty::Reception)];
///
/// assert_eq!(
///     reconcile(&assignments, &slots, date, 1, &[Duty::Reception, Duty::Runner]),
///     vec![RosterIssue::Uncovered { date, duty: Duty::Runner }]
/// );
/// ```
pub fn reconcile(
    assignments: &[RosterAssignment],
    slots: &[AvailabilitySlot],
    from: NaiveDate,
    days: u32,
    required: &[Duty],
) -> Vec<RosterIssue> {
    let mut issues = Vec::new();

    for offset in 0..days {
        let date = match from.checked_add_signed(Duration::days(i64::from(offset))) {
            Some(date) => date,
            None => break,
        };

        let mut held: Vec<(&str, Duty)> = assignments
            .iter()
            .filter(|assignment| assignment.date == date)
            .map(|assignment| (assignment.user_id.as_str(), assignment.duty))
            .collect();
        held.sort_unstable();
        held.dedup();

        for &duty in required {
            if !held.iter().any(|&(_, assigned)| assigned == duty) {
                issues.push(RosterIssue::Uncovered { date, duty });
            }
        }

        let by_user = held.iter().group_by(|(user, _)| *user);
        for (user, duties) in &by_user {
            if duties.count() > 1 {
                issues.push(RosterIssue::DoubleBooked {
                    user_id: user.to_string(),
                    date,
                });
            }
        }

        for &(user, duty) in &held {
            if user_role_spans(slots, user, date, SlotKind::Reception).is_empty() {
                issues.push(RosterIssue::Unavailable {
                    user_id: user.to_string(),
                    date,
                    duty,
                });
            }
        }
    }

    issues
}

/// Users with reception availability on `date` who are not yet on the roster
/// for it: the pool to suggest when a duty is uncovered.
pub fn cover_candidates<'a>(
    slots: &'a [AvailabilitySlot],
    assignments: &[RosterAssignment],
    date: NaiveDate,
) -> Vec<&'a str> {
    let assigned: Vec<&str> = assignments
        .iter()
        .filter(|assignment| assignment.date == date)
        .map(|assignment| assignment.user_id.as_str())
        .collect();

    available_users(slots, date, SlotKind::Reception)
        .into_iter()
        .filter(|user| !assigned.contains(user))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn reception_slot(id: &str, user: &str, on: NaiveDate) -> AvailabilitySlot {
        AvailabilitySlot::hours(id, user, on, SlotKind::Reception, 10, 17)
    }

    #[test]
    fn roster_days_list_users_per_duty() {
        let next = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        let assignments = vec![
            RosterAssignment::new("s1", "zoe", date(), Duty::Reception),
            RosterAssignment::new("s2", "ann", date(), Duty::Reception),
            RosterAssignment::new("s3", "ann", date(), Duty::Reception),
            RosterAssignment::new("s4", "ben", date(), Duty::Runner),
        ];

        let rows = roster_days(&assignments, date(), 2);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].reception, vec!["ann", "zoe"]);
        assert_eq!(rows[0].runners, vec!["ben"]);
        assert_eq!(rows[1].date, next);
        assert!(rows[1].reception.is_empty());
        assert!(rows[1].runners.is_empty());
    }

    #[test]
    fn fully_covered_day_raises_no_issues() {
        let slots = vec![
            reception_slot("a1", "ann", date()),
            reception_slot("a2", "ben", date()),
        ];
        let assignments = vec![
            RosterAssignment::new("s1", "ann", date(), Duty::Reception),
            RosterAssignment::new("s2", "ben", date(), Duty::Runner),
        ];

        assert!(reconcile(
            &assignments,
            &slots,
            date(),
            1,
            &[Duty::Reception, Duty::Runner]
        )
        .is_empty());
    }

    #[test]
    fn double_duty_is_flagged_once_per_user() {
        let slots = vec![reception_slot("a1", "ann", date())];
        let assignments = vec![
            RosterAssignment::new("s1", "ann", date(), Duty::Reception),
            RosterAssignment::new("s2", "ann", date(), Duty::Runner),
        ];

        assert_eq!(
            reconcile(&assignments, &slots, date(), 1, &[]),
            vec![RosterIssue::DoubleBooked {
                user_id: "ann".to_string(),
                date: date(),
            }]
        );
    }

    #[test]
    fn duplicate_rows_for_one_duty_are_not_double_booking() {
        let slots = vec![reception_slot("a1", "ann", date())];
        let assignments = vec![
            RosterAssignment::new("s1", "ann", date(), Duty::Reception),
            RosterAssignment::new("s2", "ann", date(), Duty::Reception),
        ];

        assert!(reconcile(&assignments, &slots, date(), 1, &[]).is_empty());
    }

    #[test]
    fn runners_reconcile_against_reception_availability() {
        let gm_only = vec![AvailabilitySlot::hours(
            "a1",
            "ben",
            date(),
            SlotKind::Gm,
            10,
            17,
        )];
        let assignments = vec![RosterAssignment::new("s1", "ben", date(), Duty::Runner)];

        assert_eq!(
            reconcile(&assignments, &gm_only, date(), 1, &[]),
            vec![RosterIssue::Unavailable {
                user_id: "ben".to_string(),
                date: date(),
                duty: Duty::Runner,
            }]
        );
    }

    #[test]
    fn issues_cover_the_whole_window_in_date_order() {
        let second = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();
        let slots = vec![reception_slot("a1", "ann", date())];
        let assignments = vec![RosterAssignment::new("s1", "ann", date(), Duty::Reception)];

        assert_eq!(
            reconcile(&assignments, &slots, date(), 2, &[Duty::Reception]),
            vec![RosterIssue::Uncovered {
                date: second,
                duty: Duty::Reception,
            }]
        );
    }

    #[test]
    fn cover_candidates_exclude_the_already_assigned() {
        let slots = vec![
            reception_slot("a1", "ann", date()),
            reception_slot("a2", "ben", date()),
            reception_slot("a3", "zoe", date()),
        ];
        let assignments = vec![RosterAssignment::new("s1", "ben", date(), Duty::Runner)];

        assert_eq!(
            cover_candidates(&slots, &assignments, date()),
            vec!["ann", "zoe"]
        );
    }
}
