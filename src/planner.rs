use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::availability::AvailabilitySlot;
use crate::calendar::{calendar_days, day_view, DayBlocks, DayView, VenueHours};
use crate::error::ValidationError;
use crate::event::{occurrences_between, EventDefinition, Occurrence, SignUp};
use crate::reservation::{gm_free_ranges, room_free_ranges, Reservation};
use crate::roster::{
    cover_candidates, reconcile, roster_days, Duty, RosterAssignment, RosterDay, RosterIssue,
};
use crate::suggest::{
    gm_slot_suggestions, room_slot_suggestions, SlotRequest, SuggestConfig, Suggestion,
};
use crate::time::TimeSpan;

/// One fetch's worth of backend records, bundled behind the operations the
/// booking pages call. Deserializes straight from the backend's JSON rows
/// and sorts them once at construction.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Planner {
    pub venue: VenueHours,
    pub slots: Vec<AvailabilitySlot>,
    pub reservations: Vec<Reservation>,
    pub assignments: Vec<RosterAssignment>,
    pub events: Vec<EventDefinition>,
    pub signups: Vec<SignUp>,
}

fn slot_order(a: &AvailabilitySlot, b: &AvailabilitySlot) -> Ordering {
    (a.date, a.user_id.as_str(), a.id.as_str()).cmp(&(b.date, b.user_id.as_str(), b.id.as_str()))
}

fn reservation_order(a: &Reservation, b: &Reservation) -> Ordering {
    (a.date, a.start, a.id.as_str()).cmp(&(b.date, b.start, b.id.as_str()))
}

fn assignment_order(a: &RosterAssignment, b: &RosterAssignment) -> Ordering {
    (a.date, a.user_id.as_str(), a.id.as_str()).cmp(&(b.date, b.user_id.as_str(), b.id.as_str()))
}

fn event_order(a: &EventDefinition, b: &EventDefinition) -> Ordering {
    (a.starts_on, a.id.as_str()).cmp(&(b.starts_on, b.id.as_str()))
}

fn signup_order(a: &SignUp, b: &SignUp) -> Ordering {
    (a.date, a.event_id.as_str(), a.id.as_str()).cmp(&(b.date, b.event_id.as_str(), b.id.as_str()))
}

impl Planner {
    pub fn new(
        venue: VenueHours,
        slots: Vec<AvailabilitySlot>,
        reservations: Vec<Reservation>,
        assignments: Vec<RosterAssignment>,
        events: Vec<EventDefinition>,
        signups: Vec<SignUp>,
    ) -> Planner {
        let mut planner = Planner {
            venue,
            slots,
            reservations,
            assignments,
            events,
            signups,
        };
        planner.sort();
        planner
    }

    /// Puts every record table into a deterministic date-major order.
    /// Deserialized planners should be sorted before use.
    pub fn sort(&mut self) {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;

            self.slots.par_sort_unstable_by(slot_order);
            self.reservations.par_sort_unstable_by(reservation_order);
            self.assignments.par_sort_unstable_by(assignment_order);
            self.events.par_sort_unstable_by(event_order);
            self.signups.par_sort_unstable_by(signup_order);
        }
        #[cfg(not(feature = "rayon"))]
        {
            self.slots.sort_unstable_by(slot_order);
            self.reservations.sort_unstable_by(reservation_order);
            self.assignments.sort_unstable_by(assignment_order);
            self.events.sort_unstable_by(event_order);
            self.signups.sort_unstable_by(signup_order);
        }
    }

    /// Strict validation for admin screens: the first malformed record or
    /// configuration error, if any. The read paths stay lenient and skip
    /// malformed rows instead.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.venue.validate()?;

        for slot in &self.slots {
            slot.validate()?;
        }
        for reservation in &self.reservations {
            reservation.span()?;
        }
        for event in &self.events {
            event.validate()?;
        }

        Ok(())
    }

    pub fn day_view(&self, date: NaiveDate) -> DayView {
        day_view(&self.slots, date)
    }

    pub fn blocks(&self, date: NaiveDate) -> Result<DayBlocks, ValidationError> {
        self.day_view(date).blocks(&self.venue)
    }

    pub fn calendar(&self, from: NaiveDate, days: u32) -> Result<Vec<DayBlocks>, ValidationError> {
        calendar_days(&self.slots, from, days, &self.venue)
    }

    pub fn gm_free(&self, user_id: &str, date: NaiveDate) -> Vec<TimeSpan<u16>> {
        gm_free_ranges(&self.slots, &self.reservations, user_id, date)
    }

    pub fn room_free(
        &self,
        room_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TimeSpan<u16>>, ValidationError> {
        room_free_ranges(&self.reservations, room_id, date, &self.venue)
    }

    pub fn suggest_gm(
        &self,
        request: &SlotRequest,
        user_id: &str,
        config: &SuggestConfig,
    ) -> Result<Vec<Suggestion>, ValidationError> {
        gm_slot_suggestions(request, user_id, &self.slots, &self.reservations, config)
    }

    pub fn suggest_room(
        &self,
        request: &SlotRequest,
        room_id: &str,
        config: &SuggestConfig,
    ) -> Result<Vec<Suggestion>, ValidationError> {
        room_slot_suggestions(request, room_id, &self.reservations, &self.venue, config)
    }

    pub fn roster(&self, from: NaiveDate, days: u32) -> Vec<RosterDay> {
        roster_days(&self.assignments, from, days)
    }

    pub fn reconcile(&self, from: NaiveDate, days: u32, required: &[Duty]) -> Vec<RosterIssue> {
        reconcile(&self.assignments, &self.slots, from, days, required)
    }

    pub fn cover_candidates(&self, date: NaiveDate) -> Vec<&str> {
        cover_candidates(&self.slots, &self.assignments, date)
    }

    pub fn occurrences(&self, from: NaiveDate, to: NaiveDate) -> Vec<Occurrence> {
        occurrences_between(&self.events, from, to)
    }

    pub fn remaining_capacity(&self, occurrence: &Occurrence) -> u32 {
        occurrence.remaining_capacity(&self.signups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::SlotKind;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn construction_sorts_every_table() {
        let later = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let planner = Planner::new(
            VenueHours::default(),
            vec![
                AvailabilitySlot::hours("a2", "u1", later, SlotKind::Gm, 10, 12),
                AvailabilitySlot::hours("a1", "u1", date(), SlotKind::Gm, 10, 12),
            ],
            vec![],
            vec![
                RosterAssignment::new("s2", "zoe", date(), Duty::Runner),
                RosterAssignment::new("s1", "ann", date(), Duty::Reception),
            ],
            vec![],
            vec![],
        );

        assert_eq!(planner.slots[0].id, "a1");
        assert_eq!(planner.assignments[0].user_id, "ann");
    }

    #[test]
    fn validate_reports_the_first_bad_record() {
        let mut planner = Planner::default();
        assert_eq!(planner.validate(), Ok(()));

        planner
            .slots
            .push(AvailabilitySlot::hours("a1", "u1", date(), SlotKind::Gm, 14, 10));

        assert_eq!(
            planner.validate(),
            Err(ValidationError::InvalidHourRange { start: 14, end: 10 })
        );
    }

    #[test]
    fn validation_errors_serialize_for_the_admin_screen() {
        let error = ValidationError::InvalidHourRange { start: 14, end: 10 };

        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({"invalidHourRange": {"start": 14, "end": 10}})
        );
    }

    #[test]
    fn validate_rejects_bad_venue_hours() {
        let planner = Planner {
            venue: VenueHours::new(23, 10),
            ..Planner::default()
        };

        assert!(planner.validate().is_err());
    }

    #[test]
    fn the_facade_matches_the_free_functions() {
        let planner = Planner::new(
            VenueHours::default(),
            vec![AvailabilitySlot::hours(
                "a1",
                "u1",
                date(),
                SlotKind::Gm,
                10,
                14,
            )],
            vec![],
            vec![],
            vec![],
            vec![],
        );

        assert_eq!(planner.gm_free("u1", date()), vec![TimeSpan::new(600, 839)]);
        assert_eq!(
            planner.day_view(date()).gm,
            vec![TimeSpan::new(600, 839)]
        );
        assert_eq!(planner.blocks(date()).unwrap().gm[0..5], [
            true, true, true, true, false
        ]);
    }
}
