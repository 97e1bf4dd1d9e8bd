//! Availability, roster, and slot-suggestion planning for venue bookings.
//!
//! Records arrive as JSON rows from the backend; the [`planner::Planner`]
//! facade bundles one fetch's worth of them and exposes the calendar, free
//! range, roster, event, and suggestion operations the booking pages call.

pub mod availability;
pub mod calendar;
pub mod error;
pub mod event;
pub mod planner;
pub mod reservation;
pub mod roster;
pub mod suggest;
pub mod time;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use crate::error::ValidationError;
pub use crate::planner::Planner;
