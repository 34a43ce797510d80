//! Domain types shared by entities, services and handlers.
//!
//! Everything here is free of I/O: slot arithmetic, status machines,
//! the legacy status normalizer and the working-hours document.

pub mod grid;
pub mod schedule;
pub mod status;
pub mod working_hours;

pub use grid::{plan_day, DayPlan, PlannedSlot, PostSpec};
pub use schedule::{
    generate_slots, BookingStatus, ScheduleStatus, SlotAction, SlotError, SlotWindow,
    TransitionError, MAX_SLOT_DURATION_MINUTES,
};
pub use status::{RawStatus, ServicePointStatus};
pub use working_hours::{DayHours, WorkingHours};
