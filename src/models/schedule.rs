use chrono::{Duration, NaiveTime, Timelike};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Longest slot a post may be configured with: one full day.
pub const MAX_SLOT_DURATION_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("slot duration must be between 1 and 1440 minutes, got {0}")]
    InvalidSlotDuration(u32),

    #[error("working window {open}-{close} is empty: closing time must be after opening time")]
    InvalidWorkingWindow { open: NaiveTime, close: NaiveTime },
}

/// One bookable window `[start, end)` inside a working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SlotWindow {
    #[schema(value_type = String, example = "09:00:00")]
    pub start: NaiveTime,
    #[schema(value_type = String, example = "09:30:00")]
    pub end: NaiveTime,
}

impl SlotWindow {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Splits `[open, close)` into consecutive slots of `duration_minutes`.
///
/// The walk stops as soon as the next slot would end after `close`, so a
/// trailing remainder shorter than one slot is left unused.
pub fn generate_slots(
    open: NaiveTime,
    close: NaiveTime,
    duration_minutes: u32,
) -> Result<Vec<SlotWindow>, SlotError> {
    if duration_minutes == 0 || duration_minutes > MAX_SLOT_DURATION_MINUTES {
        return Err(SlotError::InvalidSlotDuration(duration_minutes));
    }
    if close <= open {
        return Err(SlotError::InvalidWorkingWindow { open, close });
    }

    let window_secs = i64::from(close.num_seconds_from_midnight())
        - i64::from(open.num_seconds_from_midnight());
    let slot_secs = i64::from(duration_minutes) * 60;
    let count = window_secs / slot_secs;

    let step = Duration::minutes(i64::from(duration_minutes));
    let slots = (0..count)
        .map(|i| {
            let start = open + step * i as i32;
            SlotWindow {
                start,
                end: start + step,
            }
        })
        .collect();

    Ok(slots)
}

/// Lifecycle of a schedule slot.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScheduleStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "booked")]
    Booked,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Manual operations on a slot.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SlotAction {
    Book,
    Complete,
    Cancel,
    Reopen,
}

impl SlotAction {
    /// States the action may start from.
    pub fn allowed_from(self) -> &'static [ScheduleStatus] {
        match self {
            SlotAction::Book => &[ScheduleStatus::Available],
            SlotAction::Complete => &[ScheduleStatus::Booked],
            SlotAction::Cancel => &[ScheduleStatus::Available, ScheduleStatus::Booked],
            SlotAction::Reopen => &[ScheduleStatus::Cancelled],
        }
    }

    pub fn target(self) -> ScheduleStatus {
        match self {
            SlotAction::Book => ScheduleStatus::Booked,
            SlotAction::Complete => ScheduleStatus::Completed,
            SlotAction::Cancel => ScheduleStatus::Cancelled,
            SlotAction::Reopen => ScheduleStatus::Available,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} a {entity} that is {from}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub action: String,
    pub from: String,
}

impl ScheduleStatus {
    /// Applies a manual action, returning the resulting status.
    pub fn apply(self, action: SlotAction) -> Result<ScheduleStatus, TransitionError> {
        if action.allowed_from().contains(&self) {
            Ok(action.target())
        } else {
            Err(TransitionError {
                entity: "schedule slot",
                action: action.to_string(),
                from: self.to_string(),
            })
        }
    }

    pub fn is_available(self) -> bool {
        self == ScheduleStatus::Available
    }
}

/// Lifecycle of a booking. Each state fixes the status of the booked slot.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }

    /// Validates a move to `next`.
    pub fn transition_to(self, next: BookingStatus) -> Result<BookingStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                entity: "booking",
                action: format!("move to {}", next),
                from: self.to_string(),
            })
        }
    }

    /// Status the linked slot must carry while the booking is in this state.
    pub fn slot_status(self) -> ScheduleStatus {
        match self {
            BookingStatus::Pending | BookingStatus::Confirmed => ScheduleStatus::Booked,
            BookingStatus::Completed => ScheduleStatus::Completed,
            BookingStatus::Cancelled => ScheduleStatus::Available,
        }
    }

    /// Whether the booking still holds its slot.
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rstest::rstest;
    use sea_orm::Iterable;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn splits_a_working_day_into_half_hours() {
        let slots = generate_slots(t(9, 0), t(18, 0), 30).unwrap();
        assert_eq!(slots.len(), 18);
        assert_eq!(slots[0], SlotWindow { start: t(9, 0), end: t(9, 30) });
        assert_eq!(slots[17].end, t(18, 0));
    }

    #[test]
    fn trailing_remainder_is_dropped() {
        let slots = generate_slots(t(9, 0), t(10, 50), 40).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].end, t(10, 20));
    }

    #[test]
    fn window_shorter_than_a_slot_yields_nothing() {
        assert!(generate_slots(t(9, 0), t(9, 20), 30).unwrap().is_empty());
    }

    #[rstest]
    #[case(0)]
    #[case(1441)]
    #[case(u32::MAX)]
    fn rejects_out_of_range_durations(#[case] duration: u32) {
        assert_matches!(
            generate_slots(t(9, 0), t(18, 0), duration),
            Err(SlotError::InvalidSlotDuration(d)) if d == duration
        );
    }

    #[rstest]
    #[case(t(9, 0), t(9, 0))]
    #[case(t(18, 0), t(9, 0))]
    fn rejects_empty_windows(#[case] open: NaiveTime, #[case] close: NaiveTime) {
        assert_matches!(
            generate_slots(open, close, 30),
            Err(SlotError::InvalidWorkingWindow { .. })
        );
    }

    proptest! {
        #[test]
        fn slots_tile_the_window(
            open_min in 0u32..1439,
            len in 1u32..1440,
            duration in 1u32..=1440,
        ) {
            let close_min = (open_min + len).min(1439);
            prop_assume!(close_min > open_min);
            let open = NaiveTime::from_num_seconds_from_midnight_opt(open_min * 60, 0).unwrap();
            let close = NaiveTime::from_num_seconds_from_midnight_opt(close_min * 60, 0).unwrap();

            let slots = generate_slots(open, close, duration).unwrap();

            prop_assert_eq!(slots.len() as u32, (close_min - open_min) / duration);
            let mut cursor = open;
            for slot in &slots {
                prop_assert_eq!(slot.start, cursor);
                prop_assert_eq!(slot.duration_minutes(), i64::from(duration));
                prop_assert!(slot.end <= close);
                cursor = slot.end;
            }
        }
    }

    #[rstest]
    #[case(ScheduleStatus::Available, SlotAction::Book, ScheduleStatus::Booked)]
    #[case(ScheduleStatus::Booked, SlotAction::Complete, ScheduleStatus::Completed)]
    #[case(ScheduleStatus::Booked, SlotAction::Cancel, ScheduleStatus::Cancelled)]
    #[case(ScheduleStatus::Available, SlotAction::Cancel, ScheduleStatus::Cancelled)]
    #[case(ScheduleStatus::Cancelled, SlotAction::Reopen, ScheduleStatus::Available)]
    fn allowed_slot_transitions(
        #[case] from: ScheduleStatus,
        #[case] action: SlotAction,
        #[case] expected: ScheduleStatus,
    ) {
        assert_eq!(from.apply(action), Ok(expected));
    }

    #[rstest]
    #[case(ScheduleStatus::Booked, SlotAction::Book)]
    #[case(ScheduleStatus::Available, SlotAction::Complete)]
    #[case(ScheduleStatus::Completed, SlotAction::Cancel)]
    #[case(ScheduleStatus::Completed, SlotAction::Reopen)]
    #[case(ScheduleStatus::Booked, SlotAction::Reopen)]
    fn rejected_slot_transitions(#[case] from: ScheduleStatus, #[case] action: SlotAction) {
        let err = from.apply(action).unwrap_err();
        assert_eq!(err.from, from.to_string());
        assert!(err.to_string().contains(&action.to_string()));
    }

    #[test]
    fn booking_status_drives_slot_status() {
        assert_eq!(BookingStatus::Pending.slot_status(), ScheduleStatus::Booked);
        assert_eq!(BookingStatus::Confirmed.slot_status(), ScheduleStatus::Booked);
        assert_eq!(BookingStatus::Completed.slot_status(), ScheduleStatus::Completed);
        assert_eq!(BookingStatus::Cancelled.slot_status(), ScheduleStatus::Available);
    }

    #[test]
    fn terminal_booking_states_have_no_exits() {
        for terminal in [BookingStatus::Completed, BookingStatus::Cancelled] {
            for next in BookingStatus::iter() {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[rstest]
    #[case(BookingStatus::Pending, BookingStatus::Confirmed, true)]
    #[case(BookingStatus::Pending, BookingStatus::Cancelled, true)]
    #[case(BookingStatus::Confirmed, BookingStatus::Completed, true)]
    #[case(BookingStatus::Confirmed, BookingStatus::Cancelled, true)]
    #[case(BookingStatus::Pending, BookingStatus::Completed, false)]
    #[case(BookingStatus::Confirmed, BookingStatus::Pending, false)]
    #[case(BookingStatus::Pending, BookingStatus::Pending, false)]
    fn booking_transition_table(
        #[case] from: BookingStatus,
        #[case] to: BookingStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
        assert_eq!(from.transition_to(to).is_ok(), allowed);
    }

    #[test]
    fn statuses_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&ScheduleStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            "confirmed".parse::<BookingStatus>().unwrap(),
            BookingStatus::Confirmed
        );
        assert_eq!("reopen".parse::<SlotAction>().unwrap(), SlotAction::Reopen);
        assert!("archive".parse::<SlotAction>().is_err());
    }
}
