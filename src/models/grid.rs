use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::schedule::{generate_slots, SlotError, SlotWindow};
use super::working_hours::{weekday_name, WorkingHours};

/// The parts of a service post the grid needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSpec {
    pub id: Uuid,
    pub name: String,
    pub post_number: i32,
    pub slot_duration_minutes: u32,
}

/// Slots one post would get on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlannedSlot {
    pub post_id: Uuid,
    pub post_name: String,
    pub post_number: i32,
    pub slot_duration_minutes: u32,
    pub slots: Vec<SlotWindow>,
}

/// Time grid of a service point for a single date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DayPlan {
    pub date: NaiveDate,
    #[schema(example = "monday")]
    pub weekday: String,
    pub is_working_day: bool,
    #[schema(value_type = Option<String>, example = "09:00:00")]
    pub opens_at: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "18:00:00")]
    pub closes_at: Option<NaiveTime>,
    pub posts: Vec<PlannedSlot>,
    pub total_slots: usize,
}

/// Lays out the slot grid of every post for `date`.
///
/// `duration_override` replaces each post's own slot length. Closed days
/// produce an empty plan rather than an error.
pub fn plan_day(
    hours: &WorkingHours,
    date: NaiveDate,
    posts: &[PostSpec],
    duration_override: Option<u32>,
) -> Result<DayPlan, SlotError> {
    let weekday = date.weekday();
    let window = hours.window_for(weekday);

    let mut planned = Vec::with_capacity(posts.len());
    if let Some((open, close)) = window {
        for post in posts {
            let duration = duration_override.unwrap_or(post.slot_duration_minutes);
            let slots = generate_slots(open, close, duration)?;
            planned.push(PlannedSlot {
                post_id: post.id,
                post_name: post.name.clone(),
                post_number: post.post_number,
                slot_duration_minutes: duration,
                slots,
            });
        }
    }

    let total_slots = planned.iter().map(|p| p.slots.len()).sum();

    Ok(DayPlan {
        date,
        weekday: weekday_name(weekday).to_string(),
        is_working_day: window.is_some(),
        opens_at: window.map(|(open, _)| open),
        closes_at: window.map(|(_, close)| close),
        posts: planned,
        total_slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::working_hours::DayHours;
    use assert_matches::assert_matches;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn post(number: i32, duration: u32) -> PostSpec {
        PostSpec {
            id: Uuid::new_v4(),
            name: format!("Bay {}", number),
            post_number: number,
            slot_duration_minutes: duration,
        }
    }

    // 2024-06-03 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn each_post_uses_its_own_duration() {
        let hours = WorkingHours::weekdays(t(9, 0), t(12, 0));
        let plan = plan_day(&hours, monday(), &[post(1, 30), post(2, 60)], None).unwrap();

        assert!(plan.is_working_day);
        assert_eq!(plan.weekday, "monday");
        assert_eq!(plan.posts[0].slots.len(), 6);
        assert_eq!(plan.posts[1].slots.len(), 3);
        assert_eq!(plan.total_slots, 9);
    }

    #[test]
    fn override_applies_to_every_post() {
        let hours = WorkingHours::weekdays(t(9, 0), t(12, 0));
        let plan = plan_day(&hours, monday(), &[post(1, 30), post(2, 60)], Some(45)).unwrap();

        assert!(plan.posts.iter().all(|p| p.slot_duration_minutes == 45));
        assert_eq!(plan.total_slots, 8);
    }

    #[test]
    fn closed_day_has_no_slots() {
        let hours = WorkingHours {
            monday: Some(DayHours::closed()),
            ..Default::default()
        };
        let plan = plan_day(&hours, monday(), &[post(1, 30)], None).unwrap();

        assert!(!plan.is_working_day);
        assert!(plan.posts.is_empty());
        assert_eq!(plan.opens_at, None);
    }

    #[test]
    fn invalid_duration_surfaces_as_error() {
        let hours = WorkingHours::weekdays(t(9, 0), t(12, 0));
        assert_matches!(
            plan_day(&hours, monday(), &[post(1, 0)], None),
            Err(SlotError::InvalidSlotDuration(0))
        );
    }
}
