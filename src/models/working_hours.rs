use chrono::{NaiveTime, Weekday};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opening hours of a single weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DayHours {
    #[serde(default = "default_working_day")]
    pub is_working_day: bool,
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "09:00")]
    pub start: Option<NaiveTime>,
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "18:00")]
    pub end: Option<NaiveTime>,
}

fn default_working_day() -> bool {
    true
}

impl DayHours {
    pub fn open(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            is_working_day: true,
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn closed() -> Self {
        Self {
            is_working_day: false,
            start: None,
            end: None,
        }
    }

    /// The `(open, close)` window, if the day is a working one with both bounds set.
    pub fn window(&self) -> Option<(NaiveTime, NaiveTime)> {
        if !self.is_working_day {
            return None;
        }
        Some((self.start?, self.end?))
    }
}

/// Weekly working-hours document stored as JSON on the service point.
///
/// Days that are absent count as closed.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema,
)]
#[schema(example = json!({
    "monday": {"start": "09:00", "end": "18:00", "is_working_day": true},
    "tuesday": {"start": "09:00", "end": "18:00", "is_working_day": true},
    "saturday": {"start": "10:00", "end": "16:00", "is_working_day": true},
    "sunday": {"is_working_day": false}
}))]
pub struct WorkingHours {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monday: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuesday: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wednesday: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thursday: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friday: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturday: Option<DayHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunday: Option<DayHours>,
}

impl WorkingHours {
    /// Same hours every weekday, weekends closed.
    pub fn weekdays(start: NaiveTime, end: NaiveTime) -> Self {
        let day = Some(DayHours::open(start, end));
        Self {
            monday: day,
            tuesday: day,
            wednesday: day,
            thursday: day,
            friday: day,
            saturday: Some(DayHours::closed()),
            sunday: Some(DayHours::closed()),
        }
    }

    pub fn day(&self, weekday: Weekday) -> Option<&DayHours> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }

    /// Opening window for `weekday`, `None` when the point is closed that day.
    pub fn window_for(&self, weekday: Weekday) -> Option<(NaiveTime, NaiveTime)> {
        self.day(weekday).and_then(DayHours::window)
    }

    /// Checks that every working day has both bounds and opens before it closes.
    pub fn check(&self) -> Result<(), String> {
        let mut problems = Vec::new();
        for weekday in ALL_WEEKDAYS {
            let Some(day) = self.day(weekday) else {
                continue;
            };
            if !day.is_working_day {
                continue;
            }
            match (day.start, day.end) {
                (Some(start), Some(end)) if start < end => {}
                (Some(_), Some(_)) => problems.push(format!(
                    "{}: start must be earlier than end",
                    weekday_name(weekday)
                )),
                _ => problems.push(format!(
                    "{}: working day requires start and end",
                    weekday_name(weekday)
                )),
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}

pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Lower-case English weekday name, matching the JSON keys.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// `HH:MM` for optional times. `HH:MM:00` is accepted on input; any other
/// seconds value is rejected since it could not be written back.
mod hhmm {
    use chrono::{NaiveTime, Timelike};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&time.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => {
                let time = NaiveTime::parse_from_str(text, FORMAT)
                    .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
                    .map_err(|_| {
                        D::Error::custom(format!("invalid time '{}', expected HH:MM", text))
                    })?;
                if time.second() != 0 || time.nanosecond() != 0 {
                    return Err(D::Error::custom(format!(
                        "invalid time '{}', seconds are not supported",
                        text
                    )));
                }
                Ok(Some(time))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_the_stored_document() {
        let hours: WorkingHours = serde_json::from_value(json!({
            "monday": {"start": "09:00", "end": "18:00", "is_working_day": true},
            "saturday": {"start": "10:00:00", "end": "14:30"},
            "sunday": {"is_working_day": false}
        }))
        .unwrap();

        assert_eq!(hours.window_for(Weekday::Mon), Some((t(9, 0), t(18, 0))));
        assert_eq!(hours.window_for(Weekday::Sat), Some((t(10, 0), t(14, 30))));
        assert_eq!(hours.window_for(Weekday::Sun), None);
        assert_eq!(hours.window_for(Weekday::Tue), None);
    }

    #[test]
    fn serializes_times_as_hours_and_minutes() {
        let hours = WorkingHours {
            friday: Some(DayHours::open(t(8, 0), t(20, 15))),
            ..Default::default()
        };
        let value = serde_json::to_value(&hours).unwrap();
        assert_eq!(
            value,
            json!({"friday": {"is_working_day": true, "start": "08:00", "end": "20:15"}})
        );
    }

    #[test]
    fn check_flags_inverted_and_incomplete_days() {
        let hours = WorkingHours {
            monday: Some(DayHours::open(t(18, 0), t(9, 0))),
            tuesday: Some(DayHours {
                is_working_day: true,
                start: Some(t(9, 0)),
                end: None,
            }),
            wednesday: Some(DayHours::closed()),
            ..Default::default()
        };

        let err = hours.check().unwrap_err();
        assert!(err.contains("monday"));
        assert!(err.contains("tuesday"));
        assert!(!err.contains("wednesday"));
    }

    #[test]
    fn rejects_malformed_times() {
        let result: Result<WorkingHours, _> =
            serde_json::from_value(json!({"monday": {"start": "9am", "end": "18:00"}}));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_times_with_seconds() {
        let result: Result<WorkingHours, _> =
            serde_json::from_value(json!({"monday": {"start": "10:00:30", "end": "18:00"}}));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("seconds are not supported"), "{err}");
    }

    #[test]
    fn weekdays_helper_closes_weekend() {
        let hours = WorkingHours::weekdays(t(9, 0), t(17, 0));
        assert!(hours.check().is_ok());
        assert_eq!(hours.window_for(Weekday::Sat), None);
        assert_eq!(hours.window_for(Weekday::Wed), Some((t(9, 0), t(17, 0))));
    }
}
