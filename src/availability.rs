//! Weekday availability → calendar dates.
//!
//! Centers publish weekly slots by weekday name. Patients book concrete
//! dates, so each slot is shown with the next date it falls on. "Today" is
//! the server's local date; there is no timezone normalization.

use chrono::{Datelike, Duration, Local, NaiveDate};
use thiserror::Error;

use crate::models::{AvailabilitySlot, DatedSlot};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("Unknown weekday: {0}")]
    UnknownWeekday(String),
}

/// Sunday = 0 … Saturday = 6. Accepts full and three-letter names, any case.
pub fn weekday_index(name: &str) -> Result<u32, AvailabilityError> {
    let index = match name.trim().to_ascii_lowercase().as_str() {
        "sunday" | "sun" => 0,
        "monday" | "mon" => 1,
        "tuesday" | "tue" | "tues" => 2,
        "wednesday" | "wed" => 3,
        "thursday" | "thu" | "thurs" => 4,
        "friday" | "fri" => 5,
        "saturday" | "sat" => 6,
        _ => return Err(AvailabilityError::UnknownWeekday(name.to_string())),
    };
    Ok(index)
}

/// Next date on or after `today` that falls on `weekday`.
///
/// When `today` already is that weekday the result is `today` (offset 0),
/// so a same-day slot is still bookable.
pub fn next_date_for_weekday(
    today: NaiveDate,
    weekday: &str,
) -> Result<NaiveDate, AvailabilityError> {
    let target = weekday_index(weekday)? as i64;
    let current = today.weekday().num_days_from_sunday() as i64;
    let mut offset = target - current;
    if offset < 0 {
        offset += 7;
    }
    Ok(today + Duration::days(offset))
}

/// Attach the next calendar date to each slot, relative to `today`.
///
/// Rows whose `day` is not a weekday name are stored data we cannot place;
/// they are skipped with a warning.
pub fn date_slots(today: NaiveDate, slots: Vec<AvailabilitySlot>) -> Vec<DatedSlot> {
    slots
        .into_iter()
        .filter_map(|slot| match next_date_for_weekday(today, &slot.day) {
            Ok(next_date) => Some(DatedSlot { slot, next_date }),
            Err(e) => {
                tracing::warn!(center_id = %slot.center_id, day = %slot.day, "skipping slot: {e}");
                None
            }
        })
        .collect()
}

/// Server-local current date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // 2026-10-16 is a Friday.
    const FRIDAY: &str = "2026-10-16";

    #[test]
    fn same_weekday_is_today() {
        assert_eq!(next_date_for_weekday(date(FRIDAY), "Friday").unwrap(), date(FRIDAY));
    }

    #[test]
    fn later_weekday_in_same_week() {
        assert_eq!(
            next_date_for_weekday(date(FRIDAY), "Saturday").unwrap(),
            date("2026-10-17")
        );
    }

    #[test]
    fn earlier_weekday_wraps_to_next_week() {
        assert_eq!(
            next_date_for_weekday(date(FRIDAY), "Monday").unwrap(),
            date("2026-10-19")
        );
        assert_eq!(
            next_date_for_weekday(date(FRIDAY), "thursday").unwrap(),
            date("2026-10-22")
        );
    }

    #[test]
    fn wraps_across_month_and_year() {
        // 2026-12-31 is a Thursday.
        assert_eq!(
            next_date_for_weekday(date("2026-12-31"), "Tue").unwrap(),
            date("2027-01-05")
        );
    }

    #[test]
    fn result_is_always_within_a_week() {
        let today = date(FRIDAY);
        for day in ["sun", "mon", "tue", "wed", "thu", "fri", "sat"] {
            let next = next_date_for_weekday(today, day).unwrap();
            let offset = (next - today).num_days();
            assert!((0..7).contains(&offset), "{day}: offset {offset}");
            assert_eq!(next.weekday().num_days_from_sunday(), weekday_index(day).unwrap());
        }
    }

    #[test]
    fn unknown_weekday_is_rejected() {
        assert_eq!(
            next_date_for_weekday(date(FRIDAY), "Funday"),
            Err(AvailabilityError::UnknownWeekday("Funday".into()))
        );
    }

    #[test]
    fn date_slots_keeps_slot_fields() {
        let center_id = Uuid::new_v4();
        let slots = vec![AvailabilitySlot {
            id: None,
            center_id,
            day: "Sunday".into(),
            start_time: "09:00".into(),
            end_time: "13:00".into(),
        }];
        let dated = date_slots(date(FRIDAY), slots);
        assert_eq!(dated[0].next_date, date("2026-10-18"));
        assert_eq!(dated[0].slot.start_time, "09:00");
    }

    #[test]
    fn date_slots_skips_unplaceable_days() {
        let center_id = Uuid::new_v4();
        let slot = |day: &str| AvailabilitySlot {
            id: None,
            center_id,
            day: day.into(),
            start_time: "09:00".into(),
            end_time: "13:00".into(),
        };
        let dated = date_slots(date(FRIDAY), vec![slot("Holiday"), slot("sat")]);
        assert_eq!(dated.len(), 1);
        assert_eq!(dated[0].slot.day, "sat");
        assert_eq!(dated[0].next_date, date("2026-10-17"));
    }
}
