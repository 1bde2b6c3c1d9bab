//! Slot arithmetic over weekly availability windows.
//!
//! Slots are whole hours. A weekday's slots are the distinct hours `h` that fit
//! completely inside at least one of the weekday's windows, so overlapping or
//! repeated windows never inflate the capacity of a day.

use crate::types::{Scheduling, TimeInterval};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub const SLOT_MINUTES: i32 = 60;
pub const DAYS_IN_WEEK: i32 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedDates {
    pub blocked_week_days: Vec<i32>,
    pub blocked_dates: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub possible_times: Vec<u32>,
    pub available_times: Vec<u32>,
}

/// Day of the week counted from Sunday (0) to Saturday (6).
pub fn week_day(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

pub fn slot_hours(intervals: &[TimeInterval], week_day: i32) -> BTreeSet<u32> {
    let mut hours = BTreeSet::new();
    for interval in intervals.iter().filter(|i| i.week_day == week_day) {
        let first_hour = (interval.time_start_in_minutes.max(0) + SLOT_MINUTES - 1) / SLOT_MINUTES;
        let mut hour = first_hour;
        while hour * SLOT_MINUTES + SLOT_MINUTES <= interval.time_end_in_minutes {
            hours.insert(hour as u32);
            hour += 1;
        }
    }
    hours
}

pub fn blocked_week_days(intervals: &[TimeInterval]) -> Vec<i32> {
    (0..DAYS_IN_WEEK)
        .filter(|day| !intervals.iter().any(|interval| interval.week_day == *day))
        .collect()
}

/// Days of `year`/`month` whose slots are all booked.
///
/// Only bookings on a slot of their weekday take capacity. Days whose weekday
/// has no slot at all are left to [`blocked_week_days`].
pub fn blocked_dates(
    intervals: &[TimeInterval],
    schedulings: &[Scheduling],
    year: i32,
    month: u32,
) -> Vec<u32> {
    let mut booked_hours_per_day: BTreeMap<u32, HashSet<u32>> = BTreeMap::new();
    for scheduling in schedulings {
        let date = scheduling.date.date_naive();
        if date.year() == year && date.month() == month {
            booked_hours_per_day
                .entry(date.day())
                .or_default()
                .insert(scheduling.date.hour());
        }
    }

    booked_hours_per_day
        .into_iter()
        .filter_map(|(day, booked_hours)| {
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            let slots = slot_hours(intervals, week_day(date));
            let fully_booked = !slots.is_empty()
                && slots.iter().all(|hour| booked_hours.contains(hour));
            fully_booked.then_some(day)
        })
        .collect()
}

/// Whether `date` is the start of one of its weekday's slots.
pub fn is_slot_start(intervals: &[TimeInterval], date: DateTime<Utc>) -> bool {
    date == start_of_hour(date)
        && slot_hours(intervals, week_day(date.date_naive())).contains(&date.hour())
}

pub fn day_availability(
    intervals: &[TimeInterval],
    schedulings: &[Scheduling],
    date: NaiveDate,
    now: DateTime<Utc>,
) -> DayAvailability {
    let (_, end_of_day) = day_bounds(date);
    if end_of_day <= now {
        return DayAvailability::default();
    }

    let possible_times: Vec<u32> = slot_hours(intervals, week_day(date)).into_iter().collect();
    let booked_hours: HashSet<u32> = schedulings
        .iter()
        .filter(|scheduling| scheduling.date.date_naive() == date)
        .map(|scheduling| scheduling.date.hour())
        .collect();

    let available_times = possible_times
        .iter()
        .copied()
        .filter(|hour| !booked_hours.contains(hour))
        .filter(|hour| slot_start(date, *hour).is_some_and(|start| start > now))
        .collect();

    DayAvailability {
        possible_times,
        available_times,
    }
}

pub fn slot_start(date: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
    date.and_hms_opt(hour, 0, 0).map(|start| start.and_utc())
}

/// Truncates a timestamp to the start of its hour.
pub fn start_of_hour(date: DateTime<Utc>) -> DateTime<Utc> {
    date.with_minute(0)
        .and_then(|date| date.with_second(0))
        .and_then(|date| date.with_nanosecond(0))
        .unwrap_or(date)
}

/// Half-open UTC range covering `date`.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Half-open UTC range covering `year`/`month`, `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((day_bounds(first).0, day_bounds(next).0))
}
