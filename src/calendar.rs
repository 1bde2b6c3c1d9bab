//! Calendar operations shared by the JSON API and the HTML pages.

use crate::availability::{self, BlockedDates, DayAvailability, SLOT_MINUTES};
use crate::backend::CalendarBackend;
use crate::error::Error;
use crate::registration::RegisterForm;
use crate::types::{NewScheduling, NewTimeInterval, Scheduling, TimeInterval, User};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[validate(length(min = 3, message = "Name must have at least 3 characters."))]
    pub name: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[serde(default)]
    pub observations: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TimeIntervalRequest {
    #[validate(range(min = 0, max = 6, message = "Week day must be between 0 and 6."))]
    pub week_day: i32,
    #[validate(range(min = 0, max = 1440, message = "Start time must be within the day."))]
    pub start_time_in_minutes: i32,
    #[validate(range(min = 0, max = 1440, message = "End time must be within the day."))]
    pub end_time_in_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeIntervalsRequest {
    pub intervals: Vec<TimeIntervalRequest>,
}

fn parse_year_month(year: Option<&str>, month: Option<&str>) -> Result<(i32, u32), Error> {
    let (Some(year), Some(month)) = (year, month) else {
        return Err(Error::InvalidDate);
    };
    let year = year.trim().parse::<i32>().map_err(|_| Error::InvalidDate)?;
    let month = month.trim().parse::<u32>().map_err(|_| Error::InvalidDate)?;
    if !(1..=12).contains(&month) {
        return Err(Error::InvalidDate);
    }
    Ok((year, month))
}

pub fn find_user<T: CalendarBackend>(backend: &T, username: &str) -> Result<Option<User>, Error> {
    backend.user_by_username(username)
}

#[instrument(skip(backend))]
pub fn blocked_dates<T: CalendarBackend>(
    backend: &T,
    username: &str,
    year: Option<&str>,
    month: Option<&str>,
) -> Result<BlockedDates, Error> {
    let (year, month) = parse_year_month(year, month)?;
    let user = backend
        .user_by_username(username)?
        .ok_or(Error::UserNotFound)?;

    let intervals = backend.time_intervals(user.id)?;
    let (from, to) = availability::month_bounds(year, month).ok_or(Error::InvalidDate)?;
    let schedulings = backend.schedulings_between(user.id, from, to)?;

    let blocked = BlockedDates {
        blocked_week_days: availability::blocked_week_days(&intervals),
        blocked_dates: availability::blocked_dates(&intervals, &schedulings, year, month),
    };
    debug!(?blocked, "resolved blocked dates");
    Ok(blocked)
}

#[instrument(skip(backend, now))]
pub fn day_availability<T: CalendarBackend>(
    backend: &T,
    username: &str,
    date: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DayAvailability, Error> {
    let date = date
        .and_then(|date| NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok())
        .ok_or(Error::DateNotProvided)?;
    let user = backend
        .user_by_username(username)?
        .ok_or(Error::UserDoesNotExist)?;

    let intervals = backend.time_intervals(user.id)?;
    let (from, to) = availability::day_bounds(date);
    let schedulings = backend.schedulings_between(user.id, from, to)?;

    Ok(availability::day_availability(
        &intervals,
        &schedulings,
        date,
        now,
    ))
}

#[instrument(skip(backend, form))]
pub fn register_user<T: CalendarBackend>(backend: &T, form: RegisterForm) -> Result<User, Error> {
    let new_user = form.into_new_user()?;
    let user = backend.create_user(new_user)?;
    info!(username = %user.username, "registered user");
    Ok(user)
}

#[instrument(skip(backend, request, now))]
pub fn schedule<T: CalendarBackend>(
    backend: &T,
    username: &str,
    request: ScheduleRequest,
    now: DateTime<Utc>,
) -> Result<Scheduling, Error> {
    let user = backend
        .user_by_username(username)?
        .ok_or(Error::UserDoesNotExist)?;
    request.validate()?;

    let date = availability::start_of_hour(request.date);
    if date < now {
        return Err(Error::DateInPast);
    }

    let intervals = backend.time_intervals(user.id)?;
    if !availability::is_slot_start(&intervals, date) {
        return Err(Error::TimeNotAvailable);
    }

    let slot_end = date + Duration::minutes(SLOT_MINUTES.into());
    let conflicting = backend.schedulings_between(user.id, date, slot_end)?;
    if !conflicting.is_empty() {
        return Err(Error::SchedulingConflict);
    }

    let scheduling = backend.create_scheduling(NewScheduling {
        user_id: user.id,
        date,
        name: request.name,
        email: request.email,
        observations: request
            .observations
            .filter(|observations| !observations.trim().is_empty()),
    })?;
    info!(%date, "created scheduling");
    Ok(scheduling)
}

#[instrument(skip(backend, request))]
pub fn set_time_intervals<T: CalendarBackend>(
    backend: &T,
    username: &str,
    request: TimeIntervalsRequest,
) -> Result<Vec<TimeInterval>, Error> {
    let user = backend
        .user_by_username(username)?
        .ok_or(Error::UserDoesNotExist)?;

    let mut intervals = Vec::with_capacity(request.intervals.len());
    for interval in request.intervals {
        interval.validate()?;
        if interval.end_time_in_minutes - interval.start_time_in_minutes < SLOT_MINUTES {
            let mut error = ValidationError::new("interval-length");
            error.message = Some("End time must be at least one hour after start time.".into());
            let mut errors = ValidationErrors::new();
            errors.add("end_time_in_minutes", error);
            return Err(errors.into());
        }
        intervals.push(NewTimeInterval {
            user_id: user.id,
            week_day: interval.week_day,
            time_start_in_minutes: interval.start_time_in_minutes,
            time_end_in_minutes: interval.end_time_in_minutes,
        });
    }

    backend.replace_time_intervals(user.id, intervals)
}
