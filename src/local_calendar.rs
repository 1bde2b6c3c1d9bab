use crate::backend::CalendarBackend;
use crate::error::Error;
use crate::types::{NewScheduling, NewTimeInterval, NewUser, Scheduling, TimeInterval, User};
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Calendars {
    users: HashMap<Uuid, User>,
    time_intervals: Vec<TimeInterval>,
    schedulings: Vec<Scheduling>,
}

/// Non-persistent backend, used when no database is configured.
#[derive(Debug, Clone, Default)]
pub struct LocalCalendar {
    calendars: Arc<Mutex<Calendars>>,
}

impl LocalCalendar {
    fn lock(&self) -> MutexGuard<'_, Calendars> {
        self.calendars
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CalendarBackend for LocalCalendar {
    fn user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    fn create_user(&self, new_user: NewUser) -> Result<User, Error> {
        let mut calendars = self.lock();
        if calendars
            .users
            .values()
            .any(|user| user.username == new_user.username)
        {
            return Err(Error::UsernameTaken);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            name: new_user.name,
            bio: None,
            created_at: Utc::now(),
        };
        calendars.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn time_intervals(&self, user_id: Uuid) -> Result<Vec<TimeInterval>, Error> {
        Ok(self
            .lock()
            .time_intervals
            .iter()
            .filter(|interval| interval.user_id == user_id)
            .cloned()
            .collect())
    }

    fn replace_time_intervals(
        &self,
        user_id: Uuid,
        intervals: Vec<NewTimeInterval>,
    ) -> Result<Vec<TimeInterval>, Error> {
        let mut calendars = self.lock();
        calendars
            .time_intervals
            .retain(|interval| interval.user_id != user_id);

        let created: Vec<TimeInterval> = intervals
            .into_iter()
            .map(|interval| TimeInterval {
                id: Uuid::new_v4(),
                user_id: interval.user_id,
                week_day: interval.week_day,
                time_start_in_minutes: interval.time_start_in_minutes,
                time_end_in_minutes: interval.time_end_in_minutes,
            })
            .collect();
        calendars.time_intervals.extend(created.iter().cloned());
        Ok(created)
    }

    fn schedulings_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Scheduling>, Error> {
        let mut schedulings: Vec<Scheduling> = self
            .lock()
            .schedulings
            .iter()
            .filter(|scheduling| {
                scheduling.user_id == user_id && scheduling.date >= from && scheduling.date < to
            })
            .cloned()
            .collect();
        schedulings.sort_by_key(|scheduling| scheduling.date);
        Ok(schedulings)
    }

    fn create_scheduling(&self, new_scheduling: NewScheduling) -> Result<Scheduling, Error> {
        let mut calendars = self.lock();
        if calendars.schedulings.iter().any(|scheduling| {
            scheduling.user_id == new_scheduling.user_id && scheduling.date == new_scheduling.date
        }) {
            return Err(Error::SchedulingConflict);
        }

        let scheduling = Scheduling {
            id: Uuid::new_v4(),
            user_id: new_scheduling.user_id,
            date: new_scheduling.date,
            name: new_scheduling.name,
            email: new_scheduling.email,
            observations: new_scheduling.observations,
            created_at: Utc::now(),
        };
        calendars.schedulings.push(scheduling.clone());
        Ok(scheduling)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.into(),
            name: "Stefan Dangl".into(),
        }
    }

    fn new_scheduling(user_id: Uuid, date: DateTime<Utc>) -> NewScheduling {
        NewScheduling {
            user_id,
            date,
            name: "Peter".into(),
            email: "peter@example.com".into(),
            observations: None,
        }
    }

    #[test]
    fn test_create_and_find_user() {
        let local_calendar = LocalCalendar::default();
        assert_eq!(local_calendar.user_by_username("stefan").unwrap(), None);

        let user = local_calendar.create_user(new_user("stefan")).unwrap();
        assert_eq!(user.username, "stefan");
        assert_eq!(user.bio, None);

        let found = local_calendar.user_by_username("stefan").unwrap();
        assert_eq!(found, Some(user));
    }

    #[test]
    fn test_duplicate_username_is_rejected() {
        let local_calendar = LocalCalendar::default();
        local_calendar.create_user(new_user("stefan")).unwrap();

        let err = local_calendar.create_user(new_user("stefan")).unwrap_err();
        assert!(matches!(err, Error::UsernameTaken));
    }

    #[test]
    fn test_replace_time_intervals_only_touches_one_user() {
        let local_calendar = LocalCalendar::default();
        let stefan = local_calendar.create_user(new_user("stefan")).unwrap();
        let peter = local_calendar.create_user(new_user("peter")).unwrap();

        let interval = |user_id, week_day| NewTimeInterval {
            user_id,
            week_day,
            time_start_in_minutes: 8 * 60,
            time_end_in_minutes: 12 * 60,
        };

        local_calendar
            .replace_time_intervals(stefan.id, vec![interval(stefan.id, 1), interval(stefan.id, 2)])
            .unwrap();
        local_calendar
            .replace_time_intervals(peter.id, vec![interval(peter.id, 3)])
            .unwrap();
        local_calendar
            .replace_time_intervals(stefan.id, vec![interval(stefan.id, 5)])
            .unwrap();

        let stefan_intervals = local_calendar.time_intervals(stefan.id).unwrap();
        assert_eq!(stefan_intervals.len(), 1);
        assert_eq!(stefan_intervals[0].week_day, 5);
        assert_eq!(local_calendar.time_intervals(peter.id).unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_bookings_of_one_slot_conflict() {
        let local_calendar = LocalCalendar::default();
        let user = local_calendar.create_user(new_user("stefan")).unwrap();
        let date = Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let local_calendar = local_calendar.clone();
                std::thread::spawn(move || {
                    local_calendar.create_scheduling(new_scheduling(user.id, date))
                })
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|result| result.as_ref().err())
            .all(|err| matches!(err, Error::SchedulingConflict)));

        let other_user = local_calendar.create_user(new_user("peter")).unwrap();
        assert!(local_calendar
            .create_scheduling(new_scheduling(other_user.id, date))
            .is_ok());
    }

    #[test]
    fn test_schedulings_between_is_half_open_and_sorted() {
        let local_calendar = LocalCalendar::default();
        let user = local_calendar.create_user(new_user("stefan")).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();

        local_calendar
            .create_scheduling(new_scheduling(user.id, start + Duration::days(3)))
            .unwrap();
        local_calendar
            .create_scheduling(new_scheduling(user.id, start))
            .unwrap();
        local_calendar
            .create_scheduling(new_scheduling(user.id, end))
            .unwrap();

        let schedulings = local_calendar
            .schedulings_between(user.id, start, end)
            .unwrap();
        assert_eq!(schedulings.len(), 2);
        assert_eq!(schedulings[0].date, start);
        assert_eq!(schedulings[1].date, start + Duration::days(3));

        let other_user = Uuid::new_v4();
        assert!(local_calendar
            .schedulings_between(other_user, start, end)
            .unwrap()
            .is_empty());
    }
}
