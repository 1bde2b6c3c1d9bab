use crate::error::Error;
use crate::types::{NewScheduling, NewTimeInterval, NewUser, Scheduling, TimeInterval, User};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub trait CalendarBackend: Clone + Send + Sync + 'static {
    fn user_by_username(&self, username: &str) -> Result<Option<User>, Error>;
    /// Fails with [`Error::UsernameTaken`] if the username is already registered.
    fn create_user(&self, new_user: NewUser) -> Result<User, Error>;
    fn time_intervals(&self, user_id: Uuid) -> Result<Vec<TimeInterval>, Error>;
    fn replace_time_intervals(
        &self,
        user_id: Uuid,
        intervals: Vec<NewTimeInterval>,
    ) -> Result<Vec<TimeInterval>, Error>;
    /// Schedulings of a user with `from <= date < to`, ordered by date.
    fn schedulings_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Scheduling>, Error>;
    /// Fails with [`Error::SchedulingConflict`] if the user already has a scheduling at that date.
    fn create_scheduling(&self, new_scheduling: NewScheduling) -> Result<Scheduling, Error>;
}
