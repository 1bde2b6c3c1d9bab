use crate::backend::CalendarBackend;
use crate::error::Error;
use crate::schema::{schedulings, user_time_intervals, users};
use crate::types::{NewScheduling, NewTimeInterval, NewUser, Scheduling, TimeInterval, User};
use chrono::{DateTime, Utc};
use diesel::{
    Connection, ConnectionError, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl,
    RunQueryDsl, SelectableHelper,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::instrument;
use uuid::Uuid;

#[derive(Clone)]
pub struct DatabaseInterface {
    connection: Arc<Mutex<PgConnection>>,
}

impl DatabaseInterface {
    pub fn new(database_url: &str) -> Result<Self, ConnectionError> {
        let connection = Self::establish_connection(database_url)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn establish_connection(database_url: &str) -> Result<PgConnection, ConnectionError> {
        PgConnection::establish(database_url)
    }

    fn connection(&self) -> MutexGuard<'_, PgConnection> {
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CalendarBackend for DatabaseInterface {
    #[instrument(skip(self))]
    fn user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        let mut connection = self.connection();
        let user = users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(&mut *connection)
            .optional()?;
        Ok(user)
    }

    #[instrument(skip(self))]
    fn create_user(&self, new_user: NewUser) -> Result<User, Error> {
        let mut connection = self.connection();
        let user = diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut *connection)?;
        Ok(user)
    }

    #[instrument(skip(self))]
    fn time_intervals(&self, user_id: Uuid) -> Result<Vec<TimeInterval>, Error> {
        let mut connection = self.connection();
        let intervals = user_time_intervals::table
            .filter(user_time_intervals::user_id.eq(user_id))
            .order((
                user_time_intervals::week_day.asc(),
                user_time_intervals::time_start_in_minutes.asc(),
            ))
            .select(TimeInterval::as_select())
            .load(&mut *connection)?;
        Ok(intervals)
    }

    #[instrument(skip(self, intervals))]
    fn replace_time_intervals(
        &self,
        user_id: Uuid,
        intervals: Vec<NewTimeInterval>,
    ) -> Result<Vec<TimeInterval>, Error> {
        let mut connection = self.connection();
        let created = connection.transaction::<_, diesel::result::Error, _>(|connection| {
            diesel::delete(
                user_time_intervals::table.filter(user_time_intervals::user_id.eq(user_id)),
            )
            .execute(connection)?;

            if intervals.is_empty() {
                return Ok(vec![]);
            }
            diesel::insert_into(user_time_intervals::table)
                .values(&intervals)
                .returning(TimeInterval::as_returning())
                .get_results(connection)
        })?;
        Ok(created)
    }

    #[instrument(skip(self))]
    fn schedulings_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Scheduling>, Error> {
        let mut connection = self.connection();
        let schedulings = schedulings::table
            .filter(schedulings::user_id.eq(user_id))
            .filter(schedulings::date.ge(from))
            .filter(schedulings::date.lt(to))
            .order(schedulings::date.asc())
            .select(Scheduling::as_select())
            .load(&mut *connection)?;
        Ok(schedulings)
    }

    #[instrument(skip(self))]
    fn create_scheduling(&self, new_scheduling: NewScheduling) -> Result<Scheduling, Error> {
        let mut connection = self.connection();
        let scheduling = diesel::insert_into(schedulings::table)
            .values(&new_scheduling)
            .returning(Scheduling::as_returning())
            .get_result(&mut *connection)?;
        Ok(scheduling)
    }
}
