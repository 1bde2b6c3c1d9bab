use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{
    backend::CalendarBackend,
    configuration::Configuration,
    error::Error,
    http::create_app,
    types::{NewScheduling, NewTimeInterval, NewUser, Scheduling, TimeInterval, User},
};

#[derive(Clone)]
pub struct TestConfiguration;

impl Configuration for TestConfiguration {
    fn website_title(&self) -> String {
        "Test Calendar".into()
    }

    fn port(&self) -> String {
        "0".into()
    }

    fn database_url(&self) -> Option<String> {
        None
    }
}

/// Serves the app on an ephemeral port, returning its base URL.
pub async fn spawn_app<T: CalendarBackend>(backend: T) -> (String, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    let app = create_app(backend, TestConfiguration);
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (address, server)
}

pub struct MockCalendarBackendInner {
    pub success: AtomicBool,
    pub calls_to_user_by_username: AtomicU64,
    pub calls_to_create_user: AtomicU64,
    pub calls_to_time_intervals: AtomicU64,
    pub calls_to_replace_time_intervals: AtomicU64,
    pub calls_to_schedulings_between: AtomicU64,
    pub calls_to_create_scheduling: AtomicU64,
    pub requested_ranges: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

/// Backend that knows a single user and counts the calls it receives.
#[derive(Clone)]
pub struct MockCalendarBackend(pub Arc<MockCalendarBackendInner>);

impl MockCalendarBackendInner {
    fn new() -> Self {
        Self {
            success: AtomicBool::new(true),
            calls_to_user_by_username: AtomicU64::default(),
            calls_to_create_user: AtomicU64::default(),
            calls_to_time_intervals: AtomicU64::default(),
            calls_to_replace_time_intervals: AtomicU64::default(),
            calls_to_schedulings_between: AtomicU64::default(),
            calls_to_create_scheduling: AtomicU64::default(),
            requested_ranges: Mutex::default(),
        }
    }
}

impl MockCalendarBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockCalendarBackendInner::new()))
    }

    fn result(&self) -> Result<(), Error> {
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(Error::Database(
                diesel::result::Error::BrokenTransactionManager,
            )),
        }
    }

    fn user(username: &str) -> User {
        User {
            id: Uuid::nil(),
            username: username.into(),
            name: "Stefan Dangl".into(),
            bio: None,
            created_at: Utc::now(),
        }
    }
}

impl CalendarBackend for MockCalendarBackend {
    fn user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.0
            .calls_to_user_by_username
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(Some(Self::user(username)))
    }

    fn create_user(&self, new_user: NewUser) -> Result<User, Error> {
        self.0.calls_to_create_user.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(Self::user(&new_user.username))
    }

    /// Every hour of the week is a slot.
    fn time_intervals(&self, user_id: Uuid) -> Result<Vec<TimeInterval>, Error> {
        self.0.calls_to_time_intervals.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok((0..7)
            .map(|week_day| TimeInterval {
                id: Uuid::nil(),
                user_id,
                week_day,
                time_start_in_minutes: 0,
                time_end_in_minutes: 24 * 60,
            })
            .collect())
    }

    fn replace_time_intervals(
        &self,
        _user_id: Uuid,
        _intervals: Vec<NewTimeInterval>,
    ) -> Result<Vec<TimeInterval>, Error> {
        self.0
            .calls_to_replace_time_intervals
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(vec![])
    }

    fn schedulings_between(
        &self,
        _user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Scheduling>, Error> {
        self.0
            .calls_to_schedulings_between
            .fetch_add(1, Ordering::SeqCst);
        self.0.requested_ranges.lock().unwrap().push((from, to));
        self.result()?;
        Ok(vec![])
    }

    fn create_scheduling(&self, new_scheduling: NewScheduling) -> Result<Scheduling, Error> {
        self.0
            .calls_to_create_scheduling
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        Ok(Scheduling {
            id: Uuid::new_v4(),
            user_id: new_scheduling.user_id,
            date: new_scheduling.date,
            name: new_scheduling.name,
            email: new_scheduling.email,
            observations: new_scheduling.observations,
            created_at: Utc::now(),
        })
    }
}
