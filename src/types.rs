use crate::schema::{schedulings, user_time_intervals, users};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub name: String,
}

/// Weekly availability window. `week_day` counts from Sunday (0) to Saturday (6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = user_time_intervals)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_day: i32,
    pub time_start_in_minutes: i32,
    pub time_end_in_minutes: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_time_intervals)]
pub struct NewTimeInterval {
    pub user_id: Uuid,
    pub week_day: i32,
    pub time_start_in_minutes: i32,
    pub time_end_in_minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = schedulings)]
#[serde(rename_all = "camelCase")]
pub struct Scheduling {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schedulings)]
pub struct NewScheduling {
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub observations: Option<String>,
}
