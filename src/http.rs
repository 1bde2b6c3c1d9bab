use crate::availability::{BlockedDates, DayAvailability};
use crate::backend::CalendarBackend;
use crate::calendar::{self, ScheduleRequest, TimeIntervalsRequest};
use crate::configuration::Configuration;
use crate::error::Error;
use crate::pages;
use crate::registration::RegisterForm;
use crate::types::{Scheduling, TimeInterval, User};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::{extract::State, http::StatusCode, Json};
use axum::{
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlockedDatesQuery {
    year: Option<String>,
    month: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AvailabilityQuery {
    date: Option<String>,
}

pub fn create_app<T: CalendarBackend, C: Configuration>(backend: T, configuration: C) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/users", post(create_user::<T, C>))
        .route(
            "/api/users/:username/blocked-dates",
            get(get_blocked_dates::<T, C>),
        )
        .route(
            "/api/users/:username/availability",
            get(get_availability::<T, C>),
        )
        .route(
            "/api/users/:username/schedule",
            post(create_scheduling::<T, C>),
        )
        .route(
            "/api/users/:username/time-intervals",
            post(set_time_intervals::<T, C>),
        );

    Router::new()
        .merge(api)
        .merge(pages::routes::<T, C>())
        .with_state(AppState {
            backend,
            configuration,
        })
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn get_blocked_dates<T: CalendarBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(username): Path<String>,
    Query(query): Query<BlockedDatesQuery>,
) -> Result<Json<BlockedDates>, Error> {
    let blocked = calendar::blocked_dates(
        &state.backend,
        &username,
        query.year.as_deref(),
        query.month.as_deref(),
    )?;
    Ok(Json(blocked))
}

async fn get_availability<T: CalendarBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(username): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<DayAvailability>, Error> {
    let availability =
        calendar::day_availability(&state.backend, &username, query.date.as_deref(), Utc::now())?;
    Ok(Json(availability))
}

async fn create_user<T: CalendarBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), Error> {
    let Json(form) = payload?;
    let user = calendar::register_user(&state.backend, form)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn create_scheduling<T: CalendarBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(username): Path<String>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Scheduling>), Error> {
    let Json(request) = payload?;
    let scheduling = calendar::schedule(&state.backend, &username, request, Utc::now())?;
    Ok((StatusCode::CREATED, Json(scheduling)))
}

async fn set_time_intervals<T: CalendarBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(username): Path<String>,
    payload: Result<Json<TimeIntervalsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<TimeInterval>>), Error> {
    let Json(request) = payload?;
    let intervals = calendar::set_time_intervals(&state.backend, &username, request)?;
    Ok((StatusCode::CREATED, Json(intervals)))
}
