//! Server-rendered onboarding and scheduling pages.

use crate::availability::{self, week_day};
use crate::backend::CalendarBackend;
use crate::calendar::{self, ScheduleRequest};
use crate::configuration::Configuration;
use crate::error::Error;
use crate::registration::{field_messages, RegisterForm, NEXT_ONBOARDING_STEP, ONBOARDING_STEPS};
use crate::schedule_flow::ScheduleFlow;
use crate::types::User;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use chrono::{DateTime, Datelike, Months, NaiveDate, SecondsFormat, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tera::{Context, Tera};
use tracing::error;

lazy_static! {
    static ref TERA: Tera = {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", include_str!("../templates/base.html")),
            ("register.html", include_str!("../templates/register.html")),
            ("connect_calendar.html", include_str!("../templates/connect_calendar.html")),
            ("calendar_step.html", include_str!("../templates/calendar_step.html")),
            ("confirm_step.html", include_str!("../templates/confirm_step.html")),
            ("not_found.html", include_str!("../templates/not_found.html")),
        ])
        .unwrap();
        tera
    };
}

#[derive(Debug, Clone, Deserialize)]
struct RegisterQuery {
    username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScheduleQuery {
    date: Option<String>,
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfirmForm {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    observations: String,
}

#[derive(Debug, Serialize)]
struct CalendarDay {
    day: u32,
    date: String,
    disabled: bool,
    selected: bool,
}

#[derive(Debug, Serialize)]
struct TimeOption {
    label: String,
    href: String,
    available: bool,
}

pub fn routes<T: CalendarBackend, C: Configuration>() -> Router<AppState<T, C>> {
    Router::new()
        .route("/register", get(get_register::<T, C>).post(post_register::<T, C>))
        .route("/register/connect-calendar", get(get_connect_calendar::<T, C>))
        .route(
            "/schedule/:username",
            get(get_schedule::<T, C>).post(post_schedule::<T, C>),
        )
}

fn render(status: StatusCode, name: &str, context: &Context) -> Result<Response, Error> {
    let body = TERA.render(name, context)?;
    Ok((status, Html(body)).into_response())
}

fn base_context<C: Configuration>(configuration: &C) -> Context {
    let mut context = Context::new();
    context.insert("website_title", &configuration.website_title());
    context
}

fn format_date_time(date_time: DateTime<Utc>) -> String {
    date_time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Link to the scheduling page showing `flow`, the picker opening on `date`.
fn flow_href(username: &str, flow: ScheduleFlow, date: NaiveDate) -> String {
    match flow.selected_date_time() {
        Some(date_time) => format!(
            "/schedule/{username}?dateTime={}",
            format_date_time(date_time)
        ),
        None => format!("/schedule/{username}?date={date}"),
    }
}

fn render_register<C: Configuration>(
    configuration: &C,
    status: StatusCode,
    form: &RegisterForm,
    errors: BTreeMap<String, String>,
    message: Option<String>,
) -> Result<Response, Error> {
    let mut context = base_context(configuration);
    context.insert("form", form);
    context.insert("errors", &errors);
    context.insert("message", &message);
    context.insert("current_step", &1);
    context.insert("steps", &ONBOARDING_STEPS);
    render(status, "register.html", &context)
}

async fn get_register<T: CalendarBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Query(query): Query<RegisterQuery>,
) -> Result<Response, Error> {
    let form = RegisterForm {
        username: query.username.unwrap_or_default(),
        name: String::new(),
    };
    render_register(&state.configuration, StatusCode::OK, &form, BTreeMap::new(), None)
}

async fn post_register<T: CalendarBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, Error> {
    let configuration = &state.configuration;
    match calendar::register_user(&state.backend, form.clone()) {
        Ok(_) => Ok(Redirect::to(NEXT_ONBOARDING_STEP).into_response()),
        Err(Error::Validation(errors)) => render_register(
            configuration,
            StatusCode::UNPROCESSABLE_ENTITY,
            &form,
            field_messages(&errors),
            None,
        ),
        Err(err) if err.is_client_error() => render_register(
            configuration,
            err.status_code(),
            &form,
            BTreeMap::new(),
            Some(err.to_string()),
        ),
        Err(err) => {
            error!(%err, "Registration failed");
            render_register(
                configuration,
                StatusCode::INTERNAL_SERVER_ERROR,
                &form,
                BTreeMap::new(),
                None,
            )
        }
    }
}

async fn get_connect_calendar<T: CalendarBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
) -> Result<Response, Error> {
    let mut context = base_context(&state.configuration);
    context.insert("current_step", &2);
    context.insert("steps", &ONBOARDING_STEPS);
    render(StatusCode::OK, "connect_calendar.html", &context)
}

fn render_user_not_found<C: Configuration>(configuration: &C, username: &str) -> Result<Response, Error> {
    let mut context = base_context(configuration);
    context.insert("message", &format!("No calendar for '{username}'."));
    render(StatusCode::NOT_FOUND, "not_found.html", &context)
}

async fn get_schedule<T: CalendarBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(username): Path<String>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Response, Error> {
    let Some(user) = calendar::find_user(&state.backend, &username)? else {
        return render_user_not_found(&state.configuration, &username);
    };

    let selected = query
        .date_time
        .as_deref()
        .and_then(|date_time| DateTime::parse_from_rfc3339(date_time).ok())
        .map(|date_time| date_time.with_timezone(&Utc));

    match ScheduleFlow::new(selected) {
        ScheduleFlow::PickingDateTime => {
            let date = query
                .date
                .as_deref()
                .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok());
            render_calendar_step(&state, &user, date, Utc::now())
        }
        ScheduleFlow::Confirming { scheduled_at } => render_confirm_step(
            &state.configuration,
            StatusCode::OK,
            &user,
            scheduled_at,
            &ConfirmForm::default(),
            None,
        ),
    }
}

fn render_calendar_step<T: CalendarBackend, C: Configuration>(
    state: &AppState<T, C>,
    user: &User,
    selected_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Result<Response, Error> {
    let today = now.date_naive();
    let shown = selected_date.unwrap_or(today);
    let first_of_month = shown.with_day(1).unwrap_or(shown);
    let (year, month) = (first_of_month.year(), first_of_month.month());

    let blocked = calendar::blocked_dates(
        &state.backend,
        &user.username,
        Some(&year.to_string()),
        Some(&month.to_string()),
    )?;

    let days: Vec<CalendarDay> = first_of_month
        .iter_days()
        .take_while(|date| date.month() == month)
        .map(|date| CalendarDay {
            day: date.day(),
            date: date.to_string(),
            disabled: date < today
                || blocked.blocked_week_days.contains(&week_day(date))
                || blocked.blocked_dates.contains(&date.day()),
            selected: Some(date) == selected_date,
        })
        .collect();

    let mut context = base_context(&state.configuration);
    context.insert("user", user);
    context.insert("month_label", &first_of_month.format("%B %Y").to_string());
    let previous_month = first_of_month
        .checked_sub_months(Months::new(1))
        .unwrap_or(first_of_month);
    let next_month = first_of_month
        .checked_add_months(Months::new(1))
        .unwrap_or(first_of_month);
    context.insert("previous_month", &previous_month.to_string());
    context.insert("next_month", &next_month.to_string());
    context.insert("days", &days);

    if let Some(date) = selected_date {
        let day = calendar::day_availability(
            &state.backend,
            &user.username,
            Some(&date.to_string()),
            now,
        )?;
        let times: Vec<TimeOption> = day
            .possible_times
            .iter()
            .filter_map(|hour| {
                let start = availability::slot_start(date, *hour)?;
                let flow = ScheduleFlow::default().select_date_time(start);
                Some(TimeOption {
                    label: format!("{hour:02}:00"),
                    href: flow_href(&user.username, flow, date),
                    available: day.available_times.contains(hour),
                })
            })
            .collect();
        context.insert("selected_date", &date.format("%A, %B %-d").to_string());
        context.insert("times", &times);
    }

    render(StatusCode::OK, "calendar_step.html", &context)
}

fn render_confirm_step<C: Configuration>(
    configuration: &C,
    status: StatusCode,
    user: &User,
    scheduled_at: DateTime<Utc>,
    form: &ConfirmForm,
    message: Option<String>,
) -> Result<Response, Error> {
    let cancelled = ScheduleFlow::new(Some(scheduled_at)).cancel_confirmation();

    let mut context = base_context(configuration);
    context.insert("user", user);
    context.insert("form", form);
    context.insert("message", &message);
    context.insert("date_time", &format_date_time(scheduled_at));
    context.insert("date_label", &scheduled_at.format("%B %-d, %Y").to_string());
    context.insert("time_label", &scheduled_at.format("%H:%M").to_string());
    context.insert(
        "cancel_href",
        &flow_href(&user.username, cancelled, scheduled_at.date_naive()),
    );
    render(status, "confirm_step.html", &context)
}

async fn post_schedule<T: CalendarBackend, C: Configuration>(
    State(state): State<AppState<T, C>>,
    Path(username): Path<String>,
    Form(form): Form<ConfirmForm>,
) -> Result<Response, Error> {
    let Some(user) = calendar::find_user(&state.backend, &username)? else {
        return render_user_not_found(&state.configuration, &username);
    };
    let Ok(scheduled_at) = DateTime::parse_from_rfc3339(&form.date_time) else {
        return Ok(Redirect::to(&format!("/schedule/{username}")).into_response());
    };
    let scheduled_at = scheduled_at.with_timezone(&Utc);

    let request = ScheduleRequest {
        name: form.name.clone(),
        email: form.email.clone(),
        observations: Some(form.observations.clone()),
        date: scheduled_at,
    };
    match calendar::schedule(&state.backend, &username, request, Utc::now()) {
        Ok(scheduling) => Ok(Redirect::to(&format!(
            "/schedule/{username}?date={}",
            scheduling.date.date_naive()
        ))
        .into_response()),
        Err(err) if err.is_client_error() => render_confirm_step(
            &state.configuration,
            err.status_code(),
            &user,
            scheduled_at,
            &form,
            Some(err.to_string()),
        ),
        Err(err) => {
            error!(%err, "Scheduling failed");
            render_confirm_step(
                &state.configuration,
                StatusCode::INTERNAL_SERVER_ERROR,
                &user,
                scheduled_at,
                &form,
                None,
            )
        }
    }
}
