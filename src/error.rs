use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::result::DatabaseErrorKind;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid date")]
    InvalidDate,
    #[error("Date not provided.")]
    DateNotProvided,
    #[error("Date is in the past.")]
    DateInPast,
    #[error("User not found")]
    UserNotFound,
    #[error("User does not exist.")]
    UserDoesNotExist,
    #[error("Username already taken.")]
    UsernameTaken,
    #[error("There is another scheduling at the same time.")]
    SchedulingConflict,
    #[error("Time is not available.")]
    TimeNotAvailable,
    #[error("{}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
    #[error("{}", validation_message(.0))]
    Validation(ValidationErrors),
    #[error("database error -- {0}")]
    Database(diesel::result::Error),
    #[error("template error -- {0}")]
    Template(#[from] tera::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether the caller can fix the request, i.e. the message is meant for the visitor.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                if info.constraint_name() == Some("users_username_key") =>
            {
                Self::UsernameTaken
            }
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                if info.constraint_name() == Some("schedulings_user_id_date_key") =>
            {
                Self::SchedulingConflict
            }
            err => Self::Database(err),
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(err: ValidationErrors) -> Self {
        Self::Validation(err)
    }
}

fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages = errors
        .field_errors()
        .values()
        .flat_map(|errors| errors.iter().map(ToString::to_string))
        .collect::<Vec<String>>();
    messages.sort();
    messages.join("\n")
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_client_error() {
            self.to_string()
        } else {
            error!("{self}");
            "Internal server error".to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
