/// Error handling for the API server
///
/// Handlers return `ApiResult<T>`; every error becomes a plain-text response
/// carrying a short human-readable message and its status code.
///
/// # Example
///
/// ```
/// use taskmate_api::error::{ApiError, ApiResult};
///
/// fn require(query: Option<String>) -> ApiResult<String> {
///     query.ok_or_else(|| ApiError::precondition("Please give a search value."))
/// }
///
/// assert!(require(None).is_err());
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use validator::ValidationErrors;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Body of every 500 response; the detail only goes to the log
pub const INTERNAL_ERROR_MESSAGE: &str = "Something bad happened. Please contact support.";

/// Shared by the create and edit endpoints
pub const FILL_IN_ALL_FIELDS: &str = "Please fill in all fields.";

/// Raised by user creation, both by the pre-check and by the unique constraints
pub const NICK_OR_EMAIL_TAKEN: &str = "Nickname or email already registered.";

/// Unified API error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Bad request (400), e.g. a body that is not JSON
    BadRequest(String),

    /// Precondition failed (412): missing fields and validation failures
    PreconditionFailed(String),

    /// Not found (404)
    NotFound(String),

    /// Internal server error (500)
    InternalError(String),
}

impl ApiError {
    pub fn precondition(message: impl Into<String>) -> Self {
        ApiError::PreconditionFailed(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(detail: impl fmt::Display) -> Self {
        ApiError::InternalError(detail.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::PreconditionFailed(msg) => write!(f, "Precondition failed: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            ApiError::BadRequest(msg) | ApiError::PreconditionFailed(msg) | ApiError::NotFound(msg) => {
                msg
            }
            ApiError::InternalError(detail) => {
                tracing::error!("Internal error: {}", detail);
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };

        (status, message).into_response()
    }
}

/// Returns the violated constraint name, if `err` is a constraint violation
pub fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

/// Whether `err` is a foreign key violation
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Convert sqlx errors to API errors
///
/// Unique violations on the nickname or email columns can only come from a
/// user insert racing another one, so they get the same answer as the
/// pre-check. Everything else is internal.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match violated_constraint(&err) {
            Some("users_user_nick_key") | Some("users_user_email_key") => {
                ApiError::precondition(NICK_OR_EMAIL_TAKEN)
            }
            _ => ApiError::internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert validator errors to API errors
///
/// The first failing rule (by field name) supplies the message.
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<(String, String)> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    (
                        field.to_string(),
                        error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| FILL_IN_ALL_FIELDS.to_string()),
                    )
                })
            })
            .collect();
        fields.sort();

        let message = fields
            .into_iter()
            .next()
            .map(|(_, message)| message)
            .unwrap_or_else(|| FILL_IN_ALL_FIELDS.to_string());

        ApiError::PreconditionFailed(message)
    }
}

/// Convert body extraction failures to API errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        ApiError::BadRequest("Invalid request body.".to_string())
    }
}
