/// User endpoints
///
/// # Endpoints
///
/// - `POST /users` - Create user
/// - `GET /users/all` - List users
/// - `GET /users?query=` - Search users by nickname or email
/// - `GET /users/:id` - Get user
/// - `PATCH /users/edit/:id` - Edit name and nickname
/// - `DELETE /users/:id` - Delete user, their tasks and assignments

use crate::{
    app::AppState,
    error::{violated_constraint, ApiError, ApiResult, NICK_OR_EMAIL_TAKEN},
    routes::{non_empty, parse_id},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use taskmate_shared::models::user::{NewUser, User, UserSummary};
use validator::Validate;

const USER_NOT_FOUND: &str = "User not found.";
const NICK_TAKEN: &str = "Nickname already registered.";

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Display name
    #[validate(
        required(message = "Please fill in all fields."),
        length(min = 1, message = "Please fill in all fields.")
    )]
    pub name: Option<String>,

    /// Nickname, must be unused
    #[validate(
        required(message = "Please fill in all fields."),
        length(min = 1, message = "Please fill in all fields.")
    )]
    pub nick: Option<String>,

    /// Email, must be unused
    #[validate(
        required(message = "Please fill in all fields."),
        length(min = 1, message = "Please fill in all fields.")
    )]
    pub email: Option<String>,
}

/// Edit user request
#[derive(Debug, Deserialize, Validate)]
pub struct EditUserRequest {
    #[validate(
        required(message = "Please fill in all fields."),
        length(min = 1, message = "Please fill in all fields.")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Please fill in all fields."),
        length(min = 1, message = "Please fill in all fields.")
    )]
    pub nick: Option<String>,
}

/// Search query string
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// `{ "users": [...] }`
#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

/// Create a user
///
/// # Endpoint
///
/// ```text
/// POST /users
/// Content-Type: application/json
///
/// { "name": "Ann", "nick": "ann1", "email": "a@x.com" }
/// ```
///
/// # Errors
///
/// - `412`: "Please fill in all fields."
/// - `412`: "Nickname or email already registered."
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, &'static str)> {
    let Json(req) = payload?;
    req.validate()?;

    let data = NewUser {
        name: req.name.unwrap_or_default(),
        nick: req.nick.unwrap_or_default(),
        email: req.email.unwrap_or_default(),
    };

    if User::nick_or_email_taken(&state.db, &data.nick, &data.email).await? {
        return Err(ApiError::precondition(NICK_OR_EMAIL_TAKEN));
    }

    let user = User::create(&state.db, data).await?;
    tracing::info!(user_id = %user.user_id, "User created");

    Ok((StatusCode::CREATED, "User created!"))
}

/// List every user as `{user_id, user_nick}`
///
/// # Endpoint
///
/// ```text
/// GET /users/all
/// ```
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<UsersResponse>> {
    let users = User::list_summaries(&state.db).await?;
    Ok(Json(UsersResponse { users }))
}

/// Search users whose nickname or email contains the query
///
/// # Endpoint
///
/// ```text
/// GET /users?query=ann
/// ```
///
/// # Errors
///
/// - `412`: "Please give a search value."
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<UsersResponse>> {
    let query = non_empty(params.query)
        .ok_or_else(|| ApiError::precondition("Please give a search value."))?;

    let users = User::search(&state.db, &query).await?;
    Ok(Json(UsersResponse { users }))
}

/// Get a full user record
///
/// # Endpoint
///
/// ```text
/// GET /users/:id
/// ```
///
/// # Errors
///
/// - `404`: "User not found."
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let id = parse_id(&id).ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    User::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))
}

/// Edit a user's name and nickname
///
/// Keeping one's own nickname is allowed; taking another user's is not.
///
/// # Endpoint
///
/// ```text
/// PATCH /users/edit/:id
/// Content-Type: application/json
///
/// { "name": "Ann B.", "nick": "annb" }
/// ```
///
/// # Errors
///
/// - `412`: "Please insert an Id."
/// - `412`: "Please fill in all fields."
/// - `412`: "Nickname already registered."
/// - `412`: "User not found."
pub async fn edit_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EditUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, &'static str)> {
    if id.trim().is_empty() {
        return Err(ApiError::precondition("Please insert an Id."));
    }

    let Json(req) = payload?;
    req.validate()?;
    let name = req.name.unwrap_or_default();
    let nick = req.nick.unwrap_or_default();

    let id = parse_id(&id);

    // The nil id belongs to no user, so an unparseable id excludes nobody
    if User::nick_taken_by_other(&state.db, &nick, id.unwrap_or_default()).await? {
        return Err(ApiError::precondition(NICK_TAKEN));
    }

    let id = id.ok_or_else(|| ApiError::precondition(USER_NOT_FOUND))?;
    if !User::exists(&state.db, id).await? {
        return Err(ApiError::precondition(USER_NOT_FOUND));
    }

    let updated = User::update_profile(&state.db, id, &name, &nick)
        .await
        .map_err(|err| match violated_constraint(&err) {
            Some("users_user_nick_key") => ApiError::precondition(NICK_TAKEN),
            _ => ApiError::from(err),
        })?;

    if !updated {
        return Err(ApiError::precondition(USER_NOT_FOUND));
    }

    Ok((StatusCode::OK, "User successfully updated!"))
}

/// Delete a user with their tasks and assignments
///
/// # Endpoint
///
/// ```text
/// DELETE /users/:id
/// ```
///
/// # Errors
///
/// - `412`: "Please give an Id."
/// - `404`: "User not found."
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, &'static str)> {
    if id.trim().is_empty() {
        return Err(ApiError::precondition("Please give an Id."));
    }

    let id = parse_id(&id).ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    if !User::delete_cascade(&state.db, id).await? {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }

    tracing::info!(user_id = %id, "User deleted");
    Ok((StatusCode::OK, "User deleted."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FILL_IN_ALL_FIELDS;

    #[test]
    fn test_create_request_requires_every_field() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"name": "Ann", "nick": "ann1"}"#).unwrap();
        let err = ApiError::from(req.validate().unwrap_err());
        assert_eq!(err, ApiError::precondition(FILL_IN_ALL_FIELDS));
    }

    #[test]
    fn test_create_request_rejects_empty_strings() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"name": "", "nick": "ann1", "email": "a@x.com"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_edit_request_accepts_name_and_nick() {
        let req: EditUserRequest =
            serde_json::from_str(r#"{"name": "Ann", "nick": "ann2"}"#).unwrap();
        assert!(req.validate().is_ok());
    }
}
