/// Responsibility endpoints
///
/// # Endpoints
///
/// - `POST /tasks/responsible` - Make users responsible for a task
/// - `GET /tasks/:id/responsible` - List a task's responsibles
/// - `DELETE /tasks/:id/responsible/:user_id` - Remove one responsible

use crate::{
    app::AppState,
    error::{is_foreign_key_violation, ApiError, ApiResult},
    routes::parse_id,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use taskmate_shared::models::{responsible::Responsible, task::Task, user::UserSummary};
use uuid::Uuid;
use validator::Validate;

const TASK_NOT_FOUND: &str = "Task not found.";
const USER_OR_TASK_NOT_FOUND: &str = "User or task not found.";
const NOT_RESPONSIBLE: &str = "This user isn't responsible for this task.";

/// Assign request
#[derive(Debug, Deserialize, Validate)]
pub struct AssignRequest {
    #[validate(
        required(message = "Please fill in all fields."),
        length(min = 1, message = "Please fill in all fields.")
    )]
    pub task_id: Option<String>,

    /// Users to make responsible
    #[validate(
        required(message = "Please fill in all fields."),
        length(min = 1, message = "Please fill in all fields.")
    )]
    pub user_id: Option<Vec<String>>,
}

/// `{ "responsibles": [...] }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponsiblesResponse {
    pub responsibles: Vec<UserSummary>,
}

/// Make one or more users responsible for a task
///
/// All assignments are written together; an unknown task or user writes none.
/// Users already responsible for the task are skipped.
///
/// # Endpoint
///
/// ```text
/// POST /tasks/responsible
/// Content-Type: application/json
///
/// { "task_id": "<task id>", "user_id": ["<user id>", "<user id>"] }
/// ```
///
/// # Errors
///
/// - `412`: "Please fill in all fields."
/// - `404`: "User or task not found."
pub async fn assign_responsibles(
    State(state): State<AppState>,
    payload: Result<Json<AssignRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, &'static str)> {
    let Json(req) = payload?;
    req.validate()?;

    let task_id = parse_id(&req.task_id.unwrap_or_default())
        .ok_or_else(|| ApiError::not_found(USER_OR_TASK_NOT_FOUND))?;

    let mut user_ids = req
        .user_id
        .unwrap_or_default()
        .iter()
        .map(|raw| parse_id(raw))
        .collect::<Option<Vec<Uuid>>>()
        .ok_or_else(|| ApiError::not_found(USER_OR_TASK_NOT_FOUND))?;
    user_ids.sort_unstable();
    user_ids.dedup();

    let inserted = Responsible::assign(&state.db, task_id, &user_ids)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                ApiError::not_found(USER_OR_TASK_NOT_FOUND)
            } else {
                ApiError::from(err)
            }
        })?;
    tracing::info!(task_id = %task_id, inserted, "Responsibles assigned");

    Ok((StatusCode::CREATED, "User assigned."))
}

/// Users responsible for a task
///
/// # Endpoint
///
/// ```text
/// GET /tasks/:id/responsible
/// ```
///
/// # Errors
///
/// - `412`: "Please give an Id."
/// - `404`: "Task not found."
pub async fn list_responsibles(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResponsiblesResponse>> {
    if id.trim().is_empty() {
        return Err(ApiError::precondition("Please give an Id."));
    }

    let task_id = parse_id(&id).ok_or_else(|| ApiError::not_found(TASK_NOT_FOUND))?;
    if Task::find_by_id(&state.db, task_id).await?.is_none() {
        return Err(ApiError::not_found(TASK_NOT_FOUND));
    }

    let responsibles = Responsible::list_for_task(&state.db, task_id).await?;
    Ok(Json(ResponsiblesResponse { responsibles }))
}

/// Remove one user from a task's responsibles
///
/// # Endpoint
///
/// ```text
/// DELETE /tasks/:id/responsible/:user_id
/// ```
///
/// # Errors
///
/// - `412`: "Task or user id missing."
/// - `404`: "Task not found." (the task has no responsibles)
/// - `412`: "This user isn't responsible for this task."
pub async fn remove_responsible(
    State(state): State<AppState>,
    Path((task_id, user_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, &'static str)> {
    if task_id.trim().is_empty() || user_id.trim().is_empty() {
        return Err(ApiError::precondition("Task or user id missing."));
    }

    let task_id = parse_id(&task_id).ok_or_else(|| ApiError::not_found(TASK_NOT_FOUND))?;
    if !Responsible::task_has_assignments(&state.db, task_id).await? {
        return Err(ApiError::not_found(TASK_NOT_FOUND));
    }

    let user_id = parse_id(&user_id).ok_or_else(|| ApiError::precondition(NOT_RESPONSIBLE))?;
    if !Responsible::remove(&state.db, task_id, user_id).await? {
        return Err(ApiError::precondition(NOT_RESPONSIBLE));
    }

    Ok((StatusCode::OK, "Responsible removed."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_request_needs_non_empty_user_list() {
        let req: AssignRequest =
            serde_json::from_str(r#"{"task_id": "abc", "user_id": []}"#).unwrap();
        assert_eq!(
            ApiError::from(req.validate().unwrap_err()),
            ApiError::precondition("Please fill in all fields.")
        );
    }

    #[test]
    fn test_responsibles_response_shape() {
        let body = ResponsiblesResponse {
            responsibles: vec![UserSummary {
                user_id: Uuid::nil(),
                user_nick: "ann1".to_string(),
            }],
        };

        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["responsibles"][0]["user_nick"], "ann1");
    }
}
