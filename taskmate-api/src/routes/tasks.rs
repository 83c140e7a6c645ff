/// Task endpoints
///
/// # Endpoints
///
/// - `POST /tasks` - Create task
/// - `GET /tasks?task_creator=` - Tasks created by a user
/// - `GET /tasks/search?query=` - Search by title or description
/// - `GET /tasks/status?status=` - Tasks in a status
/// - `GET /tasks/overdue` - Tasks past their deadline
/// - `GET /tasks/:id` - Get task
/// - `PATCH /tasks/status/edit` - Set the status of several tasks
/// - `DELETE /tasks/:id` - Delete task and its assignments
///
/// Deadlines are accepted and returned as `dd/mm/yyyy`.

use crate::{
    app::AppState,
    error::{is_foreign_key_violation, ApiError, ApiResult},
    routes::{non_empty, parse_id},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use taskmate_shared::models::task::{
    format_deadline, parse_deadline, NewTask, Task, TaskStatus, TaskWithCreator,
};
use uuid::Uuid;
use validator::Validate;

const TASK_NOT_FOUND: &str = "Task not found.";
const CREATOR_NOT_FOUND: &str = "Creator not found.";

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(
        required(message = "Please fill in all fields."),
        length(min = 1, message = "Please fill in all fields.")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Please fill in all fields."),
        length(min = 1, message = "Please fill in all fields.")
    )]
    pub description: Option<String>,

    /// `dd/mm/yyyy`
    #[validate(
        required(message = "Please fill in all fields."),
        length(min = 1, message = "Please fill in all fields.")
    )]
    pub deadline: Option<String>,

    /// ID of an existing user
    #[validate(
        required(message = "Please fill in all fields."),
        length(min = 1, message = "Please fill in all fields.")
    )]
    pub creator: Option<String>,
}

/// Bulk status edit request
#[derive(Debug, Deserialize, Validate)]
pub struct EditStatusRequest {
    /// Tasks to update
    #[validate(
        required(message = "Please give an Id."),
        length(min = 1, message = "Please give an Id.")
    )]
    pub id: Option<Vec<String>>,

    /// New status for all of them, checked once every id is known to exist
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatorQuery {
    pub task_creator: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// A task as returned to clients, deadline rendered as `dd/mm/yyyy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub task_id: Uuid,
    pub task_title: String,
    pub task_description: String,
    pub task_deadline: String,
    pub task_creator: Uuid,
    pub task_status: String,

    /// Creator's nickname, present in listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_nick: Option<String>,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.task_id,
            task_title: task.task_title,
            task_description: task.task_description,
            task_deadline: format_deadline(task.task_deadline),
            task_creator: task.task_creator,
            task_status: task.task_status,
            user_nick: None,
        }
    }
}

impl From<TaskWithCreator> for TaskView {
    fn from(task: TaskWithCreator) -> Self {
        Self {
            task_id: task.task_id,
            task_title: task.task_title,
            task_description: task.task_description,
            task_deadline: format_deadline(task.task_deadline),
            task_creator: task.task_creator,
            task_status: task.task_status,
            user_nick: Some(task.user_nick),
        }
    }
}

/// `{ "tasks": [...] }`
#[derive(Debug, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<TaskView>,
}

impl From<Vec<TaskWithCreator>> for TasksResponse {
    fn from(rows: Vec<TaskWithCreator>) -> Self {
        Self {
            tasks: rows.into_iter().map(TaskView::from).collect(),
        }
    }
}

/// Create a task in the `to do` status
///
/// # Endpoint
///
/// ```text
/// POST /tasks
/// Content-Type: application/json
///
/// { "title": "T", "description": "D", "deadline": "01/02/2024", "creator": "<user id>" }
/// ```
///
/// # Errors
///
/// - `412`: "Please fill in all fields."
/// - `412`: "Please insert a valid deadline (dd/mm/yyyy)."
/// - `412`: "Creator not found."
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, &'static str)> {
    let Json(req) = payload?;
    req.validate()?;

    let deadline = parse_deadline(&req.deadline.unwrap_or_default())
        .ok_or_else(|| ApiError::precondition("Please insert a valid deadline (dd/mm/yyyy)."))?;
    let creator = parse_id(&req.creator.unwrap_or_default())
        .ok_or_else(|| ApiError::precondition(CREATOR_NOT_FOUND))?;

    let data = NewTask {
        title: req.title.unwrap_or_default(),
        description: req.description.unwrap_or_default(),
        deadline,
        creator,
    };

    let task = Task::create(&state.db, data).await.map_err(|err| {
        if is_foreign_key_violation(&err) {
            ApiError::precondition(CREATOR_NOT_FOUND)
        } else {
            ApiError::from(err)
        }
    })?;
    tracing::info!(task_id = %task.task_id, "Task created");

    Ok((StatusCode::CREATED, "Task successfully created!"))
}

/// Tasks created by a user, joined with the creator's nickname
///
/// An ID that cannot belong to any user yields an empty list.
///
/// # Endpoint
///
/// ```text
/// GET /tasks?task_creator=<user id>
/// ```
///
/// # Errors
///
/// - `412`: "Please give an Id."
pub async fn list_tasks_by_creator(
    State(state): State<AppState>,
    Query(params): Query<CreatorQuery>,
) -> ApiResult<Json<TasksResponse>> {
    let raw = non_empty(params.task_creator)
        .ok_or_else(|| ApiError::precondition("Please give an Id."))?;

    let rows = match parse_id(&raw) {
        Some(creator) => Task::list_by_creator(&state.db, creator).await?,
        None => Vec::new(),
    };

    Ok(Json(rows.into()))
}

/// Tasks whose title or description contains the query
///
/// # Endpoint
///
/// ```text
/// GET /tasks/search?query=report
/// ```
///
/// # Errors
///
/// - `412`: "Please give a search value."
pub async fn search_tasks(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<TasksResponse>> {
    let query = non_empty(params.query)
        .ok_or_else(|| ApiError::precondition("Please give a search value."))?;

    let rows = Task::search(&state.db, &query).await?;
    Ok(Json(rows.into()))
}

/// Tasks in a status; `to-do` is accepted for `to do`
///
/// # Endpoint
///
/// ```text
/// GET /tasks/status?status=doing
/// ```
///
/// # Errors
///
/// - `412`: "Please insert a valid status ('to do', 'doing' or 'done')."
pub async fn list_tasks_by_status(
    State(state): State<AppState>,
    Query(params): Query<StatusQuery>,
) -> ApiResult<Json<TasksResponse>> {
    let status = params
        .status
        .as_deref()
        .and_then(|value| TaskStatus::parse_filter(value).ok())
        .ok_or_else(|| {
            ApiError::precondition("Please insert a valid status ('to do', 'doing' or 'done').")
        })?;

    let rows = Task::list_by_status(&state.db, status).await?;
    Ok(Json(rows.into()))
}

/// Tasks whose deadline is strictly before the current time
///
/// # Endpoint
///
/// ```text
/// GET /tasks/overdue
/// ```
pub async fn list_overdue_tasks(State(state): State<AppState>) -> ApiResult<Json<TasksResponse>> {
    let rows = Task::list_overdue(&state.db, Utc::now().naive_utc()).await?;
    Ok(Json(rows.into()))
}

/// Get a full task record
///
/// # Endpoint
///
/// ```text
/// GET /tasks/:id
/// ```
///
/// # Errors
///
/// - `404`: "Task not found."
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskView>> {
    let id = parse_id(&id).ok_or_else(|| ApiError::not_found(TASK_NOT_FOUND))?;

    Task::find_by_id(&state.db, id)
        .await?
        .map(|task| Json(task.into()))
        .ok_or_else(|| ApiError::not_found(TASK_NOT_FOUND))
}

/// Set one status on several tasks at once
///
/// Either every listed task is updated or none is. The ids are checked
/// before the status, so an unknown id answers 404 even without a status.
///
/// # Endpoint
///
/// ```text
/// PATCH /tasks/status/edit
/// Content-Type: application/json
///
/// { "id": ["<task id>", "<task id>"], "status": "done" }
/// ```
///
/// # Errors
///
/// - `412`: "Please give an Id."
/// - `404`: "Task not found."
/// - `412`: "Please give a valid status ('to do', 'doing' or 'done')."
pub async fn edit_task_status(
    State(state): State<AppState>,
    payload: Result<Json<EditStatusRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, &'static str)> {
    let Json(req) = payload?;
    req.validate()?;

    let mut ids = req
        .id
        .unwrap_or_default()
        .iter()
        .map(|raw| parse_id(raw))
        .collect::<Option<Vec<Uuid>>>()
        .ok_or_else(|| ApiError::not_found(TASK_NOT_FOUND))?;
    ids.sort_unstable();
    ids.dedup();

    if !Task::all_exist(&state.db, &ids).await? {
        return Err(ApiError::not_found(TASK_NOT_FOUND));
    }

    let status: TaskStatus = req.status.unwrap_or_default().parse().map_err(|_| {
        ApiError::precondition("Please give a valid status ('to do', 'doing' or 'done').")
    })?;

    // A task deleted since the existence check still refuses the whole update
    if !Task::update_status_bulk(&state.db, &ids, status).await? {
        return Err(ApiError::not_found(TASK_NOT_FOUND));
    }

    Ok((StatusCode::OK, "Status successfully updated!"))
}

/// Delete a task and its assignments
///
/// # Endpoint
///
/// ```text
/// DELETE /tasks/:id
/// ```
///
/// # Errors
///
/// - `412`: "Please give an Id."
/// - `404`: "Task not found."
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, &'static str)> {
    if id.trim().is_empty() {
        return Err(ApiError::precondition("Please give an Id."));
    }

    let id = parse_id(&id).ok_or_else(|| ApiError::not_found(TASK_NOT_FOUND))?;

    if !Task::delete_cascade(&state.db, id).await? {
        return Err(ApiError::not_found(TASK_NOT_FOUND));
    }

    tracing::info!(task_id = %id, "Task deleted");
    Ok((StatusCode::OK, "Task deleted."))
}
