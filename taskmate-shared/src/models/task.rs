/// Task model and database operations
///
/// # Status
///
/// ```text
/// to do → doing → done
/// ```
///
/// Any status can be set from any other; the bulk edit endpoint does not
/// enforce an order.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     task_id UUID PRIMARY KEY,
///     task_title VARCHAR(255) NOT NULL,
///     task_description TEXT NOT NULL,
///     task_deadline DATE NOT NULL,
///     task_creator UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
///     task_status VARCHAR(16) NOT NULL DEFAULT 'to do'
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskmate_shared::models::task::{parse_deadline, NewTask, Task, TaskStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, creator: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, NewTask {
///     title: "Write report".to_string(),
///     description: "Quarterly numbers".to_string(),
///     deadline: parse_deadline("01/02/2024").unwrap(),
///     creator,
/// }).await?;
///
/// Task::update_status_bulk(&pool, &[task.task_id], TaskStatus::Doing).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Input format of deadlines and output format of rendered deadlines
pub const DEADLINE_FORMAT: &str = "%d/%m/%Y";

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "to do")]
    ToDo,

    #[serde(rename = "doing")]
    Doing,

    #[serde(rename = "done")]
    Done,
}

/// Returned when a string is not one of the known statuses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid task status: {0:?}")]
pub struct InvalidStatus(pub String);

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::Doing, TaskStatus::Done];

    /// Converts status to its stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "to do",
            TaskStatus::Doing => "doing",
            TaskStatus::Done => "done",
        }
    }

    /// Parses a status filter, which also accepts `"to-do"` for `ToDo`
    pub fn parse_filter(value: &str) -> Result<Self, InvalidStatus> {
        match value {
            "to-do" => Ok(TaskStatus::ToDo),
            other => other.parse(),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = InvalidStatus;

    /// Exact match on the stored strings
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| InvalidStatus(value.to_string()))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a `dd/mm/yyyy` deadline
pub fn parse_deadline(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DEADLINE_FORMAT).ok()
}

/// Renders a deadline as `dd/mm/yyyy`
pub fn format_deadline(deadline: NaiveDate) -> String {
    deadline.format(DEADLINE_FORMAT).to_string()
}

/// Full task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (UUID v4)
    pub task_id: Uuid,

    pub task_title: String,

    pub task_description: String,

    pub task_deadline: NaiveDate,

    /// User who created the task
    pub task_creator: Uuid,

    /// Stored status string, see [`TaskStatus`]
    pub task_status: String,
}

/// A task joined with its creator's nickname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskWithCreator {
    pub task_id: Uuid,
    pub task_title: String,
    pub task_description: String,
    pub task_deadline: NaiveDate,
    pub task_creator: Uuid,
    pub task_status: String,
    pub user_nick: String,
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub deadline: NaiveDate,
    pub creator: Uuid,
}

const TASK_WITH_CREATOR_COLUMNS: &str = r#"
    SELECT t.task_id, t.task_title, t.task_description, t.task_deadline,
           t.task_creator, t.task_status, u.user_nick
    FROM tasks t
    JOIN users u ON u.user_id = t.task_creator
"#;

fn joined_query(filter: &str) -> String {
    format!(
        "{} WHERE {} ORDER BY t.task_deadline, t.task_title",
        TASK_WITH_CREATOR_COLUMNS, filter
    )
}

impl Task {
    /// Inserts a task in the `to do` status
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation if `creator` is not an existing user.
    pub async fn create(pool: &PgPool, data: NewTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (task_id, task_title, task_description, task_deadline,
                               task_creator, task_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING task_id, task_title, task_description, task_deadline,
                      task_creator, task_status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.title)
        .bind(data.description)
        .bind(data.deadline)
        .bind(data.creator)
        .bind(TaskStatus::ToDo.as_str())
        .fetch_one(pool)
        .await?;

        debug!(task_id = %task.task_id, creator = %task.task_creator, "Created task");
        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT task_id, task_title, task_description, task_deadline,
                   task_creator, task_status
            FROM tasks
            WHERE task_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Tasks created by `creator`
    pub async fn list_by_creator(
        pool: &PgPool,
        creator: Uuid,
    ) -> Result<Vec<TaskWithCreator>, sqlx::Error> {
        let sql = joined_query("t.task_creator = $1");
        sqlx::query_as::<_, TaskWithCreator>(&sql)
            .bind(creator)
            .fetch_all(pool)
            .await
    }

    /// Tasks whose title or description contains `query` (case-sensitive)
    pub async fn search(pool: &PgPool, query: &str) -> Result<Vec<TaskWithCreator>, sqlx::Error> {
        let sql = joined_query("strpos(t.task_title, $1) > 0 OR strpos(t.task_description, $1) > 0");
        sqlx::query_as::<_, TaskWithCreator>(&sql)
            .bind(query)
            .fetch_all(pool)
            .await
    }

    /// Tasks currently in `status`
    pub async fn list_by_status(
        pool: &PgPool,
        status: TaskStatus,
    ) -> Result<Vec<TaskWithCreator>, sqlx::Error> {
        let sql = joined_query("t.task_status = $1");
        sqlx::query_as::<_, TaskWithCreator>(&sql)
            .bind(status.as_str())
            .fetch_all(pool)
            .await
    }

    /// Tasks whose deadline, taken as midnight of that day, is strictly
    /// before `now`
    ///
    /// A deadline of today is overdue as soon as the day has begun; one of
    /// tomorrow is not.
    pub async fn list_overdue(
        pool: &PgPool,
        now: NaiveDateTime,
    ) -> Result<Vec<TaskWithCreator>, sqlx::Error> {
        let sql = joined_query("t.task_deadline::timestamp < $1");
        sqlx::query_as::<_, TaskWithCreator>(&sql)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Checks whether every task in `ids` exists
    ///
    /// `ids` must not contain duplicates.
    pub async fn all_exist(pool: &PgPool, ids: &[Uuid]) -> Result<bool, sqlx::Error> {
        let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE task_id = ANY($1)")
            .bind(ids)
            .fetch_one(pool)
            .await?;

        Ok(usize::try_from(found).map_or(false, |found| found == ids.len()))
    }

    /// Sets `status` on every task in `ids` in one transaction
    ///
    /// The rows are locked first; if any of `ids` does not exist nothing is
    /// written and false is returned.
    pub async fn update_status_bulk(
        pool: &PgPool,
        ids: &[Uuid],
        status: TaskStatus,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let found: Vec<Uuid> =
            sqlx::query_scalar("SELECT task_id FROM tasks WHERE task_id = ANY($1) FOR UPDATE")
                .bind(ids)
                .fetch_all(&mut *tx)
                .await?;

        if ids.iter().any(|id| !found.contains(id)) {
            tx.rollback().await?;
            debug!(requested = ids.len(), found = found.len(), "Status update rejected");
            return Ok(false);
        }

        let result = sqlx::query("UPDATE tasks SET task_status = $1 WHERE task_id = ANY($2)")
            .bind(status.as_str())
            .bind(ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(updated = result.rows_affected(), status = %status, "Updated task status");
        Ok(true)
    }

    /// Deletes a task's assignments and then the task, in one transaction
    ///
    /// Returns false (and changes nothing) if the task does not exist.
    pub async fn delete_cascade(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let assignments = sqlx::query("DELETE FROM user_and_task WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let task = sqlx::query("DELETE FROM tasks WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if task.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;

        debug!(
            task_id = %id,
            assignments_removed = assignments.rows_affected(),
            "Deleted task"
        );
        Ok(true)
    }
}
