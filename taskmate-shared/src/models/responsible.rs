/// Responsibility assignments between tasks and users
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_and_task (
///     task_id UUID NOT NULL REFERENCES tasks(task_id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
///     PRIMARY KEY (task_id, user_id)
/// );
/// ```

use crate::models::user::UserSummary;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// One `user_and_task` row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Responsible {
    pub task_id: Uuid,
    pub user_id: Uuid,
}

impl Responsible {
    /// Makes every user in `user_ids` responsible for `task_id`
    ///
    /// All rows are written in one transaction; pairs that already exist are
    /// left alone. Returns the number of new assignments.
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation, and writes nothing, if the task or
    /// any of the users does not exist.
    pub async fn assign(
        pool: &PgPool,
        task_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut inserted = 0;

        for user_id in user_ids {
            let result = sqlx::query(
                r#"
                INSERT INTO user_and_task (task_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (task_id, user_id) DO NOTHING
                "#,
            )
            .bind(task_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;

        debug!(task_id = %task_id, inserted, "Assigned responsibles");
        Ok(inserted)
    }

    /// Users responsible for `task_id`, as `{user_id, user_nick}`
    pub async fn list_for_task(
        pool: &PgPool,
        task_id: Uuid,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.user_id, u.user_nick
            FROM users u
            JOIN user_and_task ut ON ut.user_id = u.user_id
            WHERE ut.task_id = $1
            ORDER BY u.user_nick
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn task_has_assignments(pool: &PgPool, task_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM user_and_task WHERE task_id = $1)")
            .bind(task_id)
            .fetch_one(pool)
            .await
    }

    pub async fn is_assigned(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_and_task WHERE task_id = $1 AND user_id = $2)",
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Removes one assignment; returns false if it did not exist
    pub async fn remove(pool: &PgPool, task_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_and_task WHERE task_id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
