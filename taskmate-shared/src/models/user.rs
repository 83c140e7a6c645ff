/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     user_id UUID PRIMARY KEY,
///     user_name VARCHAR(255) NOT NULL,
///     user_nick VARCHAR(255) NOT NULL UNIQUE,
///     user_email VARCHAR(255) NOT NULL UNIQUE
/// );
/// ```
///
/// Deleting a user also deletes the tasks they created and every
/// responsibility assignment touching them or those tasks.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Full user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub user_id: Uuid,

    /// Display name
    pub user_name: String,

    /// Nickname, unique across users
    pub user_nick: String,

    /// Email address, unique across users
    pub user_email: String,
}

/// The `{user_id, user_nick}` projection used by listings and searches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub user_id: Uuid,
    pub user_nick: String,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub nick: String,
    pub email: String,
}

impl User {
    /// Inserts a user with a freshly generated ID
    ///
    /// # Errors
    ///
    /// Fails with a database error carrying the `users_user_nick_key` or
    /// `users_user_email_key` constraint when the nickname or email is taken.
    pub async fn create(pool: &PgPool, data: NewUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, user_name, user_nick, user_email)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, user_name, user_nick, user_email
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.name)
        .bind(data.nick)
        .bind(data.email)
        .fetch_one(pool)
        .await?;

        debug!(user_id = %user.user_id, "Created user");
        Ok(user)
    }

    /// Lists every user as `{user_id, user_nick}`
    pub async fn list_summaries(pool: &PgPool) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT user_id, user_nick
            FROM users
            ORDER BY user_nick
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Users whose nickname or email contains `query` (case-sensitive)
    pub async fn search(pool: &PgPool, query: &str) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT user_id, user_nick
            FROM users
            WHERE strpos(user_nick, $1) > 0 OR strpos(user_email, $1) > 0
            ORDER BY user_nick
            "#,
        )
        .bind(query)
        .fetch_all(pool)
        .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, user_name, user_nick, user_email
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Checks whether a user with this ID exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Checks whether any user already uses this nickname or this email
    pub async fn nick_or_email_taken(
        pool: &PgPool,
        nick: &str,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE user_nick = $1 OR user_email = $2)",
        )
        .bind(nick)
        .bind(email)
        .fetch_one(pool)
        .await
    }

    /// Checks whether a user other than `except_id` uses this nickname
    ///
    /// A user keeping their own nickname is not a conflict.
    pub async fn nick_taken_by_other(
        pool: &PgPool,
        nick: &str,
        except_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE user_nick = $1 AND user_id <> $2)",
        )
        .bind(nick)
        .bind(except_id)
        .fetch_one(pool)
        .await
    }

    /// Sets a user's name and nickname
    ///
    /// Returns false if the user does not exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        name: &str,
        nick: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET user_name = $2, user_nick = $3
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(nick)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user together with everything that depends on them
    ///
    /// In one transaction, in this order: assignments of the user and of
    /// the tasks they created, the tasks they created, the user row.
    /// Returns false (and changes nothing) if the user does not exist.
    pub async fn delete_cascade(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let assignments = sqlx::query(
            r#"
            DELETE FROM user_and_task
            WHERE user_id = $1
               OR task_id IN (SELECT task_id FROM tasks WHERE task_creator = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let tasks = sqlx::query("DELETE FROM tasks WHERE task_creator = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let user = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if user.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;

        debug!(
            user_id = %id,
            tasks_removed = tasks.rows_affected(),
            assignments_removed = assignments.rows_affected(),
            "Deleted user"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serializes_with_column_names() {
        let user = User {
            user_id: Uuid::nil(),
            user_name: "Ann".to_string(),
            user_nick: "ann1".to_string(),
            user_email: "a@x.com".to_string(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["user_id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["user_name"], "Ann");
        assert_eq!(json["user_nick"], "ann1");
        assert_eq!(json["user_email"], "a@x.com");
    }

    #[test]
    fn test_summary_has_only_id_and_nick() {
        let summary = UserSummary {
            user_id: Uuid::nil(),
            user_nick: "ann1".to_string(),
        };

        let json = serde_json::to_value(&summary).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["user_id", "user_nick"]);
    }
}
