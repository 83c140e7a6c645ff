/// Database models for Taskmate
///
/// Each model owns the queries against its table. Multi-statement mutations
/// (cascading deletes, bulk status edits, multi-user assignment) run inside a
/// single transaction.
///
/// # Models
///
/// - `user`: the `users` table
/// - `task`: the `tasks` table, plus status and deadline helpers
/// - `responsible`: the `user_and_task` join table
///
/// # Example
///
/// ```no_run
/// use taskmate_shared::models::user::{NewUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, NewUser {
///     name: "Ann".to_string(),
///     nick: "ann1".to_string(),
///     email: "a@x.com".to_string(),
/// }).await?;
/// println!("Created user {}", user.user_id);
/// # Ok(())
/// # }
/// ```

pub mod responsible;
pub mod task;
pub mod user;
