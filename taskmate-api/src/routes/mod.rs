/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: user creation, lookup, search, edit and deletion
/// - `tasks`: task creation, listings, status edits and deletion
/// - `responsibles`: assigning and removing users responsible for a task

pub mod health;
pub mod responsibles;
pub mod tasks;
pub mod users;

use uuid::Uuid;

/// Parses an identifier from a path, query or body
///
/// Anything that is not a UUID cannot name an existing row.
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Treats absent and empty values the same way
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
