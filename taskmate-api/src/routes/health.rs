/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "migrations": 3
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskmate_shared::db::{migrations, pool};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Database status
    pub database: String,

    /// Applied migrations, when the database answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<usize>,
}

/// Health check handler
///
/// Always answers 200; a database outage shows up as `"degraded"`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = pool::health_check(&state.db).await.is_ok();

    let migrations = if connected {
        migrations::get_migration_status(&state.db)
            .await
            .ok()
            .map(|status| status.applied_migrations)
    } else {
        None
    };

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        migrations,
    })
}
