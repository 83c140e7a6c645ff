/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskmate_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskmate_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET    /health
/// ├── /users
/// │   ├── POST   /                          # Create user
/// │   ├── GET    /?query=                   # Search users
/// │   ├── GET    /all                       # List users
/// │   ├── GET    /:id                       # Get user
/// │   ├── PATCH  /edit/:id                  # Edit user
/// │   └── DELETE /:id                       # Delete user
/// └── /tasks
///     ├── POST   /                          # Create task
///     ├── GET    /?task_creator=            # Tasks by creator
///     ├── GET    /search?query=             # Search tasks
///     ├── GET    /status?status=            # Tasks by status
///     ├── PATCH  /status/edit               # Bulk status edit
///     ├── GET    /overdue                   # Overdue tasks
///     ├── POST   /responsible               # Assign responsibles
///     ├── GET    /:id                       # Get task
///     ├── DELETE /:id                       # Delete task
///     ├── GET    /:id/responsible           # List responsibles
///     └── DELETE /:id/responsible/:user_id  # Remove responsible
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{health, responsibles, tasks, users};

    let user_routes = Router::new()
        .route("/", post(users::create_user).get(users::search_users))
        .route("/all", get(users::list_users))
        .route("/edit/:id", patch(users::edit_user))
        .route("/:id", get(users::get_user).delete(users::delete_user));

    let task_routes = Router::new()
        .route("/", post(tasks::create_task).get(tasks::list_tasks_by_creator))
        .route("/search", get(tasks::search_tasks))
        .route("/status", get(tasks::list_tasks_by_status))
        .route("/status/edit", patch(tasks::edit_task_status))
        .route("/overdue", get(tasks::list_overdue_tasks))
        .route("/responsible", post(responsibles::assign_responsibles))
        .route("/:id", get(tasks::get_task).delete(tasks::delete_task))
        .route("/:id/responsible", get(responsibles::list_responsibles))
        .route(
            "/:id/responsible/:user_id",
            delete(responsibles::remove_responsible),
        );

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/users", user_routes)
        .nest("/tasks", task_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Permissive CORS when `*` is configured, otherwise only the listed origins
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
