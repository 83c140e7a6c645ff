/// Database layer for Taskmate
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: embedded migration runner
///
/// The tables themselves are queried from the `models` module.

pub mod migrations;
pub mod pool;
