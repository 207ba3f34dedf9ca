pub mod models;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use util::config;
use util::paths::ensure_parent_dir;

/// Opens the application database configured by `DATABASE_PATH`.
///
/// A value that already looks like a DSN is used as-is; anything else is
/// treated as a SQLite file path whose parent directory is created on demand.
pub async fn connect() -> Result<DatabaseConnection, DbErr> {
    let path_or_url = config::database_path();
    let url = if path_or_url.starts_with("sqlite:") {
        path_or_url
    } else {
        if let Err(e) = ensure_parent_dir(&path_or_url) {
            tracing::warn!(path = %path_or_url, error = %e, "could not create database directory");
        }
        format!("sqlite://{path_or_url}?mode=rwc")
    };

    let mut options = ConnectOptions::new(url);
    options.sqlx_logging(false);
    Database::connect(options).await
}
