//! Database migration runner.

use tracing::info;

use fleet_core::error::{AppError, ErrorKind};

use crate::connection::{Backend, DatabasePool};

/// Run all pending database migrations. The in-process engine has no schema,
/// so this is a no-op there.
pub async fn run_migrations(db: &DatabasePool) -> Result<(), AppError> {
    let pool = match db.backend() {
        Backend::Postgres(pool) => pool,
        Backend::Memory(_) => {
            info!("In-process storage has no migrations to run");
            return Ok(());
        }
    };

    info!("Running database migrations...");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to run migrations: {e}"),
                e,
            )
        })?;

    info!("Database migrations completed successfully");
    Ok(())
}
