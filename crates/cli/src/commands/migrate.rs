//! Database migration command.
//!
//! Runs the server crate's migrations against the configured database.
//! Migrations are embedded at compile time, so the binary can run them
//! anywhere without the source tree.

/// Run database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;
    tracing::info!("Migrations complete!");

    Ok(())
}
