//! Migrate command - schema of the document and account tables.

use common::{AppConfig, AppError, AppResult, Database};

use crate::cli::{MigrateAction, MigrateArgs};

pub async fn execute(args: MigrateArgs, config: AppConfig) -> AppResult<()> {
    let db = Database::connect_without_migrations(&config.store)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    match args.action {
        MigrateAction::Up => {
            db.run_migrations().await.map_err(failed)?;
            tracing::info!("Schema is up to date");
        }
        MigrateAction::Down => {
            db.rollback_migration().await.map_err(failed)?;
            tracing::info!("Last migration rolled back");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await.map_err(failed)?;
            let pending = status.iter().filter(|m| !m.applied).count();
            for migration in &status {
                let mark = if migration.applied { "applied" } else { "pending" };
                println!("{:<8} {}", mark, migration.name);
            }
            tracing::debug!(total = status.len(), pending, "Migration status read");
        }
        MigrateAction::Fresh => {
            tracing::warn!("Dropping every table");
            db.fresh_migrations().await.map_err(failed)?;
            tracing::info!("Schema recreated");
        }
    }

    Ok(())
}

fn failed(e: impl std::fmt::Display) -> AppError {
    AppError::internal(format!("Migration failed: {}", e))
}
