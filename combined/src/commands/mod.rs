//! Command implementations, one module per subcommand.
//!
//! Commands that touch documents open a [`Context`]: the SQL-backed store,
//! the local identity provider and a role worker that applies the claims of
//! every role document written during the command.

pub mod account;
pub mod catalog;
pub mod geo;
pub mod migrate;
pub mod staff;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use admin_client::{resolve_gate, Admin};
use common::{AppConfig, AppError, AppResult};
use domain::{GateView, Identity};
use identity_lib::{AccountStore, LocalIdentity, SqlAccounts};
use store_lib::DocumentStore;
use triggers_lib::{role_worker, TriggerWorker};

use crate::cli::AdminCredentials;

pub struct Context {
    pub identity: Arc<LocalIdentity>,
    pub admin: Admin,
    worker: TriggerWorker,
}

impl Context {
    /// Connect to the database, apply pending migrations and wire the client
    pub async fn open(config: AppConfig) -> AppResult<Self> {
        let (db, store) = store_lib::connect_sql_store(&config.store)
            .await
            .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
        let store: Arc<dyn DocumentStore> = store;

        let accounts: Arc<dyn AccountStore> = Arc::new(SqlAccounts::new(db.get_connection()));
        let identity = Arc::new(LocalIdentity::new(accounts, &config.identity));
        let worker = role_worker(&store, identity.clone())?;
        let admin = Admin::new(store, identity.clone(), &config)?;

        Ok(Self {
            identity,
            admin,
            worker,
        })
    }

    /// Sign in with `credentials` and require the admin claim
    pub async fn sign_in_admin(
        &self,
        credentials: &AdminCredentials,
        cancel: &CancellationToken,
    ) -> AppResult<Identity> {
        let user = self
            .admin
            .session
            .sign_in_with_password(&credentials.email, &credentials.password, cancel)
            .await?;
        let state = self
            .admin
            .session
            .state()
            .wait_for(|s| !s.user_loading && s.user.as_ref() == Some(&user))
            .await
            .ok_or_else(|| AppError::internal("Session listener stopped"))?;
        let gate = resolve_gate(&state, self.identity.as_ref(), true).await;
        gate.render(&ConsoleGate)
    }

    /// Apply pending role triggers, then stop the client tasks
    pub async fn finish(mut self) {
        let handled = self.worker.drain().await;
        tracing::debug!(handled, "Trigger events processed");
        self.admin.close().await;
    }
}

/// Gate outcome for a one-shot console command
struct ConsoleGate;

impl GateView for ConsoleGate {
    type Output = AppResult<Identity>;

    fn loading(&self) -> Self::Output {
        Err(AppError::internal("Session did not settle"))
    }

    fn sign_in(&self) -> Self::Output {
        Err(AppError::Unauthorized)
    }

    fn not_admin(&self, identity: &Identity) -> Self::Output {
        tracing::warn!(uid = %identity.uid, "Signed in without the admin role");
        Err(AppError::Forbidden)
    }

    fn admin(&self, identity: &Identity) -> Self::Output {
        Ok(identity.clone())
    }
}

/// Name recorded as `createdBy`/`updatedBy` for catalog edits
pub fn editor_name(identity: &Identity) -> String {
    identity
        .display_name
        .clone()
        .or_else(|| identity.email.clone())
        .unwrap_or_else(|| identity.uid.clone())
}

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("Failed to render output: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}
