//! Server Triggers Library
//!
//! Reacts to committed writes on the role collections by copying the written
//! role into the identity provider's custom claims.

pub mod pattern;
pub mod role_sync;
pub mod worker;

use std::sync::Arc;

use common::AppResult;
use identity_lib::IdentityAdmin;
use store_lib::DocumentStore;

pub use pattern::PathPattern;
pub use role_sync::{Outcome, RoleSync, Trigger, TriggerKind};
pub use worker::{TriggerWorker, WorkerState};

/// Worker running the role triggers over every change committed to `store`
pub fn role_worker(
    store: &Arc<dyn DocumentStore>,
    admin: Arc<dyn IdentityAdmin>,
) -> AppResult<TriggerWorker> {
    Ok(TriggerWorker::new(
        RoleSync::new(admin),
        Trigger::role_triggers()?,
        store.subscribe(),
    ))
}
