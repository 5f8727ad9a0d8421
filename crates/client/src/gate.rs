//! Admin gate kept current with the session.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use domain::{AdminGate, AdminUserState, ClaimLookup, Identity};
use identity_lib::IdentityProvider;

use crate::state::{Publisher, StateHolder};

/// Read the token claims of the signed-in identity and evaluate the gate.
///
/// A failed token lookup counts as "no claims", which lands on `NotAdmin`.
pub async fn resolve_gate(
    state: &AdminUserState,
    identity: &dyn IdentityProvider,
    force_refresh: bool,
) -> AdminGate {
    let lookup = match state.user.as_ref() {
        Some(user) if !state.user_loading => {
            match identity.id_token_result(user, force_refresh).await {
                Ok(token) => ClaimLookup::Resolved(Some(token.claims)),
                Err(e) => {
                    debug!(uid = %user.uid, error = %e, "Token lookup failed");
                    ClaimLookup::Resolved(None)
                }
            }
        }
        _ => ClaimLookup::Resolved(None),
    };
    AdminGate::evaluate(state, &lookup)
}

/// Re-evaluates the gate each time the session identity changes
pub struct AdminGateWatcher {
    gate: StateHolder<AdminGate>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AdminGateWatcher {
    pub fn start(session: StateHolder<AdminUserState>, identity: Arc<dyn IdentityProvider>) -> Self {
        let publisher = Publisher::new(AdminGate::Loading);
        let gate = publisher.holder();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(watch_session(publisher, session, identity, shutdown.clone()));

        Self {
            gate,
            shutdown,
            task: Some(task),
        }
    }

    pub fn gate(&self) -> StateHolder<AdminGate> {
        self.gate.clone()
    }

    pub fn current(&self) -> AdminGate {
        self.gate.current()
    }

    pub async fn close(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for AdminGateWatcher {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn watch_session(
    publisher: Publisher<AdminGate>,
    session: StateHolder<AdminUserState>,
    identity: Arc<dyn IdentityProvider>,
    shutdown: CancellationToken,
) {
    let mut states = session.observe();
    // Identity the current gate was evaluated for
    let mut evaluated: Option<Option<Identity>> = None;

    loop {
        let state = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = states.next() => match next {
                Some(state) => state,
                None => break,
            },
        };

        if state.user_loading {
            publisher.next(AdminGate::Loading);
            evaluated = None;
            continue;
        }
        if evaluated.as_ref() == Some(&state.user) {
            continue;
        }

        publisher.next(AdminGate::evaluate(&state, &ClaimLookup::Pending));
        let gate = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            gate = resolve_gate(&state, identity.as_ref(), false) => gate,
        };
        debug!(admin = gate.is_admin(), "Admin gate evaluated");
        publisher.next(gate);
        evaluated = Some(state.user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{AppError, AppResult};
    use domain::{IdTokenResult, TokenClaims};
    use identity_lib::ProviderAssertion;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::watch;

    /// Provider returning fixed claims for every identity
    struct FixedClaims {
        claims: Option<TokenClaims>,
        state: watch::Sender<Option<Identity>>,
        /// Token lookups never complete
        stalled: bool,
    }

    #[async_trait::async_trait]
    impl IdentityProvider for FixedClaims {
        async fn sign_in_with_password(&self, _: &str, _: &str) -> AppResult<Identity> {
            Err(AppError::Unauthorized)
        }

        async fn sign_in_with_provider(&self, _: ProviderAssertion) -> AppResult<Identity> {
            Err(AppError::Unauthorized)
        }

        async fn create_user_with_password(&self, _: &str, _: &str) -> AppResult<Identity> {
            Err(AppError::Unauthorized)
        }

        async fn sign_out(&self) -> AppResult<()> {
            Ok(())
        }

        async fn send_email_verification(&self, _: &Identity) -> AppResult<String> {
            Ok(String::new())
        }

        async fn apply_email_verification(&self, _: &str) -> AppResult<()> {
            Ok(())
        }

        fn current_user(&self) -> Option<Identity> {
            self.state.borrow().clone()
        }

        fn auth_state(&self) -> watch::Receiver<Option<Identity>> {
            self.state.subscribe()
        }

        async fn id_token_result(&self, _: &Identity, _: bool) -> AppResult<IdTokenResult> {
            if self.stalled {
                std::future::pending::<()>().await;
            }
            let claims = self.claims.clone().ok_or(AppError::Unauthorized)?;
            Ok(IdTokenResult {
                token: "t".to_string(),
                claims,
                issued_at: chrono::Utc::now(),
                expires_at: chrono::Utc::now(),
            })
        }
    }

    fn user() -> Identity {
        Identity {
            uid: "u1".to_string(),
            email: Some("boss@x.com".to_string()),
            display_name: None,
            photo_url: None,
            email_verified: true,
        }
    }

    fn signed_in(claims: Option<TokenClaims>) -> Arc<FixedClaims> {
        let (state, _) = watch::channel(Some(user()));
        Arc::new(FixedClaims {
            claims,
            state,
            stalled: false,
        })
    }

    fn session_state(user: Option<Identity>) -> AdminUserState {
        AdminUserState {
            user,
            user_loading: false,
            ..AdminUserState::initial()
        }
    }

    fn role(role: &str) -> TokenClaims {
        let mut claims = serde_json::Map::new();
        claims.insert("role".to_string(), json!(role));
        TokenClaims(claims)
    }

    #[tokio::test]
    async fn test_resolve_gate_outcomes() {
        let admin = signed_in(Some(role("admin")));
        let staff = signed_in(Some(role("manager")));
        let broken = signed_in(None);

        let state = session_state(Some(user()));
        assert_eq!(resolve_gate(&state, admin.as_ref(), false).await, AdminGate::Admin(user()));
        assert_eq!(resolve_gate(&state, staff.as_ref(), false).await, AdminGate::NotAdmin(user()));
        assert_eq!(resolve_gate(&state, broken.as_ref(), false).await, AdminGate::NotAdmin(user()));

        let signed_out = session_state(None);
        assert_eq!(resolve_gate(&signed_out, admin.as_ref(), false).await, AdminGate::NotSignedIn);
        assert_eq!(
            resolve_gate(&AdminUserState::initial(), admin.as_ref(), false).await,
            AdminGate::Loading
        );
    }

    #[tokio::test]
    async fn test_watcher_follows_session() {
        let session = Publisher::new(AdminUserState::initial());
        let watcher = AdminGateWatcher::start(session.holder(), signed_in(Some(role("admin"))));
        assert_eq!(watcher.current(), AdminGate::Loading);

        session.next(session_state(Some(user())));
        let gate = tokio::time::timeout(
            Duration::from_secs(1),
            watcher.gate().wait_for(|g| g.is_admin()),
        )
        .await
        .unwrap();
        assert_eq!(gate, Some(AdminGate::Admin(user())));

        session.next(session_state(None));
        let gate = tokio::time::timeout(
            Duration::from_secs(1),
            watcher.gate().wait_for(|g| *g == AdminGate::NotSignedIn),
        )
        .await
        .unwrap();
        assert!(gate.is_some());

        watcher.close().await;
    }

    #[tokio::test]
    async fn test_close_interrupts_pending_token_lookup() {
        let (state, _) = watch::channel(Some(user()));
        let identity = Arc::new(FixedClaims {
            claims: Some(role("admin")),
            state,
            stalled: true,
        });
        let session = Publisher::new(session_state(Some(user())));
        let watcher = AdminGateWatcher::start(session.holder(), identity);
        let gate = watcher.gate();

        // Let the task reach the token lookup
        tokio::time::sleep(Duration::from_millis(50)).await;
        tokio::time::timeout(Duration::from_secs(1), watcher.close())
            .await
            .unwrap();
        assert_eq!(gate.current(), AdminGate::Loading);
    }
}
