//! Signed-in administrator session.
//!
//! [`AdminSession`] owns the only [`Publisher`] of the [`AdminUserState`]. A
//! single listener task applies identity state changes from the provider and
//! the outcomes of sign-in and sign-out calls made through the session.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use common::{with_cancel, AppError, AppResult};
use domain::{AdminUserState, Identity, SIGN_OUT_MESSAGE};
use identity_lib::{IdentityProvider, ProviderAssertion};

use crate::state::{Publisher, StateHolder};

/// Outcome of a call that the listener folds into the session state
#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionEvent {
    SignInFailed(String),
    SignedOut,
    SignOutFailed(String),
}

pub struct AdminSession {
    identity: Arc<dyn IdentityProvider>,
    state: StateHolder<AdminUserState>,
    events: mpsc::UnboundedSender<SessionEvent>,
    shutdown: CancellationToken,
    listener: Option<JoinHandle<()>>,
}

impl AdminSession {
    /// Start listening to `identity`; the state starts out loading
    pub fn start(identity: Arc<dyn IdentityProvider>) -> Self {
        let publisher = Publisher::new(AdminUserState::initial());
        let state = publisher.holder();
        let (events, receiver) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let listener = tokio::spawn(listen(
            publisher,
            identity.auth_state(),
            receiver,
            shutdown.clone(),
        ));

        Self {
            identity,
            state,
            events,
            shutdown,
            listener: Some(listener),
        }
    }

    pub fn state(&self) -> StateHolder<AdminUserState> {
        self.state.clone()
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// State once the initial identity has been applied
    pub async fn settled(&self) -> AppResult<AdminUserState> {
        self.state
            .wait_for(|s| !s.user_loading)
            .await
            .ok_or_else(|| AppError::internal("session listener stopped"))
    }

    /// Popup / federated sign-in
    pub async fn sign_in_with_provider(
        &self,
        assertion: ProviderAssertion,
        cancel: &CancellationToken,
    ) -> AppResult<Identity> {
        let result = with_cancel(cancel, self.identity.sign_in_with_provider(assertion)).await;
        self.report_sign_in(result)
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Identity> {
        let result =
            with_cancel(cancel, self.identity.sign_in_with_password(email, password)).await;
        self.report_sign_in(result)
    }

    pub async fn sign_out(&self, cancel: &CancellationToken) -> AppResult<()> {
        let result = with_cancel(cancel, self.identity.sign_out()).await;
        match &result {
            Ok(()) => self.send(SessionEvent::SignedOut),
            Err(AppError::Cancelled) => {}
            Err(e) => self.send(SessionEvent::SignOutFailed(e.message())),
        }
        result
    }

    fn report_sign_in(&self, result: AppResult<Identity>) -> AppResult<Identity> {
        match &result {
            Ok(user) => info!(uid = %user.uid, "Administrator signed in"),
            Err(AppError::Cancelled) => {}
            Err(e) => self.send(SessionEvent::SignInFailed(e.message())),
        }
        result
    }

    fn send(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Session listener already stopped");
        }
    }

    /// Stop the listener and wait for it to finish
    pub async fn close(mut self) {
        self.shutdown.cancel();
        if let Some(listener) = self.listener.take() {
            let _ = listener.await;
        }
    }
}

impl Drop for AdminSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn listen(
    publisher: Publisher<AdminUserState>,
    mut auth: watch::Receiver<Option<Identity>>,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    shutdown: CancellationToken,
) {
    let initial = auth.borrow_and_update().clone();
    apply_identity(&publisher, initial);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            changed = auth.changed() => {
                if changed.is_err() {
                    debug!("Identity provider dropped its state channel");
                    break;
                }
                let user = auth.borrow_and_update().clone();
                apply_identity(&publisher, user);
            }
            Some(event) = events.recv() => apply_event(&publisher, event),
        }
    }
}

fn apply_identity(publisher: &Publisher<AdminUserState>, user: Option<Identity>) {
    publisher.update(|state| {
        if user.is_some() {
            state.error.clear();
            state.sign_out_message.clear();
        }
        state.user = user;
        state.user_loading = false;
    });
}

fn apply_event(publisher: &Publisher<AdminUserState>, event: SessionEvent) {
    publisher.update(|state| {
        state.user_loading = false;
        match event {
            SessionEvent::SignInFailed(message) | SessionEvent::SignOutFailed(message) => {
                state.error = message;
                state.sign_out_message.clear();
            }
            SessionEvent::SignedOut => {
                state.error.clear();
                state.sign_out_message = SIGN_OUT_MESSAGE.to_string();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::IdentityConfig;
    use identity_lib::{LocalIdentity, MemoryAccounts};

    fn provider() -> Arc<LocalIdentity> {
        Arc::new(LocalIdentity::new(
            Arc::new(MemoryAccounts::new()),
            &IdentityConfig::new("test-secret-key-minimum-32-chars!!", 60),
        ))
    }

    #[tokio::test]
    async fn test_initial_state_settles_without_user() {
        let session = AdminSession::start(provider());
        let state = session.settled().await.unwrap();
        assert!(state.user.is_none());
        assert!(state.error.is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_then_sign_out() {
        let identity = provider();
        identity
            .create_user_with_password("boss@x.com", "password123")
            .await
            .unwrap();
        identity.sign_out().await.unwrap();

        let session = AdminSession::start(identity);
        let cancel = CancellationToken::new();
        let user = session
            .sign_in_with_password("boss@x.com", "password123", &cancel)
            .await
            .unwrap();

        let state = session
            .state()
            .wait_for(|s| s.user.is_some())
            .await
            .unwrap();
        assert_eq!(state.user, Some(user));

        session.sign_out(&cancel).await.unwrap();
        let state = session
            .state()
            .wait_for(|s| s.user.is_none() && !s.sign_out_message.is_empty())
            .await
            .unwrap();
        assert_eq!(state.sign_out_message, SIGN_OUT_MESSAGE);
    }

    #[tokio::test]
    async fn test_failed_sign_in_sets_error() {
        let session = AdminSession::start(provider());
        let cancel = CancellationToken::new();

        let err = session
            .sign_in_with_password("ghost@x.com", "password123", &cancel)
            .await
            .unwrap_err();

        let state = session
            .state()
            .wait_for(|s| !s.error.is_empty())
            .await
            .unwrap();
        assert_eq!(state.error, err.message());
        assert!(state.user.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_sign_in_leaves_state_alone() {
        let session = AdminSession::start(provider());
        session.settled().await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = session
            .sign_in_with_password("ghost@x.com", "password123", &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Cancelled);
        assert!(session.state().current().error.is_empty());
    }
}
