//! Identity provider interfaces.
//!
//! [`IdentityProvider`] is what a signed-in client talks to; [`IdentityAdmin`]
//! is the privileged server-side surface used by the role triggers.

use async_trait::async_trait;
use tokio::sync::watch;

use common::AppResult;
use domain::{CustomClaims, IdTokenResult, Identity};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Result of a popup or federated sign-in with an external provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAssertion {
    /// Provider identifier, e.g. `google.com`
    pub provider_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl ProviderAssertion {
    pub fn new(provider_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            email: email.into(),
            display_name: None,
            photo_url: None,
        }
    }
}

/// Client-side authentication operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Identity>;

    /// Popup / federated sign-in; creates the account on first use
    async fn sign_in_with_provider(&self, assertion: ProviderAssertion) -> AppResult<Identity>;

    /// Create an account and sign it in
    async fn create_user_with_password(&self, email: &str, password: &str)
        -> AppResult<Identity>;

    async fn sign_out(&self) -> AppResult<()>;

    /// Issue a verification code for the identity's email
    async fn send_email_verification(&self, identity: &Identity) -> AppResult<String>;

    /// Mark the email owning `code` as verified
    async fn apply_email_verification(&self, code: &str) -> AppResult<()>;

    fn current_user(&self) -> Option<Identity>;

    /// Signed-in identity; every sign-in and sign-out is one change
    fn auth_state(&self) -> watch::Receiver<Option<Identity>>;

    /// Signed token and claims; `force_refresh` bypasses the token cache
    async fn id_token_result(
        &self,
        identity: &Identity,
        force_refresh: bool,
    ) -> AppResult<IdTokenResult>;
}

/// Privileged identity operations.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Identity registered under `email`, if any
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<Identity>>;

    /// Replace the custom claims of `uid`
    async fn set_custom_claims(&self, uid: &str, claims: CustomClaims) -> AppResult<()>;
}
