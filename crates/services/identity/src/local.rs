//! Bundled identity provider backed by an [`AccountStore`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info};
use validator::ValidateEmail;

use common::{AppError, AppResult, ErrorMapper, IdentityConfig, ProviderFault, Severity};
use domain::{CustomClaims, IdTokenResult, Identity, TokenClaims};

use crate::account::{Account, AccountStore};
use crate::password::Password;
use crate::provider::{IdentityAdmin, IdentityProvider, ProviderAssertion};
use crate::token::TokenSigner;

fn invalid_credential() -> ProviderFault {
    ProviderFault::coded(
        "auth/invalid-credential",
        "The supplied credentials are incorrect",
    )
}

/// Identity provider with argon2 passwords and HS256 ID tokens.
///
/// One instance models one client session: it tracks a single signed-in
/// identity and publishes every change on [`IdentityProvider::auth_state`].
pub struct LocalIdentity {
    accounts: Arc<dyn AccountStore>,
    signer: TokenSigner,
    min_password_length: usize,
    errors: ErrorMapper,
    state: watch::Sender<Option<Identity>>,
    tokens: Mutex<HashMap<String, IdTokenResult>>,
}

impl LocalIdentity {
    pub fn new(accounts: Arc<dyn AccountStore>, config: &IdentityConfig) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            accounts,
            signer: TokenSigner::new(config),
            min_password_length: config.min_password_length,
            errors: ErrorMapper::default(),
            state,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    fn fault(&self, fault: ProviderFault) -> AppError {
        self.errors.map(fault, Severity::Error)
    }

    fn check_email(&self, email: &str) -> AppResult<()> {
        if email.validate_email() {
            Ok(())
        } else {
            Err(self.fault(ProviderFault::coded(
                "auth/invalid-email",
                "The email address is badly formatted",
            )))
        }
    }

    fn publish(&self, identity: Option<Identity>) {
        self.state.send_replace(identity);
    }

    fn cached_token(&self, uid: &str) -> Option<IdTokenResult> {
        match self.tokens.lock() {
            Ok(tokens) => tokens.get(uid).cloned(),
            Err(poisoned) => poisoned.into_inner().get(uid).cloned(),
        }
    }

    fn cache_token(&self, uid: &str, token: IdTokenResult) {
        let mut tokens = match self.tokens.lock() {
            Ok(tokens) => tokens,
            Err(poisoned) => poisoned.into_inner(),
        };
        tokens.insert(uid.to_string(), token);
    }

    async fn account(&self, uid: &str) -> AppResult<Account> {
        self.accounts
            .find_by_uid(uid)
            .await
            .map_err(|f| self.fault(f))?
            .ok_or_else(|| {
                self.fault(ProviderFault::coded(
                    "auth/user-not-found",
                    "There is no user record corresponding to this identifier",
                ))
            })
    }

    /// Verify an ID token issued by this provider
    pub fn verify_id_token(&self, token: &str) -> AppResult<TokenClaims> {
        self.signer.verify(token).map_err(|f| self.fault(f))
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<Identity> {
        self.check_email(email)?;
        let account = self
            .accounts
            .find_by_email(email)
            .await
            .map_err(|f| self.fault(f))?;

        // Verify even for unknown emails so both paths cost the same
        let stored = account
            .as_ref()
            .and_then(|a| a.password_hash.as_deref())
            .map(Password::from_hash)
            .unwrap_or_else(Password::dummy);
        let valid = stored.verify(password);

        match account {
            Some(account) if valid && account.password_hash.is_some() => {
                info!(uid = %account.uid, "Signed in with password");
                let identity = account.to_identity();
                self.publish(Some(identity.clone()));
                Ok(identity)
            }
            _ => Err(self.fault(invalid_credential())),
        }
    }

    async fn sign_in_with_provider(&self, assertion: ProviderAssertion) -> AppResult<Identity> {
        self.check_email(&assertion.email)?;
        let existing = self
            .accounts
            .find_by_email(&assertion.email)
            .await
            .map_err(|f| self.fault(f))?;

        let account = match existing {
            Some(mut account) => {
                account.display_name = assertion.display_name.or(account.display_name);
                account.photo_url = assertion.photo_url.or(account.photo_url);
                account.email_verified = true;
                self.accounts
                    .update(account.clone())
                    .await
                    .map_err(|f| self.fault(f))?;
                account
            }
            None => {
                let mut account = Account::new(assertion.email);
                account.display_name = assertion.display_name;
                account.photo_url = assertion.photo_url;
                // The external provider vouches for the address
                account.email_verified = true;
                self.accounts
                    .insert(account.clone())
                    .await
                    .map_err(|f| self.fault(f))?;
                account
            }
        };

        info!(uid = %account.uid, provider = %assertion.provider_id, "Signed in with provider");
        let identity = account.to_identity();
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn create_user_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<Identity> {
        self.check_email(email)?;
        let password =
            Password::new(password, self.min_password_length).map_err(|f| self.fault(f))?;

        let mut account = Account::new(email);
        account.password_hash = Some(password.into_string());
        self.accounts
            .insert(account.clone())
            .await
            .map_err(|f| self.fault(f))?;

        info!(uid = %account.uid, "Created account");
        let identity = account.to_identity();
        self.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> AppResult<()> {
        if let Some(identity) = self.current_user() {
            debug!(uid = %identity.uid, "Signed out");
        }
        self.publish(None);
        Ok(())
    }

    async fn send_email_verification(&self, identity: &Identity) -> AppResult<String> {
        let mut account = self.account(&identity.uid).await?;
        let code = uuid::Uuid::new_v4().simple().to_string();
        account.verification_code = Some(code.clone());
        self.accounts
            .update(account)
            .await
            .map_err(|f| self.fault(f))?;
        info!(uid = %identity.uid, "Issued email verification code");
        Ok(code)
    }

    async fn apply_email_verification(&self, code: &str) -> AppResult<()> {
        let mut account = self
            .accounts
            .find_by_verification_code(code)
            .await
            .map_err(|f| self.fault(f))?
            .ok_or_else(|| {
                self.fault(ProviderFault::coded(
                    "auth/invalid-action-code",
                    "The verification code is invalid or was already used",
                ))
            })?;

        account.email_verified = true;
        account.verification_code = None;
        let identity = account.to_identity();
        self.accounts
            .update(account)
            .await
            .map_err(|f| self.fault(f))?;

        if self.current_user().map(|u| u.uid) == Some(identity.uid.clone()) {
            self.publish(Some(identity));
        }
        Ok(())
    }

    fn current_user(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    fn auth_state(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }

    async fn id_token_result(
        &self,
        identity: &Identity,
        force_refresh: bool,
    ) -> AppResult<IdTokenResult> {
        let account = self.account(&identity.uid).await?;

        if !force_refresh {
            if let Some(cached) = self.cached_token(&identity.uid) {
                let fresh_claims = account
                    .claims_updated_at
                    .map_or(true, |changed| changed <= cached.issued_at);
                if cached.expires_at > Utc::now() && fresh_claims {
                    return Ok(cached);
                }
            }
        }

        let token = self.signer.sign(&account).map_err(|f| self.fault(f))?;
        self.cache_token(&identity.uid, token.clone());
        Ok(token)
    }
}

#[async_trait]
impl IdentityAdmin for LocalIdentity {
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        Ok(self
            .accounts
            .find_by_email(email)
            .await
            .map_err(|f| self.fault(f))?
            .map(|a| a.to_identity()))
    }

    async fn set_custom_claims(&self, uid: &str, claims: CustomClaims) -> AppResult<()> {
        let mut account = self.account(uid).await?;
        account.custom_claims = claims;
        account.claims_updated_at = Some(Utc::now());
        self.accounts
            .update(account)
            .await
            .map_err(|f| self.fault(f))?;
        info!(uid = %uid, "Custom claims updated");
        Ok(())
    }
}
