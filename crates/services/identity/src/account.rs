//! Stored identity accounts and their persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::sync::RwLock;

use common::ProviderFault;
use domain::{CustomClaims, Identity};

use crate::entities::account::{self, ActiveModel, Entity as AccountEntity};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Account held by the identity provider
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub uid: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub email_verified: bool,
    pub verification_code: Option<String>,
    pub custom_claims: CustomClaims,
    /// When custom claims last changed; tokens issued earlier are stale
    pub claims_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            email: email.into(),
            password_hash: None,
            display_name: None,
            photo_url: None,
            email_verified: false,
            verification_code: None,
            custom_claims: CustomClaims::new(),
            claims_updated_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn to_identity(&self) -> Identity {
        Identity {
            uid: self.uid.clone(),
            email: Some(self.email.clone()),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
            email_verified: self.email_verified,
        }
    }
}

/// Account persistence for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_uid(&self, uid: &str) -> Result<Option<Account>, ProviderFault>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ProviderFault>;

    async fn find_by_verification_code(&self, code: &str)
        -> Result<Option<Account>, ProviderFault>;

    /// Insert a new account; an existing email is `auth/email-already-in-use`
    async fn insert(&self, account: Account) -> Result<(), ProviderFault>;

    /// Replace a stored account
    async fn update(&self, account: Account) -> Result<(), ProviderFault>;
}

fn email_taken(email: &str) -> ProviderFault {
    ProviderFault::coded(
        "auth/email-already-in-use",
        format!("The email address {} is already in use by another account", email),
    )
}

fn missing_account(uid: &str) -> ProviderFault {
    ProviderFault::coded(
        "auth/user-not-found",
        format!("There is no user record corresponding to {}", uid),
    )
}

/// Accounts kept in process memory
#[derive(Default)]
pub struct MemoryAccounts {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccounts {
    async fn find_by_uid(&self, uid: &str) -> Result<Option<Account>, ProviderFault> {
        Ok(self.accounts.read().await.get(uid).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ProviderFault> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_verification_code(
        &self,
        code: &str,
    ) -> Result<Option<Account>, ProviderFault> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.verification_code.as_deref() == Some(code))
            .cloned())
    }

    async fn insert(&self, account: Account) -> Result<(), ProviderFault> {
        let mut accounts = self.accounts.write().await;
        if accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(email_taken(&account.email));
        }
        accounts.insert(account.uid.clone(), account);
        Ok(())
    }

    async fn update(&self, account: Account) -> Result<(), ProviderFault> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&account.uid) {
            Some(stored) => {
                *stored = account;
                Ok(())
            }
            None => Err(missing_account(&account.uid)),
        }
    }
}

/// Accounts persisted in the `accounts` table
pub struct SqlAccounts {
    db: DatabaseConnection,
}

impl SqlAccounts {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for SqlAccounts {
    async fn find_by_uid(&self, uid: &str) -> Result<Option<Account>, ProviderFault> {
        AccountEntity::find_by_id(uid.to_string())
            .one(&self.db)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, ProviderFault> {
        AccountEntity::find()
            .filter(account::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_by_verification_code(
        &self,
        code: &str,
    ) -> Result<Option<Account>, ProviderFault> {
        AccountEntity::find()
            .filter(account::Column::VerificationCode.eq(code))
            .one(&self.db)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn insert(&self, account: Account) -> Result<(), ProviderFault> {
        if self.find_by_email(&account.email).await?.is_some() {
            return Err(email_taken(&account.email));
        }
        let model = ActiveModel::try_from(account)?;
        AccountEntity::insert(model).exec(&self.db).await?;
        Ok(())
    }

    async fn update(&self, account: Account) -> Result<(), ProviderFault> {
        if self.find_by_uid(&account.uid).await?.is_none() {
            return Err(missing_account(&account.uid));
        }
        ActiveModel::try_from(account)?.update(&self.db).await?;
        Ok(())
    }
}

impl TryFrom<account::Model> for Account {
    type Error = ProviderFault;

    fn try_from(model: account::Model) -> Result<Self, Self::Error> {
        let custom_claims = serde_json::from_str(&model.custom_claims).map_err(|e| {
            ProviderFault::coded(
                "auth/internal-error",
                format!("Custom claims of {} are unreadable: {}", model.uid, e),
            )
        })?;
        Ok(Self {
            uid: model.uid,
            email: model.email,
            password_hash: model.password_hash,
            display_name: model.display_name,
            photo_url: model.photo_url,
            email_verified: model.email_verified,
            verification_code: model.verification_code,
            custom_claims,
            claims_updated_at: model.claims_updated_at,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<Account> for ActiveModel {
    type Error = ProviderFault;

    fn try_from(account: Account) -> Result<Self, Self::Error> {
        let custom_claims = serde_json::to_string(&account.custom_claims)
            .map_err(|e| ProviderFault::coded("auth/invalid-claims", e.to_string()))?;
        Ok(ActiveModel {
            uid: Set(account.uid),
            email: Set(account.email.to_lowercase()),
            password_hash: Set(account.password_hash),
            display_name: Set(account.display_name),
            photo_url: Set(account.photo_url),
            email_verified: Set(account.email_verified),
            verification_code: Set(account.verification_code),
            custom_claims: Set(custom_claims),
            claims_updated_at: Set(account.claims_updated_at),
            created_at: Set(account.created_at),
        })
    }
}
