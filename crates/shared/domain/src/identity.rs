//! Signed-in identity, token claims and the admin session view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{ROLE_ADMIN, ROLE_CLAIM};

/// Custom claims attached to an identity by the server side
pub type CustomClaims = Map<String, Value>;

/// Identity as seen by a signed-in client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub email_verified: bool,
}

/// Claims read back from an issued ID token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims(pub Map<String, Value>);

impl TokenClaims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Role label carried by the token, if any
    pub fn role(&self) -> Option<&str> {
        self.0.get(ROLE_CLAIM).and_then(Value::as_str)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(ROLE_ADMIN)
    }
}

/// Signed token together with its decoded claims
#[derive(Debug, Clone, PartialEq)]
pub struct IdTokenResult {
    pub token: String,
    pub claims: TokenClaims,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Process-wide view of the signed-in administrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUserState {
    pub user: Option<Identity>,
    pub user_loading: bool,
    pub error: String,
    pub sign_out_message: String,
}

impl AdminUserState {
    /// State before the identity provider reported anything
    pub fn initial() -> Self {
        Self {
            user: None,
            user_loading: true,
            error: String::new(),
            sign_out_message: String::new(),
        }
    }
}

impl Default for AdminUserState {
    fn default() -> Self {
        Self::initial()
    }
}
