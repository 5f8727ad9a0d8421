//! ID token signing and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use common::{IdentityConfig, ProviderFault};
use domain::{IdTokenResult, TokenClaims};

use crate::account::Account;

/// Registered claims every ID token carries
const RESERVED_CLAIMS: &[&str] = &["sub", "email", "email_verified", "iat", "exp"];

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub email_verified: bool,
    pub iat: i64,
    pub exp: i64,
    /// Custom claims set through the admin interface
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl Claims {
    fn into_token_claims(self) -> TokenClaims {
        let mut map = self.custom;
        map.insert("sub".to_string(), Value::String(self.sub));
        map.insert("email".to_string(), Value::String(self.email));
        map.insert("email_verified".to_string(), Value::Bool(self.email_verified));
        map.insert("iat".to_string(), Value::from(self.iat));
        map.insert("exp".to_string(), Value::from(self.exp));
        TokenClaims(map)
    }
}

pub(crate) fn token_fault(err: jsonwebtoken::errors::Error) -> ProviderFault {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => {
            ProviderFault::coded("auth/id-token-expired", "The ID token has expired")
        }
        ErrorKind::InvalidSignature | ErrorKind::InvalidToken | ErrorKind::Base64(_) => {
            ProviderFault::coded("auth/argument-error", "The ID token is malformed or forged")
        }
        _ => ProviderFault::unclassified(err.to_string()),
    }
}

/// Signs ID tokens with an HS256 shared secret
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret_bytes()),
            ttl: Duration::minutes(config.token_ttl_minutes),
        }
    }

    /// Issue a token for `account` carrying its current custom claims
    pub fn sign(&self, account: &Account) -> Result<IdTokenResult, ProviderFault> {
        let issued_at = Utc::now();
        let expires_at = issued_at + self.ttl;

        let custom = account
            .custom_claims
            .iter()
            .filter(|(name, _)| !RESERVED_CLAIMS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let claims = Claims {
            sub: account.uid.clone(),
            email: account.email.clone(),
            email_verified: account.email_verified,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            custom,
        };

        let token = encode(&Header::default(), &claims, &self.encoding).map_err(token_fault)?;

        Ok(IdTokenResult {
            token,
            claims: claims.into_token_claims(),
            issued_at,
            expires_at,
        })
    }

    /// Verify a token and return its claims
    pub fn verify(&self, token: &str) -> Result<TokenClaims, ProviderFault> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(token_fault)?;
        Ok(data.claims.into_token_claims())
    }
}
