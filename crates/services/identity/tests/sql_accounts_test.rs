//! Identity provider over SQLite-backed accounts.

use std::sync::Arc;

use common::{Database, IdentityConfig, StoreConfig};
use identity_lib::{
    AccountStore, IdentityAdmin, IdentityProvider, LocalIdentity, SqlAccounts,
};
use serde_json::json;

async fn sql_identity() -> LocalIdentity {
    let config = StoreConfig {
        database_url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    let db = Database::connect(&config).await.unwrap();
    let accounts: Arc<dyn AccountStore> = Arc::new(SqlAccounts::new(db.get_connection()));
    LocalIdentity::new(
        accounts,
        &IdentityConfig::new("test-secret-key-minimum-32-chars!!", 60),
    )
}

#[tokio::test]
async fn test_signup_sign_in_and_claims_round_trip_through_database() {
    let identity = sql_identity().await;

    let created = identity
        .create_user_with_password("Staff@X.com", "password123")
        .await
        .unwrap();
    identity.sign_out().await.unwrap();

    let signed_in = identity
        .sign_in_with_password("staff@x.com", "password123")
        .await
        .unwrap();
    assert_eq!(signed_in.uid, created.uid);

    let found = identity
        .get_user_by_email("staff@x.com")
        .await
        .unwrap()
        .unwrap();

    let mut claims = serde_json::Map::new();
    claims.insert("role".to_string(), json!("printing"));
    identity.set_custom_claims(&found.uid, claims).await.unwrap();

    let token = identity.id_token_result(&signed_in, true).await.unwrap();
    assert_eq!(token.claims.role(), Some("printing"));
}

#[tokio::test]
async fn test_duplicate_signup_is_rejected() {
    let identity = sql_identity().await;
    identity
        .create_user_with_password("a@x.com", "password123")
        .await
        .unwrap();

    let err = identity
        .create_user_with_password("a@x.com", "password456")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "auth/email-already-in-use");
}
