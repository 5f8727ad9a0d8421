//! Role synchronisation triggers.
//!
//! Writing a role document (`roles/{docId}` for staff, `admin/{docId}` for
//! administrators) mirrors its `role` into the custom claims of the identity
//! registered under its `email`.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use common::{AppError, AppResult};
use domain::{CustomClaims, RoleDocument, ADMIN_ROLES, ROLE_CLAIM, STAFF_ROLES};
use identity_lib::IdentityAdmin;
use store_lib::{DocumentEvent, EventKind};

use crate::pattern::PathPattern;

/// Document change a trigger reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    OnCreate,
    OnUpdate,
}

impl TriggerKind {
    fn accepts(&self, kind: EventKind) -> bool {
        matches!(
            (self, kind),
            (TriggerKind::OnCreate, EventKind::Created) | (TriggerKind::OnUpdate, EventKind::Updated)
        )
    }
}

/// A named reaction to role document writes
#[derive(Debug, Clone)]
pub struct Trigger {
    pub name: &'static str,
    pub pattern: PathPattern,
    pub kind: TriggerKind,
    pub allowed_roles: &'static [&'static str],
}

impl Trigger {
    fn new(
        name: &'static str,
        pattern: &str,
        kind: TriggerKind,
        allowed_roles: &'static [&'static str],
    ) -> AppResult<Self> {
        Ok(Self {
            name,
            pattern: PathPattern::parse(pattern)?,
            kind,
            allowed_roles,
        })
    }

    /// The staff and admin triggers, on create and on update
    pub fn role_triggers() -> AppResult<Vec<Trigger>> {
        Ok(vec![
            Self::new("assignStaffRoleOnCreate", "roles/{docId}", TriggerKind::OnCreate, STAFF_ROLES)?,
            Self::new("assignStaffRoleOnUpdate", "roles/{docId}", TriggerKind::OnUpdate, STAFF_ROLES)?,
            Self::new("assignAdminRoleOnCreate", "admin/{docId}", TriggerKind::OnCreate, ADMIN_ROLES)?,
            Self::new("assignAdminRoleOnUpdate", "admin/{docId}", TriggerKind::OnUpdate, ADMIN_ROLES)?,
        ])
    }

    pub fn fires_on(&self, event: &DocumentEvent) -> bool {
        self.kind.accepts(event.kind) && self.pattern.matches(&event.path, &event.id).is_some()
    }
}

/// What one trigger invocation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    ClaimSet { uid: String, role: String },
    UserNotFound { email: String },
    RoleNotAllowed { role: String },
}

/// Applies role documents to identity claims
#[derive(Clone)]
pub struct RoleSync {
    admin: Arc<dyn IdentityAdmin>,
}

impl RoleSync {
    pub fn new(admin: Arc<dyn IdentityAdmin>) -> Self {
        Self { admin }
    }

    /// Handle one event for one trigger; holds no state between calls
    pub async fn handle(&self, trigger: &Trigger, event: &DocumentEvent) -> AppResult<Outcome> {
        let snapshot = event
            .after
            .clone()
            .ok_or_else(|| AppError::validation("role trigger fired without a written snapshot"))?;
        let document: RoleDocument = serde_json::from_value(Value::Object(snapshot))?;

        self.assign_role(&document, trigger.allowed_roles).await
    }

    async fn assign_role(
        &self,
        document: &RoleDocument,
        allowed_roles: &[&str],
    ) -> AppResult<Outcome> {
        let Some(user) = self.admin.get_user_by_email(&document.email).await? else {
            debug!(email = %document.email, "No identity for role document");
            return Ok(Outcome::UserNotFound {
                email: document.email.clone(),
            });
        };

        if !allowed_roles.contains(&document.role.as_str()) {
            debug!(email = %document.email, role = %document.role, "Role not assignable here");
            return Ok(Outcome::RoleNotAllowed {
                role: document.role.clone(),
            });
        }

        let mut claims = CustomClaims::new();
        claims.insert(ROLE_CLAIM.to_string(), Value::String(document.role.clone()));
        self.admin.set_custom_claims(&user.uid, claims).await?;

        info!(uid = %user.uid, role = %document.role, "Role claim assigned");
        Ok(Outcome::ClaimSet {
            uid: user.uid,
            role: document.role.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Identity;
    use identity_lib::MockIdentityAdmin;
    use mockall::predicate::eq;
    use serde_json::json;
    use store_lib::CollectionPath;

    fn event(path: &str, kind: EventKind, after: Value) -> DocumentEvent {
        DocumentEvent {
            kind,
            path: CollectionPath::new(path).unwrap(),
            id: "d1".to_string(),
            before: None,
            after: match after {
                Value::Object(map) => Some(map),
                _ => None,
            },
        }
    }

    fn identity(uid: &str) -> Identity {
        Identity {
            uid: uid.to_string(),
            email: Some("a@x.com".to_string()),
            display_name: None,
            photo_url: None,
            email_verified: false,
        }
    }

    fn trigger(name: &str) -> Trigger {
        Trigger::role_triggers()
            .unwrap()
            .into_iter()
            .find(|t| t.name == name)
            .unwrap()
    }

    #[test]
    fn test_trigger_selection() {
        let created = event("roles", EventKind::Created, json!({}));
        let updated = event("admin", EventKind::Updated, json!({}));
        let deleted = event("roles", EventKind::Deleted, json!({}));

        let fired: Vec<_> = Trigger::role_triggers()
            .unwrap()
            .into_iter()
            .filter(|t| t.fires_on(&created) || t.fires_on(&updated) || t.fires_on(&deleted))
            .map(|t| t.name)
            .collect();
        assert_eq!(fired, vec!["assignStaffRoleOnCreate", "assignAdminRoleOnUpdate"]);
    }

    #[tokio::test]
    async fn test_sets_role_claim_for_known_user() {
        let mut admin = MockIdentityAdmin::new();
        admin
            .expect_get_user_by_email()
            .with(eq("a@x.com"))
            .returning(|_| Ok(Some(identity("u1"))));
        admin
            .expect_set_custom_claims()
            .withf(|uid, claims| uid == "u1" && claims.get("role") == Some(&json!("manager")))
            .times(1)
            .returning(|_, _| Ok(()));

        let outcome = RoleSync::new(Arc::new(admin))
            .handle(
                &trigger("assignStaffRoleOnCreate"),
                &event("roles", EventKind::Created, json!({ "email": "a@x.com", "role": "manager" })),
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::ClaimSet {
                uid: "u1".to_string(),
                role: "manager".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_admin_role_rejected_by_staff_trigger() {
        let mut admin = MockIdentityAdmin::new();
        admin
            .expect_get_user_by_email()
            .returning(|_| Ok(Some(identity("u1"))));
        admin.expect_set_custom_claims().never();

        let outcome = RoleSync::new(Arc::new(admin))
            .handle(
                &trigger("assignStaffRoleOnUpdate"),
                &event("roles", EventKind::Updated, json!({ "email": "a@x.com", "role": "admin" })),
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::RoleNotAllowed { role: "admin".to_string() });
    }

    #[tokio::test]
    async fn test_unknown_user_sets_nothing() {
        let mut admin = MockIdentityAdmin::new();
        admin.expect_get_user_by_email().returning(|_| Ok(None));
        admin.expect_set_custom_claims().never();

        let outcome = RoleSync::new(Arc::new(admin))
            .handle(
                &trigger("assignAdminRoleOnCreate"),
                &event("admin", EventKind::Created, json!({ "email": "ghost@x.com", "role": "admin" })),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::UserNotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_error() {
        let admin = MockIdentityAdmin::new();
        let result = RoleSync::new(Arc::new(admin))
            .handle(
                &trigger("assignStaffRoleOnCreate"),
                &event("roles", EventKind::Created, json!({ "role": "manager" })),
            )
            .await;

        assert!(matches!(result, Err(AppError::Decode(_))));
    }
}
