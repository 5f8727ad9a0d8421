//! Admin gate evaluation.
//!
//! The gate decides which of four exclusive views an admin surface shows.
//! It is a pure function of the session state and the claims read from the
//! signed-in identity's token.

use crate::identity::{AdminUserState, Identity, TokenClaims};

/// Progress of the claim lookup for the current identity
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimLookup {
    /// Token claims have been requested but not yet read
    Pending,
    /// Claims were read, `None` when no token could be obtained
    Resolved(Option<TokenClaims>),
}

/// Outcome of the admin gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminGate {
    Loading,
    NotSignedIn,
    NotAdmin(Identity),
    Admin(Identity),
}

impl AdminGate {
    /// Evaluate the gate from session state and claim lookup
    pub fn evaluate(state: &AdminUserState, claims: &ClaimLookup) -> Self {
        if state.user_loading {
            return AdminGate::Loading;
        }

        let Some(user) = state.user.as_ref() else {
            return AdminGate::NotSignedIn;
        };

        match claims {
            ClaimLookup::Pending => AdminGate::Loading,
            ClaimLookup::Resolved(Some(claims)) if claims.is_admin() => {
                AdminGate::Admin(user.clone())
            }
            ClaimLookup::Resolved(_) => AdminGate::NotAdmin(user.clone()),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, AdminGate::Admin(_))
    }

    /// Render the gate through a view implementation
    pub fn render<V: GateView + ?Sized>(&self, view: &V) -> V::Output {
        match self {
            AdminGate::Loading => view.loading(),
            AdminGate::NotSignedIn => view.sign_in(),
            AdminGate::NotAdmin(identity) => view.not_admin(identity),
            AdminGate::Admin(identity) => view.admin(identity),
        }
    }
}

/// Surface rendered for each gate outcome
pub trait GateView {
    type Output;

    fn loading(&self) -> Self::Output;

    fn sign_in(&self) -> Self::Output;

    fn not_admin(&self, identity: &Identity) -> Self::Output;

    fn admin(&self, identity: &Identity) -> Self::Output;
}
