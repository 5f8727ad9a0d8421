//! Identity Provider Library
//!
//! Account management, password and federated sign-in, ID tokens with
//! custom claims, and the privileged admin surface used by server triggers.

pub mod account;
pub mod entities;
pub mod local;
pub mod password;
pub mod provider;
pub mod token;

pub use account::{Account, AccountStore, MemoryAccounts, SqlAccounts};
pub use local::LocalIdentity;
pub use password::Password;
pub use provider::{IdentityAdmin, IdentityProvider, ProviderAssertion};
pub use token::{Claims, TokenSigner};

#[cfg(any(test, feature = "test-utils"))]
pub use account::MockAccountStore;
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockIdentityAdmin;
