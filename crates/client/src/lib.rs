//! Admin Client Library
//!
//! Everything an administrator surface needs on top of the document store and
//! the identity provider: reactive state containers, the signed-in session,
//! the admin gate, staff roles, the catalog taxonomy and the geo lookup.

pub mod admin;
pub mod catalog;
pub mod gate;
pub mod geo;
pub mod session;
pub mod staff;
pub mod state;

pub use admin::Admin;
pub use catalog::Catalog;
pub use gate::{resolve_gate, AdminGateWatcher};
pub use geo::{GeoLookup, State};
pub use session::AdminSession;
pub use staff::StaffRoles;
pub use state::{CollectionSlice, DerivedCache, Observer, Publisher, StateHolder};
