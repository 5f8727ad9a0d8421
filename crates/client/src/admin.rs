//! Composition root for the admin client.

use std::sync::Arc;

use common::{AppConfig, AppResult};
use domain::{CatalogLevel, ADMIN_COLLECTION, ROLES_COLLECTION};
use identity_lib::IdentityProvider;
use store_lib::{CollectionPath, DocumentRepository, DocumentStore};

use crate::catalog::Catalog;
use crate::gate::AdminGateWatcher;
use crate::geo::GeoLookup;
use crate::session::AdminSession;
use crate::staff::StaffRoles;
use crate::state::CollectionSlice;

/// Every service and state container of the admin client, wired once.
///
/// Must be built inside a Tokio runtime: the session and the gate each start
/// a listener task.
pub struct Admin {
    pub session: AdminSession,
    pub gate: AdminGateWatcher,
    pub staff: StaffRoles,
    pub families: Catalog,
    pub categories: Catalog,
    pub sub_categories: Catalog,
    pub geo: GeoLookup,
    store: Arc<dyn DocumentStore>,
}

impl Admin {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        config: &AppConfig,
    ) -> AppResult<Self> {
        let session = AdminSession::start(identity.clone());
        let gate = AdminGateWatcher::start(session.state(), identity);

        let staff = StaffRoles::new(
            DocumentRepository::new(store.clone(), CollectionPath::new(ROLES_COLLECTION)?),
            DocumentRepository::new(store.clone(), CollectionPath::new(ADMIN_COLLECTION)?),
            Arc::new(CollectionSlice::new()),
        );

        let catalog = |level: CatalogLevel| -> AppResult<Catalog> {
            Ok(Catalog::new(
                level,
                DocumentRepository::new(store.clone(), CollectionPath::new(level.collection())?),
                config.limits.for_level(level),
                Arc::new(CollectionSlice::new()),
            ))
        };

        Ok(Self {
            families: catalog(CatalogLevel::Family)?,
            categories: catalog(CatalogLevel::Category)?,
            sub_categories: catalog(CatalogLevel::SubCategory)?,
            geo: GeoLookup::new(config.geo.clone())?,
            session,
            gate,
            staff,
            store,
        })
    }

    pub fn catalog(&self, level: CatalogLevel) -> &Catalog {
        match level {
            CatalogLevel::Family => &self.families,
            CatalogLevel::Category => &self.categories,
            CatalogLevel::SubCategory => &self.sub_categories,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Stop the session listener and the gate watcher
    pub async fn close(self) {
        self.gate.close().await;
        self.session.close().await;
    }
}
