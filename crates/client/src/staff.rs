//! Staff role management.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use validator::Validate;

use common::{with_cancel, AppError, AppResult};
use domain::{
    new_document_id, AdminGrant, DomainError, NewStaffRole, RoleDocument, StaffRole, StaffRolePatch,
    StaffRoleRecord, FIELD_CREATED_AT, ROLE_ADMIN,
};
use store_lib::{Direction, DocumentRepository, Query, ReadRepository, WriteRepository};

use crate::state::CollectionSlice;

/// Staff roles in `roles/{id}` plus administrator grants in `admin/{id}`
#[derive(Clone)]
pub struct StaffRoles {
    roles: DocumentRepository<StaffRoleRecord>,
    admins: DocumentRepository<AdminGrant>,
    slice: Arc<CollectionSlice<StaffRoleRecord>>,
}

impl StaffRoles {
    pub fn new(
        roles: DocumentRepository<StaffRoleRecord>,
        admins: DocumentRepository<AdminGrant>,
        slice: Arc<CollectionSlice<StaffRoleRecord>>,
    ) -> Self {
        Self {
            roles,
            admins,
            slice,
        }
    }

    pub fn slice(&self) -> &Arc<CollectionSlice<StaffRoleRecord>> {
        &self.slice
    }

    /// Every staff member, oldest first
    pub async fn get_all(&self, cancel: &CancellationToken) -> AppResult<Vec<StaffRoleRecord>> {
        let query = Query::new().order_by(FIELD_CREATED_AT, Direction::Ascending);
        let result = with_cancel(cancel, self.roles.get_all(query)).await;
        self.slice.fetched(&result);
        result
    }

    /// Add a staff member; one record per email
    pub async fn add(
        &self,
        email: &str,
        role: StaffRole,
        cancel: &CancellationToken,
    ) -> AppResult<StaffRoleRecord> {
        let result = with_cancel(cancel, self.add_inner(email, role)).await;
        self.slice.added(&result);
        result
    }

    async fn add_inner(&self, email: &str, role: StaffRole) -> AppResult<StaffRoleRecord> {
        let payload = NewStaffRole::new(new_document_id(), email, role);
        payload.validate().map_err(DomainError::from)?;

        let existing = self
            .roles
            .get_all(Query::new().where_eq("email", email))
            .await?;
        if !existing.is_empty() {
            debug!(email = %email, "Staff email already present");
            return Err(AppError::duplicate_email());
        }

        let created = self.roles.create_one(&payload, &payload.id).await?;
        info!(id = %created.id, role = %created.role, "Staff role added");
        Ok(created)
    }

    /// Move a record to another email; the address must not belong to another record
    pub async fn edit_email(
        &self,
        id: &str,
        email: &str,
        cancel: &CancellationToken,
    ) -> AppResult<StaffRoleRecord> {
        let result = with_cancel(cancel, self.edit_email_inner(id, email)).await;
        self.slice.edited(&result);
        result
    }

    async fn edit_email_inner(&self, id: &str, email: &str) -> AppResult<StaffRoleRecord> {
        let patch = StaffRolePatch::email(email);
        patch.validate().map_err(DomainError::from)?;

        let holders = self
            .roles
            .get_all(Query::new().where_eq("email", email))
            .await?;
        if holders.iter().any(|r| r.id != id) {
            debug!(email = %email, "Staff email already present");
            return Err(AppError::duplicate_email());
        }

        let updated = self.roles.update_one(&patch, id).await?;
        info!(id = %updated.id, "Staff email changed");
        Ok(updated)
    }

    pub async fn edit_role(
        &self,
        id: &str,
        role: StaffRole,
        cancel: &CancellationToken,
    ) -> AppResult<StaffRoleRecord> {
        self.patch(id, StaffRolePatch::role(role), cancel).await
    }

    pub async fn disable(&self, id: &str, cancel: &CancellationToken) -> AppResult<StaffRoleRecord> {
        self.patch(id, StaffRolePatch::disabled(true), cancel).await
    }

    pub async fn enable(&self, id: &str, cancel: &CancellationToken) -> AppResult<StaffRoleRecord> {
        self.patch(id, StaffRolePatch::disabled(false), cancel).await
    }

    async fn patch(
        &self,
        id: &str,
        patch: StaffRolePatch,
        cancel: &CancellationToken,
    ) -> AppResult<StaffRoleRecord> {
        let result = with_cancel(cancel, self.roles.update_one(&patch, id)).await;
        self.slice.edited(&result);
        result
    }

    /// Write an administrator grant for `email`.
    ///
    /// An existing grant is rewritten in place so the admin role trigger runs
    /// again, e.g. once the account has signed up after an earlier grant.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        cancel: &CancellationToken,
    ) -> AppResult<AdminGrant> {
        with_cancel(cancel, self.bootstrap_inner(email)).await
    }

    async fn bootstrap_inner(&self, email: &str) -> AppResult<AdminGrant> {
        let existing = self
            .admins
            .get_all(
                Query::new()
                    .where_eq("email", email)
                    .where_eq("role", ROLE_ADMIN),
            )
            .await?;
        if let Some(grant) = existing.into_iter().next() {
            let role = RoleDocument {
                email: grant.email.clone(),
                role: ROLE_ADMIN.to_string(),
            };
            let rewritten = self.admins.update_one(&role, &grant.id).await?;
            debug!(email = %email, id = %rewritten.id, "Administrator grant rewritten");
            return Ok(rewritten);
        }

        let grant = AdminGrant::new(new_document_id(), email);
        let written = self.admins.create_one(&grant, &grant.id).await?;
        info!(email = %email, "Administrator grant written");
        Ok(written)
    }
}
