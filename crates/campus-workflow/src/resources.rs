//! Resource directory: venues and equipment.
//!
//! Availability is informational only; nothing books or locks a resource.

use campus_core::error::CampusResult;
use campus_core::models::account::Principal;
use campus_core::models::resource::{Resource, ResourceFields, ResourceKind};
use campus_core::models::role::Role;
use campus_core::repository::{AccountRepository, ResourceRepository, RoleRepository};
use tracing::info;
use uuid::Uuid;

use crate::authority::Authority;

pub struct ResourceDirectory<A, R, V>
where
    A: AccountRepository,
    R: RoleRepository,
    V: ResourceRepository,
{
    authority: Authority<A, R>,
    resources: V,
}

impl<A, R, V> ResourceDirectory<A, R, V>
where
    A: AccountRepository,
    R: RoleRepository,
    V: ResourceRepository,
{
    pub fn new(authority: Authority<A, R>, resources: V) -> Self {
        Self {
            authority,
            resources,
        }
    }

    pub async fn create(&self, actor: Principal, fields: ResourceFields) -> CampusResult<Resource> {
        self.authority.require(actor, Role::Admin).await?;
        fields.validate()?;

        let resource = self.resources.create(fields).await?;
        info!(resource_id = %resource.id, kind = %resource.kind, "Resource created");
        Ok(resource)
    }

    pub async fn update(
        &self,
        actor: Principal,
        resource_id: Uuid,
        fields: ResourceFields,
    ) -> CampusResult<Resource> {
        self.authority.require(actor, Role::Admin).await?;
        fields.validate()?;

        let resource = self.resources.update(resource_id, fields).await?;
        info!(
            resource_id = %resource.id,
            is_available = resource.is_available,
            "Resource updated"
        );
        Ok(resource)
    }

    pub async fn delete(&self, actor: Principal, resource_id: Uuid) -> CampusResult<()> {
        self.authority.require(actor, Role::Admin).await?;
        self.resources.delete(resource_id).await?;
        info!(resource_id = %resource_id, "Resource deleted");
        Ok(())
    }

    pub async fn get(&self, resource_id: Uuid) -> CampusResult<Resource> {
        self.resources.get_by_id(resource_id).await
    }

    pub async fn list(&self) -> CampusResult<Vec<Resource>> {
        self.resources.list(false).await
    }

    pub async fn list_available(&self) -> CampusResult<Vec<Resource>> {
        self.resources.list(true).await
    }

    /// Available resources of kind `venue`, for event forms.
    pub async fn venues(&self) -> CampusResult<Vec<Resource>> {
        Ok(self
            .resources
            .list(true)
            .await?
            .into_iter()
            .filter(|r| r.kind == ResourceKind::Venue)
            .collect())
    }
}
