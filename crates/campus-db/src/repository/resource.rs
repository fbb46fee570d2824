//! SurrealDB implementation of [`ResourceRepository`].

use campus_core::error::CampusResult;
use campus_core::models::resource::{Resource, ResourceFields, ResourceKind};
use campus_core::repository::ResourceRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use super::{check, id_strings, parse_time, parse_uuid};
use crate::error::DbError;

const RESOURCE_FIELDS: &str = "meta::id(id) AS record_id, name, kind, description, \
     location, capacity, is_available, \
     <string> created_at AS created_at, <string> updated_at AS updated_at";

const RESOURCE_SETS: &str = "name = $name, kind = $kind, description = $description, \
     location = $location, capacity = $capacity, is_available = $is_available";

#[derive(Debug, Deserialize)]
struct ResourceRow {
    record_id: String,
    name: String,
    kind: String,
    description: Option<String>,
    location: Option<String>,
    capacity: Option<u32>,
    is_available: bool,
    created_at: String,
    updated_at: String,
}

impl ResourceRow {
    fn try_into_resource(self) -> Result<Resource, DbError> {
        Ok(Resource {
            id: parse_uuid("resource", &self.record_id)?,
            name: self.name,
            kind: self
                .kind
                .parse::<ResourceKind>()
                .map_err(|e| DbError::Corrupt(e.to_string()))?,
            description: self.description,
            location: self.location,
            capacity: self.capacity,
            is_available: self.is_available,
            created_at: parse_time("created_at", &self.created_at)?,
            updated_at: parse_time("updated_at", &self.updated_at)?,
        })
    }
}

fn into_resources(rows: Vec<ResourceRow>) -> Result<Vec<Resource>, DbError> {
    let mut resources = rows
        .into_iter()
        .map(ResourceRow::try_into_resource)
        .collect::<Result<Vec<_>, _>>()?;
    resources.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(resources)
}

/// SurrealDB implementation of the resource repository.
#[derive(Clone)]
pub struct SurrealResourceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealResourceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn write(
        &self,
        statement: String,
        id: Uuid,
        fields: ResourceFields,
    ) -> Result<(), DbError> {
        check(
            self.db
                .query(statement)
                .bind(("id", id.to_string()))
                .bind(("name", fields.name))
                .bind(("kind", fields.kind.as_str()))
                .bind(("description", fields.description))
                .bind(("location", fields.location))
                .bind(("capacity", fields.capacity))
                .bind(("is_available", fields.is_available))
                .await?,
        )?;
        Ok(())
    }
}

impl<C: Connection> ResourceRepository for SurrealResourceRepository<C> {
    async fn create(&self, fields: ResourceFields) -> CampusResult<Resource> {
        let id = Uuid::new_v4();
        let statement = format!(
            "CREATE type::thing('resource', $id) SET {RESOURCE_SETS}, \
             created_at = time::now(), updated_at = time::now()"
        );
        self.write(statement, id, fields).await?;
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> CampusResult<Resource> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {RESOURCE_FIELDS} FROM type::thing('resource', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource".into(),
            id: id_str,
        })?;

        Ok(row.try_into_resource()?)
    }

    async fn get_many(&self, ids: &[Uuid]) -> CampusResult<Vec<Resource>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(format!(
                "SELECT {RESOURCE_FIELDS} FROM resource WHERE meta::id(id) INSIDE $ids"
            ))
            .bind(("ids", id_strings(ids)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_resources(rows)?)
    }

    async fn update(&self, id: Uuid, fields: ResourceFields) -> CampusResult<Resource> {
        let statement = format!(
            "UPDATE type::thing('resource', $id) SET {RESOURCE_SETS}, \
             updated_at = time::now()"
        );
        self.write(statement, id, fields).await?;
        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> CampusResult<()> {
        // Existence check first so deleting an unknown id reports NotFound.
        self.get_by_id(id).await?;
        check(
            self.db
                .query("DELETE type::thing('resource', $id)")
                .bind(("id", id.to_string()))
                .await
                .map_err(DbError::from)?,
        )?;
        Ok(())
    }

    async fn list(&self, available_only: bool) -> CampusResult<Vec<Resource>> {
        let condition = if available_only {
            " WHERE is_available = true"
        } else {
            ""
        };

        let mut result = self
            .db
            .query(format!("SELECT {RESOURCE_FIELDS} FROM resource{condition}"))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_resources(rows)?)
    }
}
