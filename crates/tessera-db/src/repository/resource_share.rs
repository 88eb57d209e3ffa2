//! SurrealDB implementation of [`ResourceShareRepository`].
//!
//! One row per `(resource_type, resource_id, user)`, addressed by a
//! deterministic record id so that re-sharing the same triple upserts.
//! Expired rows are kept; expiry is decided by the caller at read time.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::resource_share::{ResourceRef, ResourceShare, UpsertResourceShare};
use tessera_core::repository::ResourceShareRepository;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct ShareRow {
    project_id: String,
    resource_type: String,
    resource_id: String,
    user_id: String,
    permission: String,
    notes: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    shared_by: String,
    shared_at: DateTime<Utc>,
}

impl ShareRow {
    fn try_into_share(self) -> Result<ResourceShare, DbError> {
        let resource = ResourceRef::parse(&self.resource_type, &self.resource_id)
            .map_err(|e| DbError::Decode(e.to_string()))?;
        let permission = self
            .permission
            .parse()
            .map_err(|_| DbError::Decode(format!("share permission '{}'", self.permission)))?;
        Ok(ResourceShare {
            project_id: parse_uuid(&self.project_id, "project")?,
            resource,
            user_id: parse_uuid(&self.user_id, "user")?,
            permission,
            notes: self.notes,
            expires_at: self.expires_at,
            shared_by: parse_uuid(&self.shared_by, "sharer")?,
            shared_at: self.shared_at,
        })
    }
}

fn record_key(resource: ResourceRef, user_id: Uuid) -> String {
    format!("{}_{}_{user_id}", resource.kind(), resource.id())
}

/// SurrealDB implementation of the resource share ledger.
#[derive(Clone)]
pub struct SurrealResourceShareRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealResourceShareRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResourceShareRepository for SurrealResourceShareRepository<C> {
    async fn upsert(&self, input: UpsertResourceShare) -> TesseraResult<ResourceShare> {
        let key = record_key(input.resource, input.user_id);

        let result = self
            .db
            .query(
                "UPSERT type::record('resource_share', $key) SET \
                 project_id = $project_id, \
                 resource_type = $resource_type, resource_id = $resource_id, \
                 user_id = $user_id, permission = $permission, \
                 notes = $notes, expires_at = $expires_at, \
                 shared_by = $shared_by, shared_at = time::now()",
            )
            .bind(("key", key.clone()))
            .bind(("project_id", input.project_id.to_string()))
            .bind(("resource_type", input.resource.kind().as_str().to_string()))
            .bind(("resource_id", input.resource.id().to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("permission", input.permission.as_str().to_string()))
            .bind(("notes", input.notes))
            .bind(("expires_at", input.expires_at))
            .bind(("shared_by", input.shared_by.to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ShareRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource_share".into(),
            id: key,
        })?;

        Ok(row.try_into_share()?)
    }

    async fn delete(&self, resource: ResourceRef, user_id: Uuid) -> TesseraResult<bool> {
        let mut result = self
            .db
            .query("DELETE type::record('resource_share', $key) RETURN BEFORE")
            .bind(("key", record_key(resource, user_id)))
            .await
            .map_err(DbError::from)?;

        let removed: Vec<ShareRow> = result.take(0).map_err(DbError::from)?;
        Ok(!removed.is_empty())
    }

    async fn get(
        &self,
        resource: ResourceRef,
        user_id: Uuid,
    ) -> TesseraResult<Option<ResourceShare>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('resource_share', $key)")
            .bind(("key", record_key(resource, user_id)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ShareRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(ShareRow::try_into_share)
            .transpose()?)
    }

    async fn list_by_resource(&self, resource: ResourceRef) -> TesseraResult<Vec<ResourceShare>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM resource_share \
                 WHERE resource_type = $resource_type AND resource_id = $resource_id \
                 ORDER BY shared_at ASC",
            )
            .bind(("resource_type", resource.kind().as_str().to_string()))
            .bind(("resource_id", resource.id().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ShareRow> = result.take(0).map_err(DbError::from)?;
        let shares = rows
            .into_iter()
            .map(ShareRow::try_into_share)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_key_distinguishes_resource_kinds() {
        let id = Uuid::new_v4();
        let user = Uuid::new_v4();
        assert_ne!(
            record_key(ResourceRef::Task(id), user),
            record_key(ResourceRef::Comment(id), user)
        );
    }
}
