//! SurrealDB implementation of [`ProjectAccessRepository`].
//!
//! Rows use the deterministic record id `project_access:<project>_<user>`,
//! so a grant is a single UPSERT and a revoke a single DELETE. Concurrent
//! writers rely on SurrealDB's record-level atomicity; the last write wins.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::project_access::{ProjectAccessGrant, UpsertProjectAccess};
use tessera_core::repository::ProjectAccessRepository;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct GrantRow {
    project_id: String,
    user_id: String,
    access_level: String,
    granted_by: String,
    granted_at: DateTime<Utc>,
}

impl GrantRow {
    fn try_into_grant(self) -> Result<ProjectAccessGrant, DbError> {
        Ok(ProjectAccessGrant {
            project_id: parse_uuid(&self.project_id, "project")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            access_level: self
                .access_level
                .parse()
                .map_err(|_| DbError::Decode(format!("access level '{}'", self.access_level)))?,
            granted_by: parse_uuid(&self.granted_by, "grantor")?,
            granted_at: self.granted_at,
        })
    }
}

fn collect(rows: Vec<GrantRow>) -> Result<Vec<ProjectAccessGrant>, DbError> {
    rows.into_iter().map(GrantRow::try_into_grant).collect()
}

fn record_key(project_id: Uuid, user_id: Uuid) -> String {
    format!("{project_id}_{user_id}")
}

/// SurrealDB implementation of the project access ledger.
#[derive(Clone)]
pub struct SurrealProjectAccessRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProjectAccessRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProjectAccessRepository for SurrealProjectAccessRepository<C> {
    async fn upsert(&self, input: UpsertProjectAccess) -> TesseraResult<ProjectAccessGrant> {
        let key = record_key(input.project_id, input.user_id);

        let result = self
            .db
            .query(
                "UPSERT type::record('project_access', $key) SET \
                 project_id = $project_id, user_id = $user_id, \
                 access_level = $access_level, granted_by = $granted_by, \
                 granted_at = time::now()",
            )
            .bind(("key", key.clone()))
            .bind(("project_id", input.project_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("access_level", input.access_level.as_str().to_string()))
            .bind(("granted_by", input.granted_by.to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<GrantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project_access".into(),
            id: key,
        })?;

        debug!(
            project_id = %input.project_id,
            user_id = %input.user_id,
            level = %input.access_level,
            "Project access upserted"
        );

        Ok(row.try_into_grant()?)
    }

    async fn delete(&self, project_id: Uuid, user_id: Uuid) -> TesseraResult<bool> {
        let mut result = self
            .db
            .query("DELETE type::record('project_access', $key) RETURN BEFORE")
            .bind(("key", record_key(project_id, user_id)))
            .await
            .map_err(DbError::from)?;

        let removed: Vec<GrantRow> = result.take(0).map_err(DbError::from)?;
        Ok(!removed.is_empty())
    }

    async fn get(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> TesseraResult<Option<ProjectAccessGrant>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('project_access', $key)")
            .bind(("key", record_key(project_id, user_id)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(GrantRow::try_into_grant)
            .transpose()?)
    }

    async fn list_by_project(&self, project_id: Uuid) -> TesseraResult<Vec<ProjectAccessGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM project_access \
                 WHERE project_id = $project_id ORDER BY granted_at ASC",
            )
            .bind(("project_id", project_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRow> = result.take(0).map_err(DbError::from)?;
        Ok(collect(rows)?)
    }

    async fn list_by_user(&self, user_id: Uuid) -> TesseraResult<Vec<ProjectAccessGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM project_access \
                 WHERE user_id = $user_id ORDER BY granted_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRow> = result.take(0).map_err(DbError::from)?;
        Ok(collect(rows)?)
    }
}
