//! SurrealDB implementation of [`ProjectRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::project::{CreateProject, Project};
use tessera_core::repository::ProjectRepository;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct ProjectRow {
    record_id: String,
    tenant_id: Option<String>,
    name: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl ProjectRow {
    fn try_into_project(self) -> Result<Project, DbError> {
        Ok(Project {
            id: parse_uuid(&self.record_id, "project")?,
            tenant_id: self
                .tenant_id
                .as_deref()
                .map(|t| parse_uuid(t, "tenant"))
                .transpose()?,
            name: self.name,
            created_by: parse_uuid(&self.created_by, "creator")?,
            created_at: self.created_at,
        })
    }
}

fn collect(rows: Vec<ProjectRow>) -> Result<Vec<Project>, DbError> {
    rows.into_iter().map(ProjectRow::try_into_project).collect()
}

const SELECT_BY_ID: &str = "SELECT meta::id(id) AS record_id, * \
                            FROM type::record('project', $id)";

/// SurrealDB implementation of the Project repository.
#[derive(Clone)]
pub struct SurrealProjectRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProjectRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProjectRepository for SurrealProjectRepository<C> {
    async fn create(&self, input: CreateProject) -> TesseraResult<Project> {
        let id_str = Uuid::new_v4().to_string();
        let query = format!(
            "CREATE type::record('project', $id) SET \
             tenant_id = $tenant_id, name = $name, created_by = $created_by; \
             {SELECT_BY_ID};"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.map(|t| t.to_string())))
            .bind(("name", input.name))
            .bind(("created_by", input.created_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ProjectRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(row.try_into_project()?)
    }

    async fn get_by_id(&self, id: Uuid) -> TesseraResult<Project> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_BY_ID)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(row.try_into_project()?)
    }

    async fn list_by_tenant(&self, tenant_id: Option<Uuid>) -> TesseraResult<Vec<Project>> {
        let query = if tenant_id.is_some() {
            "SELECT meta::id(id) AS record_id, * FROM project \
             WHERE tenant_id = $tenant_id ORDER BY created_at ASC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM project \
             WHERE tenant_id = NONE ORDER BY created_at ASC"
        };

        let mut result = self
            .db
            .query(query)
            .bind(("tenant_id", tenant_id.map(|t| t.to_string())))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        Ok(collect(rows)?)
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> TesseraResult<Vec<Project>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM project \
                 WHERE meta::id(id) IN $ids ORDER BY created_at ASC",
            )
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        Ok(collect(rows)?)
    }
}
