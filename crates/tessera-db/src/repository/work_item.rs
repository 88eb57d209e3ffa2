//! SurrealDB implementation of [`WorkItemRepository`].
//!
//! Tasks and comments carry the internal-only flag; files and milestones are
//! plain project artifacts that can still be shared.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::resource_share::{ResourceKind, ResourceRef};
use tessera_core::models::work_item::{
    Comment, CreateArtifact, CreateComment, CreateTask, SharedResource, Task,
};
use tessera_core::repository::WorkItemRepository;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct TaskRow {
    record_id: String,
    project_id: String,
    title: String,
    is_internal_only: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRow {
    fn try_into_task(self) -> Result<Task, DbError> {
        Ok(Task {
            id: parse_uuid(&self.record_id, "task")?,
            project_id: parse_uuid(&self.project_id, "project")?,
            title: self.title,
            is_internal_only: self.is_internal_only,
            created_by: parse_uuid(&self.created_by, "creator")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CommentRow {
    record_id: String,
    task_id: String,
    parent_id: Option<String>,
    body: String,
    is_internal_only: bool,
    author_id: String,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn try_into_comment(self) -> Result<Comment, DbError> {
        Ok(Comment {
            id: parse_uuid(&self.record_id, "comment")?,
            task_id: parse_uuid(&self.task_id, "task")?,
            parent_id: self
                .parent_id
                .as_deref()
                .map(|p| parse_uuid(p, "parent comment"))
                .transpose()?,
            body: self.body,
            is_internal_only: self.is_internal_only,
            author_id: parse_uuid(&self.author_id, "author")?,
            created_at: self.created_at,
        })
    }
}

/// Projection shared by every resource table: owning project plus the
/// visibility flag (always false for files and milestones). For comments
/// `project_id` holds the parent task id until it is followed.
#[derive(Debug, SurrealValue)]
struct ResolvedRow {
    project_id: String,
    is_internal_only: bool,
}

fn table_for(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Task => "task",
        ResourceKind::Comment => "task_comment",
        ResourceKind::File => "project_file",
        ResourceKind::Milestone => "milestone",
    }
}

const SELECT_TASK: &str = "SELECT meta::id(id) AS record_id, * \
                           FROM type::record('task', $id)";

const SELECT_COMMENT: &str = "SELECT meta::id(id) AS record_id, * \
                              FROM type::record('task_comment', $id)";

/// SurrealDB implementation of the work item repository.
#[derive(Clone)]
pub struct SurrealWorkItemRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealWorkItemRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn create_artifact(
        &self,
        kind: ResourceKind,
        input: CreateArtifact,
    ) -> Result<SharedResource, DbError> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record($table, $id) SET \
                 project_id = $project_id, name = $name, created_by = $created_by",
            )
            .bind(("table", table_for(kind).to_string()))
            .bind(("id", id.to_string()))
            .bind(("project_id", input.project_id.to_string()))
            .bind(("name", input.name))
            .bind(("created_by", input.created_by.to_string()))
            .await?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(SharedResource {
            resource: ResourceRef::new(kind, id),
            project_id: input.project_id,
            is_internal_only: false,
        })
    }

    async fn task_query(&self, query: &str, id: Uuid, value: Option<bool>) -> TesseraResult<Task> {
        let id_str = id.to_string();
        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("value", value))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TaskRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.try_into_task()?)
    }
}

impl<C: Connection> WorkItemRepository for SurrealWorkItemRepository<C> {
    async fn create_task(&self, input: CreateTask) -> TesseraResult<Task> {
        let id_str = Uuid::new_v4().to_string();
        let query = format!(
            "CREATE type::record('task', $id) SET \
             project_id = $project_id, title = $title, \
             is_internal_only = $is_internal_only, created_by = $created_by; \
             {SELECT_TASK};"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("project_id", input.project_id.to_string()))
            .bind(("title", input.title))
            .bind(("is_internal_only", input.is_internal_only))
            .bind(("created_by", input.created_by.to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TaskRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.try_into_task()?)
    }

    async fn create_comment(&self, input: CreateComment) -> TesseraResult<Comment> {
        let id_str = Uuid::new_v4().to_string();
        let query = format!(
            "CREATE type::record('task_comment', $id) SET \
             task_id = $task_id, parent_id = $parent_id, body = $body, \
             is_internal_only = $is_internal_only, author_id = $author_id; \
             {SELECT_COMMENT};"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("task_id", input.task_id.to_string()))
            .bind(("parent_id", input.parent_id.map(|p| p.to_string())))
            .bind(("body", input.body))
            .bind(("is_internal_only", input.is_internal_only))
            .bind(("author_id", input.author_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CommentRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        Ok(row.try_into_comment()?)
    }

    async fn create_file(&self, input: CreateArtifact) -> TesseraResult<SharedResource> {
        Ok(self.create_artifact(ResourceKind::File, input).await?)
    }

    async fn create_milestone(&self, input: CreateArtifact) -> TesseraResult<SharedResource> {
        Ok(self.create_artifact(ResourceKind::Milestone, input).await?)
    }

    async fn get_task(&self, id: Uuid) -> TesseraResult<Task> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(SELECT_TASK)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.try_into_task()?)
    }

    async fn list_tasks(&self, project_id: Uuid) -> TesseraResult<Vec<Task>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM task \
                 WHERE project_id = $project_id ORDER BY created_at ASC",
            )
            .bind(("project_id", project_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let tasks = rows
            .into_iter()
            .map(TaskRow::try_into_task)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(tasks)
    }

    async fn list_comments(&self, task_id: Uuid) -> TesseraResult<Vec<Comment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM task_comment \
                 WHERE task_id = $task_id ORDER BY created_at ASC",
            )
            .bind(("task_id", task_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let comments = rows
            .into_iter()
            .map(CommentRow::try_into_comment)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(comments)
    }

    async fn toggle_task_internal(&self, id: Uuid) -> TesseraResult<Task> {
        let query = format!(
            "UPDATE type::record('task', $id) SET \
             is_internal_only = !is_internal_only, updated_at = time::now(); \
             {SELECT_TASK};"
        );
        self.task_query(&query, id, None).await
    }

    async fn set_task_internal(&self, id: Uuid, internal_only: bool) -> TesseraResult<Task> {
        let query = format!(
            "UPDATE type::record('task', $id) SET \
             is_internal_only = $value, updated_at = time::now(); \
             {SELECT_TASK};"
        );
        self.task_query(&query, id, Some(internal_only)).await
    }

    async fn resolve(&self, resource: ResourceRef) -> TesseraResult<SharedResource> {
        let kind = resource.kind();
        let id_str = resource.id().to_string();

        let query = match kind {
            ResourceKind::Task => {
                "SELECT project_id, is_internal_only FROM type::record('task', $id)"
            }
            ResourceKind::Comment => {
                "SELECT task_id AS project_id, is_internal_only \
                 FROM type::record('task_comment', $id)"
            }
            ResourceKind::File | ResourceKind::Milestone => {
                "SELECT project_id, false AS is_internal_only \
                 FROM type::record($table, $id)"
            }
        };

        let mut result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("table", table_for(kind).to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResolvedRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: kind.as_str().into(),
            id: id_str,
        })?;

        // A comment belongs to the project of its task.
        let project_id = match kind {
            ResourceKind::Comment => {
                let task_id = parse_uuid(&row.project_id, "task")?;
                self.get_task(task_id).await?.project_id
            }
            _ => parse_uuid(&row.project_id, "project")?,
        };

        Ok(SharedResource {
            resource,
            project_id,
            is_internal_only: row.is_internal_only,
        })
    }
}
