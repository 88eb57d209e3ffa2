//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The access services are generic
//! over these traits so they carry no dependency on the database crate.
//! Lookups by id are global; tenant scoping is decided by the caller so that
//! cross-tenant references can be reported uniformly.

use uuid::Uuid;

use crate::error::TesseraResult;
use crate::models::{
    audit::{AuditEvent, CreateAuditEvent},
    principal::{CreatePrincipal, Principal, UpdatePrincipal},
    project::{CreateProject, Project},
    project_access::{ProjectAccessGrant, UpsertProjectAccess},
    resource_share::{ResourceRef, ResourceShare, UpsertResourceShare},
    tenant::{CreateTenant, Tenant, TenantStatus},
    work_item::{
        Comment, CreateArtifact, CreateComment, CreateTask, SharedResource, Task,
    },
};

// ---------------------------------------------------------------------------
// Principals & tenants (read store)
// ---------------------------------------------------------------------------

pub trait PrincipalRepository: Send + Sync {
    fn create(&self, input: CreatePrincipal)
    -> impl Future<Output = TesseraResult<Principal>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TesseraResult<Principal>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdatePrincipal,
    ) -> impl Future<Output = TesseraResult<Principal>> + Send;
}

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = TesseraResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TesseraResult<Tenant>> + Send;
    /// Look up by subdomain. The argument is normalized before matching.
    fn get_by_subdomain(
        &self,
        subdomain: &str,
    ) -> impl Future<Output = TesseraResult<Tenant>> + Send;
    fn set_status(
        &self,
        id: Uuid,
        status: TenantStatus,
    ) -> impl Future<Output = TesseraResult<Tenant>> + Send;
    /// Assign the owning principal if none is assigned yet.
    ///
    /// Runs check-then-assign inside a single transaction. Fails with
    /// `Duplicate` when an owner already exists, so at most one caller ever
    /// succeeds.
    fn activate_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> impl Future<Output = TesseraResult<Tenant>> + Send;
}

// ---------------------------------------------------------------------------
// Projects & work items
// ---------------------------------------------------------------------------

pub trait ProjectRepository: Send + Sync {
    fn create(&self, input: CreateProject)
    -> impl Future<Output = TesseraResult<Project>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TesseraResult<Project>> + Send;
    /// All projects of a tenant; `None` lists internal-only projects.
    fn list_by_tenant(
        &self,
        tenant_id: Option<Uuid>,
    ) -> impl Future<Output = TesseraResult<Vec<Project>>> + Send;
    /// Projects for the given ids. Unknown ids are skipped.
    fn list_by_ids(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = TesseraResult<Vec<Project>>> + Send;
}

pub trait WorkItemRepository: Send + Sync {
    fn create_task(&self, input: CreateTask) -> impl Future<Output = TesseraResult<Task>> + Send;
    fn create_comment(
        &self,
        input: CreateComment,
    ) -> impl Future<Output = TesseraResult<Comment>> + Send;
    fn create_file(
        &self,
        input: CreateArtifact,
    ) -> impl Future<Output = TesseraResult<SharedResource>> + Send;
    fn create_milestone(
        &self,
        input: CreateArtifact,
    ) -> impl Future<Output = TesseraResult<SharedResource>> + Send;

    fn get_task(&self, id: Uuid) -> impl Future<Output = TesseraResult<Task>> + Send;
    fn list_tasks(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = TesseraResult<Vec<Task>>> + Send;
    fn list_comments(
        &self,
        task_id: Uuid,
    ) -> impl Future<Output = TesseraResult<Vec<Comment>>> + Send;

    /// Flip `is_internal_only` in a single statement and return the result.
    fn toggle_task_internal(&self, id: Uuid) -> impl Future<Output = TesseraResult<Task>> + Send;
    fn set_task_internal(
        &self,
        id: Uuid,
        internal_only: bool,
    ) -> impl Future<Output = TesseraResult<Task>> + Send;

    /// Resolve any shareable resource to its project and visibility flag.
    fn resolve(
        &self,
        resource: ResourceRef,
    ) -> impl Future<Output = TesseraResult<SharedResource>> + Send;
}

// ---------------------------------------------------------------------------
// Ledgers
// ---------------------------------------------------------------------------

pub trait ProjectAccessRepository: Send + Sync {
    /// Insert or overwrite the `(project, user)` row.
    fn upsert(
        &self,
        input: UpsertProjectAccess,
    ) -> impl Future<Output = TesseraResult<ProjectAccessGrant>> + Send;
    /// Delete the `(project, user)` row if present. Returns whether a row
    /// was removed.
    fn delete(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = TesseraResult<bool>> + Send;
    fn get(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = TesseraResult<Option<ProjectAccessGrant>>> + Send;
    fn list_by_project(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = TesseraResult<Vec<ProjectAccessGrant>>> + Send;
    fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = TesseraResult<Vec<ProjectAccessGrant>>> + Send;
}

pub trait ResourceShareRepository: Send + Sync {
    /// Insert or overwrite the `(resource, user)` row.
    fn upsert(
        &self,
        input: UpsertResourceShare,
    ) -> impl Future<Output = TesseraResult<ResourceShare>> + Send;
    /// Delete the `(resource, user)` row if present. Returns whether a row
    /// was removed.
    fn delete(
        &self,
        resource: ResourceRef,
        user_id: Uuid,
    ) -> impl Future<Output = TesseraResult<bool>> + Send;
    fn get(
        &self,
        resource: ResourceRef,
        user_id: Uuid,
    ) -> impl Future<Output = TesseraResult<Option<ResourceShare>>> + Send;
    /// Every row for a resource, expired ones included.
    fn list_by_resource(
        &self,
        resource: ResourceRef,
    ) -> impl Future<Output = TesseraResult<Vec<ResourceShare>>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only)
// ---------------------------------------------------------------------------

pub trait AuditSink: Send + Sync {
    /// Append an event. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditEvent,
    ) -> impl Future<Output = TesseraResult<AuditEvent>> + Send;
}
