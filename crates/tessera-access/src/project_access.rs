//! Project access ledger: who holds which level on which project.

use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::principal::Principal;
use tessera_core::models::project::{CreateProject, Project};
use tessera_core::models::project_access::{AccessLevel, ProjectAccessGrant, UpsertProjectAccess};
use tessera_core::repository::{
    AuditSink, PrincipalRepository, ProjectAccessRepository, ProjectRepository, TenantRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::audit;
use crate::error::AccessError;
use crate::roles::{RoleClass, classify};
use crate::scope::{self, ProjectScope};

/// Project access service.
///
/// Generic over repository implementations so that the access layer has no
/// dependency on the database crate.
pub struct ProjectAccessLedger<T, U, P, L, A>
where
    T: TenantRepository,
    U: PrincipalRepository,
    P: ProjectRepository,
    L: ProjectAccessRepository,
    A: AuditSink,
{
    tenant_repo: T,
    principal_repo: U,
    project_repo: P,
    access_repo: L,
    audit: A,
}

impl<T, U, P, L, A> ProjectAccessLedger<T, U, P, L, A>
where
    T: TenantRepository,
    U: PrincipalRepository,
    P: ProjectRepository,
    L: ProjectAccessRepository,
    A: AuditSink,
{
    pub fn new(tenant_repo: T, principal_repo: U, project_repo: P, access_repo: L, audit: A) -> Self {
        Self {
            tenant_repo,
            principal_repo,
            project_repo,
            access_repo,
            audit,
        }
    }

    /// Create a project and grant its creator `admin`.
    ///
    /// Tenant members create projects in their own tenant; internal
    /// employees create internal-only projects.
    pub async fn create_project(&self, creator: &Principal, name: &str) -> TesseraResult<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TesseraError::validation("project name must not be empty"));
        }

        // 1. Work out which side of the tenant boundary the project lives on.
        let tenant_id = match classify(creator)? {
            RoleClass::InternalEmployee(_) => None,
            RoleClass::CompanySuperAdmin | RoleClass::ClientMember => {
                let subdomain = creator.normalized_subdomain().unwrap_or_default();
                let tenant = self.tenant_repo.get_by_subdomain(&subdomain).await?;
                Some(tenant.id)
            }
            RoleClass::ProductOwner => return Err(AccessError::CrossTenant.into()),
        };

        // 2. Persist the project.
        let project = self
            .project_repo
            .create(CreateProject {
                tenant_id,
                name: name.to_string(),
                created_by: creator.id,
            })
            .await?;

        // 3. The creator becomes its first admin.
        self.access_repo
            .upsert(UpsertProjectAccess {
                project_id: project.id,
                user_id: creator.id,
                access_level: AccessLevel::Admin,
                granted_by: creator.id,
            })
            .await?;

        info!(
            project_id = %project.id,
            creator_id = %creator.id,
            internal = project.is_internal(),
            "Project created"
        );
        audit::report(
            &self.audit,
            creator,
            "project.create",
            format!("project:{}", project.id),
            &Ok::<_, TesseraError>(()),
        )
        .await;

        Ok(project)
    }

    /// Set `grantee`'s level on a project, overwriting any previous level.
    pub async fn grant(
        &self,
        project_id: Uuid,
        grantee_id: Uuid,
        level: AccessLevel,
        grantor: &Principal,
    ) -> TesseraResult<ProjectAccessGrant> {
        let result = self.grant_inner(project_id, grantee_id, level, grantor).await;
        audit::report(
            &self.audit,
            grantor,
            "project_access.grant",
            format!("project:{project_id}/user:{grantee_id}/{level}"),
            &result,
        )
        .await;
        result
    }

    async fn grant_inner(
        &self,
        project_id: Uuid,
        grantee_id: Uuid,
        level: AccessLevel,
        grantor: &Principal,
    ) -> TesseraResult<ProjectAccessGrant> {
        let scope = self.authorize_admin(project_id, grantee_id, grantor).await?;

        let grant = self
            .access_repo
            .upsert(UpsertProjectAccess {
                project_id: scope.project.id,
                user_id: grantee_id,
                access_level: level,
                granted_by: grantor.id,
            })
            .await?;

        info!(
            %project_id,
            user_id = %grantee_id,
            level = %level,
            granted_by = %grantor.id,
            "Project access granted"
        );
        Ok(grant)
    }

    /// Remove `user_id`'s row from a project. An absent row is `NotFound`.
    pub async fn revoke(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        revoker: &Principal,
    ) -> TesseraResult<()> {
        let result = self.revoke_inner(project_id, user_id, revoker).await;
        audit::report(
            &self.audit,
            revoker,
            "project_access.revoke",
            format!("project:{project_id}/user:{user_id}"),
            &result,
        )
        .await;
        result
    }

    async fn revoke_inner(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        revoker: &Principal,
    ) -> TesseraResult<()> {
        self.authorize_admin(project_id, user_id, revoker).await?;

        if !self.access_repo.delete(project_id, user_id).await? {
            return Err(TesseraError::not_found(
                "project_access",
                format!("{project_id}/{user_id}"),
            ));
        }

        info!(%project_id, %user_id, revoked_by = %revoker.id, "Project access revoked");
        Ok(())
    }

    /// The level `user` effectively holds on a project.
    ///
    /// The company super admin of the project's tenant is `admin` without a
    /// row. Absence of a row is `None`, not an error.
    pub async fn effective_level(
        &self,
        user: &Principal,
        project_id: Uuid,
    ) -> TesseraResult<Option<AccessLevel>> {
        let result = self.effective_level_inner(user, project_id).await;
        audit::report_denial(
            &self.audit,
            user,
            "project_access.effective_level",
            format!("project:{project_id}"),
            &result,
        )
        .await;
        result
    }

    async fn effective_level_inner(
        &self,
        user: &Principal,
        project_id: Uuid,
    ) -> TesseraResult<Option<AccessLevel>> {
        let scope =
            scope::load_for(&self.project_repo, &self.tenant_repo, project_id, user).await?;
        if scope.is_tenant_super_admin(user) {
            return Ok(Some(AccessLevel::Admin));
        }
        let grant = self.access_repo.get(project_id, user.id).await?;
        Ok(grant.map(|g| g.access_level))
    }

    /// Projects `user` can open.
    ///
    /// A company super admin sees every project of the tenant; everybody
    /// else sees the projects on their side of the tenant boundary that
    /// carry a row for them.
    pub async fn list_accessible_projects(&self, user: &Principal) -> TesseraResult<Vec<Project>> {
        let home_tenant = match classify(user)? {
            RoleClass::ProductOwner => return Ok(Vec::new()),
            RoleClass::InternalEmployee(_) => None,
            RoleClass::CompanySuperAdmin => {
                let subdomain = user.normalized_subdomain().unwrap_or_default();
                let tenant = self.tenant_repo.get_by_subdomain(&subdomain).await?;
                return self.project_repo.list_by_tenant(Some(tenant.id)).await;
            }
            RoleClass::ClientMember => {
                let subdomain = user.normalized_subdomain().unwrap_or_default();
                Some(self.tenant_repo.get_by_subdomain(&subdomain).await?.id)
            }
        };

        let ids: Vec<Uuid> = self
            .access_repo
            .list_by_user(user.id)
            .await?
            .into_iter()
            .map(|g| g.project_id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let projects = self.project_repo.list_by_ids(&ids).await?;
        Ok(projects
            .into_iter()
            .filter(|p| p.tenant_id == home_tenant)
            .collect())
    }

    /// Every row of a project, for viewers on the project's side of the
    /// tenant boundary.
    pub async fn list_project_grants(
        &self,
        project_id: Uuid,
        viewer: &Principal,
    ) -> TesseraResult<Vec<ProjectAccessGrant>> {
        let result = self.list_project_grants_inner(project_id, viewer).await;
        audit::report_denial(
            &self.audit,
            viewer,
            "project_access.list_grants",
            format!("project:{project_id}"),
            &result,
        )
        .await;
        result
    }

    async fn list_project_grants_inner(
        &self,
        project_id: Uuid,
        viewer: &Principal,
    ) -> TesseraResult<Vec<ProjectAccessGrant>> {
        scope::load_for(&self.project_repo, &self.tenant_repo, project_id, viewer).await?;
        self.access_repo.list_by_project(project_id).await
    }

    /// Shared preconditions of grant and revoke.
    ///
    /// Project, grantor and grantee must all sit on the same side of the
    /// tenant boundary. Only then is the grantor's level checked, so a
    /// cross-tenant caller learns nothing about the project.
    async fn authorize_admin(
        &self,
        project_id: Uuid,
        subject_id: Uuid,
        actor: &Principal,
    ) -> TesseraResult<ProjectScope> {
        classify(actor)?;

        // 1. Project must be visible to the actor.
        let scope =
            scope::load_for(&self.project_repo, &self.tenant_repo, project_id, actor).await?;

        // 2. Subject must live in the same scope.
        let subject = scope::referenced_principal(&self.principal_repo, subject_id).await?;
        if !scope.admits(&subject) {
            return Err(AccessError::CrossTenant.into());
        }

        // 3. Company super admin override, otherwise an exact `admin` row.
        if scope.is_tenant_super_admin(actor) {
            return Ok(scope);
        }
        match self.access_repo.get(project_id, actor.id).await? {
            Some(g) if g.access_level == AccessLevel::Admin => Ok(scope),
            _ => Err(AccessError::NotProjectAdmin.into()),
        }
    }
}
