//! Project tenancy scope shared by the ledgers.

use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::principal::Principal;
use tessera_core::models::project::Project;
use tessera_core::models::tenant::Tenant;
use tessera_core::repository::{PrincipalRepository, ProjectRepository, TenantRepository};
use uuid::Uuid;

use crate::error::AccessError;
use crate::roles::is_company_super_admin;

/// A project together with its owning tenant, if any.
#[derive(Debug, Clone)]
pub struct ProjectScope {
    pub project: Project,
    pub tenant: Option<Tenant>,
}

impl ProjectScope {
    /// Whether `principal` lives on the same side of the tenant boundary as
    /// the project: members of the owning tenant for client projects,
    /// internal employees for internal projects.
    pub fn admits(&self, principal: &Principal) -> bool {
        match &self.tenant {
            Some(tenant) => {
                !principal.is_internal_employee && principal.belongs_to(&tenant.subdomain)
            }
            None => principal.is_internal_employee,
        }
    }

    /// The company super admin of the project's own tenant.
    pub fn is_tenant_super_admin(&self, principal: &Principal) -> bool {
        self.tenant
            .as_ref()
            .is_some_and(|t| is_company_super_admin(principal) && principal.belongs_to(&t.subdomain))
    }
}

/// Load a project and its tenant. An absent project is `None`.
pub(crate) async fn load<P: ProjectRepository, T: TenantRepository>(
    projects: &P,
    tenants: &T,
    project_id: Uuid,
) -> TesseraResult<Option<ProjectScope>> {
    let project = match projects.get_by_id(project_id).await {
        Ok(p) => p,
        Err(TesseraError::NotFound { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };
    let tenant = match project.tenant_id {
        Some(id) => Some(tenants.get_by_id(id).await?),
        None => None,
    };
    Ok(Some(ProjectScope { project, tenant }))
}

/// Load a project as seen by `principal`.
///
/// Absent projects and projects across the tenant boundary are reported
/// identically as a tenant mismatch.
pub(crate) async fn load_for<P: ProjectRepository, T: TenantRepository>(
    projects: &P,
    tenants: &T,
    project_id: Uuid,
    principal: &Principal,
) -> TesseraResult<ProjectScope> {
    match load(projects, tenants, project_id).await? {
        Some(scope) if scope.admits(principal) => Ok(scope),
        _ => Err(AccessError::CrossTenant.into()),
    }
}

/// Fetch a principal referenced by id. An absent principal is reported as
/// a tenant mismatch, like one living in another tenant.
pub(crate) async fn referenced_principal<U: PrincipalRepository>(
    principals: &U,
    id: Uuid,
) -> TesseraResult<Principal> {
    match principals.get_by_id(id).await {
        Ok(p) => Ok(p),
        Err(TesseraError::NotFound { .. }) => Err(AccessError::CrossTenant.into()),
        Err(e) => Err(e),
    }
}
