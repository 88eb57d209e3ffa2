//! Resource share ledger: per-user grants on individual project resources.
//!
//! A share row is keyed by `(resource, user)`; re-sharing overwrites it.
//! Expiry is a read-time filter evaluated against the injected [`Clock`],
//! never a deletion trigger.

use chrono::{DateTime, Utc};
use tessera_core::clock::Clock;
use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::principal::Principal;
use tessera_core::models::project_access::AccessLevel;
use tessera_core::models::resource_share::{
    ResourceRef, ResourceShare, SharePermission, UpsertResourceShare,
};
use tessera_core::models::work_item::SharedResource;
use tessera_core::repository::{
    AuditSink, PrincipalRepository, ProjectAccessRepository, ProjectRepository,
    ResourceShareRepository, TenantRepository, WorkItemRepository,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit;
use crate::error::AccessError;
use crate::scope::{self, ProjectScope};

/// Input for a single share.
#[derive(Debug, Clone)]
pub struct ShareRequest {
    pub project_id: Uuid,
    pub resource: ResourceRef,
    pub user_id: Uuid,
    pub permission: SharePermission,
    pub notes: Option<String>,
    /// `None` shares indefinitely.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Result of [`ResourceShareLedger::bulk_share`].
#[derive(Debug, Default)]
pub struct BulkShareOutcome {
    /// Number of users the resource was shared with.
    pub shared: usize,
    /// Users that could not be shared with, and why.
    pub failures: Vec<(Uuid, TesseraError)>,
}

/// Resource sharing service.
pub struct ResourceShareLedger<W, S, P, L, U, T, A, C>
where
    W: WorkItemRepository,
    S: ResourceShareRepository,
    P: ProjectRepository,
    L: ProjectAccessRepository,
    U: PrincipalRepository,
    T: TenantRepository,
    A: AuditSink,
    C: Clock,
{
    work_item_repo: W,
    share_repo: S,
    project_repo: P,
    access_repo: L,
    principal_repo: U,
    tenant_repo: T,
    audit: A,
    clock: C,
}

impl<W, S, P, L, U, T, A, C> ResourceShareLedger<W, S, P, L, U, T, A, C>
where
    W: WorkItemRepository,
    S: ResourceShareRepository,
    P: ProjectRepository,
    L: ProjectAccessRepository,
    U: PrincipalRepository,
    T: TenantRepository,
    A: AuditSink,
    C: Clock,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        work_item_repo: W,
        share_repo: S,
        project_repo: P,
        access_repo: L,
        principal_repo: U,
        tenant_repo: T,
        audit: A,
        clock: C,
    ) -> Self {
        Self {
            work_item_repo,
            share_repo,
            project_repo,
            access_repo,
            principal_repo,
            tenant_repo,
            audit,
            clock,
        }
    }

    /// Share a resource with one user, overwriting an existing share.
    pub async fn share(
        &self,
        request: ShareRequest,
        sharer: &Principal,
    ) -> TesseraResult<ResourceShare> {
        let target = format!("{}/user:{}", request.resource, request.user_id);
        let result = self.share_inner(request, sharer).await;
        audit::report(&self.audit, sharer, "resource_share.share", target, &result).await;
        result
    }

    async fn share_inner(
        &self,
        request: ShareRequest,
        sharer: &Principal,
    ) -> TesseraResult<ResourceShare> {
        // 1. Project must be reachable by the sharer.
        let scope = match scope::load(&self.project_repo, &self.tenant_repo, request.project_id)
            .await?
        {
            Some(s) if reaches(&s, sharer) => s,
            _ => return Err(AccessError::CrossTenant.into()),
        };

        // 2. Resource must belong to that project.
        let shared = match self.work_item_repo.resolve(request.resource).await {
            Ok(r) if r.project_id == scope.project.id => r,
            Ok(_) | Err(TesseraError::NotFound { .. }) => {
                return Err(TesseraError::not_found(
                    request.resource.kind().as_str(),
                    request.resource.id(),
                ));
            }
            Err(e) => return Err(e),
        };

        // 3. Sharer must hold sharing authority on the project.
        self.require_share_authority(&scope, sharer).await?;

        // 4. Target must be an employee or a member of the project's tenant.
        let recipient = scope::referenced_principal(&self.principal_repo, request.user_id).await?;
        if !recipient.is_internal_employee && !scope.admits(&recipient) {
            return Err(AccessError::CrossTenant.into());
        }
        if shared.is_internal_only && !recipient.is_internal_employee {
            return Err(AccessError::InternalResource.into());
        }

        // 5. Upsert the row.
        let share = self
            .share_repo
            .upsert(UpsertResourceShare {
                project_id: scope.project.id,
                resource: request.resource,
                user_id: recipient.id,
                permission: request.permission,
                notes: request.notes,
                expires_at: request.expires_at,
                shared_by: sharer.id,
            })
            .await?;

        info!(
            resource = %share.resource,
            user_id = %share.user_id,
            permission = share.permission.as_str(),
            shared_by = %sharer.id,
            "Resource shared"
        );
        Ok(share)
    }

    /// Remove a user's share on a resource. An absent row is `NotFound`.
    pub async fn revoke(
        &self,
        resource: ResourceRef,
        user_id: Uuid,
        revoker: &Principal,
    ) -> TesseraResult<()> {
        let result = self.revoke_inner(resource, user_id, revoker).await;
        audit::report(
            &self.audit,
            revoker,
            "resource_share.revoke",
            format!("{resource}/user:{user_id}"),
            &result,
        )
        .await;
        result
    }

    async fn revoke_inner(
        &self,
        resource: ResourceRef,
        user_id: Uuid,
        revoker: &Principal,
    ) -> TesseraResult<()> {
        let (_, scope) = self.reachable_resource(resource, revoker).await?;
        self.require_share_authority(&scope, revoker).await?;

        if !self.share_repo.delete(resource, user_id).await? {
            return Err(TesseraError::not_found(
                "resource_share",
                format!("{resource}/{user_id}"),
            ));
        }

        info!(%resource, %user_id, revoked_by = %revoker.id, "Resource share revoked");
        Ok(())
    }

    /// Share rows of a resource.
    ///
    /// Principals with sharing authority see every row; anyone else on the
    /// project's side of the tenant boundary sees only their own. Expired
    /// rows are dropped unless `include_expired` is set.
    pub async fn list_shares(
        &self,
        resource: ResourceRef,
        viewer: &Principal,
        include_expired: bool,
    ) -> TesseraResult<Vec<ResourceShare>> {
        let result = self.list_shares_inner(resource, viewer, include_expired).await;
        audit::report_denial(
            &self.audit,
            viewer,
            "resource_share.list",
            resource.to_string(),
            &result,
        )
        .await;
        result
    }

    async fn list_shares_inner(
        &self,
        resource: ResourceRef,
        viewer: &Principal,
        include_expired: bool,
    ) -> TesseraResult<Vec<ResourceShare>> {
        let (_, scope) = self.reachable_resource(resource, viewer).await?;
        // Missing authority narrows the listing; any other failure is real.
        let sees_all = match self.require_share_authority(&scope, viewer).await {
            Ok(()) => true,
            Err(e) if e.is_denial() => false,
            Err(e) => return Err(e),
        };
        let now = self.clock.now();

        let shares = self.share_repo.list_by_resource(resource).await?;
        Ok(shares
            .into_iter()
            .filter(|s| sees_all || s.user_id == viewer.id)
            .filter(|s| include_expired || s.is_active_at(now))
            .collect())
    }

    /// Whether `user` may open `resource`.
    ///
    /// Internal employees always may. Anyone else needs a resource that is
    /// not internal-only and an active share row.
    pub async fn has_access(&self, user: &Principal, resource: ResourceRef) -> TesseraResult<bool> {
        if user.is_internal_employee {
            return Ok(true);
        }

        let shared = match self.work_item_repo.resolve(resource).await {
            Ok(r) => r,
            Err(TesseraError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        if shared.is_internal_only {
            debug!(%resource, user_id = %user.id, "Internal-only resource hidden");
            return Ok(false);
        }

        let share = self.share_repo.get(resource, user.id).await?;
        Ok(share.is_some_and(|s| s.is_active_at(self.clock.now())))
    }

    /// Share one resource with many users.
    ///
    /// Each user is handled independently; a failure for one is recorded
    /// and the rest still proceed.
    pub async fn bulk_share(
        &self,
        project_id: Uuid,
        resource: ResourceRef,
        user_ids: &[Uuid],
        sharer: &Principal,
        permission: SharePermission,
    ) -> BulkShareOutcome {
        let mut outcome = BulkShareOutcome::default();

        for &user_id in user_ids {
            let request = ShareRequest {
                project_id,
                resource,
                user_id,
                permission,
                notes: None,
                expires_at: None,
            };
            match self.share(request, sharer).await {
                Ok(_) => outcome.shared += 1,
                Err(e) => outcome.failures.push((user_id, e)),
            }
        }

        if !outcome.failures.is_empty() {
            warn!(
                %resource,
                shared = outcome.shared,
                failed = outcome.failures.len(),
                "Bulk share partially failed"
            );
        }
        outcome
    }

    /// Resolve a resource and its project as seen by `actor`. Absent
    /// resources and resources across the tenant boundary are reported
    /// identically.
    async fn reachable_resource(
        &self,
        resource: ResourceRef,
        actor: &Principal,
    ) -> TesseraResult<(SharedResource, ProjectScope)> {
        let shared = match self.work_item_repo.resolve(resource).await {
            Ok(r) => r,
            Err(TesseraError::NotFound { .. }) => return Err(AccessError::CrossTenant.into()),
            Err(e) => return Err(e),
        };
        match scope::load(&self.project_repo, &self.tenant_repo, shared.project_id).await? {
            Some(s) if reaches(&s, actor) => Ok((shared, s)),
            _ => Err(AccessError::CrossTenant.into()),
        }
    }

    /// Employees, the tenant's company super admin, and project admins or
    /// editors may share.
    async fn require_share_authority(
        &self,
        scope: &ProjectScope,
        actor: &Principal,
    ) -> TesseraResult<()> {
        if actor.is_internal_employee || scope.is_tenant_super_admin(actor) {
            return Ok(());
        }
        match self.access_repo.get(scope.project.id, actor.id).await? {
            Some(g) if matches!(g.access_level, AccessLevel::Admin | AccessLevel::Editor) => Ok(()),
            _ => Err(AccessError::CannotShare.into()),
        }
    }
}

/// Internal employees work across every project; everybody else only on
/// their own side of the tenant boundary.
fn reaches(scope: &ProjectScope, principal: &Principal) -> bool {
    principal.is_internal_employee || scope.admits(principal)
}
