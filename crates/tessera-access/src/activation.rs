//! Tenant-owner activation.

use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::principal::Principal;
use tessera_core::models::tenant::{Tenant, TenantStatus};
use tessera_core::repository::{AuditSink, TenantRepository};
use tracing::info;
use uuid::Uuid;

use crate::audit;
use crate::error::AccessError;
use crate::roles::is_company_super_admin;

/// Assigns a tenant's first owner.
pub struct OwnerActivation<T: TenantRepository, A: AuditSink> {
    tenant_repo: T,
    audit: A,
}

impl<T: TenantRepository, A: AuditSink> OwnerActivation<T, A> {
    pub fn new(tenant_repo: T, audit: A) -> Self {
        Self { tenant_repo, audit }
    }

    /// Make `principal` the owner of the tenant.
    ///
    /// Only the company super admin of that very tenant qualifies. The
    /// store assigns the owner transactionally, so of several concurrent
    /// callers exactly one wins and the rest get `Duplicate`. A trial tenant
    /// becomes active.
    pub async fn activate(&self, tenant_id: Uuid, principal: &Principal) -> TesseraResult<Tenant> {
        let result = self.activate_inner(tenant_id, principal).await;
        audit::report(
            &self.audit,
            principal,
            "tenant.activate_owner",
            format!("tenant:{tenant_id}"),
            &result,
        )
        .await;
        result
    }

    async fn activate_inner(&self, tenant_id: Uuid, principal: &Principal) -> TesseraResult<Tenant> {
        if !is_company_super_admin(principal) {
            return Err(AccessError::NotCompanySuperAdmin.into());
        }
        if !principal.is_active() {
            return Err(TesseraError::denied("principal account is not active"));
        }

        let tenant = match self.tenant_repo.get_by_id(tenant_id).await {
            Ok(t) if principal.belongs_to(&t.subdomain) => t,
            Ok(_) | Err(TesseraError::NotFound { .. }) => {
                return Err(AccessError::CrossTenant.into());
            }
            Err(e) => return Err(e),
        };

        match tenant.status {
            TenantStatus::Blocked => {
                return Err(AccessError::TenantInactive { status: "blocked" }.into());
            }
            TenantStatus::Suspended => {
                return Err(AccessError::TenantInactive { status: "suspended" }.into());
            }
            TenantStatus::Active | TenantStatus::Trial => {}
        }

        let tenant = self.tenant_repo.activate_owner(tenant.id, principal.id).await?;
        info!(
            tenant_id = %tenant.id,
            subdomain = %tenant.subdomain,
            owner_id = %principal.id,
            "Tenant owner assigned"
        );
        Ok(tenant)
    }
}
