//! Context admission: may this principal operate under this host at all?
//!
//! Admission is a strict partition. For any context at most one kind of
//! principal is let in:
//!
//! | context          | admitted                                         |
//! |------------------|--------------------------------------------------|
//! | product owner    | `super_admin`, not an employee, no tenant        |
//! | internal         | internal employees (never the product owner)     |
//! | client `S`       | non-employees whose tenant subdomain equals `S`  |

use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::context::{ContextKind, TenantContext};
use tessera_core::models::principal::{Principal, PrincipalStatus};
use tessera_core::models::tenant::TenantStatus;
use tessera_core::repository::{AuditSink, TenantRepository};
use tracing::info;

use crate::audit;
use crate::config::AccessConfig;
use crate::error::AccessError;
use crate::roles::is_product_owner;

/// Pure admission check over the principal record and the context.
pub fn verify_principal_allowed(principal: &Principal, context: &TenantContext) -> bool {
    match context.kind {
        ContextKind::ProductOwner => is_product_owner(principal),
        ContextKind::Internal => principal.is_internal_employee,
        ContextKind::Client => match context.subdomain.as_deref() {
            Some(subdomain) => {
                !principal.is_internal_employee && principal.belongs_to(subdomain)
            }
            None => false,
        },
    }
}

/// The login URL matching the principal's actual role and tenant, used to
/// redirect a principal that arrived on the wrong host.
pub fn allowed_login_url(principal: &Principal, config: &AccessConfig) -> String {
    let host = if is_product_owner(principal) {
        config.product_owner_host()
    } else if principal.is_internal_employee {
        config.internal_host()
    } else if let Some(subdomain) = principal.normalized_subdomain() {
        config.tenant_host(&subdomain)
    } else {
        config.internal_host()
    };
    config.login_url(&host)
}

fn status_name(status: PrincipalStatus) -> &'static str {
    match status {
        PrincipalStatus::Active => "active",
        PrincipalStatus::Suspended => "suspended",
        PrincipalStatus::Blocked => "blocked",
    }
}

fn describe(context: &TenantContext) -> String {
    match (&context.kind, &context.subdomain) {
        (ContextKind::Client, Some(s)) => format!("client:{s}"),
        (ContextKind::Client, None) => "client:unresolved".into(),
        (ContextKind::Internal, _) => "internal".into(),
        (ContextKind::ProductOwner, _) => "product_owner".into(),
    }
}

/// Store-aware admission: adds principal status and tenant status to the
/// pure check, and reports denials to the audit sink.
pub struct AdmissionService<T: TenantRepository, A: AuditSink> {
    tenants: T,
    audit: A,
    config: AccessConfig,
}

impl<T: TenantRepository, A: AuditSink> AdmissionService<T, A> {
    pub fn new(tenants: T, audit: A, config: AccessConfig) -> Self {
        Self {
            tenants,
            audit,
            config,
        }
    }

    /// Admit `principal` into `context` or explain why not.
    ///
    /// An unresolved client context is `NotFound`. Host mismatches and
    /// inactive accounts are `PermissionDenied` carrying the principal's
    /// own login URL.
    pub async fn admit(&self, principal: &Principal, context: &TenantContext) -> TesseraResult<()> {
        let result = self.check(principal, context).await;
        if result.is_err() {
            audit::report(
                &self.audit,
                principal,
                "context.admit",
                describe(context),
                &result,
            )
            .await;
        }
        result
    }

    async fn check(&self, principal: &Principal, context: &TenantContext) -> TesseraResult<()> {
        if context.is_unresolved() {
            return Err(TesseraError::not_found("tenant", "unresolved host"));
        }

        let login_url = allowed_login_url(principal, &self.config);

        if principal.status != PrincipalStatus::Active {
            return Err(AccessError::PrincipalInactive {
                status: status_name(principal.status),
                login_url,
            }
            .into());
        }

        if !verify_principal_allowed(principal, context) {
            info!(
                principal_id = %principal.id,
                context = %describe(context),
                redirect = %login_url,
                "Principal refused on host"
            );
            return Err(AccessError::WrongHost { login_url }.into());
        }

        if let Some(subdomain) = context.subdomain.as_deref() {
            let tenant = self.tenants.get_by_subdomain(subdomain).await?;
            if !tenant.status.admits_members() {
                let status = match tenant.status {
                    TenantStatus::Blocked => "blocked",
                    _ => "suspended",
                };
                return Err(AccessError::TenantInactive { status }.into());
            }
        }

        Ok(())
    }
}
