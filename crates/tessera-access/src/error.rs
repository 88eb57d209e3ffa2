//! Access-decision error types.

use tessera_core::error::TesseraError;
use thiserror::Error;

/// Why an access decision was refused.
///
/// Every variant surfaces to callers as one of the core error classes;
/// see the `From` impl below.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("principal is not allowed on this host")]
    WrongHost { login_url: String },

    #[error("principal account is {status}")]
    PrincipalInactive { status: &'static str, login_url: String },

    #[error("tenant is {status}")]
    TenantInactive { status: &'static str },

    #[error("principal record is malformed: {0}")]
    MalformedPrincipal(&'static str),

    #[error("only internal employees may {0}")]
    InternalOnly(&'static str),

    #[error("requires company super admin or project admin")]
    NotProjectAdmin,

    #[error("requires project admin or editor")]
    CannotShare,

    #[error("requires the tenant's company super admin")]
    NotCompanySuperAdmin,

    #[error("internal-only resources cannot be shared with external users")]
    InternalResource,

    #[error("cross-tenant reference")]
    CrossTenant,
}

impl From<AccessError> for TesseraError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::WrongHost { ref login_url }
            | AccessError::PrincipalInactive { ref login_url, .. } => {
                TesseraError::PermissionDenied {
                    redirect_to: Some(login_url.clone()),
                    reason: err.to_string(),
                }
            }
            AccessError::TenantInactive { .. }
            | AccessError::InternalOnly(_)
            | AccessError::NotProjectAdmin
            | AccessError::CannotShare
            | AccessError::NotCompanySuperAdmin => TesseraError::denied(err.to_string()),
            AccessError::MalformedPrincipal(_) | AccessError::InternalResource => {
                TesseraError::validation(err.to_string())
            }
            AccessError::CrossTenant => TesseraError::TenantMismatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_host_carries_redirect() {
        let err: TesseraError = AccessError::WrongHost {
            login_url: "https://owner.crm.example/login".into(),
        }
        .into();
        match err {
            TesseraError::PermissionDenied { redirect_to, .. } => {
                assert_eq!(redirect_to.as_deref(), Some("https://owner.crm.example/login"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn cross_tenant_maps_to_tenant_mismatch() {
        let err: TesseraError = AccessError::CrossTenant.into();
        assert!(matches!(err, TesseraError::TenantMismatch));
    }
}
