//! Error types for the Tessera access core.

use thiserror::Error;

/// Message returned for every cross-tenant reference, whether or not the
/// referenced object exists.
pub const TENANT_MISMATCH_MESSAGE: &str = "referenced object is outside your tenant";

#[derive(Debug, Error)]
pub enum TesseraError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A same-tenant entity is absent. Never used for cross-tenant lookups.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// Role, level or context mismatch. `redirect_to` carries the login URL
    /// the principal should be sent to, when one can be computed.
    #[error("Permission denied: {reason}")]
    PermissionDenied {
        reason: String,
        redirect_to: Option<String>,
    },

    #[error("Entity already exists: {entity}")]
    Duplicate { entity: String },

    #[error("Tenant mismatch: {TENANT_MISMATCH_MESSAGE}")]
    TenantMismatch,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TesseraError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
            redirect_to: None,
        }
    }

    /// True for the error classes that are reported to the audit sink.
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::TenantMismatch)
    }
}

pub type TesseraResult<T> = Result<T, TesseraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_mismatch_message_is_constant() {
        assert_eq!(
            TesseraError::TenantMismatch.to_string(),
            format!("Tenant mismatch: {TENANT_MISMATCH_MESSAGE}")
        );
    }

    #[test]
    fn denial_classification() {
        assert!(TesseraError::TenantMismatch.is_denial());
        assert!(TesseraError::denied("nope").is_denial());
        assert!(!TesseraError::not_found("project", "x").is_denial());
        assert!(!TesseraError::validation("bad").is_denial());
    }
}
