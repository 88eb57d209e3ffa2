//! Principal domain model.
//!
//! A principal is an already-authenticated actor. The access core never
//! authenticates; it only classifies and authorizes the stored record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalRole {
    SuperAdmin,
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalStatus {
    Active,
    Suspended,
    Blocked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: PrincipalRole,
    /// Member of the operating company rather than any tenant.
    pub is_internal_employee: bool,
    /// Subdomain of the tenant the principal belongs to. `None` for internal
    /// employees and the product owner.
    pub tenant_subdomain: Option<String>,
    pub company_name: Option<String>,
    pub status: PrincipalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Principal {
    /// The tenant subdomain, trimmed and lower-cased. Blank values count as
    /// no tenant.
    pub fn normalized_subdomain(&self) -> Option<String> {
        self.tenant_subdomain
            .as_deref()
            .map(normalize_subdomain)
            .filter(|s| !s.is_empty())
    }

    /// Case-insensitive, whitespace-tolerant tenant membership check.
    pub fn belongs_to(&self, subdomain: &str) -> bool {
        let wanted = normalize_subdomain(subdomain);
        !wanted.is_empty() && self.normalized_subdomain().as_deref() == Some(wanted.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.status == PrincipalStatus::Active
    }
}

/// Canonical form used for every subdomain comparison and for storage.
pub fn normalize_subdomain(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrincipal {
    pub role: PrincipalRole,
    pub is_internal_employee: bool,
    pub tenant_subdomain: Option<String>,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePrincipal {
    pub role: Option<PrincipalRole>,
    pub status: Option<PrincipalStatus>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub company_name: Option<Option<String>>,
}
