//! Tenant domain model.
//!
//! A tenant is an isolated client organization identified by a globally
//! unique subdomain label. All tenant data lives in one logical store and is
//! separated by subdomain/foreign-key predicates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Blocked,
    Suspended,
    Trial,
}

impl TenantStatus {
    /// Whether members of a tenant in this state may sign in.
    pub fn admits_members(self) -> bool {
        matches!(self, Self::Active | Self::Trial)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Lower-cased, trimmed subdomain label (e.g. `acme`).
    pub subdomain: String,
    pub name: String,
    pub status: TenantStatus,
    /// Owning principal. Unset until the first invitation is accepted.
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub subdomain: String,
    pub name: String,
    pub status: TenantStatus,
}
