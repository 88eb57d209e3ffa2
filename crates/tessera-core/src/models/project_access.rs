//! Project access-control entries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TesseraError;

/// Per-project access level.
///
/// The derived ordering (`Viewer < Editor < Admin`) exists for display and
/// sorting only. Authorization checks match levels exactly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Viewer,
    Editor,
    Admin,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Self::Viewer),
            "editor" => Ok(Self::Editor),
            "admin" => Ok(Self::Admin),
            other => Err(TesseraError::validation(format!(
                "unknown access level: {other}"
            ))),
        }
    }
}

/// One ledger row: `(project, user) -> level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAccessGrant {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub access_level: AccessLevel,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
}

/// Input for an upsert into the project access ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertProjectAccess {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub access_level: AccessLevel,
    pub granted_by: Uuid,
}
