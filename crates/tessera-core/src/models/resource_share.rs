//! Resource references and timed sharing grants.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TesseraError;

/// The kind of a shareable resource, as persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Task,
    Comment,
    File,
    Milestone,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Comment => "comment",
            Self::File => "file",
            Self::Milestone => "milestone",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "comment" => Ok(Self::Comment),
            "file" => Ok(Self::File),
            "milestone" => Ok(Self::Milestone),
            other => Err(TesseraError::validation(format!(
                "unknown resource type: {other}"
            ))),
        }
    }
}

/// A typed reference to a shareable resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ResourceRef {
    Task(Uuid),
    Comment(Uuid),
    File(Uuid),
    Milestone(Uuid),
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, id: Uuid) -> Self {
        match kind {
            ResourceKind::Task => Self::Task(id),
            ResourceKind::Comment => Self::Comment(id),
            ResourceKind::File => Self::File(id),
            ResourceKind::Milestone => Self::Milestone(id),
        }
    }

    /// Rebuild a reference from its persisted `(type, id)` pair.
    pub fn parse(kind: &str, id: &str) -> Result<Self, TesseraError> {
        let kind = kind.parse::<ResourceKind>()?;
        let id = Uuid::parse_str(id)
            .map_err(|e| TesseraError::validation(format!("invalid resource id: {e}")))?;
        Ok(Self::new(kind, id))
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Task(_) => ResourceKind::Task,
            Self::Comment(_) => ResourceKind::Comment,
            Self::File(_) => ResourceKind::File,
            Self::Milestone(_) => ResourceKind::Milestone,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Task(id) | Self::Comment(id) | Self::File(id) | Self::Milestone(id) => *id,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SharePermission {
    View,
    Comment,
    Edit,
}

impl SharePermission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Comment => "comment",
            Self::Edit => "edit",
        }
    }
}

impl FromStr for SharePermission {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "comment" => Ok(Self::Comment),
            "edit" => Ok(Self::Edit),
            other => Err(TesseraError::validation(format!(
                "unknown share permission: {other}"
            ))),
        }
    }
}

/// A sharing grant, unique per `(resource, user)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceShare {
    pub project_id: Uuid,
    pub resource: ResourceRef,
    pub user_id: Uuid,
    pub permission: SharePermission,
    pub notes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub shared_by: Uuid,
    pub shared_at: DateTime<Utc>,
}

impl ResourceShare {
    /// A share is active while it has no expiry or the expiry lies after
    /// `now`. Expired rows stay in the ledger.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Input for an upsert into the resource share ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertResourceShare {
    pub project_id: Uuid,
    pub resource: ResourceRef,
    pub user_id: Uuid,
    pub permission: SharePermission,
    pub notes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub shared_by: Uuid,
}
