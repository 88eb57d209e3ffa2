//! Project work items: tasks, comments, files and milestones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resource_share::ResourceRef;

/// Items carrying the internal/external visibility gate.
pub trait InternalVisibility {
    fn is_internal_only(&self) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub is_internal_only: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InternalVisibility for Task {
    fn is_internal_only(&self) -> bool {
        self.is_internal_only
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    /// Set for replies. A reply's visibility is its own flag alone.
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub is_internal_only: bool,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl InternalVisibility for Comment {
    fn is_internal_only(&self) -> bool {
        self.is_internal_only
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub is_internal_only: bool,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub task_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub is_internal_only: bool,
    pub author_id: Uuid,
}

/// Files and milestones are shareable but carry no internal-only flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArtifact {
    pub project_id: Uuid,
    pub name: String,
    pub created_by: Uuid,
}

/// What the sharing ledger needs to know about any shareable resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedResource {
    pub resource: ResourceRef,
    pub project_id: Uuid,
    pub is_internal_only: bool,
}
