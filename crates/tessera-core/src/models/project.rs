//! Project domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    /// Owning tenant. `None` marks an internal-only project.
    pub tenant_id: Option<Uuid>,
    pub name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn is_internal(&self) -> bool {
        self.tenant_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub tenant_id: Option<Uuid>,
    pub name: String,
    pub created_by: Uuid,
}
