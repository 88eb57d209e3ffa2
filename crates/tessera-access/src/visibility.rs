//! The internal-only visibility gate.
//!
//! Independent from sharing: an internal-only item stays hidden from
//! external principals whatever grants they hold.

use tessera_core::error::TesseraResult;
use tessera_core::models::principal::Principal;
use tessera_core::models::work_item::{InternalVisibility, Task};
use tessera_core::repository::{AuditSink, WorkItemRepository};
use tracing::info;
use uuid::Uuid;

use crate::audit;
use crate::error::AccessError;

/// Drop every internal-only item unless `principal` is an internal
/// employee. Each item is judged on its own flag; replies inherit nothing
/// from their parents.
pub fn filter_visible<T: InternalVisibility>(principal: &Principal, items: Vec<T>) -> Vec<T> {
    if principal.is_internal_employee {
        return items;
    }
    items
        .into_iter()
        .filter(|item| !item.is_internal_only())
        .collect()
}

/// Changes to a task's internal-only flag. Internal employees only; a
/// refused change is forwarded to the audit sink.
pub struct VisibilityService<W: WorkItemRepository, A: AuditSink> {
    work_item_repo: W,
    audit: A,
}

impl<W: WorkItemRepository, A: AuditSink> VisibilityService<W, A> {
    pub fn new(work_item_repo: W, audit: A) -> Self {
        Self {
            work_item_repo,
            audit,
        }
    }

    /// Flip the task's current flag in one store statement.
    pub async fn toggle_internal_only(
        &self,
        principal: &Principal,
        task_id: Uuid,
    ) -> TesseraResult<Task> {
        let result = match require_employee(principal) {
            Ok(()) => self.work_item_repo.toggle_task_internal(task_id).await,
            Err(e) => Err(e),
        };
        audit::report_denial(
            &self.audit,
            principal,
            "task.toggle_internal_only",
            format!("task:{task_id}"),
            &result,
        )
        .await;

        let task = result?;
        info!(
            %task_id,
            internal_only = task.is_internal_only,
            changed_by = %principal.id,
            "Task visibility toggled"
        );
        Ok(task)
    }

    /// Set the flag to an explicit value. Concurrent callers asking for the
    /// same value agree on the outcome.
    pub async fn set_internal_only(
        &self,
        principal: &Principal,
        task_id: Uuid,
        internal_only: bool,
    ) -> TesseraResult<Task> {
        let result = match require_employee(principal) {
            Ok(()) => {
                self.work_item_repo
                    .set_task_internal(task_id, internal_only)
                    .await
            }
            Err(e) => Err(e),
        };
        audit::report_denial(
            &self.audit,
            principal,
            "task.set_internal_only",
            format!("task:{task_id}"),
            &result,
        )
        .await;

        let task = result?;
        info!(%task_id, internal_only, changed_by = %principal.id, "Task visibility set");
        Ok(task)
    }
}

fn require_employee(principal: &Principal) -> TesseraResult<()> {
    if principal.is_internal_employee {
        Ok(())
    } else {
        Err(AccessError::InternalOnly("change task visibility").into())
    }
}
