//! Best-effort forwarding of decisions to the audit sink.
//!
//! A failing sink is logged and otherwise ignored; it never changes the
//! outcome handed back to the caller.

use tessera_core::error::TesseraResult;
use tessera_core::models::audit::{AuditOutcome, CreateAuditEvent};
use tessera_core::models::principal::Principal;
use tessera_core::repository::AuditSink;
use tracing::warn;

/// Record the outcome of `action` when it succeeded or was denied.
/// Other failures (validation, not-found, storage) are not audit events.
pub(crate) async fn report<A: AuditSink, T>(
    sink: &A,
    actor: &Principal,
    action: &str,
    target: String,
    result: &TesseraResult<T>,
) {
    let (outcome, reason) = match result {
        Ok(_) => (AuditOutcome::Success, None),
        Err(e) if e.is_denial() => (AuditOutcome::Denied, Some(e.to_string())),
        Err(_) => return,
    };
    append(sink, actor, action, target, outcome, reason).await;
}

/// Record `action` only when it was denied. Used on read paths, where
/// successful lookups are not audit events.
pub(crate) async fn report_denial<A: AuditSink, T>(
    sink: &A,
    actor: &Principal,
    action: &str,
    target: String,
    result: &TesseraResult<T>,
) {
    let reason = match result {
        Err(e) if e.is_denial() => e.to_string(),
        _ => return,
    };
    append(sink, actor, action, target, AuditOutcome::Denied, Some(reason)).await;
}

async fn append<A: AuditSink>(
    sink: &A,
    actor: &Principal,
    action: &str,
    target: String,
    outcome: AuditOutcome,
    reason: Option<String>,
) {
    let event = CreateAuditEvent {
        actor_id: actor.id,
        tenant_subdomain: actor.normalized_subdomain(),
        action: action.to_string(),
        target: Some(target),
        outcome,
        reason,
    };

    if let Err(e) = sink.append(event).await {
        warn!(actor_id = %actor.id, action, error = %e, "Audit write failed");
    }
}
