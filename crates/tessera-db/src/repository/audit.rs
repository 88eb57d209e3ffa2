//! SurrealDB append-only [`AuditSink`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::audit::{AuditEvent, AuditOutcome, CreateAuditEvent};
use tessera_core::repository::AuditSink;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct AuditRow {
    record_id: String,
    actor_id: String,
    tenant_subdomain: Option<String>,
    action: String,
    target: Option<String>,
    outcome: String,
    reason: Option<String>,
    timestamp: DateTime<Utc>,
}

impl AuditRow {
    fn try_into_event(self) -> Result<AuditEvent, DbError> {
        let outcome = match self.outcome.as_str() {
            "success" => AuditOutcome::Success,
            "denied" => AuditOutcome::Denied,
            other => return Err(DbError::Decode(format!("unknown audit outcome: {other}"))),
        };
        Ok(AuditEvent {
            id: parse_uuid(&self.record_id, "audit")?,
            actor_id: parse_uuid(&self.actor_id, "actor")?,
            tenant_subdomain: self.tenant_subdomain,
            action: self.action,
            target: self.target,
            outcome,
            reason: self.reason,
            timestamp: self.timestamp,
        })
    }
}

/// Audit sink writing to the `audit_log` table.
#[derive(Clone)]
pub struct SurrealAuditSink<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditSink<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Events recorded for one actor, oldest first.
    pub async fn list_by_actor(&self, actor_id: Uuid) -> TesseraResult<Vec<AuditEvent>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM audit_log \
                 WHERE actor_id = $actor_id ORDER BY timestamp ASC",
            )
            .bind(("actor_id", actor_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let events = rows
            .into_iter()
            .map(AuditRow::try_into_event)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(events)
    }
}

impl<C: Connection> AuditSink for SurrealAuditSink<C> {
    async fn append(&self, input: CreateAuditEvent) -> TesseraResult<AuditEvent> {
        let id_str = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 actor_id = $actor_id, tenant_subdomain = $tenant_subdomain, \
                 action = $action, target = $target, \
                 outcome = $outcome, reason = $reason; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('audit_log', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor_id", input.actor_id.to_string()))
            .bind(("tenant_subdomain", input.tenant_subdomain))
            .bind(("action", input.action))
            .bind(("target", input.target))
            .bind(("outcome", input.outcome.as_str().to_string()))
            .bind(("reason", input.reason))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<AuditRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_log".into(),
            id: id_str,
        })?;

        Ok(row.try_into_event()?)
    }
}
