//! SurrealDB implementation of [`PrincipalRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::principal::{
    CreatePrincipal, Principal, PrincipalRole, PrincipalStatus, UpdatePrincipal,
    normalize_subdomain,
};
use tessera_core::repository::PrincipalRepository;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct PrincipalRow {
    record_id: String,
    role: String,
    is_internal_employee: bool,
    tenant_subdomain: Option<String>,
    company_name: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PrincipalRow {
    fn try_into_principal(self) -> Result<Principal, DbError> {
        Ok(Principal {
            id: parse_uuid(&self.record_id, "principal")?,
            role: parse_role(&self.role)?,
            is_internal_employee: self.is_internal_employee,
            tenant_subdomain: self.tenant_subdomain,
            company_name: self.company_name,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_role(s: &str) -> Result<PrincipalRole, DbError> {
    match s {
        "super_admin" => Ok(PrincipalRole::SuperAdmin),
        "admin" => Ok(PrincipalRole::Admin),
        "user" => Ok(PrincipalRole::User),
        other => Err(DbError::Decode(format!("unknown principal role: {other}"))),
    }
}

fn role_to_string(role: PrincipalRole) -> &'static str {
    match role {
        PrincipalRole::SuperAdmin => "super_admin",
        PrincipalRole::Admin => "admin",
        PrincipalRole::User => "user",
    }
}

fn parse_status(s: &str) -> Result<PrincipalStatus, DbError> {
    match s {
        "active" => Ok(PrincipalStatus::Active),
        "suspended" => Ok(PrincipalStatus::Suspended),
        "blocked" => Ok(PrincipalStatus::Blocked),
        other => Err(DbError::Decode(format!("unknown principal status: {other}"))),
    }
}

fn status_to_string(status: PrincipalStatus) -> &'static str {
    match status {
        PrincipalStatus::Active => "active",
        PrincipalStatus::Suspended => "suspended",
        PrincipalStatus::Blocked => "blocked",
    }
}

const SELECT_BY_ID: &str = "SELECT meta::id(id) AS record_id, * \
                            FROM type::record('principal', $id)";

/// SurrealDB implementation of the Principal repository.
#[derive(Clone)]
pub struct SurrealPrincipalRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPrincipalRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PrincipalRepository for SurrealPrincipalRepository<C> {
    async fn create(&self, input: CreatePrincipal) -> TesseraResult<Principal> {
        let id_str = Uuid::new_v4().to_string();
        let subdomain = input
            .tenant_subdomain
            .as_deref()
            .map(normalize_subdomain)
            .filter(|s| !s.is_empty());

        let query = format!(
            "CREATE type::record('principal', $id) SET \
             role = $role, \
             is_internal_employee = $is_internal_employee, \
             tenant_subdomain = $tenant_subdomain, \
             company_name = $company_name, \
             status = 'active'; \
             {SELECT_BY_ID};"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("role", role_to_string(input.role).to_string()))
            .bind(("is_internal_employee", input.is_internal_employee))
            .bind(("tenant_subdomain", subdomain))
            .bind(("company_name", input.company_name))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PrincipalRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: id_str,
        })?;

        Ok(row.try_into_principal()?)
    }

    async fn get_by_id(&self, id: Uuid) -> TesseraResult<Principal> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_BY_ID)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: id_str,
        })?;

        Ok(row.try_into_principal()?)
    }

    async fn update(&self, id: Uuid, input: UpdatePrincipal) -> TesseraResult<Principal> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.company_name.is_some() {
            sets.push("company_name = $company_name");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('principal', $id) SET {}; {SELECT_BY_ID};",
            sets.join(", ")
        );

        let mut builder = self.db.query(query).bind(("id", id_str.clone()));
        if let Some(role) = input.role {
            builder = builder.bind(("role", role_to_string(role).to_string()));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(company_name) = input.company_name {
            builder = builder.bind(("company_name", company_name));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PrincipalRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "principal".into(),
            id: id_str,
        })?;

        Ok(row.try_into_principal()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_round_trip() {
        for role in [
            PrincipalRole::SuperAdmin,
            PrincipalRole::Admin,
            PrincipalRole::User,
        ] {
            assert_eq!(parse_role(role_to_string(role)).unwrap(), role);
        }
        assert!(parse_role("owner").is_err());
    }

    #[test]
    fn unknown_status_is_a_decode_error() {
        assert!(matches!(parse_status("deleted"), Err(DbError::Decode(_))));
    }
}
