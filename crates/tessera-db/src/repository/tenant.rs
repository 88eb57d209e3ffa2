//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::principal::normalize_subdomain;
use tessera_core::models::tenant::{CreateTenant, Tenant, TenantStatus};
use tessera_core::repository::TenantRepository;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct TenantRow {
    record_id: String,
    subdomain: String,
    name: String,
    status: String,
    owner_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRow {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let owner_id = self
            .owner_id
            .as_deref()
            .map(|o| parse_uuid(o, "owner"))
            .transpose()?;
        Ok(Tenant {
            id: parse_uuid(&self.record_id, "tenant")?,
            subdomain: self.subdomain,
            name: self.name,
            status: parse_status(&self.status)?,
            owner_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_status(s: &str) -> Result<TenantStatus, DbError> {
    match s {
        "active" => Ok(TenantStatus::Active),
        "blocked" => Ok(TenantStatus::Blocked),
        "suspended" => Ok(TenantStatus::Suspended),
        "trial" => Ok(TenantStatus::Trial),
        other => Err(DbError::Decode(format!("unknown tenant status: {other}"))),
    }
}

fn status_to_string(status: TenantStatus) -> &'static str {
    match status {
        TenantStatus::Active => "active",
        TenantStatus::Blocked => "blocked",
        TenantStatus::Suspended => "suspended",
        TenantStatus::Trial => "trial",
    }
}

const SELECT_BY_ID: &str = "SELECT meta::id(id) AS record_id, * \
                            FROM type::record('tenant', $id)";

/// Check-then-assign for the owning principal. The conditional UPDATE only
/// matches while no owner is set; the transaction keeps the status change
/// and the owner assignment together.
const ACTIVATE_OWNER: &str = "\
BEGIN TRANSACTION;
UPDATE type::record('tenant', $id) SET \
    owner_id = $owner_id, updated_at = time::now() \
    WHERE owner_id = NONE;
UPDATE type::record('tenant', $id) SET status = 'active' \
    WHERE owner_id = $owner_id AND status = 'trial';
COMMIT TRANSACTION;
";

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> TesseraResult<Tenant> {
        let subdomain = normalize_subdomain(&input.subdomain);
        if self.find_by_subdomain(&subdomain).await?.is_some() {
            return Err(DbError::Duplicate {
                entity: format!("tenant subdomain '{subdomain}'"),
            }
            .into());
        }

        let id_str = Uuid::new_v4().to_string();
        let query = format!(
            "CREATE type::record('tenant', $id) SET \
             subdomain = $subdomain, name = $name, status = $status; \
             {SELECT_BY_ID};"
        );

        let created = match self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("subdomain", subdomain.clone()))
            .bind(("name", input.name))
            .bind(("status", status_to_string(input.status).to_string()))
            .await
        {
            Ok(response) => response.check().map_err(|e| DbError::Query(e.to_string())),
            Err(e) => Err(DbError::from(e)),
        };

        // A concurrent create can slip past the lookup above. The UNIQUE
        // index rejects it; report that as the duplicate it is.
        let mut result = match created {
            Ok(result) => result,
            Err(e) => {
                if self.find_by_subdomain(&subdomain).await?.is_some() {
                    warn!(%subdomain, "Concurrent tenant create lost to an existing subdomain");
                    return Err(DbError::Duplicate {
                        entity: format!("tenant subdomain '{subdomain}'"),
                    }
                    .into());
                }
                return Err(e.into());
            }
        };

        let rows: Vec<TenantRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn get_by_id(&self, id: Uuid) -> TesseraResult<Tenant> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(SELECT_BY_ID)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn get_by_subdomain(&self, subdomain: &str) -> TesseraResult<Tenant> {
        let subdomain = normalize_subdomain(subdomain);
        self.find_by_subdomain(&subdomain)
            .await?
            .ok_or_else(|| {
                DbError::NotFound {
                    entity: "tenant".into(),
                    id: format!("subdomain={subdomain}"),
                }
                .into()
            })
    }

    async fn set_status(&self, id: Uuid, status: TenantStatus) -> TesseraResult<Tenant> {
        let query = format!(
            "UPDATE type::record('tenant', $id) SET \
             status = $status, updated_at = time::now(); \
             {SELECT_BY_ID};"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("status", status_to_string(status).to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(1).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn activate_owner(&self, id: Uuid, owner_id: Uuid) -> TesseraResult<Tenant> {
        let applied = match self
            .db
            .query(ACTIVATE_OWNER)
            .bind(("id", id.to_string()))
            .bind(("owner_id", owner_id.to_string()))
            .await
        {
            Ok(response) => response
                .check()
                .map(|_| ())
                .map_err(|e| DbError::Query(e.to_string())),
            Err(e) => Err(DbError::from(e)),
        };

        // Whoever holds the row now is the single winner. A conflicting
        // transaction that lost the race is reported the same way.
        let tenant = self.get_by_id(id).await?;
        match tenant.owner_id {
            Some(current) if current == owner_id => {
                info!(tenant_id = %id, owner_id = %owner_id, "Tenant owner activated");
                Ok(tenant)
            }
            Some(_) => {
                warn!(tenant_id = %id, owner_id = %owner_id, "Tenant already has an owner");
                Err(DbError::Duplicate {
                    entity: "tenant owner".into(),
                }
                .into())
            }
            None => {
                applied?;
                Err(DbError::Query(format!("owner assignment for tenant {id} did not apply")).into())
            }
        }
    }
}

impl<C: Connection> SurrealTenantRepository<C> {
    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE subdomain = $subdomain",
            )
            .bind(("subdomain", subdomain.to_string()))
            .await?;

        let rows: Vec<TenantRow> = result.take(0)?;
        rows.into_iter().next().map(TenantRow::try_into_tenant).transpose()
    }
}
