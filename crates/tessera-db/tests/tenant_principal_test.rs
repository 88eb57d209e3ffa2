//! Integration tests for the tenant and principal repositories using
//! in-memory SurrealDB.

use tessera_core::error::TesseraError;
use tessera_core::models::principal::{
    CreatePrincipal, PrincipalRole, PrincipalStatus, UpdatePrincipal,
};
use tessera_core::models::tenant::{CreateTenant, TenantStatus};
use tessera_core::repository::{PrincipalRepository, TenantRepository};
use tessera_db::repository::{SurrealPrincipalRepository, SurrealTenantRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tessera_db::run_migrations(&db).await.unwrap();
    db
}

fn new_tenant(subdomain: &str, status: TenantStatus) -> CreateTenant {
    CreateTenant {
        subdomain: subdomain.into(),
        name: format!("{subdomain} Inc."),
        status,
    }
}

#[tokio::test]
async fn create_and_get_tenant() {
    let repo = SurrealTenantRepository::new(setup().await);

    let tenant = repo
        .create(new_tenant(" Acme ", TenantStatus::Trial))
        .await
        .unwrap();
    assert_eq!(tenant.subdomain, "acme");
    assert_eq!(tenant.status, TenantStatus::Trial);
    assert!(tenant.owner_id.is_none());

    let by_id = repo.get_by_id(tenant.id).await.unwrap();
    assert_eq!(by_id.subdomain, "acme");

    let by_subdomain = repo.get_by_subdomain("ACME").await.unwrap();
    assert_eq!(by_subdomain.id, tenant.id);
}

#[tokio::test]
async fn duplicate_subdomain_is_rejected() {
    let repo = SurrealTenantRepository::new(setup().await);

    repo.create(new_tenant("acme", TenantStatus::Active))
        .await
        .unwrap();
    let err = repo
        .create(new_tenant("ACME", TenantStatus::Active))
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::Duplicate { .. }));
}

#[tokio::test]
async fn concurrent_creates_yield_one_tenant_and_duplicates() {
    let repo = SurrealTenantRepository::new(setup().await);

    let (a, b, c) = tokio::join!(
        repo.create(new_tenant("initech", TenantStatus::Trial)),
        repo.create(new_tenant("initech", TenantStatus::Trial)),
        repo.create(new_tenant("Initech", TenantStatus::Trial)),
    );
    let results = [a, b, c];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(err, TesseraError::Duplicate { .. }), "{err:?}");
    }
    assert_eq!(repo.get_by_subdomain("initech").await.unwrap().status, TenantStatus::Trial);
}

#[tokio::test]
async fn unknown_tenant_is_not_found() {
    let repo = SurrealTenantRepository::new(setup().await);

    assert!(matches!(
        repo.get_by_subdomain("nobody").await,
        Err(TesseraError::NotFound { .. })
    ));
    assert!(matches!(
        repo.get_by_id(Uuid::new_v4()).await,
        Err(TesseraError::NotFound { .. })
    ));
}

#[tokio::test]
async fn set_status_updates_tenant() {
    let repo = SurrealTenantRepository::new(setup().await);
    let tenant = repo
        .create(new_tenant("acme", TenantStatus::Active))
        .await
        .unwrap();

    let blocked = repo
        .set_status(tenant.id, TenantStatus::Blocked)
        .await
        .unwrap();
    assert_eq!(blocked.status, TenantStatus::Blocked);
    assert!(!blocked.status.admits_members());
}

#[tokio::test]
async fn owner_activation_assigns_once_and_leaves_trial() {
    let repo = SurrealTenantRepository::new(setup().await);
    let tenant = repo
        .create(new_tenant("acme", TenantStatus::Trial))
        .await
        .unwrap();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    let activated = repo.activate_owner(tenant.id, first).await.unwrap();
    assert_eq!(activated.owner_id, Some(first));
    assert_eq!(activated.status, TenantStatus::Active);

    // The same owner again is a no-op.
    let again = repo.activate_owner(tenant.id, first).await.unwrap();
    assert_eq!(again.owner_id, Some(first));

    let err = repo.activate_owner(tenant.id, second).await.unwrap_err();
    assert!(matches!(err, TesseraError::Duplicate { .. }));
    assert_eq!(
        repo.get_by_id(tenant.id).await.unwrap().owner_id,
        Some(first)
    );
}

#[tokio::test]
async fn owner_activation_of_missing_tenant_is_not_found() {
    let repo = SurrealTenantRepository::new(setup().await);
    let err = repo
        .activate_owner(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::NotFound { .. }));
}

#[tokio::test]
async fn create_and_update_principal() {
    let repo = SurrealPrincipalRepository::new(setup().await);

    let principal = repo
        .create(CreatePrincipal {
            role: PrincipalRole::Admin,
            is_internal_employee: false,
            tenant_subdomain: Some("  Acme".into()),
            company_name: Some("Acme".into()),
        })
        .await
        .unwrap();
    assert_eq!(principal.tenant_subdomain.as_deref(), Some("acme"));
    assert_eq!(principal.status, PrincipalStatus::Active);

    let updated = repo
        .update(
            principal.id,
            UpdatePrincipal {
                role: Some(PrincipalRole::SuperAdmin),
                status: Some(PrincipalStatus::Suspended),
                company_name: Some(None),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.role, PrincipalRole::SuperAdmin);
    assert_eq!(updated.status, PrincipalStatus::Suspended);
    assert!(updated.company_name.is_none());

    let fetched = repo.get_by_id(principal.id).await.unwrap();
    assert_eq!(fetched.role, PrincipalRole::SuperAdmin);
}

#[tokio::test]
async fn blank_subdomain_is_stored_as_none() {
    let repo = SurrealPrincipalRepository::new(setup().await);

    let owner = repo
        .create(CreatePrincipal {
            role: PrincipalRole::SuperAdmin,
            is_internal_employee: false,
            tenant_subdomain: Some("   ".into()),
            company_name: None,
        })
        .await
        .unwrap();
    assert!(owner.tenant_subdomain.is_none());
}
