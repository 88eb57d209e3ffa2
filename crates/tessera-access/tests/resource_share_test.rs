//! Integration tests for resource sharing, the visibility gate and owner
//! activation using in-memory SurrealDB.

use chrono::{Duration, Utc};
use tessera_access::{
    OwnerActivation, ProjectAccessLedger, ResourceShareLedger, ShareRequest, VisibilityService,
    filter_visible,
};
use tessera_core::clock::FixedClock;
use tessera_core::error::TesseraError;
use tessera_core::models::audit::AuditOutcome;
use tessera_core::models::principal::{CreatePrincipal, Principal, PrincipalRole};
use tessera_core::models::project::Project;
use tessera_core::models::project_access::AccessLevel;
use tessera_core::models::resource_share::{ResourceRef, SharePermission};
use tessera_core::models::tenant::{CreateTenant, Tenant, TenantStatus};
use tessera_core::models::work_item::{CreateTask, Task};
use tessera_core::repository::{PrincipalRepository, TenantRepository, WorkItemRepository};
use tessera_db::repository::{
    SurrealAuditSink, SurrealPrincipalRepository, SurrealProjectAccessRepository,
    SurrealProjectRepository, SurrealResourceShareRepository, SurrealTenantRepository,
    SurrealWorkItemRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Shares = ResourceShareLedger<
    SurrealWorkItemRepository<Db>,
    SurrealResourceShareRepository<Db>,
    SurrealProjectRepository<Db>,
    SurrealProjectAccessRepository<Db>,
    SurrealPrincipalRepository<Db>,
    SurrealTenantRepository<Db>,
    SurrealAuditSink<Db>,
    FixedClock,
>;

struct Fixture {
    db: Surreal<Db>,
    shares: Shares,
    csa: Principal,
    project: Project,
    task: Task,
    internal_task: Task,
}

async fn db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tessera_db::run_migrations(&db).await.unwrap();
    db
}

async fn tenant(db: &Surreal<Db>, subdomain: &str, status: TenantStatus) -> Tenant {
    SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            subdomain: subdomain.into(),
            name: subdomain.into(),
            status,
        })
        .await
        .unwrap()
}

async fn principal(
    db: &Surreal<Db>,
    role: PrincipalRole,
    internal: bool,
    tenant: Option<&str>,
) -> Principal {
    SurrealPrincipalRepository::new(db.clone())
        .create(CreatePrincipal {
            role,
            is_internal_employee: internal,
            tenant_subdomain: tenant.map(String::from),
            company_name: None,
        })
        .await
        .unwrap()
}

fn access_ledger(
    db: &Surreal<Db>,
) -> ProjectAccessLedger<
    SurrealTenantRepository<Db>,
    SurrealPrincipalRepository<Db>,
    SurrealProjectRepository<Db>,
    SurrealProjectAccessRepository<Db>,
    SurrealAuditSink<Db>,
> {
    ProjectAccessLedger::new(
        SurrealTenantRepository::new(db.clone()),
        SurrealPrincipalRepository::new(db.clone()),
        SurrealProjectRepository::new(db.clone()),
        SurrealProjectAccessRepository::new(db.clone()),
        SurrealAuditSink::new(db.clone()),
    )
}

/// Tenant `acme` with its super admin, one project, and two tasks, one of
/// them internal-only.
async fn setup() -> Fixture {
    let db = db().await;
    tenant(&db, "acme", TenantStatus::Active).await;
    tenant(&db, "globex", TenantStatus::Active).await;

    let csa = principal(&db, PrincipalRole::SuperAdmin, false, Some("acme")).await;
    let project = access_ledger(&db)
        .create_project(&csa, "Launch")
        .await
        .unwrap();

    let work = SurrealWorkItemRepository::new(db.clone());
    let task = work
        .create_task(CreateTask {
            project_id: project.id,
            title: "Press kit".into(),
            is_internal_only: false,
            created_by: csa.id,
        })
        .await
        .unwrap();
    let internal_task = work
        .create_task(CreateTask {
            project_id: project.id,
            title: "Margin review".into(),
            is_internal_only: true,
            created_by: csa.id,
        })
        .await
        .unwrap();

    let shares = ResourceShareLedger::new(
        work,
        SurrealResourceShareRepository::new(db.clone()),
        SurrealProjectRepository::new(db.clone()),
        SurrealProjectAccessRepository::new(db.clone()),
        SurrealPrincipalRepository::new(db.clone()),
        SurrealTenantRepository::new(db.clone()),
        SurrealAuditSink::new(db.clone()),
        FixedClock(Utc::now()),
    );

    Fixture {
        db,
        shares,
        csa,
        project,
        task,
        internal_task,
    }
}

fn request(f: &Fixture, resource: ResourceRef, user_id: Uuid) -> ShareRequest {
    ShareRequest {
        project_id: f.project.id,
        resource,
        user_id,
        permission: SharePermission::View,
        notes: None,
        expires_at: None,
    }
}

#[tokio::test]
async fn expired_share_grants_nothing_open_ended_share_does() {
    let f = setup().await;
    let late = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let regular = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let resource = ResourceRef::Task(f.task.id);

    f.shares
        .share(
            ShareRequest {
                expires_at: Some(Utc::now() - Duration::days(1)),
                ..request(&f, resource, late.id)
            },
            &f.csa,
        )
        .await
        .unwrap();
    f.shares
        .share(request(&f, resource, regular.id), &f.csa)
        .await
        .unwrap();

    assert!(!f.shares.has_access(&late, resource).await.unwrap());
    assert!(f.shares.has_access(&regular, resource).await.unwrap());

    let active = f.shares.list_shares(resource, &f.csa, false).await.unwrap();
    assert_eq!(active.len(), 1);
    let all = f.shares.list_shares(resource, &f.csa, true).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn internal_employees_always_have_access() {
    let f = setup().await;
    let employee = principal(&f.db, PrincipalRole::User, true, None).await;

    assert!(
        f.shares
            .has_access(&employee, ResourceRef::Task(f.internal_task.id))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn internal_only_resources_stay_with_employees() {
    let f = setup().await;
    let member = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let employee = principal(&f.db, PrincipalRole::User, true, None).await;
    let resource = ResourceRef::Task(f.internal_task.id);

    let err = f
        .shares
        .share(request(&f, resource, member.id), &f.csa)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::Validation { .. }));
    assert!(!f.shares.has_access(&member, resource).await.unwrap());

    f.shares
        .share(request(&f, resource, employee.id), &f.csa)
        .await
        .unwrap();
}

#[tokio::test]
async fn sharing_needs_editor_or_admin() {
    let f = setup().await;
    let viewer = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let editor = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let target = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let access = access_ledger(&f.db);
    access
        .grant(f.project.id, viewer.id, AccessLevel::Viewer, &f.csa)
        .await
        .unwrap();
    access
        .grant(f.project.id, editor.id, AccessLevel::Editor, &f.csa)
        .await
        .unwrap();
    let resource = ResourceRef::Task(f.task.id);

    let err = f
        .shares
        .share(request(&f, resource, target.id), &viewer)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::PermissionDenied { .. }));

    f.shares
        .share(request(&f, resource, target.id), &editor)
        .await
        .unwrap();
    assert!(f.shares.has_access(&target, resource).await.unwrap());

    // Without sharing authority only one's own row is listed.
    f.shares
        .share(request(&f, resource, viewer.id), &editor)
        .await
        .unwrap();
    let seen = f.shares.list_shares(resource, &viewer, true).await.unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].user_id, viewer.id);
}

#[tokio::test]
async fn resource_must_belong_to_the_project() {
    let f = setup().await;
    let member = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;

    let err = f
        .shares
        .share(request(&f, ResourceRef::Task(Uuid::new_v4()), member.id), &f.csa)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::NotFound { .. }));

    // A task id addressed as a comment is a different resource.
    let err = f
        .shares
        .share(request(&f, ResourceRef::Comment(f.task.id), member.id), &f.csa)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::NotFound { .. }));
}

#[tokio::test]
async fn revoke_removes_access_and_absent_row_is_not_found() {
    let f = setup().await;
    let member = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let resource = ResourceRef::Task(f.task.id);

    f.shares
        .share(request(&f, resource, member.id), &f.csa)
        .await
        .unwrap();
    f.shares.revoke(resource, member.id, &f.csa).await.unwrap();
    assert!(!f.shares.has_access(&member, resource).await.unwrap());

    let err = f
        .shares
        .revoke(resource, member.id, &f.csa)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::NotFound { .. }));
}

#[tokio::test]
async fn foreign_tenant_cannot_touch_shares() {
    let f = setup().await;
    let foreign_csa = principal(&f.db, PrincipalRole::SuperAdmin, false, Some("globex")).await;
    let member = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let resource = ResourceRef::Task(f.task.id);

    let err = f
        .shares
        .share(request(&f, resource, member.id), &foreign_csa)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::TenantMismatch));

    let err = f
        .shares
        .list_shares(resource, &foreign_csa, true)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::TenantMismatch));

    // An unknown resource looks exactly like a foreign one.
    let err = f
        .shares
        .revoke(ResourceRef::Milestone(Uuid::new_v4()), member.id, &foreign_csa)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::TenantMismatch));
}

#[tokio::test]
async fn bulk_share_records_failures_without_aborting() {
    let f = setup().await;
    let a = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let b = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let foreign = principal(&f.db, PrincipalRole::User, false, Some("globex")).await;
    let ghost = Uuid::new_v4();
    let resource = ResourceRef::Task(f.task.id);

    let outcome = f
        .shares
        .bulk_share(
            f.project.id,
            resource,
            &[a.id, foreign.id, ghost, b.id],
            &f.csa,
            SharePermission::Comment,
        )
        .await;

    assert_eq!(outcome.shared, 2);
    assert_eq!(outcome.failures.len(), 2);
    for (user_id, err) in &outcome.failures {
        assert!([foreign.id, ghost].contains(user_id));
        assert!(matches!(err, TesseraError::TenantMismatch));
    }
    assert!(f.shares.has_access(&a, resource).await.unwrap());
    assert!(f.shares.has_access(&b, resource).await.unwrap());
}

#[tokio::test]
async fn visibility_filter_and_toggle() {
    let f = setup().await;
    let employee = principal(&f.db, PrincipalRole::User, true, None).await;
    let client = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let work = SurrealWorkItemRepository::new(f.db.clone());

    let tasks = work.list_tasks(f.project.id).await.unwrap();
    assert_eq!(filter_visible(&employee, tasks.clone()).len(), 2);
    let visible = filter_visible(&client, tasks);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, f.task.id);

    let service = VisibilityService::new(work, SurrealAuditSink::new(f.db.clone()));
    let err = service
        .toggle_internal_only(&client, f.task.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::PermissionDenied { .. }));

    let toggled = service
        .toggle_internal_only(&employee, f.task.id)
        .await
        .unwrap();
    assert!(toggled.is_internal_only);

    let set = service
        .set_internal_only(&employee, f.task.id, false)
        .await
        .unwrap();
    assert!(!set.is_internal_only);
}

#[tokio::test]
async fn refused_reads_and_visibility_changes_are_audited() {
    let f = setup().await;
    let outsider = principal(&f.db, PrincipalRole::User, false, Some("globex")).await;
    let client = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let ledger = access_ledger(&f.db);
    let visibility = VisibilityService::new(
        SurrealWorkItemRepository::new(f.db.clone()),
        SurrealAuditSink::new(f.db.clone()),
    );

    let err = ledger.effective_level(&outsider, f.project.id).await.unwrap_err();
    assert!(matches!(err, TesseraError::TenantMismatch));
    let err = ledger
        .list_project_grants(f.project.id, &outsider)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::TenantMismatch));
    let err = f
        .shares
        .list_shares(ResourceRef::Task(f.task.id), &outsider, false)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::TenantMismatch));
    let err = visibility
        .toggle_internal_only(&outsider, f.task.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::PermissionDenied { .. }));

    let audit = SurrealAuditSink::new(f.db.clone());
    let events = audit.list_by_actor(outsider.id).await.unwrap();
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e.outcome == AuditOutcome::Denied));
    let mut actions: Vec<_> = events.iter().map(|e| e.action.as_str()).collect();
    actions.sort_unstable();
    assert_eq!(
        actions,
        [
            "project_access.effective_level",
            "project_access.list_grants",
            "resource_share.list",
            "task.toggle_internal_only",
        ]
    );

    // Successful reads and the set path for a non-employee.
    ledger.effective_level(&client, f.project.id).await.unwrap();
    f.shares
        .list_shares(ResourceRef::Task(f.task.id), &client, false)
        .await
        .unwrap();
    visibility
        .set_internal_only(&client, f.task.id, true)
        .await
        .unwrap_err();
    let events = audit.list_by_actor(client.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, "task.set_internal_only");
}

#[tokio::test]
async fn list_shares_surfaces_storage_failures() {
    let f = setup().await;
    let viewer = principal(&f.db, PrincipalRole::User, false, Some("acme")).await;
    let resource = ResourceRef::Task(f.task.id);
    f.shares
        .share(request(&f, resource, viewer.id), &f.csa)
        .await
        .unwrap();

    // A grant row that cannot be decoded makes the authority lookup fail.
    f.db.query(
        "CREATE type::record('project_access', $key) SET \
         project_id = $project_id, user_id = $user_id, \
         access_level = 'viewer', granted_by = 'not-a-uuid'",
    )
    .bind(("key", format!("{}_{}", f.project.id, viewer.id)))
    .bind(("project_id", f.project.id.to_string()))
    .bind(("user_id", viewer.id.to_string()))
    .await
    .unwrap()
    .check()
    .unwrap();

    let err = f.shares.list_shares(resource, &viewer, false).await.unwrap_err();
    assert!(matches!(err, TesseraError::Database(_)), "{err:?}");
}

#[tokio::test]
async fn exactly_one_owner_wins_activation() {
    let db = db().await;
    let trial = tenant(&db, "initech", TenantStatus::Trial).await;
    let first = principal(&db, PrincipalRole::SuperAdmin, false, Some("initech")).await;
    let second = principal(&db, PrincipalRole::SuperAdmin, false, Some("initech")).await;

    let activation = OwnerActivation::new(
        SurrealTenantRepository::new(db.clone()),
        SurrealAuditSink::new(db.clone()),
    );

    let (a, b) = tokio::join!(
        activation.activate(trial.id, &first),
        activation.activate(trial.id, &second)
    );
    let results = [a, b];
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].status, TenantStatus::Active);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(TesseraError::Duplicate { .. })))
    );

    let stored = SurrealTenantRepository::new(db.clone())
        .get_by_id(trial.id)
        .await
        .unwrap();
    assert!(stored.owner_id == Some(first.id) || stored.owner_id == Some(second.id));
}

#[tokio::test]
async fn activation_requires_the_tenants_own_super_admin() {
    let db = db().await;
    let acme = tenant(&db, "acme", TenantStatus::Trial).await;
    tenant(&db, "globex", TenantStatus::Active).await;
    let member = principal(&db, PrincipalRole::Admin, false, Some("acme")).await;
    let foreign_csa = principal(&db, PrincipalRole::SuperAdmin, false, Some("globex")).await;

    let activation = OwnerActivation::new(
        SurrealTenantRepository::new(db.clone()),
        SurrealAuditSink::new(db.clone()),
    );

    let err = activation.activate(acme.id, &member).await.unwrap_err();
    assert!(matches!(err, TesseraError::PermissionDenied { .. }));

    let err = activation.activate(acme.id, &foreign_csa).await.unwrap_err();
    assert!(matches!(err, TesseraError::TenantMismatch));

    let err = activation
        .activate(Uuid::new_v4(), &foreign_csa)
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::TenantMismatch));
}
