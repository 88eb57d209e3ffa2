//! Integration tests for the work item repository using in-memory
//! SurrealDB.

use tessera_core::error::TesseraError;
use tessera_core::models::project::CreateProject;
use tessera_core::models::resource_share::ResourceRef;
use tessera_core::models::work_item::{CreateArtifact, CreateComment, CreateTask};
use tessera_core::repository::{ProjectRepository, WorkItemRepository};
use tessera_db::repository::{SurrealProjectRepository, SurrealWorkItemRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> (Surreal<Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tessera_db::run_migrations(&db).await.unwrap();

    let project = SurrealProjectRepository::new(db.clone())
        .create(CreateProject {
            tenant_id: Some(Uuid::new_v4()),
            name: "Launch".into(),
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();

    (db, project.id)
}

fn task(project_id: Uuid, internal: bool) -> CreateTask {
    CreateTask {
        project_id,
        title: "Draft contract".into(),
        is_internal_only: internal,
        created_by: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn projects_are_listed_by_tenant_and_id() {
    let (db, project_id) = setup().await;
    let repo = SurrealProjectRepository::new(db);

    let internal = repo
        .create(CreateProject {
            tenant_id: None,
            name: "Ops".into(),
            created_by: Uuid::new_v4(),
        })
        .await
        .unwrap();
    assert!(internal.is_internal());

    let internal_only = repo.list_by_tenant(None).await.unwrap();
    assert_eq!(internal_only.len(), 1);
    assert_eq!(internal_only[0].id, internal.id);

    let tenant_id = repo.get_by_id(project_id).await.unwrap().tenant_id;
    assert_eq!(repo.list_by_tenant(tenant_id).await.unwrap().len(), 1);

    let by_ids = repo
        .list_by_ids(&[project_id, internal.id, Uuid::new_v4()])
        .await
        .unwrap();
    assert_eq!(by_ids.len(), 2);
    assert!(repo.list_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn toggle_flips_and_set_is_explicit() {
    let (db, project_id) = setup().await;
    let repo = SurrealWorkItemRepository::new(db);

    let created = repo.create_task(task(project_id, false)).await.unwrap();

    let flipped = repo.toggle_task_internal(created.id).await.unwrap();
    assert!(flipped.is_internal_only);
    let flipped_back = repo.toggle_task_internal(created.id).await.unwrap();
    assert!(!flipped_back.is_internal_only);

    for _ in 0..2 {
        let set = repo.set_task_internal(created.id, true).await.unwrap();
        assert!(set.is_internal_only);
    }
}

#[tokio::test]
async fn toggle_of_missing_task_is_not_found() {
    let (db, _) = setup().await;
    let repo = SurrealWorkItemRepository::new(db);

    let err = repo.toggle_task_internal(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, TesseraError::NotFound { .. }));
}

#[tokio::test]
async fn comments_and_replies_are_listed_per_task() {
    let (db, project_id) = setup().await;
    let repo = SurrealWorkItemRepository::new(db);

    let t = repo.create_task(task(project_id, false)).await.unwrap();
    let parent = repo
        .create_comment(CreateComment {
            task_id: t.id,
            parent_id: None,
            body: "Pricing is internal".into(),
            is_internal_only: true,
            author_id: Uuid::new_v4(),
        })
        .await
        .unwrap();
    let reply = repo
        .create_comment(CreateComment {
            task_id: t.id,
            parent_id: Some(parent.id),
            body: "Agreed".into(),
            is_internal_only: false,
            author_id: Uuid::new_v4(),
        })
        .await
        .unwrap();
    assert_eq!(reply.parent_id, Some(parent.id));

    let comments = repo.list_comments(t.id).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(repo.list_tasks(project_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn resolve_finds_project_and_visibility() {
    let (db, project_id) = setup().await;
    let repo = SurrealWorkItemRepository::new(db);

    let t = repo.create_task(task(project_id, true)).await.unwrap();
    let c = repo
        .create_comment(CreateComment {
            task_id: t.id,
            parent_id: None,
            body: "ok".into(),
            is_internal_only: false,
            author_id: Uuid::new_v4(),
        })
        .await
        .unwrap();
    let artifact = CreateArtifact {
        project_id,
        name: "brief.pdf".into(),
        created_by: Uuid::new_v4(),
    };
    let file = repo.create_file(artifact.clone()).await.unwrap();
    let milestone = repo.create_milestone(artifact).await.unwrap();

    let resolved = repo.resolve(ResourceRef::Task(t.id)).await.unwrap();
    assert_eq!(resolved.project_id, project_id);
    assert!(resolved.is_internal_only);

    let resolved = repo.resolve(ResourceRef::Comment(c.id)).await.unwrap();
    assert_eq!(resolved.project_id, project_id);
    assert!(!resolved.is_internal_only);

    for r in [file.resource, milestone.resource] {
        let resolved = repo.resolve(r).await.unwrap();
        assert_eq!(resolved.project_id, project_id);
        assert!(!resolved.is_internal_only);
    }
}

#[tokio::test]
async fn resolve_does_not_confuse_resource_kinds() {
    let (db, project_id) = setup().await;
    let repo = SurrealWorkItemRepository::new(db);

    let t = repo.create_task(task(project_id, false)).await.unwrap();

    let err = repo.resolve(ResourceRef::Comment(t.id)).await.unwrap_err();
    assert!(matches!(err, TesseraError::NotFound { .. }));
    let err = repo.resolve(ResourceRef::File(t.id)).await.unwrap_err();
    assert!(matches!(err, TesseraError::NotFound { .. }));
}
