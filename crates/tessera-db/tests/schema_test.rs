//! Integration tests for schema initialization using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn schema_migration_applies_successfully() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    tessera_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info = info.expect("INFO FOR DB should return a value");
    let info_str = format!("{:?}", info);

    for table in [
        "tenant",
        "principal",
        "project",
        "project_access",
        "task",
        "task_comment",
        "project_file",
        "milestone",
        "resource_share",
        "audit_log",
        "_migration",
    ] {
        assert!(info_str.contains(table), "missing {table} table");
    }
}

#[tokio::test]
async fn migration_is_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    tessera_db::run_migrations(&db).await.unwrap();
    tessera_db::run_migrations(&db).await.unwrap();

    let mut result = db.query("SELECT * FROM _migration").await.unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}

#[tokio::test]
async fn unique_index_prevents_duplicate_subdomains() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    tessera_db::run_migrations(&db).await.unwrap();

    db.query("CREATE tenant SET subdomain = 'acme', name = 'Acme', status = 'active'")
        .await
        .unwrap()
        .check()
        .unwrap();

    let result = db
        .query("CREATE tenant SET subdomain = 'acme', name = 'Other', status = 'trial'")
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "duplicate subdomain should be rejected");
}

#[tokio::test]
async fn status_assertions_reject_unknown_values() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    tessera_db::run_migrations(&db).await.unwrap();

    let result = db
        .query("CREATE tenant SET subdomain = 'acme', name = 'Acme', status = 'deleted'")
        .await
        .unwrap()
        .check();

    assert!(result.is_err(), "unknown tenant status should be rejected");
}
