use chrono::Utc;
use jobintel::entities::job_record::{self, NewJobRecord};
use jobintel::store::{JobStore, MemoryJobStore, SeaOrmJobStore, StoreError};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ColumnTrait, Database, EntityTrait, QueryFilter};

fn record(job_id: &str, session: &str) -> NewJobRecord {
    NewJobRecord {
        job_id: job_id.to_string(),
        source: "Indeed".to_string(),
        status: "Active".to_string(),
        retrieved_date: Utc::now(),
        scrape_session_id: session.to_string(),
    }
}

async fn sqlite_store() -> SeaOrmJobStore {
    let conn = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&conn, None).await.unwrap();
    SeaOrmJobStore::new(conn)
}

#[tokio::test]
async fn test_sqlite_store_insert_and_exists() {
    let store = sqlite_store().await;

    assert!(!store.exists("abc123").await.unwrap());
    store.insert(record("abc123", "session-1")).await.unwrap();
    assert!(store.exists("abc123").await.unwrap());
    assert!(!store.exists("other").await.unwrap());

    let row = job_record::Entity::find()
        .filter(job_record::Column::JobId.eq("abc123"))
        .one(store.connection())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.scrape_session_id, "session-1");
    assert_eq!(row.source.as_deref(), Some("Indeed"));
    assert_eq!(row.status.as_deref(), Some("Active"));
    assert_eq!(row.job_title, None);
    assert_eq!(row.min_salary, None);
}

#[tokio::test]
async fn test_sqlite_store_rejects_duplicate_job_id() {
    let store = sqlite_store().await;
    store.insert(record("dup", "session-1")).await.unwrap();

    let err = store.insert(record("dup", "session-2")).await.unwrap_err();

    assert!(matches!(err, StoreError::Duplicate(ref id) if id == "dup"));
    let rows = job_record::Entity::find().all(store.connection()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].scrape_session_id, "session-1");
}

#[tokio::test]
async fn test_migrations_can_be_rerun() {
    let conn = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&conn, None).await.unwrap();
    Migrator::up(&conn, None).await.unwrap();
}

#[tokio::test]
async fn test_memory_store_behaves_like_a_set() {
    let store = MemoryJobStore::new();
    assert!(store.is_empty());

    store.insert(record("a", "s")).await.unwrap();
    assert!(store.exists("a").await.unwrap());
    assert!(matches!(
        store.insert(record("a", "t")).await,
        Err(StoreError::Duplicate(_))
    ));
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("a").unwrap().scrape_session_id, "s");
}
