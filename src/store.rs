use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::entities::job_record::{self, NewJobRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("job id {0} already stored")]
    Duplicate(String),
}

/// Persistent set of job records keyed by job id.
///
/// Existence checks and inserts are separate calls; nothing spans a batch.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn exists(&self, job_id: &str) -> Result<bool, StoreError>;

    async fn insert(&self, record: NewJobRecord) -> Result<(), StoreError>;
}

pub struct SeaOrmJobStore {
    conn: DatabaseConnection,
}

impl SeaOrmJobStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        SeaOrmJobStore { conn }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }
}

#[async_trait]
impl JobStore for SeaOrmJobStore {
    async fn exists(&self, job_id: &str) -> Result<bool, StoreError> {
        let count = job_record::Entity::find()
            .filter(job_record::Column::JobId.eq(job_id))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    async fn insert(&self, record: NewJobRecord) -> Result<(), StoreError> {
        let job_id = record.job_id.clone();
        match record.into_active_model().insert(&self.conn).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let msg = e.to_string().to_lowercase();
                if msg.contains("unique constraint") || msg.contains("duplicate key") {
                    Err(StoreError::Duplicate(job_id))
                } else {
                    Err(StoreError::Db(e))
                }
            }
        }
    }
}

/// Store kept in process memory, used when no `DATABASE_URL` is configured.
#[derive(Default)]
pub struct MemoryJobStore {
    records: Mutex<HashMap<String, NewJobRecord>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recovers the map from a poisoned lock.
    fn records(&self) -> MutexGuard<'_, HashMap<String, NewJobRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, job_id: &str) -> Option<NewJobRecord> {
        self.records().get(job_id).cloned()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn exists(&self, job_id: &str) -> Result<bool, StoreError> {
        Ok(self.records().contains_key(job_id))
    }

    async fn insert(&self, record: NewJobRecord) -> Result<(), StoreError> {
        let mut records = self.records();
        if records.contains_key(&record.job_id) {
            return Err(StoreError::Duplicate(record.job_id));
        }
        records.insert(record.job_id.clone(), record);
        Ok(())
    }
}
