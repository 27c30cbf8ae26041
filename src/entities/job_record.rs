use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per job identifier seen by the listing crawler.
///
/// Enrichment columns (title, salary, ...) stay empty until a detail
/// extraction run fills them; the crawler only writes the identifier,
/// session, source and status.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "job_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i64,
    #[sea_orm(unique)]
    pub job_id: String,
    pub job_url: Option<String>,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub salary_raw: Option<String>,
    // Salary bounds are kept as the digit strings produced by the normalizer.
    pub min_salary: Option<String>,
    pub max_salary: Option<String>,
    pub fixed_salary: Option<String>,
    pub salary_unit: Option<String>,
    pub job_type: Option<String>,
    pub shift_and_schedule: Option<String>,
    pub apply_link: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub job_description_text: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub job_description_html: Option<String>,
    pub retrieved_date: DateTime<Utc>,
    pub scrape_session_id: String,
    pub source: Option<String>,
    pub status: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Fields written when an identifier is first seen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewJobRecord {
    pub job_id: String,
    pub source: String,
    pub status: String,
    pub retrieved_date: DateTime<Utc>,
    pub scrape_session_id: String,
}

impl NewJobRecord {
    pub fn into_active_model(self) -> ActiveModel {
        use sea_orm::Set;

        ActiveModel {
            job_id: Set(self.job_id),
            source: Set(Some(self.source)),
            status: Set(Some(self.status)),
            retrieved_date: Set(self.retrieved_date),
            scrape_session_id: Set(self.scrape_session_id),
            // id is assigned by the database, enrichment columns stay NULL
            ..Default::default()
        }
    }
}
