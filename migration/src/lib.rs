pub use sea_orm_migration::prelude::*;

mod m20241012_093000_create_job_records_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20241012_093000_create_job_records_table::Migration)]
    }
}
