use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JobRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JobRecords::JobId).string_len(255).not_null().unique_key())
                    .col(ColumnDef::new(JobRecords::JobUrl).string_len(1000).null())
                    .col(ColumnDef::new(JobRecords::JobTitle).string_len(500).null())
                    .col(ColumnDef::new(JobRecords::CompanyName).string_len(500).null())
                    .col(ColumnDef::new(JobRecords::Location).string_len(500).null())
                    .col(ColumnDef::new(JobRecords::SalaryRaw).string_len(500).null())
                    .col(ColumnDef::new(JobRecords::MinSalary).string_len(32).null())
                    .col(ColumnDef::new(JobRecords::MaxSalary).string_len(32).null())
                    .col(ColumnDef::new(JobRecords::FixedSalary).string_len(32).null())
                    .col(ColumnDef::new(JobRecords::SalaryUnit).string_len(100).null())
                    .col(ColumnDef::new(JobRecords::JobType).string_len(500).null())
                    .col(ColumnDef::new(JobRecords::ShiftAndSchedule).string_len(1000).null())
                    .col(ColumnDef::new(JobRecords::ApplyLink).string_len(3000).null())
                    .col(ColumnDef::new(JobRecords::JobDescriptionText).text().null())
                    .col(ColumnDef::new(JobRecords::JobDescriptionHtml).text().null())
                    .col(
                        ColumnDef::new(JobRecords::RetrievedDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(JobRecords::ScrapeSessionId).string_len(500).not_null())
                    .col(ColumnDef::new(JobRecords::Source).string_len(100).null())
                    .col(ColumnDef::new(JobRecords::Status).string_len(100).null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("scrape_session_index")
                    .table(JobRecords::Table)
                    .col(JobRecords::ScrapeSessionId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum JobRecords {
    Table,
    Id,
    JobId,
    JobUrl,
    JobTitle,
    CompanyName,
    Location,
    SalaryRaw,
    MinSalary,
    MaxSalary,
    FixedSalary,
    SalaryUnit,
    JobType,
    ShiftAndSchedule,
    ApplyLink,
    JobDescriptionText,
    JobDescriptionHtml,
    RetrievedDate,
    ScrapeSessionId,
    Source,
    Status,
}
