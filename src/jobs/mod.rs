pub mod job_details;
pub mod job_ids;
pub mod salary;

pub use job_details::{run_job_details, DetailOptions, ExtractError};
pub use job_ids::{run_job_ids, CrawlError, CrawlOptions, CrawlOverrides, CrawlSummary};
pub use salary::{normalize_salary, NormalizedSalary, SalaryUnit, NOT_AVAILABLE};
