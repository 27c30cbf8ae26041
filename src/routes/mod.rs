pub mod job_data;
pub mod job_ids;

pub use job_data::*;
pub use job_ids::*;
