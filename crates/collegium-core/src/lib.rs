pub mod college;
pub mod credentials;
pub mod error;
pub mod export;
pub mod files;
pub mod repository;
pub mod stats;

pub use college::{parse_department_list, College, CollegeFields, StudentCategory};
pub use credentials::{CredentialStore, DEFAULT_PASSWORD, DEFAULT_USERNAME};
pub use error::{Error, Result};
pub use export::{college_summary_csv, department_stats_csv};
pub use files::{validate_filename, FileStore, StoredFile};
pub use repository::CollegeRepository;
pub use stats::{college_summaries, department_stats, CollegeSummary, DepartmentStats, Totals};
