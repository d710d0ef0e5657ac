pub mod config;
pub mod issues;
pub mod lock;
pub mod rules;
pub mod skills;
pub mod types;

pub use config::Config;
pub use issues::{IssueCollector, ReconciliationIssue, ReconciliationKind, ValidationIssue};
pub use lock::{LockEntry, LockManifest};
pub use rules::ValidationProfile;
pub use types::*;
