//! Core domain logic for issue-tracker work stats.
//!
//! This crate contains the fundamental types and logic for:
//! - Aggregation: merging opens, closes, reopens and comments into one record per issue
//! - Categories: deriving a component label from an issue title
//! - Scoping: half-open time windows over touch timestamps
//! - Sources: the iteration interface a corpus must provide

mod aggregate;
mod category;
pub mod event_type;
pub mod record;
mod scope;
pub mod source;
pub mod types;

pub use aggregate::{ActivityQuery, aggregate_issues};
pub use category::extract_category;
pub use event_type::IssueEventType;
pub use record::IssueRecord;
pub use scope::{TimeScope, in_scope};
pub use source::{IssueSource, MemorySource};
pub use types::{Issue, IssueComment, IssueEvent, IssueKey, Repository, ValidationError};
