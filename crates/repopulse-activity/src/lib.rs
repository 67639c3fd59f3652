//! Contributor activity aggregation and freelance-pattern detection.
//!
//! Folds a repository's commit stream into per-author churn summaries and
//! temporal summaries, then flags authors whose engagement was short, small,
//! and is now dormant. Everything here is pure computation over a
//! [`source::CommitSource`]; the only I/O is the per-commit detail fetch,
//! which runs with bounded concurrency.

pub mod aggregate;
pub mod freelance;
pub mod local;
pub mod source;
pub mod timeline;

pub use aggregate::{aggregate_activity, ActivityAggregator, AuthorActivitySummary};
pub use freelance::{classify, detect_freelancers, DetectionResult, FreelanceCriteria, FreelancerFlag};
pub use local::LocalRepository;
pub use source::{CommitSource, MemorySource};
pub use timeline::{build_timelines, AuthorTemporalSummary};
