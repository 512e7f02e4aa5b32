//! Durable job and quality-record store.
//!
//! One SQLite database with two tables, `jobs` and `vmaf_scores`, behind a
//! connection pool. Every operation acquires a connection for its own scope;
//! the pool is sized so each in-flight job's single writer task gets one.
//! The status transition table is enforced at this boundary.

pub mod error;
pub mod job_store;
pub mod vmaf;

pub use error::{StoreError, StoreResult};
pub use job_store::{JobFilter, JobStore};
