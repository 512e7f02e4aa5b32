//! Pipeline orchestration for shotsplit.
//!
//! This crate provides:
//! - The [`scheduler::Scheduler`] facade the API shell calls into
//! - The per-job background pipeline (segment, transcode, reassemble)
//! - The independent VMAF quality task
//! - Worker configuration and tracing setup

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod quality;
pub mod scheduler;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use scheduler::Scheduler;
