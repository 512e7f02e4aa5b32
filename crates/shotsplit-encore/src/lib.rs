//! Client for the Encore batch transcoding service.
//!
//! Encore exposes an asynchronous job model (create, then poll until a
//! terminal status); this crate maps it onto the synchronous call semantics
//! the pipeline wants:
//! - [`client::EncoreClient::submit`]: create with fixed-delay retry
//! - [`client::EncoreClient::await_all`]: blocking poll loop over a batch
//! - [`batch`]: per-run submission helpers and output extraction

pub mod batch;
pub mod client;
pub mod error;
pub mod types;

pub use batch::{outputs_of, rendition_groups, submit_audio, submit_shots, BatchProfiles};
pub use client::{EncoreClient, EncoreConfig, RetryPolicy};
pub use error::{EncoreError, EncoreResult};
pub use types::{EncoreInput, EncoreJob, EncoreJobRequest, EncoreJobStatus, EncoreOutput};
