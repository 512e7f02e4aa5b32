//! FFmpeg CLI gateway and media operations for the shotsplit pipeline.
//!
//! Everything that touches the external media tool goes through the
//! [`command::CommandRunner`] gateway; the other modules express probing,
//! shot segmentation, stream-copy reassembly and VMAF scoring as command
//! specs executed through it.

pub mod command;
pub mod error;
pub mod fs_utils;
pub mod mux;
pub mod probe;
pub mod segment;
pub mod vmaf;

#[cfg(test)]
pub(crate) mod test_support;

pub use command::{run_or_fail, CommandOutput, CommandRunner, MediaCommand, ProcessRunner};
pub use error::{MediaError, MediaResult};
pub use segment::ShotSegment;
