//! VMAF quality scoring via libvmaf.

use regex::Regex;
use std::path::Path;
use tracing::debug;

use crate::command::{CommandRunner, MediaCommand};
use crate::error::MediaResult;

/// libvmaf invocation parameters.
#[derive(Debug, Clone)]
pub struct VmafConfig {
    /// Path to the VMAF model JSON
    pub model_path: String,
    /// Worker threads handed to the filter
    pub n_threads: u32,
    /// Score every n-th frame; 1 scores all frames
    pub n_subsample: u32,
}

impl Default for VmafConfig {
    fn default() -> Self {
        Self {
            model_path: "vmaf_models/vmaf_v0.6.1.json".to_string(),
            n_threads: 4,
            n_subsample: 1,
        }
    }
}

/// Compare `processed` against `reference` and extract the pooled score.
///
/// The score arrives as a labeled line on the tool's diagnostic stream. A
/// run that produces no such line (including a run that failed outright)
/// yields `None` rather than an error; the caller records that as a failed
/// computation.
pub async fn compute_score(
    runner: &dyn CommandRunner,
    processed: impl AsRef<Path>,
    reference: impl AsRef<Path>,
    config: &VmafConfig,
) -> MediaResult<Option<f64>> {
    let filter = format!(
        "libvmaf=model_path='{}':n_threads={}:n_subsample={}",
        config.model_path, config.n_threads, config.n_subsample
    );
    let command = MediaCommand::ffmpeg()
        .args(["-hide_banner", "-i"])
        .path_arg(&processed)
        .arg("-i")
        .path_arg(&reference)
        .args(["-lavfi", &filter, "-f", "null", "-"]);

    let output = runner.run(&command).await?;
    let score = parse_score(&output.stderr);
    debug!(?score, "vmaf run finished");
    Ok(score)
}

/// Pull `VMAF score: N.NNNNNN` out of the tool's diagnostic output.
pub fn parse_score(diagnostics: &str) -> Option<f64> {
    let pattern = Regex::new(r"VMAF score: (\d+\.?\d*)").unwrap();
    pattern
        .captures(diagnostics)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}
