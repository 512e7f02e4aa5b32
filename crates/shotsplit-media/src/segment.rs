//! Shot-boundary detection, merging and trimming.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::command::{run_or_fail, CommandRunner, MediaCommand};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::ensure_dir;
use crate::probe::probe_duration;

/// A contiguous sub-range of the source timeline, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotSegment {
    pub start: f64,
    pub end: f64,
}

impl ShotSegment {
    /// Length of the segment in seconds.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// Interior scene-change timestamps, ascending.
///
/// Never includes 0 or the source duration; `segment` adds those endpoints.
/// Fatal when the tool exits non-zero.
pub async fn detect_boundaries(
    runner: &dyn CommandRunner,
    path: impl AsRef<Path>,
    threshold: f64,
) -> MediaResult<Vec<f64>> {
    // The quoting inside the filter spec is consumed by the filtergraph
    // parser, not by a shell.
    let filter = format!(
        "movie={},select='gt(scene,{})'",
        path.as_ref().display(),
        threshold
    );
    let command = MediaCommand::ffprobe()
        .args([
            "-hide_banner",
            "-v",
            "panic",
            "-show_entries",
            "packet=pts_time",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
            "-f",
            "lavfi",
        ])
        .arg(filter);

    let output = run_or_fail(runner, &command, "scene detection").await?;

    let mut boundaries = Vec::new();
    for token in output.stdout.split_whitespace() {
        let ts = token.parse::<f64>().map_err(|_| {
            MediaError::invalid_output(format!("scene timestamp not numeric: {token:?}"))
        })?;
        boundaries.push(ts);
    }

    debug!(boundaries = boundaries.len(), "scene detection done");
    Ok(boundaries)
}

/// Merge boundaries closer together than `min_length`, in a single forward
/// pass.
///
/// A short gap drops the *next* boundary, except when the current index is
/// the second-to-last, where the *current* one is dropped so the final
/// timestamp (the source duration) survives; the first boundary is never
/// touched. The pass does not revisit earlier gaps that a merge may have
/// widened; downstream consumers depend on these exact results.
pub fn merge_boundaries(mut boundaries: Vec<f64>, min_length: f64) -> Vec<f64> {
    if min_length == 0.0 {
        return boundaries;
    }

    let mut i = 0;
    while i + 1 < boundaries.len() {
        let gap = boundaries[i + 1] - boundaries[i];
        if gap < min_length {
            if i + 2 == boundaries.len() {
                // can't delete the last timestamp
                boundaries.remove(i);
            } else {
                boundaries.remove(i + 1);
            }
        } else {
            i += 1;
        }
    }

    boundaries
}

/// Detect boundaries, bracket them with `[0, duration]` and merge short
/// gaps, pairing the result into segments.
///
/// A source with no interior boundary yields exactly one segment spanning
/// the whole file.
pub async fn segment(
    runner: &dyn CommandRunner,
    path: impl AsRef<Path>,
    threshold: f64,
    min_length: f64,
) -> MediaResult<Vec<ShotSegment>> {
    let interior = detect_boundaries(runner, &path, threshold).await?;
    let duration = probe_duration(runner, &path).await?;

    let mut boundaries = Vec::with_capacity(interior.len() + 2);
    boundaries.push(0.0);
    boundaries.extend(interior);
    boundaries.push(duration);

    let merged = merge_boundaries(boundaries, min_length);
    Ok(segments_from_boundaries(&merged))
}

fn segments_from_boundaries(boundaries: &[f64]) -> Vec<ShotSegment> {
    boundaries
        .windows(2)
        .map(|pair| ShotSegment {
            start: pair[0],
            end: pair[1],
        })
        .collect()
}

/// Cut one stream-copied file per segment, then decode-check the source.
///
/// Outputs are `{stem}-{index}.{ext}` under `output_dir`, in shot order. The
/// decode pass writes the tool's error output to `error.log` next to the
/// cuts; its failure aborts the stage even though nothing reads the log
/// afterwards; a source that does not decode cleanly must not reach the
/// transcoder.
pub async fn trim(
    runner: &dyn CommandRunner,
    path: impl AsRef<Path>,
    segments: &[ShotSegment],
    output_dir: impl AsRef<Path>,
) -> MediaResult<Vec<PathBuf>> {
    let path = path.as_ref();
    let output_dir = output_dir.as_ref();

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MediaError::InvalidPath(path.to_path_buf()))?;
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MediaError::InvalidPath(path.to_path_buf()))?;

    let mut outputs = Vec::with_capacity(segments.len());
    for (index, seg) in segments.iter().enumerate() {
        let output_path = output_dir.join(format!("{stem}-{index}.{extension}"));
        let command = MediaCommand::ffmpeg()
            .args(["-y", "-hide_banner", "-stats", "-v", "panic", "-i"])
            .path_arg(path)
            .arg("-ss")
            .arg(seg.start.to_string())
            .arg("-to")
            .arg(seg.end.to_string())
            .args(["-c", "copy"])
            .path_arg(&output_path);

        run_or_fail(runner, &command, "trim video").await?;
        outputs.push(output_path);
    }

    decode_check(runner, path, &output_dir.join("error.log")).await?;

    Ok(outputs)
}

/// Full-file decode pass; the tool's error stream lands in `log_path`.
async fn decode_check(
    runner: &dyn CommandRunner,
    path: &Path,
    log_path: &Path,
) -> MediaResult<()> {
    let command = MediaCommand::ffmpeg()
        .args(["-y", "-v", "error", "-i"])
        .path_arg(path)
        .args(["-f", "null", "-"]);

    let output = runner.run(&command).await?;
    tokio::fs::write(log_path, &output.stderr).await?;

    if !output.success() {
        return Err(MediaError::tool_failed(
            "decode check",
            output.exit_code,
            output.stderr,
        ));
    }
    Ok(())
}

/// Detect, merge and cut in one go, under `{output_dir}/shots/`.
pub async fn split_into_shots(
    runner: &dyn CommandRunner,
    path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    threshold: f64,
    min_length: f64,
) -> MediaResult<Vec<PathBuf>> {
    let segments = segment(runner, &path, threshold, min_length).await?;
    info!(shots = segments.len(), "source segmented");

    let shots_dir = output_dir.as_ref().join("shots");
    ensure_dir(&shots_dir).await?;

    trim(runner, &path, &segments, &shots_dir).await
}
