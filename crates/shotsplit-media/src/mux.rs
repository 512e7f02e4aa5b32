//! Stream-copy reassembly: demux, concat and remux operations.
//!
//! Nothing here re-encodes. Failures propagate as labeled tool errors and
//! leave any partially written outputs in place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::command::{run_or_fail, CommandRunner, MediaCommand};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::ensure_dir;

/// Outputs of a remux pass, keyed by audio-track label, one entry per video
/// rendition in rendition order.
pub type RemuxOutputs = BTreeMap<String, Vec<PathBuf>>;

/// Extract the audio track of `source`, stream-copied.
pub async fn copy_audio(
    runner: &dyn CommandRunner,
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let command = MediaCommand::ffmpeg()
        .args(["-y", "-hide_banner", "-i"])
        .path_arg(&source)
        .args(["-map", "0:a", "-c", "copy"])
        .path_arg(&output);

    run_or_fail(runner, &command, "copy audio").await.map(drop)
}

/// Extract the video track of `source`, stream-copied.
pub async fn copy_video(
    runner: &dyn CommandRunner,
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let command = MediaCommand::ffmpeg()
        .args(["-y", "-hide_banner", "-i"])
        .path_arg(&source)
        .args(["-c:v", "copy", "-an"])
        .path_arg(&output);

    run_or_fail(runner, &command, "copy video").await.map(drop)
}

/// Mux one video and one audio stream into a container, stream-copied.
pub async fn mux_audio_video(
    runner: &dyn CommandRunner,
    video: impl AsRef<Path>,
    audio: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let command = MediaCommand::ffmpeg()
        .args(["-y", "-hide_banner", "-i"])
        .path_arg(&video)
        .arg("-i")
        .path_arg(&audio)
        .args(["-c", "copy"])
        .path_arg(&output);

    run_or_fail(runner, &command, "mux video and audio")
        .await
        .map(drop)
}

/// Write a concat-demuxer manifest listing `parts` in order.
pub async fn write_concat_manifest(parts: &[PathBuf], manifest: &Path) -> MediaResult<()> {
    let mut body = String::new();
    for part in parts {
        body.push_str(&format!("file {}\n", part.display()));
    }
    fs::write(manifest, body).await?;
    Ok(())
}

/// Stitch the parts of each rendition group into one contiguous file.
///
/// Group order is rendition order; part order within a group is shot order.
/// Manifests go to `{base}/concat/`, stitched files to `{base}/remuxed/`.
/// The rendition keeps the first part's filename, with any trailing `-N`
/// shot index stripped from the stem.
pub async fn concat_renditions(
    runner: &dyn CommandRunner,
    groups: &[Vec<PathBuf>],
    base_dir: impl AsRef<Path>,
) -> MediaResult<Vec<PathBuf>> {
    let base_dir = base_dir.as_ref();
    let concat_dir = base_dir.join("concat");
    let remuxed_dir = base_dir.join("remuxed");
    ensure_dir(&concat_dir).await?;
    ensure_dir(&remuxed_dir).await?;

    let mut renditions = Vec::with_capacity(groups.len());
    for parts in groups {
        let first = parts
            .first()
            .ok_or_else(|| MediaError::invalid_output("empty rendition group"))?;
        let stem = first
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| MediaError::InvalidPath(first.clone()))?;
        let name = strip_shot_index(stem);
        let file_name = match first.extension().and_then(|s| s.to_str()) {
            Some(ext) => format!("{name}.{ext}"),
            None => name.to_string(),
        };

        let manifest = concat_dir.join(format!("concat_{name}.txt"));
        write_concat_manifest(parts, &manifest).await?;

        let output = remuxed_dir.join(format!("remuxed_{file_name}"));
        let command = MediaCommand::ffmpeg()
            .args(["-y", "-hide_banner", "-f", "concat", "-safe", "0", "-i"])
            .path_arg(&manifest)
            .args(["-c", "copy"])
            .path_arg(&output);

        run_or_fail(runner, &command, "stitch video").await?;
        debug!(rendition = %output.display(), parts = parts.len(), "rendition stitched");
        renditions.push(output);
    }

    Ok(renditions)
}

/// Pair every audio track with every rendition, stream-copied.
///
/// Produces exactly `tracks x renditions` files named
/// `{label}_{rendition_filename}` under `output_dir`, grouped by audio-track
/// label.
pub async fn remux_tracks(
    runner: &dyn CommandRunner,
    renditions: &[PathBuf],
    audio_tracks: &[PathBuf],
    output_dir: impl AsRef<Path>,
) -> MediaResult<RemuxOutputs> {
    let output_dir = output_dir.as_ref();
    let mut outputs = RemuxOutputs::new();

    for audio in audio_tracks {
        let label = audio_label(audio)?;
        let mut same_audio = Vec::with_capacity(renditions.len());

        for rendition in renditions {
            let rendition_name = rendition
                .file_name()
                .and_then(|s| s.to_str())
                .ok_or_else(|| MediaError::InvalidPath(rendition.clone()))?;
            let output = output_dir.join(format!("{label}_{rendition_name}"));

            mux_audio_video(runner, rendition, audio, &output).await?;
            same_audio.push(output);
        }

        outputs.insert(label, same_audio);
    }

    Ok(outputs)
}

/// Drop a trailing `-N` shot index from a file stem, if present.
fn strip_shot_index(stem: &str) -> &str {
    match stem.rsplit_once('-') {
        Some((head, tail))
            if !head.is_empty() && !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) =>
        {
            head
        }
        _ => stem,
    }
}

/// Track label out of an encoder output filename.
///
/// Encoder audio outputs are named `{base}_{label}.{ext}`, for example
/// `audio_STEREO.wav`; a stem without an underscore is its own label.
fn audio_label(path: &Path) -> MediaResult<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MediaError::InvalidPath(path.to_path_buf()))?;

    Ok(stem
        .split('_')
        .nth(1)
        .unwrap_or(stem)
        .to_string())
}
