//! FFprobe wrappers: duration and stream reports.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::command::{run_or_fail, CommandRunner, MediaCommand};
use crate::error::{MediaError, MediaResult};

/// Duration of a media file in seconds.
///
/// Fatal when the tool exits non-zero or prints something non-numeric.
pub async fn probe_duration(
    runner: &dyn CommandRunner,
    path: impl AsRef<Path>,
) -> MediaResult<f64> {
    let command = MediaCommand::ffprobe()
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .path_arg(&path);

    let output = run_or_fail(runner, &command, "probe duration").await?;

    output.stdout.trim().parse::<f64>().map_err(|_| {
        MediaError::invalid_output(format!("duration not numeric: {:?}", output.stdout.trim()))
    })
}

/// One stream entry from the probe report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<String>,
    pub bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<StreamInfo>,
}

/// Stream-level report for a media file.
///
/// An empty report means the file is nothing the media tool understands;
/// callers use that to reject non-video sources before scheduling.
pub async fn probe_streams(
    runner: &dyn CommandRunner,
    path: impl AsRef<Path>,
) -> MediaResult<Vec<StreamInfo>> {
    let command = MediaCommand::ffprobe()
        .args(["-v", "quiet", "-print_format", "json", "-show_streams", "-i"])
        .path_arg(&path);

    // Exit code intentionally ignored: an unreadable file yields an empty
    // report, which is the signal callers act on.
    let output = runner.run(&command).await?;

    let body = output.stdout.trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let report: ProbeReport = serde_json::from_str(body)?;
    Ok(report.streams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandOutput;
    use crate::test_support::ScriptedRunner;

    #[tokio::test]
    async fn test_probe_duration_parses_stdout() {
        let runner = ScriptedRunner::new(|_| CommandOutput::ok("10.000000\n"));

        let duration = probe_duration(&runner, "/videos/in.mp4").await.unwrap();
        assert!((duration - 10.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_probe_duration_rejects_garbage() {
        let runner = ScriptedRunner::new(|_| CommandOutput::ok("N/A\n"));

        assert!(matches!(
            probe_duration(&runner, "/videos/in.mp4").await,
            Err(MediaError::InvalidOutput(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_duration_fatal_on_tool_failure() {
        let runner = ScriptedRunner::new(|_| CommandOutput {
            stderr: "no such file".to_string(),
            exit_code: Some(1),
            ..Default::default()
        });

        assert!(matches!(
            probe_duration(&runner, "/videos/in.mp4").await,
            Err(MediaError::ToolFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_probe_streams_parses_report() {
        let runner = ScriptedRunner::new(|_| {
            CommandOutput::ok(
                r#"{"streams": [{"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080}, {"codec_type": "audio", "codec_name": "aac"}]}"#,
            )
        });

        let streams = probe_streams(&runner, "/videos/in.mp4").await.unwrap();
        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].codec_type.as_deref(), Some("video"));
        assert_eq!(streams[0].width, Some(1920));
    }

    #[tokio::test]
    async fn test_probe_streams_empty_for_non_media() {
        let runner = ScriptedRunner::new(|_| CommandOutput {
            stdout: "{}\n".to_string(),
            exit_code: Some(1),
            ..Default::default()
        });

        let streams = probe_streams(&runner, "/etc/passwd").await.unwrap();
        assert!(streams.is_empty());
    }
}
