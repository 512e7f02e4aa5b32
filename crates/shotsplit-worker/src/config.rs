//! Worker configuration.

use shotsplit_encore::{BatchProfiles, EncoreConfig};
use shotsplit_media::vmaf::VmafConfig;

/// Configuration for the scheduler and its background tasks.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Encore connection and retry settings
    pub encore: EncoreConfig,
    /// Profiles and artifact naming for submissions
    pub profiles: BatchProfiles,
    /// libvmaf parameters
    pub vmaf: VmafConfig,
    /// Keep-directory output the quality score is computed against
    pub quality_target: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            encore: EncoreConfig::default(),
            profiles: BatchProfiles::default(),
            vmaf: VmafConfig::default(),
            quality_target: "STEREO_remuxed_encore_x264_crf_23.mp4".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            encore: EncoreConfig::from_env(),
            profiles: BatchProfiles {
                video_profile: std::env::var("ENCORE_VIDEO_PROFILE")
                    .unwrap_or(defaults.profiles.video_profile),
                audio_profile: std::env::var("ENCORE_AUDIO_PROFILE")
                    .unwrap_or(defaults.profiles.audio_profile),
                video_base_name: std::env::var("ENCORE_VIDEO_BASE_NAME")
                    .unwrap_or(defaults.profiles.video_base_name),
                audio_base_name: std::env::var("ENCORE_AUDIO_BASE_NAME")
                    .unwrap_or(defaults.profiles.audio_base_name),
            },
            vmaf: VmafConfig {
                model_path: std::env::var("VMAF_MODEL_PATH").unwrap_or(defaults.vmaf.model_path),
                n_threads: std::env::var("VMAF_THREADS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.vmaf.n_threads),
                n_subsample: std::env::var("VMAF_SUBSAMPLE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.vmaf.n_subsample),
            },
            quality_target: std::env::var("QUALITY_TARGET").unwrap_or(defaults.quality_target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.profiles.video_profile, "shot-change-video-only");
        assert_eq!(config.profiles.audio_profile, "audio-only");
        assert_eq!(config.quality_target, "STEREO_remuxed_encore_x264_crf_23.mp4");
        assert_eq!(config.vmaf.n_subsample, 1);
    }
}
