use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

use crate::asset::MediaAsset;
use crate::config::MediaConfig;
use crate::error::{AudioMovieError, Result};
use super::probe::parse_probe_output;
use super::{MediaCommand, MediaCommandBuilder, MediaToolkit};

/// Concrete toolkit backed by the ffmpeg and ffprobe binaries
pub struct FfmpegToolkit {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl FfmpegToolkit {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.ffmpeg_path, &config.ffprobe_path);

        Self {
            config,
            command_builder,
        }
    }

    fn check_binary(binary: &str) -> Result<()> {
        let output = Command::new(binary)
            .arg("-version")
            .output()
            .map_err(|e| AudioMovieError::Media(format!("{} not found: {}", binary, e)))?;

        if output.status.success() {
            debug!("{} is available", binary);
            Ok(())
        } else {
            Err(AudioMovieError::Media(format!("{} version check failed", binary)))
        }
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn load_asset(&self, path: &Path) -> Result<MediaAsset> {
        if !path.is_file() {
            return Err(AudioMovieError::FileNotFound(path.display().to_string()));
        }

        let output = self.command_builder.probe(path).capture().await?;
        let asset = parse_probe_output(path, &output)?;

        debug!(
            "Loaded {} ({:.3}s, {} tracks)",
            path.display(),
            asset.duration.as_secs_f64(),
            asset.tracks.len()
        );
        Ok(asset)
    }

    async fn execute(&self, mut command: MediaCommand) -> Result<()> {
        info!("Executing media command: {}", command.description);

        // User-specified options go right before the output path
        if !self.config.extra_options.is_empty() {
            if let Some(output) = command.args.pop() {
                command.args.extend(self.config.extra_options.iter().cloned());
                command.args.push(output);
            }
        }

        command.execute().await
    }

    fn command_builder(&self) -> MediaCommandBuilder {
        self.command_builder.clone()
    }

    fn check_availability(&self) -> Result<()> {
        Self::check_binary(&self.config.ffmpeg_path)?;
        Self::check_binary(&self.config.ffprobe_path)?;
        info!("Media toolkit is available");
        Ok(())
    }

    async fn version_info(&self) -> Result<String> {
        debug!("Getting media toolkit version information");

        let output = self.command_builder.version_check().capture().await?;
        let version_info = String::from_utf8_lossy(&output);
        // First line carries the version
        let first_line = version_info.lines().next().unwrap_or("Unknown version");
        Ok(first_line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MediaConfig {
        MediaConfig {
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            extra_options: vec!["-threads".to_string(), "2".to_string()],
        }
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let toolkit = FfmpegToolkit::new(config());
        let err = toolkit.load_asset(Path::new("/no/such/song.mp3")).await.unwrap_err();
        assert!(matches!(err, AudioMovieError::FileNotFound(_)));
    }

    #[test]
    fn test_unavailable_binaries() {
        let toolkit = FfmpegToolkit::new(config());
        assert!(matches!(toolkit.check_availability(), Err(AudioMovieError::Media(_))));
    }

    #[test]
    fn test_builder_uses_configured_binaries() {
        let toolkit = FfmpegToolkit::new(config());
        let builder = toolkit.command_builder();
        assert_eq!(builder.version_check().binary_path, "/nonexistent/ffmpeg");
        assert_eq!(builder.probe("a.wav").binary_path, "/nonexistent/ffprobe");
    }
}
