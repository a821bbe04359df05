use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::configuration::ExportQuality;
use crate::error::{AudioMovieError, Result};
use crate::geometry::Size;
use crate::time::format_seconds;

/// Abstract media processing command representation
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add an input restricted to `[start, start + duration)`
    pub fn trimmed_input<P: AsRef<Path>>(self, path: P, start: Duration, duration: Duration) -> Self {
        self.arg("-ss")
            .arg(format_seconds(start))
            .arg("-t")
            .arg(format_seconds(duration))
            .input(path)
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Fail instead of overwriting an existing output
    pub fn no_overwrite(self) -> Self {
        self.arg("-n")
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Disable audio
    pub fn no_audio(self) -> Self {
        self.arg("-an")
    }

    /// Add a complex filter graph
    pub fn filter_complex<S: Into<String>>(self, graph: S) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    /// Map a stream or filter label into the output
    pub fn map<S: Into<String>>(self, stream: S) -> Self {
        self.arg("-map").arg(stream)
    }

    /// Limit output duration
    pub fn duration(self, duration: Duration) -> Self {
        self.arg("-t").arg(format_seconds(duration))
    }

    /// Set output container
    pub fn format<S: Into<String>>(self, format: S) -> Self {
        self.arg("-f").arg(format)
    }

    /// Encoder settings for an export quality
    pub fn quality_preset(self, quality: ExportQuality) -> Self {
        let (crf, preset, audio_bitrate) = match quality {
            ExportQuality::Highest => ("18", "slow", "256k"),
            ExportQuality::Medium => ("23", "medium", "160k"),
            ExportQuality::Low => ("28", "veryfast", "96k"),
        };
        self.video_codec("libx264")
            .arg("-crf").arg(crf)
            .arg("-preset").arg(preset)
            .arg("-pix_fmt").arg("yuv420p")
            .audio_codec("aac")
            .arg("-b:a").arg(audio_bitrate)
    }

    /// Move the index to the front so playback can start before download ends
    pub fn web_optimized(self) -> Self {
        self.arg("-movflags").arg("+faststart")
    }

    /// Last argument, which is the output path for ffmpeg commands
    pub fn output_path(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        self.run().await.map(|_| ())
    }

    /// Execute the command and return its standard output
    pub async fn capture(&self) -> Result<Vec<u8>> {
        self.run().await
    }

    async fn run(&self) -> Result<Vec<u8>> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| AudioMovieError::Media(format!("Failed to execute {}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AudioMovieError::Media(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

/// Builder for common media processing operations
#[derive(Debug, Clone)]
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl MediaCommandBuilder {
    pub fn new<S1: Into<String>, S2: Into<String>>(ffmpeg_path: S1, ffprobe_path: S2) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Build stream inspection command with JSON output
    pub fn probe<P: AsRef<Path>>(&self, path: P) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Media probe")
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Build a silent solid-color movie of the given size and length
    pub fn blank_movie<P: AsRef<Path>>(
        &self,
        output_path: P,
        size: Size,
        fps: u32,
        duration: Duration,
    ) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, format!("Blank {} movie", size))
            .overwrite()
            .format("lavfi")
            .input(format!("color=c=black:s={}:r={}", size, fps))
            .duration(duration)
            .no_audio()
            .video_codec("libx264")
            .arg("-tune").arg("stillimage")
            .arg("-pix_fmt").arg("yuv420p")
            .output(output_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Version check").arg("-version")
    }

    /// Build custom ffmpeg command
    pub fn custom<S: Into<String>>(&self, description: S) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, description.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed_input_precedes_path() {
        let cmd = MediaCommand::new("ffmpeg", "test").trimmed_input(
            "/tmp/a.m4a",
            Duration::ZERO,
            Duration::from_millis(12_500),
        );
        assert_eq!(cmd.args, vec!["-ss", "0.000000", "-t", "12.500000", "-i", "/tmp/a.m4a"]);
    }

    #[test]
    fn test_quality_presets_differ() {
        let high = MediaCommand::new("ffmpeg", "x").quality_preset(ExportQuality::Highest);
        let low = MediaCommand::new("ffmpeg", "x").quality_preset(ExportQuality::Low);
        assert!(high.args.windows(2).any(|w| w == ["-crf", "18"]));
        assert!(low.args.windows(2).any(|w| w == ["-crf", "28"]));
        assert!(low.args.windows(2).any(|w| w == ["-c:a", "aac"]));
    }

    #[test]
    fn test_blank_movie_command() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let cmd = builder.blank_movie("/assets/blank_portrait.mp4", Size::new(1080, 1920), 25, Duration::from_secs(3600));

        assert_eq!(cmd.binary_path, "ffmpeg");
        assert!(cmd.args.windows(2).any(|w| w == ["-i", "color=c=black:s=1080x1920:r=25"]));
        assert!(cmd.args.windows(2).any(|w| w == ["-t", "3600.000000"]));
        assert_eq!(cmd.output_path(), Some("/assets/blank_portrait.mp4"));
    }

    #[test]
    fn test_probe_command_uses_ffprobe() {
        let cmd = MediaCommandBuilder::new("ffmpeg", "/opt/ffprobe").probe("song.mp3");
        assert_eq!(cmd.binary_path, "/opt/ffprobe");
        assert_eq!(cmd.output_path(), Some("song.mp3"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_media_error() {
        let cmd = MediaCommand::new("/nonexistent/ffmpeg-binary", "Nothing").arg("-version");
        let err = cmd.execute().await.unwrap_err();
        assert!(matches!(err, AudioMovieError::Media(_)));
    }
}
