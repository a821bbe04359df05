use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::configuration::ExportConfiguration;
use crate::error::{AudioMovieError, Result};

/// Application state directory, relative to the working directory
pub const APP_DIR: &str = ".audiomovie";

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub media: MediaConfig,
    pub assets: AssetsConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub export: ExportConfiguration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
    /// Additional encoder options appended before the output path
    /// Common options: ["-threads", "4", "-tune", "stillimage"]
    #[serde(default)]
    pub extra_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory holding blank_landscape.mp4 and blank_portrait.mp4
    pub directory: PathBuf,
    /// Length of generated placeholder movies in seconds
    pub placeholder_duration_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving exported movies
    pub documents_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let app_dir = PathBuf::from(APP_DIR);
        Self {
            media: MediaConfig {
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: default_ffprobe_path(),
                extra_options: vec![
                    // "-threads".to_string(), "4".to_string(),
                ],
            },
            assets: AssetsConfig {
                directory: app_dir.join("assets"),
                placeholder_duration_secs: 3600,
            },
            output: OutputConfig {
                documents_dir: app_dir.join("documents"),
            },
            export: ExportConfiguration::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AudioMovieError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| AudioMovieError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AudioMovieError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| AudioMovieError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
