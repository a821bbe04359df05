// Media toolkit seam
//
// Everything that touches real media files goes through `MediaToolkit`:
// - Toolkit: ffmpeg/ffprobe implementation
// - Commands: command builders and execution
// - Probe: ffprobe JSON parsing into assets and tracks

pub mod commands;
pub mod probe;
pub mod toolkit;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use commands::*;
pub use toolkit::*;

use crate::asset::MediaAsset;
use crate::config::MediaConfig;
use crate::error::Result;

/// Asset loading and command execution backing compositions and exports
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Load a media file and describe its tracks
    async fn load_asset(&self, path: &Path) -> Result<MediaAsset>;

    /// Run a prepared media command to completion
    async fn execute(&self, command: MediaCommand) -> Result<()>;

    /// Builder bound to this toolkit's binaries
    fn command_builder(&self) -> MediaCommandBuilder;

    /// Check if the underlying tools are available
    fn check_availability(&self) -> Result<()>;

    /// Get version information of the underlying tools
    async fn version_info(&self) -> Result<String>;
}

/// Factory for creating media toolkit instances
pub struct MediaToolkitFactory;

impl MediaToolkitFactory {
    /// Create the default toolkit implementation (FFmpeg-based)
    pub fn create_toolkit(config: MediaConfig) -> Arc<dyn MediaToolkit> {
        Arc::new(toolkit::FfmpegToolkit::new(config))
    }
}
