use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::info;

use crate::bundle::AssetBundle;
use crate::configuration::{Orientation, PLACEHOLDER_EXTENSION};
use crate::error::Result;
use crate::media::MediaToolkit;

/// Writes the blank movies the exporter lays audio over
pub struct PlaceholderGenerator {
    toolkit: Arc<dyn MediaToolkit>,
    assets: AssetBundle,
    duration: Duration,
    fps: u32,
}

impl PlaceholderGenerator {
    pub fn new(toolkit: Arc<dyn MediaToolkit>, assets: AssetBundle, duration: Duration, fps: u32) -> Self {
        Self { toolkit, assets, duration, fps }
    }

    /// Ensure a blank movie exists for every orientation. Existing files are
    /// kept unless `force` is set. Returns the paths that were written.
    pub async fn generate(&self, force: bool) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(self.assets.root()).await?;

        let builder = self.toolkit.command_builder();
        let mut written = Vec::new();

        for orientation in Orientation::ALL {
            let name = orientation.placeholder_name();
            let path = self.assets.path_for_resource(&name, PLACEHOLDER_EXTENSION);

            if !force && path.is_file() {
                info!("Placeholder {} already present", path.display());
                continue;
            }

            info!("Generating {} placeholder: {}", orientation, path.display());
            let command = builder.blank_movie(&path, orientation.resolution(), self.fps, self.duration);
            self.toolkit.execute(command).await?;
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaCommandBuilder, MockMediaToolkit};
    use assert_fs::prelude::*;

    fn toolkit(expected_runs: usize) -> MockMediaToolkit {
        let mut toolkit = MockMediaToolkit::new();
        toolkit
            .expect_command_builder()
            .returning(|| MediaCommandBuilder::new("ffmpeg", "ffprobe"));
        toolkit.expect_execute().times(expected_runs).returning(|command| {
            std::fs::write(command.output_path().unwrap(), b"blank")?;
            Ok(())
        });
        toolkit
    }

    #[tokio::test]
    async fn test_generates_both_orientations() {
        let dir = assert_fs::TempDir::new().unwrap();
        let assets = AssetBundle::new(dir.path().join("assets"));
        let generator = PlaceholderGenerator::new(Arc::new(toolkit(2)), assets.clone(), Duration::from_secs(60), 25);

        let written = generator.generate(false).await.unwrap();

        assert_eq!(written.len(), 2);
        assert!(assets.url_for_resource("blank_landscape", "mp4").is_some());
        assert!(assets.url_for_resource("blank_portrait", "mp4").is_some());
    }

    #[tokio::test]
    async fn test_keeps_existing_unless_forced() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("blank_landscape.mp4").touch().unwrap();
        let assets = AssetBundle::new(dir.path());

        let generator = PlaceholderGenerator::new(Arc::new(toolkit(1)), assets.clone(), Duration::from_secs(60), 25);
        let written = generator.generate(false).await.unwrap();
        assert_eq!(written, vec![dir.path().join("blank_portrait.mp4")]);

        let forced = PlaceholderGenerator::new(Arc::new(toolkit(2)), assets, Duration::from_secs(60), 25);
        assert_eq!(forced.generate(true).await.unwrap().len(), 2);
    }
}
