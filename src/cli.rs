use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::configuration::{ExportConfiguration, ExportFormat, ExportQuality, Orientation, Rgba};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export an audio file as a movie
    Export {
        /// Input audio file
        #[arg(short, long)]
        audio: PathBuf,

        #[command(flatten)]
        options: ExportOptions,
    },

    /// Export every audio file in a directory
    Batch {
        /// Input directory containing audio files
        #[arg(short, long)]
        input_dir: PathBuf,

        #[command(flatten)]
        options: ExportOptions,
    },

    /// Generate the blank placeholder movies
    Placeholders {
        /// Placeholder length in seconds (defaults to the configured length)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Regenerate placeholders that already exist
        #[arg(long)]
        force: bool,
    },

    /// Show the tracks of a media file
    Probe {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Output configuration file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

/// Per-run overrides of the configured export settings
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ExportOptions {
    /// Output orientation (landscape, portrait)
    #[arg(long)]
    pub orientation: Option<Orientation>,

    /// Output frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Background color (#RRGGBB, #RRGGBBAA or a color name)
    #[arg(short, long)]
    pub background: Option<Rgba>,

    /// Output container (mov, mp4)
    #[arg(short, long)]
    pub format: Option<ExportFormat>,

    /// Export quality (highest, medium, low)
    #[arg(short, long)]
    pub quality: Option<ExportQuality>,

    /// Directory receiving exported movies
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

impl ExportOptions {
    /// `base` with every given option applied
    pub fn apply(&self, base: &ExportConfiguration) -> ExportConfiguration {
        ExportConfiguration {
            fps: self.fps.unwrap_or(base.fps),
            orientation: self.orientation.unwrap_or(base.orientation),
            background_color: self.background.or(base.background_color),
            export_format: self.format.unwrap_or(base.export_format),
            export_quality: self.quality.unwrap_or(base.export_quality),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_export_options() {
        let args = Args::try_parse_from([
            "audiomovie", "export", "--audio", "song.m4a",
            "--orientation", "portrait", "--background", "#000000", "--format", "mp4",
        ])
        .unwrap();

        let Commands::Export { audio, options } = args.command else {
            panic!("expected export command");
        };
        assert_eq!(audio, PathBuf::from("song.m4a"));

        let configuration = options.apply(&ExportConfiguration::default());
        assert_eq!(configuration.orientation, Orientation::Portrait);
        assert_eq!(configuration.background_color, Some(Rgba::BLACK));
        assert_eq!(configuration.export_format, ExportFormat::Mp4);
        assert_eq!(configuration.fps, 25);
    }

    #[test]
    fn test_invalid_orientation_rejected() {
        let result = Args::try_parse_from(["audiomovie", "export", "--audio", "a.wav", "--orientation", "diagonal"]);
        assert!(result.is_err());
    }
}
