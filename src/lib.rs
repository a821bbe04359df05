//! audiomovie - Audio to Movie Export
//!
//! Lays an audio file over a blank placeholder movie and exports the result
//! as a `.mov` or `.mp4`, optionally filling the frame with a background
//! color, using ffmpeg and ffprobe.

pub mod asset;
pub mod bundle;
pub mod cli;
pub mod composition;
pub mod config;
pub mod configuration;
pub mod error;
pub mod exporter;
pub mod geometry;
pub mod media;
pub mod placeholder;
pub mod session;
pub mod time;
pub mod video_composition;

pub use configuration::{ExportConfiguration, ExportFormat, ExportQuality, Orientation, Rgba};
pub use error::{AudioMovieError, ExportFailure, Result};
pub use exporter::{AudioMovieExporter, ExportObserver, ExportOutcome};
