//! audiomovie - Audio to Movie Export
//!
//! Command line entry point: exports audio files as movies, generates the
//! blank placeholder movies and inspects media files.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use walkdir::WalkDir;

use audiomovie::bundle::AssetBundle;
use audiomovie::cli::{Args, Commands, ExportOptions};
use audiomovie::config::{Config, APP_DIR};
use audiomovie::error::ExportFailure;
use audiomovie::exporter::{AudioMovieExporter, ExportObserver};
use audiomovie::media::MediaToolkitFactory;
use audiomovie::placeholder::PlaceholderGenerator;

const AUDIO_EXTENSIONS: [&str; 10] = ["mp3", "m4a", "aac", "wav", "aiff", "aif", "flac", "ogg", "opus", "caf"];

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose)?;

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Export { audio, options } => {
            let mut exporter = build_exporter(&config, &options).await?;
            let observer = Arc::new(ProgressObserver::new(&audio));
            exporter.set_observer(&observer);

            let location = exporter.generate_movie(&audio).await.into_result()?;
            println!("{}", display_path(&location));
        }
        Commands::Batch { input_dir, options } => {
            info!("Exporting directory: {}", input_dir.display());
            let exporter = build_exporter(&config, &options).await?;
            info!("Writing movies to {}", exporter.documents_dir().display());
            let audio_files = find_audio_files(&input_dir);
            info!("Found {} audio files to export", audio_files.len());

            let mut failures = 0;
            for audio in &audio_files {
                let observer = Arc::new(ProgressObserver::new(audio));
                let mut exporter = exporter.clone();
                exporter.set_observer(&observer);

                match exporter.generate_movie(audio).await.into_result() {
                    Ok(location) => println!("{} -> {}", audio.display(), display_path(&location)),
                    Err(failure) => {
                        warn!("Failed to export {}: {}", audio.display(), failure);
                        failures += 1;
                    }
                }
            }

            println!("Exported {} of {} files", audio_files.len() - failures, audio_files.len());
        }
        Commands::Placeholders { duration, force } => {
            let toolkit = MediaToolkitFactory::create_toolkit(config.media.clone());
            toolkit.check_availability()?;

            let duration = Duration::from_secs(duration.unwrap_or(config.assets.placeholder_duration_secs));
            let generator = PlaceholderGenerator::new(
                toolkit,
                AssetBundle::new(&config.assets.directory),
                duration,
                config.export.fps,
            );

            let written = generator.generate(force).await?;
            if written.is_empty() {
                println!("Placeholders already present in {}", config.assets.directory.display());
            }
            for path in written {
                println!("{}", display_path(&path));
            }
        }
        Commands::Probe { input } => {
            let toolkit = MediaToolkitFactory::create_toolkit(config.media.clone());
            let asset = toolkit.load_asset(&input).await?;

            println!("\n{} ({:.3}s)", input.display(), asset.duration.as_secs_f64());
            println!("{:<6} {:<8} {:<10} {:<12} {:<10} {:<8}", "Index", "Type", "Codec", "Size", "Duration", "Rotation");
            println!("{}", "-".repeat(60));
            for track in &asset.tracks {
                let size = track
                    .natural_size
                    .map(|size| track.preferred_transform.apply_to_size(size).to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<6} {:<8} {:<10} {:<12} {:<10.3} {:<8}",
                    track.index,
                    track.media_type.to_string(),
                    track.codec.as_deref().unwrap_or("-"),
                    size,
                    track.duration().as_secs_f64(),
                    track.preferred_transform.rotation_degrees()
                );
            }
        }
        Commands::InitConfig { output } => {
            config.save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}

/// Exporter for `config` with the command line overrides applied
async fn build_exporter(config: &Config, options: &ExportOptions) -> Result<AudioMovieExporter> {
    let mut config = config.clone();
    if let Some(output_dir) = &options.output_dir {
        config.output.documents_dir = output_dir.clone();
    }
    config.export = options.apply(&config.export);

    let exporter = AudioMovieExporter::from_config(&config);
    exporter.toolkit().check_availability()?;
    match exporter.toolkit().version_info().await {
        Ok(version) => info!("Using {}", version),
        Err(e) => warn!("Could not read ffmpeg version: {}", e),
    }
    Ok(exporter)
}

fn find_audio_files(input_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Path relative to the working directory when that is shorter to read
fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd))
        .filter(|relative| !relative.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

/// Terminal spinner shown while an export runs
struct ProgressObserver {
    spinner: ProgressBar,
    name: String,
}

impl ProgressObserver {
    fn new(audio: &Path) -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            spinner.set_style(style);
        }
        let name = audio
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| audio.display().to_string());
        Self { spinner, name }
    }
}

impl ExportObserver for ProgressObserver {
    fn did_start(&self, _exporter: &AudioMovieExporter) {
        self.spinner.set_message(format!("Exporting {}", self.name));
        self.spinner.enable_steady_tick(Duration::from_millis(100));
    }

    fn did_encounter_error(&self, _exporter: &AudioMovieExporter, error: &ExportFailure) {
        self.spinner.abandon_with_message(format!("{}: {}", self.name, error));
    }

    fn did_export_movie_to(&self, _exporter: &AudioMovieExporter, _location: &Path) {
        self.spinner.finish_and_clear();
    }
}

/// Console logging on stderr plus a daily log file under the app directory
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(APP_DIR).join("log");
    std::fs::create_dir_all(&log_dir)?;

    let (file_writer, guard) = non_blocking(rolling::daily(&log_dir, "audiomovie.log"));
    // The writer flushes on guard drop; keep it for the whole run
    std::mem::forget(guard);

    let level = if verbose { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(verbose)
                .with_line_number(verbose),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging {} to {}", level, log_dir.join("audiomovie.log").display());
    Ok(())
}
