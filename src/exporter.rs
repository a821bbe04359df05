// Audio movie exporter
//
// One export attempt per call: audio track, then placeholder video track,
// then render settings, then the export session. The first failing step
// ends the attempt. Whatever happens, the observer hears exactly one
// `did_start` followed by exactly one of `did_encounter_error` or
// `did_export_movie_to`, and the same result is returned to the caller.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::asset::MediaType;
use crate::bundle::AssetBundle;
use crate::composition::{Composition, TrackId};
use crate::config::Config;
use crate::configuration::ExportConfiguration;
use crate::error::{AudioMovieError, ExportFailure};
use crate::media::{MediaToolkit, MediaToolkitFactory};
use crate::session::{ExportSession, ExportStatus};
use crate::time::TimeRange;
use crate::video_composition::VideoComposition;

const SAVE_FAILED: &str = "Error saving movie to disk";

type StepResult<T> = std::result::Result<T, ExportFailure>;

/// Receives export progress. Only the success notification is required.
pub trait ExportObserver: Send + Sync {
    fn did_start(&self, _exporter: &AudioMovieExporter) {}

    fn did_encounter_error(&self, _exporter: &AudioMovieExporter, _error: &ExportFailure) {}

    fn did_export_movie_to(&self, exporter: &AudioMovieExporter, location: &Path);
}

/// Result of one export attempt
#[derive(Debug)]
pub enum ExportOutcome {
    Exported(PathBuf),
    Failed(ExportFailure),
}

impl ExportOutcome {
    pub fn is_exported(&self) -> bool {
        matches!(self, ExportOutcome::Exported(_))
    }

    pub fn location(&self) -> Option<&Path> {
        match self {
            ExportOutcome::Exported(location) => Some(location.as_path()),
            ExportOutcome::Failed(_) => None,
        }
    }

    pub fn into_result(self) -> std::result::Result<PathBuf, ExportFailure> {
        match self {
            ExportOutcome::Exported(location) => Ok(location),
            ExportOutcome::Failed(failure) => Err(failure),
        }
    }
}

#[derive(Clone)]
pub struct AudioMovieExporter {
    pub configuration: ExportConfiguration,
    observer: Option<Weak<dyn ExportObserver>>,
    toolkit: Arc<dyn MediaToolkit>,
    assets: AssetBundle,
    documents_dir: PathBuf,
}

impl AudioMovieExporter {
    pub fn new<P: Into<PathBuf>>(toolkit: Arc<dyn MediaToolkit>, assets: AssetBundle, documents_dir: P) -> Self {
        Self {
            configuration: ExportConfiguration::default(),
            observer: None,
            toolkit,
            assets,
            documents_dir: documents_dir.into(),
        }
    }

    /// Exporter wired to ffmpeg with the configured directories and export defaults
    pub fn from_config(config: &Config) -> Self {
        let toolkit = MediaToolkitFactory::create_toolkit(config.media.clone());
        let mut exporter = Self::new(
            toolkit,
            AssetBundle::new(&config.assets.directory),
            &config.output.documents_dir,
        );
        exporter.configuration = config.export.clone();
        exporter
    }

    /// Register `observer` without keeping it alive
    pub fn set_observer<O: ExportObserver + 'static>(&mut self, observer: &Arc<O>) {
        let observer: Weak<O> = Arc::downgrade(observer);
        self.observer = Some(observer);
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn toolkit(&self) -> &Arc<dyn MediaToolkit> {
        &self.toolkit
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    /// Export `audio_source` with the exporter's own configuration
    pub async fn generate_movie(&self, audio_source: &Path) -> ExportOutcome {
        let configuration = self.configuration.clone();
        self.export(audio_source, &configuration).await
    }

    /// Export `audio_source` over the placeholder movie selected by `configuration`
    pub async fn export(&self, audio_source: &Path, configuration: &ExportConfiguration) -> ExportOutcome {
        info!("Exporting {} as {} movie", audio_source.display(), configuration.export_format);
        if let Some(observer) = self.observer() {
            observer.did_start(self);
        }

        let session = match self.prepare(audio_source, configuration).await {
            Ok(session) => session,
            Err(failure) => return self.fail(failure),
        };

        let (tx, rx) = oneshot::channel();
        let exporter = self.clone();
        session.export_asynchronously(move |session| {
            let _ = tx.send(exporter.finish(session));
        });

        match rx.await {
            Ok(outcome) => outcome,
            // The worker went away before reporting
            Err(_) => self.fail(ExportFailure::new(
                SAVE_FAILED,
                Some(AudioMovieError::Export("Export task ended without a result".to_string())),
            )),
        }
    }

    async fn prepare(&self, audio_source: &Path, configuration: &ExportConfiguration) -> StepResult<ExportSession> {
        let mut composition = Composition::new();

        self.configure_audio_track(audio_source, &mut composition).await?;
        let video_track = self.configure_video_track(configuration, &mut composition).await?;

        let track = composition
            .track(video_track)
            .ok_or_else(|| ExportFailure::new("Error creating new video track", None))?;
        let video_composition = VideoComposition::for_track(track, configuration);

        self.configure_export_session(composition, video_composition, configuration).await
    }

    async fn configure_audio_track(&self, audio_source: &Path, composition: &mut Composition) -> StepResult<TrackId> {
        const MISSING: &str = "Error retrieving audio track from source file";

        let asset = self
            .toolkit
            .load_asset(audio_source)
            .await
            .map_err(|e| ExportFailure::new(MISSING, Some(e)))?;

        let source_track = asset
            .first_track(MediaType::Audio)
            .ok_or_else(|| ExportFailure::new(MISSING, None))?;

        let track = composition
            .add_mutable_track(MediaType::Audio, None)
            .ok_or_else(|| ExportFailure::new("Error creating new audio track", None))?;

        composition
            .insert_time_range(track, source_track.time_range, &asset, source_track, Duration::ZERO)
            .map_err(|e| ExportFailure::new("Error initializing audio time range", Some(e)))?;

        debug!("Audio track {} spans {:.3}s", track, composition.duration().as_secs_f64());
        Ok(track)
    }

    async fn configure_video_track(
        &self,
        configuration: &ExportConfiguration,
        composition: &mut Composition,
    ) -> StepResult<TrackId> {
        const EMPTY_MOVIE: &str = "Unable to initialize empty movie";

        let placeholder = configuration
            .video_asset(&self.assets)
            .ok_or_else(|| ExportFailure::new(EMPTY_MOVIE, None))?;

        let asset = self
            .toolkit
            .load_asset(&placeholder)
            .await
            .map_err(|e| ExportFailure::new(EMPTY_MOVIE, Some(e)))?;

        let source_track = asset
            .first_track(MediaType::Video)
            .ok_or_else(|| ExportFailure::new("Error retrieving video track", None))?;

        let track = composition
            .add_mutable_track(MediaType::Video, None)
            .ok_or_else(|| ExportFailure::new("Error creating new video track", None))?;

        // Match the placeholder's length to the audio already inserted
        let range = TimeRange::new(Duration::ZERO, composition.duration());
        composition
            .insert_time_range(track, range, &asset, source_track, Duration::ZERO)
            .map_err(|e| ExportFailure::new("Error initializing video time range", Some(e)))?;

        debug!("Video track {} from {}", track, placeholder.display());
        Ok(track)
    }

    async fn configure_export_session(
        &self,
        composition: Composition,
        video_composition: VideoComposition,
        configuration: &ExportConfiguration,
    ) -> StepResult<ExportSession> {
        let format = configuration.file_type();
        let preparing = |cause: Option<AudioMovieError>| ExportFailure::new(format!("Error preparing {} quality export", format), cause);

        let mut session = ExportSession::new(composition, configuration.export_quality, Arc::clone(&self.toolkit))
            .map_err(|e| preparing(Some(e)))?;

        tokio::fs::create_dir_all(&self.documents_dir)
            .await
            .map_err(|e| preparing(Some(AudioMovieError::from(e))))?;

        let output = self
            .documents_dir
            .join(format!("{}.{}", Uuid::new_v4(), format.extension()));

        session.video_composition = Some(video_composition);
        session.output_file_type = Some(format);
        session.output_url = Some(output);
        session.should_optimize_for_network_use = true;

        Ok(session)
    }

    /// Turn a finished session into the reported outcome
    fn finish(&self, mut session: ExportSession) -> ExportOutcome {
        match session.status() {
            ExportStatus::Completed => match session.output_url.take() {
                Some(location) => self.succeed(location),
                None => self.fail(ExportFailure::new(SAVE_FAILED, None)),
            },
            _ => {
                let cause = session.take_error();
                self.fail(ExportFailure::new(SAVE_FAILED, cause))
            }
        }
    }

    fn succeed(&self, location: PathBuf) -> ExportOutcome {
        info!("Movie exported to {}", location.display());
        if let Some(observer) = self.observer() {
            observer.did_export_movie_to(self, &location);
        }
        ExportOutcome::Exported(location)
    }

    fn fail(&self, failure: ExportFailure) -> ExportOutcome {
        match failure.cause() {
            Some(cause) => error!("{}: {}", failure, cause),
            None => error!("{}", failure),
        }
        if let Some(observer) = self.observer() {
            observer.did_encounter_error(self, &failure);
        }
        ExportOutcome::Failed(failure)
    }

    fn observer(&self) -> Option<Arc<dyn ExportObserver>> {
        self.observer.as_ref().and_then(Weak::upgrade)
    }
}
