// Export session
//
// Renders a composition plus its render settings into a single movie file.
// Each segment of each track becomes one trimmed ffmpeg input; the video
// chain applies the layer transform, frame rate and render size, and an
// optional background pass overlays a solid color over the whole frame.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::asset::MediaType;
use crate::composition::{Composition, CompositionTrack};
use crate::configuration::{ExportFormat, ExportQuality};
use crate::error::{AudioMovieError, Result};
use crate::media::{MediaCommand, MediaToolkit};
use crate::video_composition::VideoComposition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    Waiting,
    Exporting,
    Completed,
    Failed,
}

/// Shortest timeline that survives microsecond `-t` arguments
const MIN_DURATION: Duration = Duration::from_micros(1);

pub struct ExportSession {
    composition: Composition,
    quality: ExportQuality,
    toolkit: Arc<dyn MediaToolkit>,
    pub output_url: Option<PathBuf>,
    pub output_file_type: Option<ExportFormat>,
    pub video_composition: Option<VideoComposition>,
    pub should_optimize_for_network_use: bool,
    status: ExportStatus,
    error: Option<AudioMovieError>,
}

impl ExportSession {
    pub fn new(composition: Composition, quality: ExportQuality, toolkit: Arc<dyn MediaToolkit>) -> Result<Self> {
        if composition.is_empty() {
            return Err(AudioMovieError::Export("Composition has no tracks to export".to_string()));
        }
        if composition.duration() < MIN_DURATION {
            return Err(AudioMovieError::Export(format!(
                "Composition of {}ns is too short to export",
                composition.duration().as_nanos()
            )));
        }

        Ok(Self {
            composition,
            quality,
            toolkit,
            output_url: None,
            output_file_type: None,
            video_composition: None,
            should_optimize_for_network_use: false,
            status: ExportStatus::Waiting,
            error: None,
        })
    }

    pub fn status(&self) -> ExportStatus {
        self.status
    }

    pub fn error(&self) -> Option<&AudioMovieError> {
        self.error.as_ref()
    }

    fn file_type(&self, output: &Path) -> Result<ExportFormat> {
        if let Some(file_type) = self.output_file_type {
            return Ok(file_type);
        }
        output
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| AudioMovieError::UnsupportedFormat(output.display().to_string()))?
            .parse()
    }

    /// The ffmpeg invocation that renders this session
    pub fn export_command(&self) -> Result<MediaCommand> {
        let output = self
            .output_url
            .as_ref()
            .ok_or_else(|| AudioMovieError::Export("No output location set".to_string()))?;
        let file_type = self.file_type(output)?;

        let mut command = self
            .toolkit
            .command_builder()
            .custom(format!("{} export", self.quality.preset_name()));

        let mut filters = Vec::new();
        let mut next_input = 0usize;

        let mut video_label = None;
        if let Some(track) = self.composition.tracks_with_media_type(MediaType::Video).next() {
            let (cmd, labels) = add_inputs(command, track, &mut next_input);
            command = cmd;
            let source = join_segments(&labels, MediaType::Video, "vsrc", &mut filters);
            filters.push(self.video_chain(track, &source));
            video_label = Some("[v]".to_string());
        }

        let mut audio_label = None;
        if let Some(track) = self.composition.tracks_with_media_type(MediaType::Audio).next() {
            let (cmd, labels) = add_inputs(command, track, &mut next_input);
            command = cmd;
            audio_label = Some(if labels.len() == 1 {
                // A lone stream is mapped directly, without brackets
                labels[0].trim_matches(|c: char| c == '[' || c == ']').to_string()
            } else {
                join_segments(&labels, MediaType::Audio, "a", &mut filters)
            });
        }

        if !filters.is_empty() {
            command = command.filter_complex(filters.join(";"));
        }
        if let Some(label) = video_label {
            command = command.map(label);
        }
        if let Some(label) = audio_label {
            command = command.map(label);
        }

        command = command
            .duration(self.composition.duration())
            .quality_preset(self.quality);

        if self.should_optimize_for_network_use {
            command = command.web_optimized();
        }

        Ok(command
            .format(file_type.extension())
            .no_overwrite()
            .output(output))
    }

    /// Filter chain from `source` to the `[v]` output label
    fn video_chain(&self, track: &CompositionTrack, source: &str) -> String {
        let Some(settings) = &self.video_composition else {
            return format!("{}setsar=1[v]", source);
        };

        let transform = settings
            .layer_instruction(track.id)
            .map(|layer| layer.transform)
            .unwrap_or(track.preferred_transform);
        let rotate = match transform.rotation_degrees() {
            90 => "transpose=clock,",
            180 => "hflip,vflip,",
            270 => "transpose=cclock,",
            _ => "",
        };

        let size = settings.render_size;
        let rate = settings.frame_duration.frame_rate();
        let base = format!(
            "{}{}fps={},scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1",
            source,
            rotate,
            rate,
            w = size.width,
            h = size.height
        );

        match &settings.animation_tool {
            Some(tool) => format!(
                "{}[base];color=c={}:s={}:r={}[bg];[base][bg]overlay=shortest=1:format=auto[v]",
                base,
                tool.background_color.to_ffmpeg(),
                tool.output_frame.size,
                rate
            ),
            None => format!("{}[v]", base),
        }
    }

    /// Render the composition, updating status and error
    pub async fn export(&mut self) {
        self.status = ExportStatus::Exporting;
        match self.run().await {
            Ok(()) => {
                info!("Export completed");
                self.status = ExportStatus::Completed;
            }
            Err(e) => {
                warn!("Export failed: {}", e);
                self.error = Some(e);
                self.status = ExportStatus::Failed;
            }
        }
    }

    async fn run(&self) -> Result<()> {
        let command = self.export_command()?;
        let output = self
            .output_url
            .as_ref()
            .ok_or_else(|| AudioMovieError::Export("No output location set".to_string()))?;

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).await?;
        }

        debug!("Rendering {:.3}s composition to {}", self.composition.duration().as_secs_f64(), output.display());
        self.toolkit.execute(command).await?;

        if !fs::try_exists(output).await? {
            return Err(AudioMovieError::Export(format!(
                "Encoder finished without writing {}",
                output.display()
            )));
        }
        Ok(())
    }

    /// Take the failure recorded by [`export`](Self::export)
    pub fn take_error(&mut self) -> Option<AudioMovieError> {
        self.error.take()
    }

    /// Run the export on a worker task and hand the finished session to `completion` there
    pub fn export_asynchronously<F>(mut self, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(ExportSession) + Send + 'static,
    {
        tokio::spawn(async move {
            self.export().await;
            completion(self);
        })
    }
}

/// Add one trimmed input per segment; returns the stream labels in timeline order.
/// Tracks are gapless from zero, so concatenating the labels reproduces the timeline.
fn add_inputs(mut command: MediaCommand, track: &CompositionTrack, next_input: &mut usize) -> (MediaCommand, Vec<String>) {
    let mut labels = Vec::new();
    for segment in &track.segments {
        let start = segment.source_range.start;
        if track.media_type == MediaType::Video {
            command = command.arg("-noautorotate");
        }
        command = command.trimmed_input(&segment.source_path, start, segment.duration());
        labels.push(format!(
            "[{}:{}:{}]",
            next_input,
            track.media_type.stream_specifier(),
            segment.source_stream
        ));
        *next_input += 1;
    }
    (command, labels)
}

/// Concatenate several segment labels into `[name]`, or pass a single one through
fn join_segments(labels: &[String], media_type: MediaType, name: &str, filters: &mut Vec<String>) -> String {
    if labels.len() == 1 {
        return labels[0].clone();
    }
    let (v, a) = match media_type {
        MediaType::Video => (1, 0),
        MediaType::Audio => (0, 1),
    };
    filters.push(format!("{}concat=n={}:v={}:a={}[{}]", labels.concat(), labels.len(), v, a, name));
    format!("[{}]", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::tests::{audio_asset, video_asset};
    use crate::configuration::{ExportConfiguration, Orientation, Rgba};
    use crate::geometry::{Size, Transform};
    use crate::media::{MediaCommandBuilder, MockMediaToolkit};
    use crate::time::TimeRange;

    fn composition(audio_secs: u64, transform: Transform) -> Composition {
        let audio = audio_asset(audio_secs);
        let video = video_asset(3600, Size::new(1920, 1080), transform);
        let mut composition = Composition::new();

        let audio_track = composition.add_mutable_track(MediaType::Audio, None).unwrap();
        composition
            .insert_time_range(audio_track, audio.tracks[0].time_range, &audio, &audio.tracks[0], Duration::ZERO)
            .unwrap();

        let video_track = composition.add_mutable_track(MediaType::Video, None).unwrap();
        let range = TimeRange::new(Duration::ZERO, composition.duration());
        composition
            .insert_time_range(video_track, range, &video, &video.tracks[0], Duration::ZERO)
            .unwrap();
        composition
    }

    fn toolkit() -> MockMediaToolkit {
        let mut toolkit = MockMediaToolkit::new();
        toolkit
            .expect_command_builder()
            .returning(|| MediaCommandBuilder::new("ffmpeg", "ffprobe"));
        toolkit
    }

    fn session(configuration: &ExportConfiguration, transform: Transform, toolkit: MockMediaToolkit) -> ExportSession {
        let composition = composition(12, transform);
        let video_track = composition.tracks_with_media_type(MediaType::Video).next().unwrap().clone();

        let mut session = ExportSession::new(composition, configuration.export_quality, Arc::new(toolkit)).unwrap();
        session.output_url = Some(PathBuf::from(format!("/out/movie.{}", configuration.export_format)));
        session.output_file_type = Some(configuration.file_type());
        session.video_composition = Some(VideoComposition::for_track(&video_track, configuration));
        session.should_optimize_for_network_use = true;
        session
    }

    fn arg_after<'a>(command: &'a MediaCommand, flag: &str) -> Option<&'a str> {
        command
            .args
            .windows(2)
            .find(|w| w[0] == flag)
            .map(|w| w[1].as_str())
    }

    #[test]
    fn test_empty_composition_rejected() {
        let result = ExportSession::new(Composition::new(), ExportQuality::Low, Arc::new(toolkit()));
        assert!(matches!(result, Err(AudioMovieError::Export(_))));
    }

    #[test]
    fn test_sub_microsecond_composition_rejected() {
        let audio = audio_asset(1);
        let blip = TimeRange::new(Duration::ZERO, Duration::from_nanos(400));
        let mut composition = Composition::new();
        let track = composition.add_mutable_track(MediaType::Audio, None).unwrap();
        composition
            .insert_time_range(track, blip, &audio, &audio.tracks[0], Duration::ZERO)
            .unwrap();

        let result = ExportSession::new(composition, ExportQuality::Low, Arc::new(toolkit()));
        assert!(matches!(result, Err(AudioMovieError::Export(_))));
    }

    #[test]
    fn test_split_audio_concatenates_to_timeline_length() {
        let audio = audio_asset(10);
        let source = &audio.tracks[0];
        let mut composition = Composition::new();
        let track = composition.add_mutable_track(MediaType::Audio, None).unwrap();
        composition
            .insert_time_range(track, TimeRange::new(Duration::ZERO, Duration::from_secs(4)), &audio, source, Duration::ZERO)
            .unwrap();
        composition
            .insert_time_range(
                track,
                TimeRange::new(Duration::from_secs(6), Duration::from_secs(2)),
                &audio,
                source,
                Duration::from_secs(2),
            )
            .unwrap();

        let mut session = ExportSession::new(composition, ExportQuality::Low, Arc::new(toolkit())).unwrap();
        session.output_url = Some(PathBuf::from("/out/movie.mov"));
        let command = session.export_command().unwrap();

        let trims: Vec<_> = command
            .args
            .windows(4)
            .filter(|w| w[0] == "-ss" && w[2] == "-t")
            .map(|w| (w[1].clone(), w[3].clone()))
            .collect();
        assert_eq!(
            trims,
            vec![
                ("0.000000".to_string(), "2.000000".to_string()),
                ("6.000000".to_string(), "2.000000".to_string()),
                ("2.000000".to_string(), "2.000000".to_string()),
            ]
        );
        assert_eq!(
            arg_after(&command, "-filter_complex"),
            Some("[0:a:0][1:a:0][2:a:0]concat=n=3:v=0:a=1[a]")
        );
        assert!(command.args.windows(2).any(|w| w == ["-map", "[a]"]));
        assert!(command.args.windows(2).any(|w| w == ["-t", "6.000000"]));
    }

    #[test]
    fn test_landscape_command() {
        let configuration = ExportConfiguration::default();
        let command = session(&configuration, Transform::IDENTITY, toolkit()).export_command().unwrap();

        let graph = arg_after(&command, "-filter_complex").unwrap();
        assert!(graph.starts_with("[0:v:0]fps=25/1,scale=1920:1080"));
        assert!(graph.ends_with("setsar=1[v]"));
        assert!(!graph.contains("color="));

        assert_eq!(arg_after(&command, "-t"), Some("12.000000"));
        assert_eq!(arg_after(&command, "-f"), Some("mov"));
        assert_eq!(arg_after(&command, "-movflags"), Some("+faststart"));
        assert!(command.args.windows(2).any(|w| w == ["-map", "[v]"]));
        assert!(command.args.windows(2).any(|w| w == ["-map", "1:a:0"]));
        assert!(command.args.contains(&"-n".to_string()));
        assert_eq!(command.output_path(), Some("/out/movie.mov"));
    }

    #[test]
    fn test_background_pass_in_graph() {
        let configuration = ExportConfiguration {
            orientation: Orientation::Portrait,
            background_color: Some(Rgba::rgb(1.0, 0.0, 0.0)),
            export_format: ExportFormat::Mp4,
            ..Default::default()
        };
        let command = session(&configuration, Transform::IDENTITY, toolkit()).export_command().unwrap();

        let graph = arg_after(&command, "-filter_complex").unwrap();
        assert!(graph.contains("scale=1080:1920"));
        assert!(graph.contains("color=c=0xFF0000@1.000:s=1080x1920:r=25/1[bg]"));
        assert!(graph.ends_with("overlay=shortest=1:format=auto[v]"));
        assert_eq!(arg_after(&command, "-f"), Some("mp4"));
    }

    #[test]
    fn test_layer_transform_becomes_filter() {
        let command = session(&ExportConfiguration::default(), Transform::rotation(90), toolkit())
            .export_command()
            .unwrap();
        let graph = arg_after(&command, "-filter_complex").unwrap();
        assert!(graph.starts_with("[0:v:0]transpose=clock,fps="));
        assert_eq!(arg_after(&command, "-noautorotate"), Some("-ss"));
    }

    #[test]
    fn test_missing_output_location() {
        let mut session = session(&ExportConfiguration::default(), Transform::IDENTITY, toolkit());
        session.output_url = None;
        assert!(session.export_command().is_err());
    }

    #[tokio::test]
    async fn test_export_completes_when_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut toolkit = toolkit();
        toolkit.expect_execute().times(1).returning(|command| {
            std::fs::write(command.output_path().unwrap(), b"movie")?;
            Ok(())
        });

        let mut session = session(&ExportConfiguration::default(), Transform::IDENTITY, toolkit);
        session.output_url = Some(dir.path().join("nested").join("movie.mov"));
        session.export().await;

        assert_eq!(session.status(), ExportStatus::Completed);
        assert!(session.error().is_none());
        assert!(dir.path().join("nested").join("movie.mov").exists());
    }

    #[tokio::test]
    async fn test_export_failure_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut toolkit = toolkit();
        toolkit
            .expect_execute()
            .returning(|_| Err(AudioMovieError::Media("encoder crashed".to_string())));

        let mut session = session(&ExportConfiguration::default(), Transform::IDENTITY, toolkit);
        session.output_url = Some(dir.path().join("movie.mov"));

        let (tx, rx) = tokio::sync::oneshot::channel();
        session
            .export_asynchronously(move |finished| {
                let _ = tx.send((finished.status(), finished.error().map(|e| e.to_string())));
            })
            .await
            .unwrap();

        let (status, error) = rx.await.unwrap();
        assert_eq!(status, ExportStatus::Failed);
        assert!(error.unwrap().contains("encoder crashed"));
    }
}
