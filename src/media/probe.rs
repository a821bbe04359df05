//! ffprobe output parsing.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::asset::{AssetTrack, MediaAsset, MediaType};
use crate::error::Result;
use crate::geometry::{Size, Transform};
use crate::time::TimeRange;

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    #[serde(default)]
    tags: Option<FfprobeTags>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Deserialize)]
struct FfprobeTags {
    rotate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    /// Counter-clockwise degrees from the display matrix
    rotation: Option<f64>,
}

fn parse_seconds(value: Option<&String>) -> Option<Duration> {
    value
        .and_then(|s| s.parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// Clockwise display rotation of a stream
fn stream_rotation(stream: &FfprobeStream) -> i32 {
    if let Some(rotation) = stream.side_data_list.iter().find_map(|side| side.rotation) {
        return -(rotation.round() as i32);
    }
    stream
        .tags
        .as_ref()
        .and_then(|tags| tags.rotate.as_ref())
        .and_then(|r| r.parse::<i32>().ok())
        .unwrap_or(0)
}

/// Build a [`MediaAsset`] from `ffprobe -print_format json -show_format -show_streams` output.
/// Streams other than audio and video are skipped.
pub fn parse_probe_output(path: &Path, json: &[u8]) -> Result<MediaAsset> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let format_duration = probe
        .format
        .as_ref()
        .and_then(|format| parse_seconds(format.duration.as_ref()));

    let tracks: Vec<AssetTrack> = probe
        .streams
        .iter()
        .filter_map(|stream| {
            let media_type = match stream.codec_type.as_deref() {
                Some("audio") => MediaType::Audio,
                Some("video") => MediaType::Video,
                _ => return None,
            };

            let duration = parse_seconds(stream.duration.as_ref())
                .or(format_duration)
                .unwrap_or_default();

            // Some containers report 0x0 for streams without a coded size
            let natural_size = match (stream.width, stream.height) {
                (Some(width), Some(height)) => Some(Size::new(width, height)).filter(|size| !size.is_empty()),
                _ => None,
            };

            Some(AssetTrack {
                index: stream.index,
                media_type,
                time_range: TimeRange::new(Duration::ZERO, duration),
                natural_size,
                preferred_transform: Transform::rotation(stream_rotation(stream)),
                codec: stream.codec_name.clone(),
            })
        })
        .collect();

    let duration = format_duration
        .or_else(|| tracks.iter().map(AssetTrack::duration).max())
        .unwrap_or_default();

    Ok(MediaAsset {
        path: path.to_path_buf(),
        duration,
        tracks,
    })
}
