use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::geometry::{Size, Transform};
use crate::time::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Video,
}

impl MediaType {
    /// Stream specifier letter used by ffmpeg (`a` / `v`)
    pub fn stream_specifier(&self) -> &'static str {
        match self {
            MediaType::Audio => "a",
            MediaType::Video => "v",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Audio => f.write_str("audio"),
            MediaType::Video => f.write_str("video"),
        }
    }
}

/// One stream of a loaded media file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetTrack {
    /// Stream index inside the container
    pub index: u32,
    pub media_type: MediaType,
    pub time_range: TimeRange,
    pub natural_size: Option<Size>,
    pub preferred_transform: Transform,
    pub codec: Option<String>,
}

impl AssetTrack {
    pub fn duration(&self) -> Duration {
        self.time_range.finite_duration().unwrap_or_default()
    }
}

/// A timed media file and its tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub duration: Duration,
    pub tracks: Vec<AssetTrack>,
}

impl MediaAsset {
    pub fn tracks_with_media_type(&self, media_type: MediaType) -> impl Iterator<Item = &AssetTrack> {
        self.tracks.iter().filter(move |track| track.media_type == media_type)
    }

    pub fn first_track(&self, media_type: MediaType) -> Option<&AssetTrack> {
        self.tracks_with_media_type(media_type).next()
    }

    /// Position of `track` among this asset's tracks of the same media type
    pub fn relative_index(&self, track: &AssetTrack) -> Option<usize> {
        self.tracks_with_media_type(track.media_type)
            .position(|candidate| candidate.index == track.index)
    }
}
