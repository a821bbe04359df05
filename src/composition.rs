// In-memory assembly of timed tracks
//
// A composition holds tracks made of segments; each segment points at a time
// range of a stream in a source file and the time it starts on the
// composition's timeline. Nothing is decoded here: the export session turns
// the segments into encoder inputs.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::asset::{AssetTrack, MediaAsset, MediaType};
use crate::error::{AudioMovieError, Result};
use crate::geometry::{Size, Transform};
use crate::time::TimeRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositionSegment {
    pub source_path: PathBuf,
    /// Index among the source's streams of the same media type
    pub source_stream: usize,
    pub source_range: TimeRange,
    pub target_start: Duration,
}

impl CompositionSegment {
    pub fn duration(&self) -> Duration {
        self.source_range.finite_duration().unwrap_or_default()
    }

    pub fn target_end(&self) -> Duration {
        self.target_start + self.duration()
    }

    /// Cut at timeline position `at`, which must fall strictly inside the segment
    fn split_at(self, at: Duration) -> (Self, Self) {
        let offset = at - self.target_start;
        let head = Self {
            source_range: TimeRange::new(self.source_range.start, offset),
            ..self.clone()
        };
        let tail = Self {
            source_range: TimeRange::new(self.source_range.start + offset, self.duration() - offset),
            target_start: at,
            ..self
        };
        (head, tail)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositionTrack {
    pub id: TrackId,
    pub media_type: MediaType,
    pub segments: Vec<CompositionSegment>,
    pub preferred_transform: Transform,
    pub natural_size: Option<Size>,
}

impl CompositionTrack {
    pub fn duration(&self) -> Duration {
        self.segments
            .iter()
            .map(CompositionSegment::target_end)
            .max()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Composition {
    tracks: Vec<CompositionTrack>,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty track. Returns `None` when `preferred_id` is already taken.
    pub fn add_mutable_track(&mut self, media_type: MediaType, preferred_id: Option<TrackId>) -> Option<TrackId> {
        let id = match preferred_id {
            Some(id) if self.track(id).is_some() => {
                debug!("Track id {} already in use", id);
                return None;
            }
            Some(id) => id,
            None => TrackId(self.tracks.iter().map(|t| t.id.0).max().unwrap_or(0) + 1),
        };

        self.tracks.push(CompositionTrack {
            id,
            media_type,
            segments: Vec::new(),
            preferred_transform: Transform::IDENTITY,
            natural_size: None,
        });
        debug!("Added {} track {}", media_type, id);
        Some(id)
    }

    /// Insert `range` of `source_track` into `track` at `at`. Segments at or
    /// after `at` are pushed back by the inserted duration; a segment spanning
    /// `at` is split around the insertion. Tracks stay gapless from zero, so
    /// `at` may not lie past the track's end.
    pub fn insert_time_range(
        &mut self,
        track: TrackId,
        range: TimeRange,
        source: &MediaAsset,
        source_track: &AssetTrack,
        at: Duration,
    ) -> Result<()> {
        let duration = range.finite_duration().ok_or_else(|| {
            AudioMovieError::Composition(format!("Cannot insert indefinite time range {}", range))
        })?;
        if range.is_empty() {
            return Err(AudioMovieError::Composition(format!("Cannot insert empty time range {}", range)));
        }
        if !source_track.time_range.contains_range(&range) {
            return Err(AudioMovieError::Composition(format!(
                "Time range {} is outside source track {} of {}",
                range,
                source_track.time_range,
                source.path.display()
            )));
        }
        let source_stream = source.relative_index(source_track).ok_or_else(|| {
            AudioMovieError::Composition(format!(
                "Stream {} does not belong to {}",
                source_track.index,
                source.path.display()
            ))
        })?;

        let target = self
            .tracks
            .iter_mut()
            .find(|t| t.id == track)
            .ok_or_else(|| AudioMovieError::Composition(format!("Unknown composition track {}", track)))?;

        if target.media_type != source_track.media_type {
            return Err(AudioMovieError::Composition(format!(
                "Cannot insert {} content into {} track {}",
                source_track.media_type, target.media_type, track
            )));
        }

        let end = target.duration();
        if at > end {
            return Err(AudioMovieError::Composition(format!(
                "Cannot insert at {:.3}s past the end of track {} ({:.3}s)",
                at.as_secs_f64(),
                track,
                end.as_secs_f64()
            )));
        }

        let mut segments = Vec::with_capacity(target.segments.len() + 2);
        for segment in target.segments.drain(..) {
            if segment.target_start < at && at < segment.target_end() {
                let (head, tail) = segment.split_at(at);
                segments.push(head);
                segments.push(tail);
            } else {
                segments.push(segment);
            }
        }
        for segment in segments.iter_mut().filter(|s| s.target_start >= at) {
            segment.target_start += duration;
        }
        segments.push(CompositionSegment {
            source_path: source.path.clone(),
            source_stream,
            source_range: range,
            target_start: at,
        });
        segments.sort_by_key(|s| s.target_start);
        target.segments = segments;

        if target.segments.len() == 1 {
            target.preferred_transform = source_track.preferred_transform;
            target.natural_size = source_track.natural_size;
        }

        debug!(
            "Inserted {} of {} into track {} at {:.3}s",
            range,
            source.path.display(),
            track,
            at.as_secs_f64()
        );
        Ok(())
    }

    /// End of the latest segment on any track
    pub fn duration(&self) -> Duration {
        self.tracks
            .iter()
            .map(CompositionTrack::duration)
            .max()
            .unwrap_or_default()
    }

    pub fn tracks(&self) -> &[CompositionTrack] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&CompositionTrack> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn tracks_with_media_type(&self, media_type: MediaType) -> impl Iterator<Item = &CompositionTrack> {
        self.tracks.iter().filter(move |t| t.media_type == media_type)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
