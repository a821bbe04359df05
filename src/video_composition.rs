use std::time::Duration;

use crate::composition::{CompositionTrack, TrackId};
use crate::configuration::{ExportConfiguration, Rgba};
use crate::geometry::{Rect, Size, Transform};
use crate::time::{FrameDuration, TimeRange};

/// Transform applied to one track from a point in time onwards
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInstruction {
    pub track: TrackId,
    pub transform: Transform,
    pub at: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoCompositionInstruction {
    pub time_range: TimeRange,
    pub layer_instructions: Vec<LayerInstruction>,
}

/// Post-processing pass that draws the video layer inside a colored output
/// layer. The video layer has zero size, so only the background shows.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundLayerTool {
    pub background_color: Rgba,
    pub output_frame: Rect,
    pub video_layer_frame: Rect,
}

/// Render settings applied by the export session
#[derive(Debug, Clone, PartialEq)]
pub struct VideoComposition {
    pub frame_duration: FrameDuration,
    pub render_size: Size,
    pub instructions: Vec<VideoCompositionInstruction>,
    pub animation_tool: Option<BackgroundLayerTool>,
}

impl VideoComposition {
    /// Settings for rendering `video_track` with `configuration`: one
    /// instruction covering the whole timeline, the track's own transform
    /// applied from zero, and a background pass when a color is configured.
    pub fn for_track(video_track: &CompositionTrack, configuration: &ExportConfiguration) -> Self {
        let layer_instruction = LayerInstruction {
            track: video_track.id,
            transform: video_track.preferred_transform,
            at: Duration::ZERO,
        };

        let instruction = VideoCompositionInstruction {
            time_range: TimeRange::indefinite_from(Duration::ZERO),
            layer_instructions: vec![layer_instruction],
        };

        Self {
            frame_duration: FrameDuration::from_fps(configuration.fps),
            render_size: configuration.resolution(),
            instructions: vec![instruction],
            animation_tool: background_layer_tool(configuration),
        }
    }

    /// Layer instruction for `track`, if any instruction covers it
    pub fn layer_instruction(&self, track: TrackId) -> Option<&LayerInstruction> {
        self.instructions
            .iter()
            .flat_map(|instruction| instruction.layer_instructions.iter())
            .find(|layer| layer.track == track)
    }
}

fn background_layer_tool(configuration: &ExportConfiguration) -> Option<BackgroundLayerTool> {
    configuration.background_color.map(|color| BackgroundLayerTool {
        background_color: color,
        output_frame: Rect::with_size(configuration.resolution()),
        video_layer_frame: Rect::ZERO,
    })
}
