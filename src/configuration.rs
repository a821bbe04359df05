use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::bundle::AssetBundle;
use crate::error::{AudioMovieError, Result};
use crate::geometry::Size;

/// Extension of the bundled placeholder movies
pub const PLACEHOLDER_EXTENSION: &str = "mp4";

const PLACEHOLDER_PREFIX: &str = "blank_";

fn default_fps() -> u32 {
    25
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

impl Orientation {
    pub const ALL: [Orientation; 2] = [Orientation::Landscape, Orientation::Portrait];

    pub fn name(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
        }
    }

    /// Output dimensions for this orientation
    pub fn resolution(&self) -> Size {
        match self {
            Orientation::Landscape => Size::new(1920, 1080),
            Orientation::Portrait => Size::new(1080, 1920),
        }
    }

    /// Resource name of the blank movie for this orientation
    pub fn placeholder_name(&self) -> String {
        format!("{}{}", PLACEHOLDER_PREFIX, self.name())
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Orientation {
    type Err = AudioMovieError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "landscape" => Ok(Orientation::Landscape),
            "portrait" => Ok(Orientation::Portrait),
            _ => Err(AudioMovieError::Config(format!(
                "Invalid orientation '{}'. Valid orientations: landscape, portrait",
                s
            ))),
        }
    }
}

/// Output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Mov,
    Mp4,
}

impl ExportFormat {
    /// File extension, which doubles as the ffmpeg muxer name
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Mov => "mov",
            ExportFormat::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = AudioMovieError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "mov" => Ok(ExportFormat::Mov),
            "mp4" => Ok(ExportFormat::Mp4),
            _ => Err(AudioMovieError::UnsupportedFormat(format!(
                "'{}'. Valid formats: mov, mp4",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    Highest,
    Medium,
    #[default]
    Low,
}

impl ExportQuality {
    /// Preset identifier passed to the export session
    pub fn preset_name(&self) -> &'static str {
        match self {
            ExportQuality::Highest => "HighestQuality",
            ExportQuality::Medium => "MediumQuality",
            ExportQuality::Low => "LowQuality",
        }
    }
}

impl FromStr for ExportQuality {
    type Err = AudioMovieError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "highest" | "high" => Ok(ExportQuality::Highest),
            "medium" => Ok(ExportQuality::Medium),
            "low" => Ok(ExportQuality::Low),
            _ => Err(AudioMovieError::Config(format!(
                "Invalid quality '{}'. Valid qualities: highest, medium, low",
                s
            ))),
        }
    }
}

/// RGBA color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::rgb(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    fn channel(value: f32) -> u8 {
        (value.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// `#RRGGBBAA`
    pub fn to_hex(&self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}{:02X}",
            Self::channel(self.r),
            Self::channel(self.g),
            Self::channel(self.b),
            Self::channel(self.a)
        )
    }

    /// ffmpeg color syntax, e.g. `0xFF8000@1.000`
    pub fn to_ffmpeg(&self) -> String {
        format!(
            "0x{:02X}{:02X}{:02X}@{:.3}",
            Self::channel(self.r),
            Self::channel(self.g),
            Self::channel(self.b),
            self.a.clamp(0.0, 1.0)
        )
    }
}

impl FromStr for Rgba {
    type Err = AudioMovieError;

    fn from_str(s: &str) -> Result<Self> {
        let named = match s.to_lowercase().as_str() {
            "white" => Some(Rgba::WHITE),
            "black" => Some(Rgba::BLACK),
            "red" => Some(Rgba::rgb(1.0, 0.0, 0.0)),
            "green" => Some(Rgba::rgb(0.0, 1.0, 0.0)),
            "blue" => Some(Rgba::rgb(0.0, 0.0, 1.0)),
            "yellow" => Some(Rgba::rgb(1.0, 1.0, 0.0)),
            "orange" => Some(Rgba::rgb(1.0, 0.5, 0.0)),
            "purple" => Some(Rgba::rgb(0.5, 0.0, 0.5)),
            "gray" | "grey" => Some(Rgba::rgb(0.5, 0.5, 0.5)),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let invalid = || AudioMovieError::Config(format!(
            "Invalid color '{}'. Use #RRGGBB, #RRGGBBAA or a color name",
            s
        ));

        let hex = s.trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut components = [255u8; 4];
        for (i, component) in components.iter_mut().enumerate().take(hex.len() / 2) {
            *component = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }

        Ok(Rgba::new(
            components[0] as f32 / 255.0,
            components[1] as f32 / 255.0,
            components[2] as f32 / 255.0,
            components[3] as f32 / 255.0,
        ))
    }
}

impl TryFrom<String> for Rgba {
    type Error = AudioMovieError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Desired output of one export. Derived values are computed on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfiguration {
    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub orientation: Orientation,
    /// Fill color rendered over the whole frame; none keeps the placeholder's pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Rgba>,
    #[serde(default)]
    pub export_format: ExportFormat,
    #[serde(default)]
    pub export_quality: ExportQuality,
}

impl Default for ExportConfiguration {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            orientation: Orientation::default(),
            background_color: None,
            export_format: ExportFormat::default(),
            export_quality: ExportQuality::default(),
        }
    }
}

impl ExportConfiguration {
    pub fn resolution(&self) -> Size {
        self.orientation.resolution()
    }

    pub fn placeholder_asset_name(&self) -> String {
        self.orientation.placeholder_name()
    }

    /// Location of the blank movie for the configured orientation, if bundled
    pub fn video_asset(&self, bundle: &AssetBundle) -> Option<PathBuf> {
        bundle.url_for_resource(&self.placeholder_asset_name(), PLACEHOLDER_EXTENSION)
    }

    pub fn file_type(&self) -> ExportFormat {
        self.export_format
    }

    pub fn export_preset(&self) -> &'static str {
        self.export_quality.preset_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_depends_on_orientation_only() {
        for orientation in Orientation::ALL {
            let plain = ExportConfiguration { orientation, ..Default::default() };
            let decorated = ExportConfiguration {
                orientation,
                fps: 60,
                background_color: Some(Rgba::BLACK),
                export_format: ExportFormat::Mp4,
                export_quality: ExportQuality::Highest,
            };
            assert_eq!(plain.resolution(), decorated.resolution());
            assert_eq!(plain.placeholder_asset_name(), decorated.placeholder_asset_name());
        }

        let landscape = ExportConfiguration::default();
        assert_eq!(landscape.resolution(), Size::new(1920, 1080));
        assert_eq!(landscape.placeholder_asset_name(), "blank_landscape");

        let portrait = ExportConfiguration { orientation: Orientation::Portrait, ..Default::default() };
        assert_eq!(portrait.resolution(), Size::new(1080, 1920));
        assert_eq!(portrait.placeholder_asset_name(), "blank_portrait");
    }

    #[test]
    fn test_defaults() {
        let config = ExportConfiguration::default();
        assert_eq!(config.fps, 25);
        assert_eq!(config.file_type(), ExportFormat::Mov);
        assert_eq!(config.export_preset(), "LowQuality");
        assert!(config.background_color.is_none());
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(ExportQuality::Highest.preset_name(), "HighestQuality");
        assert_eq!(ExportQuality::Medium.preset_name(), "MediumQuality");
        assert_eq!(ExportQuality::Low.preset_name(), "LowQuality");
    }

    #[test]
    fn test_parse_color() {
        assert_eq!("#FFFFFF".parse::<Rgba>().unwrap(), Rgba::WHITE);
        assert_eq!("white".parse::<Rgba>().unwrap(), Rgba::WHITE);

        let translucent: Rgba = "#FF000080".parse().unwrap();
        assert_eq!(translucent.to_hex(), "#FF000080");
        assert_eq!(translucent.to_ffmpeg(), "0xFF0000@0.502");

        assert!("#12345".parse::<Rgba>().is_err());
        assert!("chartreuse-ish".parse::<Rgba>().is_err());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("Portrait".parse::<Orientation>().unwrap(), Orientation::Portrait);
        assert_eq!(".mp4".parse::<ExportFormat>().unwrap(), ExportFormat::Mp4);
        assert_eq!("highest".parse::<ExportQuality>().unwrap(), ExportQuality::Highest);
        assert!("square".parse::<Orientation>().is_err());
        assert!("avi".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_toml_round_trip_keeps_color() {
        let config = ExportConfiguration {
            background_color: Some("#336699".parse().unwrap()),
            orientation: Orientation::Portrait,
            ..Default::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("background_color = \"#336699FF\""));
        assert!(text.contains("orientation = \"portrait\""));

        let parsed: ExportConfiguration = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
