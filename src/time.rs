use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Length of a time range; instructions may cover an unbounded timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extent {
    Finite(Duration),
    Indefinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Duration,
    pub duration: Extent,
}

impl TimeRange {
    pub fn new(start: Duration, duration: Duration) -> Self {
        Self { start, duration: Extent::Finite(duration) }
    }

    /// Range starting at `start` that never ends
    pub fn indefinite_from(start: Duration) -> Self {
        Self { start, duration: Extent::Indefinite }
    }

    pub fn finite_duration(&self) -> Option<Duration> {
        match self.duration {
            Extent::Finite(duration) => Some(duration),
            Extent::Indefinite => None,
        }
    }

    pub fn end(&self) -> Option<Duration> {
        self.finite_duration().map(|duration| self.start + duration)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.duration, Extent::Finite(d) if d.is_zero())
    }

    pub fn contains_range(&self, other: &TimeRange) -> bool {
        if other.start < self.start {
            return false;
        }
        match (self.end(), other.end()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(outer), Some(inner)) => inner <= outer,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.duration {
            Extent::Finite(d) => write!(f, "[{:.3}s +{:.3}s]", self.start.as_secs_f64(), d.as_secs_f64()),
            Extent::Indefinite => write!(f, "[{:.3}s +indefinite]", self.start.as_secs_f64()),
        }
    }
}

/// Rational frame duration (`value / timescale` seconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDuration {
    pub value: u32,
    pub timescale: u32,
}

impl FrameDuration {
    /// One frame at `fps` frames per second
    pub fn from_fps(fps: u32) -> Self {
        Self { value: 1, timescale: fps }
    }

    pub fn as_secs_f64(&self) -> f64 {
        if self.timescale == 0 {
            return 0.0;
        }
        self.value as f64 / self.timescale as f64
    }

    /// Frame rate in ffmpeg's rational syntax, e.g. `25/1`
    pub fn frame_rate(&self) -> String {
        format!("{}/{}", self.timescale, self.value)
    }
}

/// Seconds rounded to the nearest microsecond, as accepted by ffmpeg's `-ss`/`-t`.
pub fn format_seconds(duration: Duration) -> String {
    let micros = (duration.as_nanos() + 500) / 1_000;
    format!("{}.{:06}", micros / 1_000_000, micros % 1_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_range() {
        let outer = TimeRange::new(Duration::ZERO, Duration::from_secs(10));
        assert!(outer.contains_range(&TimeRange::new(Duration::from_secs(2), Duration::from_secs(8))));
        assert!(!outer.contains_range(&TimeRange::new(Duration::from_secs(2), Duration::from_secs(9))));
        assert!(!outer.contains_range(&TimeRange::indefinite_from(Duration::ZERO)));
        assert!(TimeRange::indefinite_from(Duration::ZERO).contains_range(&outer));
    }

    #[test]
    fn test_frame_duration() {
        let frame = FrameDuration::from_fps(25);
        assert_eq!(frame.as_secs_f64(), 0.04);
        assert_eq!(frame.frame_rate(), "25/1");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(Duration::from_millis(12_000)), "12.000000");
        assert_eq!(format_seconds(Duration::from_millis(65_123)), "65.123000");
    }

    #[test]
    fn test_format_seconds_rounds_to_microseconds() {
        assert_eq!(format_seconds(Duration::from_nanos(65_123_456_700)), "65.123457");
        assert_eq!(format_seconds(Duration::from_nanos(1_999_999_600)), "2.000000");
        assert_eq!(format_seconds(Duration::from_micros(400)), "0.000400");
        assert_eq!(format_seconds(Duration::from_nanos(400)), "0.000000");
    }
}
