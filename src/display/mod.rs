//! Presentation helpers shared by every page: publish dates and ad rotation.

use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;

use crate::domain::Ad;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// "5 min ago", "3h ago", "Yesterday", then "Jan 5".
    #[default]
    Relative,
    /// "2024-01-05 14:30".
    Absolute,
}

/// Ad slot size, one per placement in the layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdVariant {
    #[default]
    Leaderboard,
    Rectangle,
    Sidebar,
}

impl AdVariant {
    /// Nominal (width, height) in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            AdVariant::Leaderboard => (728, 90),
            AdVariant::Rectangle => (300, 250),
            AdVariant::Sidebar => (300, 600),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub date_style: DateStyle,

    /// Seconds each ad stays up before the next one (default: 5).
    pub ad_rotation_secs: u64,

    pub ad_variant: AdVariant,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_style: DateStyle::default(),
            ad_rotation_secs: 5,
            ad_variant: AdVariant::default(),
        }
    }
}

impl DisplayConfig {
    pub fn ad_interval(&self) -> Duration {
        Duration::from_secs(self.ad_rotation_secs.max(1))
    }
}

/// Format a publish date relative to `now`.
///
/// Dates in the future count as "0 min ago".
pub fn format_published(date: DateTime<Utc>, now: DateTime<Utc>, style: DateStyle) -> String {
    if style == DateStyle::Absolute {
        return date.format("%Y-%m-%d %H:%M").to_string();
    }

    let elapsed = (now - date).max(chrono::Duration::zero());
    let hours = elapsed.num_hours();

    if hours < 1 {
        format!("{} min ago", elapsed.num_minutes())
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if hours < 48 {
        "Yesterday".to_string()
    } else if date.year() != now.year() {
        date.format("%b %-d, %Y").to_string()
    } else {
        date.format("%b %-d").to_string()
    }
}

/// Cycles through a fixed list of ads on a timer.
///
/// The position is derived from elapsed time, so callers just ask for the
/// current ad whenever they render.
#[derive(Debug, Clone)]
pub struct AdRotation {
    ads: Vec<Ad>,
    start: usize,
    interval: Duration,
}

impl AdRotation {
    pub fn new(ads: Vec<Ad>, start: usize, interval: Duration) -> Self {
        Self {
            ads,
            start,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn len(&self) -> usize {
        self.ads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ads.is_empty()
    }

    pub fn index_at(&self, elapsed: Duration) -> Option<usize> {
        if self.ads.is_empty() {
            return None;
        }
        let ticks = (elapsed.as_millis() / self.interval.as_millis()) as usize;
        Some(self.start.wrapping_add(ticks) % self.ads.len())
    }

    pub fn current(&self, elapsed: Duration) -> Option<&Ad> {
        self.index_at(elapsed).map(|i| &self.ads[i])
    }
}
