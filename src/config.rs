use crate::layout::MAX_GEOMETRY;
use anyhow::{Context, ensure};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Dwell time before a hovered key commits
    #[serde(default = "default_hold_time_ms")]
    pub hold_time_ms: u64,
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub typing: TypingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hold_time_ms: default_hold_time_ms(),
            keyboard: KeyboardConfig::default(),
            input: InputConfig::default(),
            display: DisplayConfig::default(),
            typing: TypingConfig::default(),
        }
    }
}

fn default_hold_time_ms() -> u64 {
    800
}

// ============================================================================
// Keyboard Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct KeyboardConfig {
    #[serde(default = "default_key_size")]
    pub key_width: i32,
    #[serde(default = "default_key_size")]
    pub key_height: i32,
    #[serde(default = "default_key_gap")]
    pub key_gap: i32,
    /// Distance from the last row to the bottom edge of the frame
    #[serde(default = "default_bottom_margin")]
    pub bottom_margin: i32,
    /// Minimum distance from the left edge when a row does not fit centered
    #[serde(default = "default_side_margin")]
    pub side_margin: i32,
    #[serde(default = "default_rows")]
    pub rows: Vec<Vec<String>>,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            key_width: default_key_size(),
            key_height: default_key_size(),
            key_gap: default_key_gap(),
            bottom_margin: default_bottom_margin(),
            side_margin: default_side_margin(),
            rows: default_rows(),
        }
    }
}

impl KeyboardConfig {
    /// Reject geometry outside `1..=MAX_GEOMETRY` (sizes) or `0..=MAX_GEOMETRY`
    /// (gap and margins)
    pub fn validate(&self) -> anyhow::Result<()> {
        let fields = [
            ("key_width", self.key_width, 1),
            ("key_height", self.key_height, 1),
            ("key_gap", self.key_gap, 0),
            ("bottom_margin", self.bottom_margin, 0),
            ("side_margin", self.side_margin, 0),
        ];
        for (name, value, min) in fields {
            ensure!(
                (min..=MAX_GEOMETRY).contains(&value),
                "keyboard.{} = {} is out of range ({}..={})",
                name,
                value,
                min,
                MAX_GEOMETRY
            );
        }
        Ok(())
    }
}

fn default_key_size() -> i32 {
    40
}

fn default_key_gap() -> i32 {
    6
}

fn default_bottom_margin() -> i32 {
    100
}

fn default_side_margin() -> i32 {
    60
}

fn default_rows() -> Vec<Vec<String>> {
    [
        &["Q", "W", "E", "R", "T", "Y", "U", "I", "O", "P"][..],
        &["A", "S", "D", "F", "G", "H", "J", "K", "L"][..],
        &["Z", "X", "C", "V", "B", "N", "M", "SPACE", "DEL", "ENTER"][..],
    ]
    .iter()
    .map(|row| row.iter().map(|s| s.to_string()).collect())
    .collect()
}

// ============================================================================
// Input Config
// ============================================================================

/// Which hand wins when more than one fingertip is over a key
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HandPolicy {
    /// Last hand over a key wins (hands off the keyboard never override)
    #[default]
    Last,
    /// First hand over a key wins
    First,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default)]
    pub hand_policy: HandPolicy,
    /// Landmark used as the pointer (8 = index fingertip)
    #[serde(default = "default_fingertip_landmark")]
    pub fingertip_landmark: usize,
    /// Flip incoming landmarks horizontally
    #[serde(default)]
    pub mirror: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            hand_policy: HandPolicy::default(),
            fingertip_landmark: default_fingertip_landmark(),
            mirror: false,
        }
    }
}

fn default_fingertip_landmark() -> usize {
    8
}

// ============================================================================
// Display Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Virtual frame size used when no camera dictates one (pointer mode)
    #[serde(default = "default_frame_width")]
    pub frame_width: i32,
    #[serde(default = "default_frame_height")]
    pub frame_height: i32,
    #[serde(default = "default_show_fps")]
    pub show_fps: bool,
    /// Exit-key poll timeout per frame
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            show_fps: default_show_fps(),
            poll_ms: default_poll_ms(),
        }
    }
}

fn default_frame_width() -> i32 {
    640
}

fn default_frame_height() -> i32 {
    480
}

fn default_show_fps() -> bool {
    true
}

fn default_poll_ms() -> u64 {
    16
}

// ============================================================================
// Typing Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TypingConfig {
    /// Send committed keystrokes to the focused application
    #[serde(default)]
    pub forward: bool,
}

impl Config {
    /// Load from `path`, or defaults when the file does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.keyboard.validate()?;
        Ok(config)
    }

    pub fn hold_time(&self) -> Duration {
        Duration::from_millis(self.hold_time_ms)
    }
}
