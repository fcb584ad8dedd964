//! What a display draws over each frame, and the display seam itself

use crate::layout::{Key, Point};

/// Everything a display needs to draw one frame's overlay
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    pub width: i32,
    pub height: i32,
    pub keys: &'a [Key],
    /// Key under the pointer this frame
    pub highlight: Option<&'a str>,
    pub text: &'a str,
    pub fingertips: &'a [Point],
    /// Dwell progress of the current candidate (1.0 = about to commit)
    pub progress: Option<f32>,
    pub fps: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayControl {
    Continue,
    /// User asked to quit
    Exit,
}

pub trait DisplaySink {
    /// Show the overlay, then wait briefly for an exit request
    fn present(&mut self, overlay: &Overlay<'_>) -> anyhow::Result<DisplayControl>;
}

/// Headless display: logs text changes, never asks to exit
#[derive(Debug, Default)]
pub struct LogDisplay {
    last_text: String,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for LogDisplay {
    fn present(&mut self, overlay: &Overlay<'_>) -> anyhow::Result<DisplayControl> {
        if overlay.text != self.last_text {
            log::info!("Text: {:?}", overlay.text);
            self.last_text.clear();
            self.last_text.push_str(overlay.text);
        }
        if let Some(key) = overlay.highlight {
            log::trace!("Hovering {} ({:.0}%)", key, overlay.progress.unwrap_or(0.0) * 100.0);
        }
        Ok(DisplayControl::Continue)
    }
}
