//! Frame-rate and typing stats for the FPS readout and the exit summary

use std::time::{Duration, Instant};

#[derive(Clone, Default)]
pub struct FrameStats {
    pub frames: u64,
    pub frames_with_hands: u64,
    pub commits: u64,
    first_frame: Option<Instant>,
    last_frame: Option<Instant>,
    fps: Option<f32>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame timestamp; FPS is the inverse of the last frame interval
    pub fn record_frame(&mut self, at: Instant, has_hands: bool) {
        self.frames += 1;
        if has_hands {
            self.frames_with_hands += 1;
        }
        if let Some(prev) = self.last_frame {
            let dt = at.saturating_duration_since(prev).as_secs_f32();
            self.fps = if dt > 0.0 { Some(1.0 / dt) } else { self.fps };
        }
        self.first_frame.get_or_insert(at);
        self.last_frame = Some(at);
    }

    pub fn record_commit(&mut self) {
        self.commits += 1;
    }

    pub fn fps(&self) -> Option<f32> {
        self.fps
    }

    pub fn elapsed(&self) -> Duration {
        match (self.first_frame, self.last_frame) {
            (Some(first), Some(last)) => last.saturating_duration_since(first),
            _ => Duration::ZERO,
        }
    }

    pub fn summary(&self) -> String {
        if self.frames == 0 {
            return "No frames processed.\n".to_string();
        }
        let elapsed = self.elapsed().as_secs_f64();
        let avg_fps = if elapsed > 0.0 {
            (self.frames - 1) as f64 / elapsed
        } else {
            0.0
        };
        let tracked = self.frames_with_hands as f64 / self.frames as f64 * 100.0;
        format!(
            "Frames (n={}): {:.1}s avg={:.1} fps, hands in {:.0}% of frames, {} keystrokes\n",
            self.frames, elapsed, avg_fps, tracked, self.commits
        )
    }
}
