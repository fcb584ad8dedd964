//! Recorded landmark sessions as a frame source
//!
//! One JSON object per line:
//!
//! ```text
//! {"t": 0.033, "width": 640, "height": 480, "hands": [[[0.41, 0.62], [0.43, 0.60, -0.02]]]}
//! ```
//!
//! `t` is seconds since the start of the recording and each hand is a list of
//! normalized `[x, y]` or `[x, y, z]` landmarks. Blank lines and `#` comments
//! are skipped.

use crate::vision::{Frame, FrameError, FrameSource, Hand, Landmark};
use anyhow::Context;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    t: f64,
    width: i32,
    height: i32,
    #[serde(default)]
    hands: Vec<Vec<Vec<f32>>>,
}

pub struct ReplaySource<R> {
    lines: Lines<R>,
    line_no: usize,
    origin: Instant,
    realtime: bool,
    sequence: u64,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open recording {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            origin: Instant::now(),
            realtime: false,
            sequence: 0,
        }
    }

    /// Sleep until each frame's recorded time instead of replaying flat out
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    fn malformed(&self, message: impl Into<String>) -> FrameError {
        FrameError::Malformed {
            line: self.line_no,
            message: message.into(),
        }
    }

    fn parse(&self, line: &str) -> Result<(Duration, i32, i32, Vec<Hand>), FrameError> {
        let recorded: RecordedFrame =
            serde_json::from_str(line).map_err(|e| self.malformed(e.to_string()))?;

        if recorded.t < 0.0 {
            return Err(self.malformed(format!("bad timestamp {}", recorded.t)));
        }
        let offset = Duration::try_from_secs_f64(recorded.t)
            .map_err(|e| self.malformed(format!("bad timestamp {}: {}", recorded.t, e)))?;
        if recorded.width <= 0 || recorded.height <= 0 {
            return Err(FrameError::InvalidSize {
                width: recorded.width,
                height: recorded.height,
            });
        }

        let mut hands = Vec::with_capacity(recorded.hands.len());
        for points in &recorded.hands {
            let mut landmarks = Vec::with_capacity(points.len());
            for p in points {
                let landmark = match p.as_slice() {
                    [x, y] => Landmark::new(*x, *y),
                    [x, y, z] => Landmark { x: *x, y: *y, z: *z },
                    _ => {
                        return Err(self.malformed(format!(
                            "landmark needs 2 or 3 coordinates, got {}",
                            p.len()
                        )));
                    }
                };
                landmarks.push(landmark);
            }
            hands.push(Hand::new(landmarks));
        }

        Ok((offset, recorded.width, recorded.height, hands))
    }
}

impl<R: BufRead> FrameSource for ReplaySource<R> {
    fn next_frame(&mut self) -> Result<Frame, FrameError> {
        loop {
            let Some(line) = self.lines.next() else {
                return Err(FrameError::EndOfStream);
            };
            let line = line?;
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (offset, width, height, hands) = self.parse(trimmed)?;
            let captured_at = self
                .origin
                .checked_add(offset)
                .ok_or_else(|| self.malformed("timestamp out of range"))?;
            if self.realtime {
                let wait = captured_at.saturating_duration_since(Instant::now());
                if !wait.is_zero() {
                    thread::sleep(wait);
                }
            }

            let frame = Frame {
                width,
                height,
                captured_at,
                sequence: self.sequence,
                hands,
            };
            self.sequence += 1;
            return Ok(frame);
        }
    }

    fn release(&mut self) {
        log::debug!("Replay released after {} frames", self.sequence);
    }
}
