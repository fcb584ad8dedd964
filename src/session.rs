//! Per-frame session state and the frame loop
//!
//! A [`Session`] owns everything that survives between frames: the selector,
//! the typed text and stats. Key rectangles are rebuilt from each frame's size.

use crate::buffer::{KeyAction, TypedBuffer};
use crate::config::{Config, HandPolicy, InputConfig};
use crate::layout::{Key, KeyboardLayout, Point, hit_test};
use crate::overlay::{DisplayControl, DisplaySink, Overlay};
use crate::selector::DwellSelector;
use crate::stats::FrameStats;
use crate::typing::KeystrokeSink;
use crate::vision::{Frame, FrameError, FrameSource, Hand, HandDetector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Outcome of one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Key under the winning fingertip
    pub detected: Option<String>,
    /// Key whose hold completed this frame
    pub committed: Option<String>,
}

pub struct Session {
    layout: KeyboardLayout,
    selector: DwellSelector,
    buffer: TypedBuffer,
    input: InputConfig,
    show_fps: bool,
    keys: Vec<Key>,
    frame_size: (i32, i32),
    fingertips: Vec<Point>,
    highlight: Option<String>,
    last_frame_at: Option<Instant>,
    stats: FrameStats,
    keystroke_sink: Option<Box<dyn KeystrokeSink>>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            layout: KeyboardLayout::new(&config.keyboard),
            selector: DwellSelector::new(config.hold_time()),
            buffer: TypedBuffer::new(),
            input: config.input.clone(),
            show_fps: config.display.show_fps,
            keys: Vec::new(),
            frame_size: (0, 0),
            fingertips: Vec::new(),
            highlight: None,
            last_frame_at: None,
            stats: FrameStats::new(),
            keystroke_sink: None,
        }
    }

    pub fn with_keystroke_sink(mut self, sink: Box<dyn KeystrokeSink>) -> Self {
        self.keystroke_sink = Some(sink);
        self
    }

    pub fn text(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn into_text(self) -> String {
        self.buffer.into_string()
    }

    pub fn selector(&self) -> &DwellSelector {
        &self.selector
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn layout(&self) -> &KeyboardLayout {
        &self.layout
    }

    /// Run one frame through hit-testing and dwell selection
    #[hotpath::measure]
    pub fn process_frame(&mut self, frame: &Frame, hands: &[Hand]) -> FrameReport {
        let now = frame.captured_at;
        self.stats.record_frame(now, !hands.is_empty());
        self.last_frame_at = Some(now);
        self.frame_size = (frame.width, frame.height);
        self.keys = self.layout.compute(frame.width, frame.height);
        self.fingertips.clear();

        if hands.is_empty() {
            if self.selector.candidate().is_some() {
                log::debug!("Hand lost, dropping hold");
            }
            self.selector.reset();
            self.highlight = None;
            return FrameReport::default();
        }

        let detected = self.resolve_key(frame, hands);
        let committed = self.selector.update(detected.as_deref(), now);
        self.highlight = detected.clone();

        if let Some(label) = &committed {
            self.commit(label);
        }

        FrameReport {
            detected,
            committed,
        }
    }

    /// Hit-test every fingertip and pick one key according to the hand policy
    fn resolve_key(&mut self, frame: &Frame, hands: &[Hand]) -> Option<String> {
        let mut detected = None;
        for hand in hands {
            let Some(tip) = hand.landmark(self.input.fingertip_landmark) else {
                log::trace!(
                    "Hand has {} landmarks, no fingertip #{}",
                    hand.landmarks.len(),
                    self.input.fingertip_landmark
                );
                continue;
            };
            let tip = if self.input.mirror { tip.mirrored() } else { tip };
            let point = tip.to_pixel(frame.width, frame.height);
            self.fingertips.push(point);

            if let Some(label) = hit_test(&self.keys, point) {
                match self.input.hand_policy {
                    HandPolicy::Last => detected = Some(label.to_string()),
                    HandPolicy::First if detected.is_none() => {
                        detected = Some(label.to_string())
                    }
                    HandPolicy::First => {}
                }
            }
        }
        detected
    }

    fn commit(&mut self, label: &str) {
        let action = KeyAction::from_label(label);
        self.buffer.apply(&action);
        self.stats.record_commit();
        log::info!("Key {} -> {:?}", label, self.buffer.as_str());

        if let Some(sink) = self.keystroke_sink.as_mut() {
            if let Err(e) = sink.send(&action) {
                log::warn!("Forwarding {} failed: {}", label, e);
            }
        }
    }

    pub fn overlay(&self) -> Overlay<'_> {
        Overlay {
            width: self.frame_size.0,
            height: self.frame_size.1,
            keys: &self.keys,
            highlight: self.highlight.as_deref(),
            text: self.buffer.as_str(),
            fingertips: &self.fingertips,
            progress: self.last_frame_at.and_then(|t| self.selector.progress(t)),
            fps: if self.show_fps { self.stats.fps() } else { None },
        }
    }
}

/// Pump frames until the source drains, the display asks to exit or
/// `running` is cleared. The source is released on every exit path.
pub fn run(
    session: &mut Session,
    source: &mut dyn FrameSource,
    detector: &mut dyn HandDetector,
    display: &mut dyn DisplaySink,
    running: &AtomicBool,
) -> anyhow::Result<()> {
    let result = pump(session, source, detector, display, running);
    source.release();
    result
}

fn pump(
    session: &mut Session,
    source: &mut dyn FrameSource,
    detector: &mut dyn HandDetector,
    display: &mut dyn DisplaySink,
    running: &AtomicBool,
) -> anyhow::Result<()> {
    while running.load(Ordering::SeqCst) {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(FrameError::EndOfStream) => {
                log::info!("Frame source drained");
                return Ok(());
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Frame acquisition failed")),
        };

        let hands = detector.detect(&frame);
        let report = session.process_frame(&frame, &hands);
        log::trace!("Frame {}: {:?}", frame.sequence, report);

        if display.present(&session.overlay())? == DisplayControl::Exit {
            log::info!("Exit requested");
            break;
        }
    }
    Ok(())
}
