//! Terminal mouse as a stand-in fingertip
//!
//! While the left button is held the pointer counts as a tracked hand whose
//! every landmark sits under the mouse; releasing the button is hand loss.
//! Mouse events arrive from the terminal display's event poll over a channel.

use crate::vision::{Frame, FrameError, FrameSource, Hand, Landmark};
use flume::TryRecvError;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    /// Size of the terminal area the frame is drawn into
    Viewport { cols: u16, rows: u16 },
    Down { col: u16, row: u16 },
    Moved { col: u16, row: u16 },
    Up,
}

pub struct PointerSource {
    events: flume::Receiver<PointerEvent>,
    width: i32,
    height: i32,
    viewport: (u16, u16),
    position: Option<(u16, u16)>,
    pressed: bool,
    sequence: u64,
}

impl PointerSource {
    pub fn new(
        events: flume::Receiver<PointerEvent>,
        width: i32,
        height: i32,
    ) -> Result<Self, FrameError> {
        if width <= 0 || height <= 0 {
            return Err(FrameError::InvalidSize { width, height });
        }
        Ok(Self {
            events,
            width,
            height,
            viewport: (1, 1),
            position: None,
            pressed: false,
            sequence: 0,
        })
    }

    fn apply(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Viewport { cols, rows } => self.viewport = (cols.max(1), rows.max(1)),
            PointerEvent::Down { col, row } => {
                self.pressed = true;
                self.position = Some((col, row));
            }
            PointerEvent::Moved { col, row } => self.position = Some((col, row)),
            PointerEvent::Up => self.pressed = false,
        }
    }

    /// Center of the pointer's cell in normalized frame coordinates
    fn landmark(&self) -> Option<Landmark> {
        let (col, row) = self.position?;
        let (cols, rows) = self.viewport;
        Some(Landmark::new(
            (col as f32 + 0.5) / cols as f32,
            (row as f32 + 0.5) / rows as f32,
        ))
    }
}

impl FrameSource for PointerSource {
    fn next_frame(&mut self) -> Result<Frame, FrameError> {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(FrameError::EndOfStream),
            }
        }

        let hands = match (self.pressed, self.landmark()) {
            (true, Some(tip)) => vec![Hand::at(tip)],
            _ => Vec::new(),
        };

        let frame = Frame {
            width: self.width,
            height: self.height,
            captured_at: Instant::now(),
            sequence: self.sequence,
            hands,
        };
        self.sequence += 1;
        Ok(frame)
    }
}
