//! Frames, hands and the capability seams around the frame loop
//!
//! Camera acquisition and landmark inference live outside this crate. A
//! [`FrameSource`] hands out frames (optionally already annotated with hands)
//! and a [`HandDetector`] turns a frame into hands.

use crate::layout::Point;
use std::time::Instant;
use thiserror::Error;

/// Landmarks per hand in the reference tracker
pub const HAND_LANDMARKS: usize = 21;

/// Index fingertip in the reference tracker's landmark order
pub const INDEX_FINGER_TIP: usize = 8;

/// A hand landmark in normalized [0, 1] frame coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Pixel position in a `width` x `height` frame (truncating like an int cast)
    pub fn to_pixel(&self, width: i32, height: i32) -> Point {
        Point::new(
            (self.x * width as f32) as i32,
            (self.y * height as f32) as i32,
        )
    }

    pub fn mirrored(&self) -> Self {
        Self {
            x: 1.0 - self.x,
            ..*self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    pub landmarks: Vec<Landmark>,
}

impl Hand {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// A full hand with every landmark collapsed onto one point
    pub fn at(point: Landmark) -> Self {
        Self {
            landmarks: vec![point; HAND_LANDMARKS],
        }
    }

    pub fn landmark(&self, index: usize) -> Option<Landmark> {
        self.landmarks.get(index).copied()
    }
}

/// One acquired frame. Pixel data never enters the crate; sources that
/// already know where the hands are attach them as `hands`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: i32,
    pub height: i32,
    pub captured_at: Instant,
    pub sequence: u64,
    pub hands: Vec<Hand>,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("end of stream")]
    EndOfStream,
    #[error("frame source I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("invalid frame size {width}x{height}")]
    InvalidSize { width: i32, height: i32 },
}

pub trait FrameSource {
    /// Block until the next frame. `EndOfStream` once the source is drained.
    fn next_frame(&mut self) -> Result<Frame, FrameError>;

    /// Shut the source down; called once when the loop exits.
    fn release(&mut self) {}
}

pub trait HandDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Hand>;
}

/// Detector that trusts the hands the source attached to each frame
#[derive(Debug, Default)]
pub struct AnnotatedDetector;

impl HandDetector for AnnotatedDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<Hand> {
        frame.hands.clone()
    }
}
