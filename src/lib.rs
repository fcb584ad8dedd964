//! Dwell-to-type virtual keyboard
//!
//! A QWERTY layout is laid over each video frame; holding a tracked fingertip
//! over a key for the dwell time types it. Frame acquisition, hand tracking
//! and drawing sit behind [`vision::FrameSource`], [`vision::HandDetector`]
//! and [`overlay::DisplaySink`], so the selection logic runs the same against
//! a camera, a recorded session or the terminal mouse.

pub mod buffer;
pub mod config;
pub mod layout;
pub mod overlay;
pub mod pointer;
pub mod replay;
pub mod selector;
pub mod session;
pub mod stats;
pub mod tui;
pub mod typing;
pub mod vision;
