//! End-to-end dwell typing through the frame loop with scripted sources

use dwellkey::config::Config;
use dwellkey::layout::KeyboardLayout;
use dwellkey::overlay::{DisplayControl, DisplaySink, Overlay};
use dwellkey::replay::ReplaySource;
use dwellkey::session::{self, Session};
use dwellkey::vision::{AnnotatedDetector, Frame, FrameError, FrameSource, Hand, Landmark};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

const W: i32 = 640;
const H: i32 = 480;

/// Frames from a list, then an optional error instead of end-of-stream
struct ScriptedSource {
    frames: VecDeque<Frame>,
    fail_with: Option<FrameError>,
    released: bool,
}

impl ScriptedSource {
    fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            fail_with: None,
            released: false,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Frame, FrameError> {
        match self.frames.pop_front() {
            Some(frame) => Ok(frame),
            None => Err(self.fail_with.take().unwrap_or(FrameError::EndOfStream)),
        }
    }

    fn release(&mut self) {
        self.released = true;
    }
}

/// Records what was shown; asks to exit after `exit_after` frames
#[derive(Default)]
struct RecordingDisplay {
    texts: Vec<String>,
    highlights: Vec<Option<String>>,
    exit_after: Option<usize>,
}

impl DisplaySink for RecordingDisplay {
    fn present(&mut self, overlay: &Overlay<'_>) -> anyhow::Result<DisplayControl> {
        self.texts.push(overlay.text.to_string());
        self.highlights.push(overlay.highlight.map(str::to_string));
        if self.exit_after == Some(self.texts.len()) {
            return Ok(DisplayControl::Exit);
        }
        Ok(DisplayControl::Continue)
    }
}

fn key_center(label: &str) -> Landmark {
    let keys = KeyboardLayout::new(&Config::default().keyboard).compute(W, H);
    let key = keys.iter().find(|k| k.label == label).unwrap();
    Landmark::new(
        (key.rect.x + key.rect.width / 2) as f32 / W as f32,
        (key.rect.y + key.rect.height / 2) as f32 / H as f32,
    )
}

/// One frame every 100ms; `None` means no hand in view
fn script(t0: Instant, keys: &[Option<&str>]) -> Vec<Frame> {
    keys.iter()
        .enumerate()
        .map(|(i, key)| Frame {
            width: W,
            height: H,
            captured_at: t0 + Duration::from_millis(i as u64 * 100),
            sequence: i as u64,
            hands: key.map(|k| vec![Hand::at(key_center(k))]).unwrap_or_default(),
        })
        .collect()
}

fn run_script(session: &mut Session, frames: Vec<Frame>) -> (ScriptedSource, RecordingDisplay) {
    let mut source = ScriptedSource::new(frames);
    let mut display = RecordingDisplay::default();
    let running = AtomicBool::new(true);
    session::run(session, &mut source, &mut AnnotatedDetector, &mut display, &running).unwrap();
    (source, display)
}

#[test]
fn test_hold_a_for_threshold_types_a() {
    let mut session = Session::new(&Config::default());
    let (source, display) = run_script(&mut session, script(Instant::now(), &[Some("A"); 9]));
    assert_eq!(session.text(), "A");
    assert!(session.selector().candidate().is_none());
    assert!(source.released);
    assert_eq!(display.texts.last().map(String::as_str), Some("A"));
    assert_eq!(display.texts[7], "");
}

#[test]
fn test_del_removes_last_character() {
    let mut session = Session::new(&Config::default());
    let mut keys = vec![Some("H"); 9];
    keys.extend([Some("I"); 9]);
    keys.extend([Some("DEL"); 9]);
    run_script(&mut session, script(Instant::now(), &keys));
    assert_eq!(session.text(), "H");
}

#[test]
fn test_alternating_keys_never_type() {
    let mut session = Session::new(&Config::default());
    // A, B, A every 300ms, sampled at 100ms
    let pattern = ["A", "A", "A", "B", "B", "B", "A", "A", "A"];
    let keys: Vec<Option<&str>> = pattern.iter().map(|k| Some(*k)).collect();
    run_script(&mut session, script(Instant::now(), &keys));
    assert_eq!(session.text(), "");
    assert_eq!(session.stats().commits, 0);
}

#[test]
fn test_hand_loss_mid_hold_types_nothing() {
    let mut session = Session::new(&Config::default());
    let keys = [
        Some("A"), Some("A"), Some("A"), Some("A"), Some("A"),
        None,
        Some("A"), Some("A"), Some("A"), Some("A"),
    ];
    let (_, display) = run_script(&mut session, script(Instant::now(), &keys));
    assert_eq!(session.text(), "");
    assert_eq!(display.highlights[5], None);
    assert_eq!(display.highlights[6].as_deref(), Some("A"));
}

#[test]
fn test_long_hold_repeats() {
    let mut session = Session::new(&Config::default());
    // Commit at 800ms, re-arm at 900ms, commit again at 1700ms
    run_script(&mut session, script(Instant::now(), &[Some("SPACE"); 18]));
    assert_eq!(session.text(), "  ");
}

#[test]
fn test_enter_and_space() {
    let mut session = Session::new(&Config::default());
    let mut keys = vec![Some("O"); 9];
    keys.push(None);
    keys.extend([Some("ENTER"); 9]);
    keys.push(None);
    keys.extend([Some("SPACE"); 9]);
    run_script(&mut session, script(Instant::now(), &keys));
    assert_eq!(session.text(), "O\n ");
}

#[test]
fn test_display_exit_stops_loop() {
    let mut session = Session::new(&Config::default());
    let mut source = ScriptedSource::new(script(Instant::now(), &[Some("A"); 20]));
    let mut display = RecordingDisplay {
        exit_after: Some(3),
        ..RecordingDisplay::default()
    };
    let running = AtomicBool::new(true);
    session::run(&mut session, &mut source, &mut AnnotatedDetector, &mut display, &running).unwrap();
    assert_eq!(display.texts.len(), 3);
    assert_eq!(source.frames.len(), 17);
    assert!(source.released);
}

#[test]
fn test_cleared_running_flag_processes_nothing() {
    let mut session = Session::new(&Config::default());
    let mut source = ScriptedSource::new(script(Instant::now(), &[Some("A"); 5]));
    let mut display = RecordingDisplay::default();
    let running = AtomicBool::new(false);
    session::run(&mut session, &mut source, &mut AnnotatedDetector, &mut display, &running).unwrap();
    assert!(display.texts.is_empty());
    assert!(source.released);
}

#[test]
fn test_acquisition_failure_is_fatal_and_releases_source() {
    let mut session = Session::new(&Config::default());
    let mut source = ScriptedSource::new(script(Instant::now(), &[Some("A"); 3]));
    source.fail_with = Some(FrameError::Io(std::io::Error::other("camera unplugged")));
    let mut display = RecordingDisplay::default();
    let running = AtomicBool::new(true);

    let err = session::run(&mut session, &mut source, &mut AnnotatedDetector, &mut display, &running)
        .unwrap_err();
    assert!(format!("{:#}", err).contains("camera unplugged"));
    assert_eq!(display.texts.len(), 3);
    assert!(source.released);
}

#[test]
fn test_replay_recording_types_text() {
    let a = key_center("A");
    let mut recording = String::from("# A held for 0.8s, then the hand leaves\n");
    for i in 0..=8 {
        recording.push_str(&format!(
            "{{\"t\": {:.1}, \"width\": {}, \"height\": {}, \"hands\": [[{}]]}}\n",
            i as f64 * 0.1,
            W,
            H,
            vec![format!("[{}, {}]", a.x, a.y); 21].join(", ")
        ));
    }
    recording.push_str(&format!("{{\"t\": 1.0, \"width\": {}, \"height\": {}, \"hands\": []}}\n", W, H));

    let mut session = Session::new(&Config::default());
    let mut source = ReplaySource::new(Cursor::new(recording.into_bytes()));
    let mut display = RecordingDisplay::default();
    let running = AtomicBool::new(true);
    session::run(&mut session, &mut source, &mut AnnotatedDetector, &mut display, &running).unwrap();

    assert_eq!(display.texts.len(), 10);
    assert_eq!(session.text(), "A");
}

#[test]
fn test_demo_recording() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/type_hi.jsonl");
    let mut session = Session::new(&Config::default());
    let mut source = ReplaySource::open(&path).unwrap();
    let mut display = RecordingDisplay::default();
    let running = AtomicBool::new(true);
    session::run(&mut session, &mut source, &mut AnnotatedDetector, &mut display, &running).unwrap();

    assert_eq!(session.text(), "HI ");
    assert_eq!(session.stats().commits, 5);
    assert_eq!(session.stats().frames, 160);
}
