//! Terminal display: the frame is scaled onto the terminal grid
//!
//! Keys become colored cell spans with centered labels, the typed text gets a
//! white box at the top, fingertips are dots, and the last terminal row is a
//! status bar with the dwell progress. ESC, `q` or Ctrl+C request exit.

use crate::overlay::{DisplayControl, DisplaySink, Overlay};
use crate::pointer::PointerEvent;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEventKind,
};
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, execute};
use std::io::{self, Write, stdout};
use std::time::{Duration, Instant};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub type Rgb = (u8, u8, u8);

const KEY_FG: Rgb = (255, 255, 255);
const KEY_BG: Rgb = (70, 70, 70);
const HIGHLIGHT_FG: Rgb = (0, 0, 0);
const HIGHLIGHT_BG: Rgb = (0, 255, 0);
const TEXT_FG: Rgb = (0, 0, 0);
const TEXT_BG: Rgb = (255, 255, 255);
const TIP_FG: Rgb = (0, 255, 0);
const BLANK_FG: Rgb = (200, 200, 200);

/// Placeholder for the second column of a double-width character
const WIDE_TAIL: char = '\0';

/// Top-left and bottom-right inset of the text box, in frame pixels
const TEXT_BOX_LEFT: i32 = 30;
const TEXT_BOX_TOP: i32 = 20;
const TEXT_BOX_BOTTOM: i32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgb,
    pub bg: Option<Rgb>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: BLANK_FG,
            bg: None,
        }
    }
}

/// Character grid the overlay is rasterized into
pub struct Canvas {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![Cell::default(); cols * rows],
        }
    }

    pub fn get(&self, col: usize, row: usize) -> Option<&Cell> {
        (col < self.cols && row < self.rows).then(|| &self.cells[row * self.cols + col])
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        (col >= 0 && row >= 0 && (col as usize) < self.cols && (row as usize) < self.rows)
            .then(|| row as usize * self.cols + col as usize)
    }

    /// Blank out the other half of a wide character overlapping cell `i`
    fn split_wide(&mut self, i: usize) {
        if self.cells[i].ch == WIDE_TAIL && i % self.cols > 0 {
            self.cells[i - 1].ch = ' ';
        }
        if (i + 1) % self.cols > 0 && self.cells[i + 1].ch == WIDE_TAIL {
            self.cells[i + 1].ch = ' ';
        }
    }

    fn set(&mut self, col: i32, row: i32, cell: Cell) {
        if let Some(i) = self.index(col, row) {
            self.split_wide(i);
            self.cells[i] = cell;
        }
    }

    fn fill(&mut self, c0: i32, r0: i32, c1: i32, r1: i32, bg: Rgb) {
        for row in r0..r1 {
            for col in c0..c1 {
                self.set(col, row, Cell { ch: ' ', fg: KEY_FG, bg: Some(bg) });
            }
        }
    }

    fn put_str(&mut self, col: i32, row: i32, text: &str, fg: Rgb, bg: Option<Rgb>) {
        let mut c = col;
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0) as i32;
            if width == 0 {
                continue;
            }
            if width == 2 {
                // Both halves must land on the grid or the row shifts
                let (Some(_), Some(tail)) = (self.index(c, row), self.index(c + 1, row)) else {
                    c += width;
                    continue;
                };
                self.set(c, row, Cell { ch, fg, bg });
                if (tail + 1) % self.cols > 0 && self.cells[tail + 1].ch == WIDE_TAIL {
                    self.cells[tail + 1].ch = ' ';
                }
                self.cells[tail] = Cell { ch: WIDE_TAIL, fg, bg };
            } else {
                self.set(c, row, Cell { ch, fg, bg });
            }
            c += width;
        }
    }

    /// Row text without colors, for tests and debugging
    pub fn row_text(&self, row: usize) -> String {
        (0..self.cols)
            .filter_map(|col| self.get(col, row).map(|c| c.ch))
            .filter(|&ch| ch != WIDE_TAIL)
            .collect()
    }
}

/// Frame pixel coordinate -> cell index
fn to_cell(v: i32, frame: i32, cells: usize) -> i32 {
    (v as i64 * cells as i64).div_euclid(frame.max(1) as i64) as i32
}

/// Longest suffix of `text` that fits in `width` columns
fn tail_fit(text: &str, width: usize) -> &str {
    if text.width() <= width {
        return text;
    }
    let mut used = 0;
    let mut start = text.len();
    for (i, ch) in text.char_indices().rev() {
        used += ch.width().unwrap_or(0);
        if used > width {
            break;
        }
        start = i;
    }
    &text[start..]
}

/// Longest prefix of `text` that fits in `width` columns
fn head_fit(text: &str, width: usize) -> &str {
    let mut used = 0;
    for (i, ch) in text.char_indices() {
        used += ch.width().unwrap_or(0);
        if used > width {
            return &text[..i];
        }
    }
    text
}

/// Rasterize an overlay into a `cols` x `rows` grid
pub fn render_canvas(overlay: &Overlay<'_>, cols: usize, rows: usize) -> Canvas {
    let mut canvas = Canvas::new(cols, rows);
    let (w, h) = (overlay.width, overlay.height);
    if w <= 0 || h <= 0 || cols == 0 || rows == 0 {
        return canvas;
    }
    let cx = |x: i32| to_cell(x, w, cols);
    let cy = |y: i32| to_cell(y, h, rows);

    // Text box
    let (c0, r0) = (cx(TEXT_BOX_LEFT), cy(TEXT_BOX_TOP));
    let c1 = cx(w - TEXT_BOX_LEFT).max(c0 + 1);
    let r1 = cy(TEXT_BOX_BOTTOM).max(r0 + 1);
    canvas.fill(c0, r0, c1, r1, TEXT_BG);
    let line = overlay.text.rsplit('\n').next().unwrap_or("");
    let room = (c1 - c0 - 2).max(0) as usize;
    canvas.put_str(c0 + 1, r0 + (r1 - r0) / 2, tail_fit(line, room), TEXT_FG, Some(TEXT_BG));

    // Keys
    for key in overlay.keys {
        let (kc0, kr0) = (cx(key.rect.x), cy(key.rect.y));
        let kc1 = cx(key.rect.right()).max(kc0 + 1);
        let kr1 = cy(key.rect.bottom()).max(kr0 + 1);
        let highlighted = overlay.highlight == Some(key.label.as_str());
        let (fg, bg) = if highlighted {
            (HIGHLIGHT_FG, HIGHLIGHT_BG)
        } else {
            (KEY_FG, KEY_BG)
        };
        canvas.fill(kc0, kr0, kc1, kr1, bg);

        let span = (kc1 - kc0) as usize;
        let label = head_fit(&key.label, span);
        let pad = (span.saturating_sub(label.width()) / 2) as i32;
        canvas.put_str(kc0 + pad, kr0 + (kr1 - kr0) / 2, label, fg, Some(bg));
    }

    // Fingertips
    for tip in overlay.fingertips {
        let (col, row) = (cx(tip.x), cy(tip.y));
        let bg = canvas.get(col.max(0) as usize, row.max(0) as usize).and_then(|c| c.bg);
        canvas.set(col, row, Cell { ch: '●', fg: TIP_FG, bg });
    }

    canvas
}

/// Bottom status bar: dwell progress, hovered key, FPS, text length.
/// Cut to `width` columns so the last terminal row never wraps.
pub fn status_line(overlay: &Overlay<'_>, width: usize) -> String {
    const SLOTS: usize = 8;
    let filled = overlay
        .progress
        .map(|p| (p * SLOTS as f32).round() as usize)
        .unwrap_or(0)
        .min(SLOTS);
    let bar: String = (0..SLOTS).map(|i| if i < filled { '|' } else { ' ' }).collect();

    let mut out = format!(" dwellkey | [{}] {:<6}", bar, overlay.highlight.unwrap_or("-"));
    if let Some(fps) = overlay.fps {
        out.push_str(&format!(" | FPS: {}", fps as u32));
    }
    out.push_str(&format!(
        " | chars: {} | hold left button over a key, ESC to quit",
        overlay.text.chars().count()
    ));
    let cut = head_fit(&out, width).len();
    out.truncate(cut);
    out
}

pub struct TerminalDisplay {
    pointer_tx: flume::Sender<PointerEvent>,
    poll: Duration,
    cols: u16,
    rows: u16,
}

impl TerminalDisplay {
    /// Take over the terminal. Mouse events come back on the returned receiver.
    pub fn new(poll: Duration) -> io::Result<(Self, flume::Receiver<PointerEvent>)> {
        let (tx, rx) = flume::unbounded();
        let (cols, rows) = terminal::size()?;

        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            terminal::Clear(ClearType::All)
        )?;

        let display = Self {
            pointer_tx: tx,
            poll,
            cols,
            rows,
        };
        display.send_viewport();
        Ok((display, rx))
    }

    /// Canvas area: everything above the status bar
    fn canvas_size(&self) -> (u16, u16) {
        (self.cols.max(1), self.rows.saturating_sub(1).max(1))
    }

    fn send_viewport(&self) {
        let (cols, rows) = self.canvas_size();
        let _ = self.pointer_tx.send(PointerEvent::Viewport { cols, rows });
    }

    fn draw(&self, overlay: &Overlay<'_>) -> io::Result<()> {
        let (cols, rows) = self.canvas_size();
        let canvas = render_canvas(overlay, cols as usize, rows as usize);

        let mut out = String::with_capacity(cols as usize * rows as usize * 8);
        out.push_str("\x1b[H");

        let mut last: Option<(Rgb, Option<Rgb>)> = None;
        for row in 0..canvas.rows {
            for col in 0..canvas.cols {
                let cell = canvas.cells[row * canvas.cols + col];
                if last != Some((cell.fg, cell.bg)) {
                    out.push_str("\x1b[0m");
                    out.push_str(&format!("\x1b[38;2;{};{};{}m", cell.fg.0, cell.fg.1, cell.fg.2));
                    if let Some(bg) = cell.bg {
                        out.push_str(&format!("\x1b[48;2;{};{};{}m", bg.0, bg.1, bg.2));
                    }
                    last = Some((cell.fg, cell.bg));
                }
                if cell.ch != WIDE_TAIL {
                    out.push(cell.ch);
                }
            }
            out.push_str("\x1b[0m\r\n");
            last = None;
        }

        out.push_str("\x1b[K\x1b[1m");
        // One column short of the edge: writing the last cell of the last row
        // can scroll the screen
        out.push_str(&status_line(overlay, cols.saturating_sub(1) as usize));
        out.push_str("\x1b[0m");

        let mut stdout = stdout();
        stdout.write_all(out.as_bytes())?;
        stdout.flush()
    }

    /// Drain terminal events until the poll window closes
    fn poll_events(&mut self) -> io::Result<DisplayControl> {
        let deadline = Instant::now() + self.poll;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !event::poll(remaining)? {
                return Ok(DisplayControl::Continue);
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => return Ok(DisplayControl::Exit),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(DisplayControl::Exit);
                    }
                    _ => {}
                },
                Event::Mouse(mouse) => {
                    let (col, row) = (mouse.column, mouse.row);
                    let pointer = match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => Some(PointerEvent::Down { col, row }),
                        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                            Some(PointerEvent::Moved { col, row })
                        }
                        MouseEventKind::Up(MouseButton::Left) => Some(PointerEvent::Up),
                        _ => None,
                    };
                    if let Some(pointer) = pointer {
                        let _ = self.pointer_tx.send(pointer);
                    }
                }
                Event::Resize(cols, rows) => {
                    self.cols = cols;
                    self.rows = rows;
                    execute!(stdout(), terminal::Clear(ClearType::All))?;
                    self.send_viewport();
                }
                Event::FocusLost => {
                    let _ = self.pointer_tx.send(PointerEvent::Up);
                }
                _ => {}
            }
        }
    }

    fn restore(&self) -> io::Result<()> {
        execute!(
            stdout(),
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }
}

impl DisplaySink for TerminalDisplay {
    fn present(&mut self, overlay: &Overlay<'_>) -> anyhow::Result<DisplayControl> {
        self.draw(overlay)?;
        Ok(self.poll_events()?)
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyboardConfig;
    use crate::layout::{KeyboardLayout, Point};

    fn overlay<'a>(
        keys: &'a [crate::layout::Key],
        highlight: Option<&'a str>,
        text: &'a str,
        tips: &'a [Point],
    ) -> Overlay<'a> {
        Overlay {
            width: 640,
            height: 480,
            keys,
            highlight,
            text,
            fingertips: tips,
            progress: Some(0.5),
            fps: Some(29.7),
        }
    }

    #[test]
    fn test_to_cell() {
        assert_eq!(to_cell(0, 640, 80), 0);
        assert_eq!(to_cell(93, 640, 80), 11);
        assert_eq!(to_cell(639, 640, 80), 79);
        assert_eq!(to_cell(-8, 640, 80), -1);
    }

    #[test]
    fn test_tail_fit() {
        assert_eq!(tail_fit("hello", 10), "hello");
        assert_eq!(tail_fit("hello world", 5), "world");
        assert_eq!(tail_fit("ab漢字", 4), "漢字");
        assert_eq!(tail_fit("ab漢字", 3), "字");
        assert_eq!(tail_fit("abc", 0), "");
    }

    #[test]
    fn test_keys_and_text_drawn() {
        let keys = KeyboardLayout::new(&KeyboardConfig::default()).compute(640, 480);
        let ov = overlay(&keys, None, "HELLO\nWORLD", &[]);
        let canvas = render_canvas(&ov, 160, 48);

        let text_rows: String = (0..48).map(|r| canvas.row_text(r)).collect::<Vec<_>>().join("\n");
        assert!(text_rows.contains("WORLD"));
        assert!(!text_rows.contains("HELLO"));
        for label in ["Q", "P", "ENTER", "SPACE", "DEL"] {
            assert!(text_rows.contains(label), "missing {}", label);
        }
    }

    #[test]
    fn test_highlighted_key_colored() {
        let keys = KeyboardLayout::new(&KeyboardConfig::default()).compute(640, 480);
        let q = keys.iter().find(|k| k.label == "Q").unwrap().rect;
        let ov = overlay(&keys, Some("Q"), "", &[]);
        let canvas = render_canvas(&ov, 160, 48);

        let col = to_cell(q.x, 640, 160) as usize;
        let row = to_cell(q.y, 480, 48) as usize;
        assert_eq!(canvas.get(col, row).unwrap().bg, Some(HIGHLIGHT_BG));

        let w = keys.iter().find(|k| k.label == "W").unwrap().rect;
        let col = to_cell(w.x, 640, 160) as usize;
        assert_eq!(canvas.get(col, row).unwrap().bg, Some(KEY_BG));
    }

    #[test]
    fn test_fingertip_marker() {
        let tips = [Point::new(320, 240)];
        let ov = overlay(&[], None, "", &tips);
        let canvas = render_canvas(&ov, 80, 24);
        assert_eq!(canvas.get(40, 12).unwrap().ch, '●');
    }

    #[test]
    fn test_offscreen_fingertip_ignored() {
        let tips = [Point::new(-50, 900)];
        let ov = overlay(&[], None, "", &tips);
        let canvas = render_canvas(&ov, 80, 24);
        assert!(!(0..24).any(|r| canvas.row_text(r).contains('●')));
    }

    #[test]
    fn test_status_line() {
        let ov = overlay(&[], Some("A"), "HI", &[]);
        let line = status_line(&ov, 200);
        assert!(line.contains("[||||    ]"));
        assert!(line.contains("FPS: 29"));
        assert!(line.contains("chars: 2"));
    }

    #[test]
    fn test_status_line_fits_terminal() {
        let ov = overlay(&[], Some("ENTER"), "HELLO", &[]);
        let full = status_line(&ov, 200);
        assert!(full.width() > 79);

        let line = status_line(&ov, 79);
        assert_eq!(line.width(), 79);
        assert!(full.starts_with(&line));
        assert_eq!(status_line(&ov, 0), "");
    }

    #[test]
    fn test_head_fit() {
        assert_eq!(head_fit("hello", 10), "hello");
        assert_eq!(head_fit("hello world", 5), "hello");
        assert_eq!(head_fit("漢字ab", 3), "漢");
        assert_eq!(head_fit("abc", 0), "");
    }

    #[test]
    fn test_wide_label_keeps_row_width() {
        let config = KeyboardConfig {
            rows: vec![vec!["漢".to_string(), "字字字字字".to_string(), "A".to_string()]],
            ..KeyboardConfig::default()
        };
        let keys = KeyboardLayout::new(&config).compute(640, 480);
        let ov = overlay(&keys, None, "", &[]);
        let canvas = render_canvas(&ov, 160, 48);

        let label_row = (0..48)
            .find(|&r| canvas.row_text(r).contains('漢'))
            .expect("wide label drawn");
        let text = canvas.row_text(label_row);
        assert_eq!(text.width(), 160);
        // 10-column key holds at most five double-width characters
        assert!(text.contains("字字字字字"));
        assert!(text.contains('A'));
    }

    #[test]
    fn test_overwriting_wide_char_blanks_its_tail() {
        let mut canvas = Canvas::new(6, 1);
        canvas.put_str(0, 0, "漢字", KEY_FG, None);
        assert_eq!(canvas.row_text(0), "漢字  ");

        canvas.set(1, 0, Cell { ch: '●', fg: TIP_FG, bg: None });
        assert_eq!(canvas.row_text(0), " ●字  ");
        assert_eq!(canvas.row_text(0).width(), 6);

        canvas.put_str(5, 0, "漢", KEY_FG, None);
        assert_eq!(canvas.row_text(0), " ●字  ");
    }
}
