//! Terminal renderer.
//!
//! Draws the window as a truecolor heat map: one terminal column per bucket
//! (newest at the right), two vertical pixels per cell via the upper-half
//! block glyph. The top line carries the legend, the bottom line a time-axis
//! caption ending in `NOW`. Raw mode plus the alternate screen are entered on
//! construction and restored on drop, so a panic unwinding through `main`
//! still leaves the terminal usable.

use crate::aggregate;
use crate::colormap::{ColorRamp, Rgb};
use crate::error::{Error, Result};
use crate::window::Window;
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, event, execute, queue};
use std::io::{IsTerminal, Stdout, Write};
use std::time::Duration;

/// Upper half block: fg paints the upper pixel, bg the lower one.
const HALF_BLOCK: char = '\u{2580}';

/// Legend entries, label colors matching the heat ramp and proof override.
const LEGEND: &[(Rgb, &str)] = &[
    (Rgb::new(0xf0, 0x00, 0x00), "RED: NO-HARVEST "),
    (Rgb::new(0xf0, 0xa0, 0x00), "ORA: UNDER-HARVEST "),
    (Rgb::new(0xf0, 0xf0, 0x00), "YLW: NOMINAL "),
    (aggregate::PROOF_COLOR, "BLU: PROOF"),
];

fn term_color(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// Owns the terminal for the process lifetime.
pub struct Grapher {
    out: Stdout,
    cols: u16,
    rows: u16,
    axis: String,
    /// High-water mark of the last rendered frame; drives redraw skipping.
    rendered_stamp: i64,
}

impl Grapher {
    /// Enter raw mode and the alternate screen. Fails with
    /// [`Error::NotATerminal`] when stdout is not a tty (exit code 2).
    pub fn new() -> Result<Self> {
        let mut out = std::io::stdout();
        if !out.is_terminal() {
            return Err(Error::NotATerminal);
        }
        let (cols, rows) = terminal::size().map_err(Error::Render)?;
        terminal::enable_raw_mode().map_err(Error::Render)?;
        execute!(out, EnterAlternateScreen, cursor::Hide, Clear(ClearType::All))
            .map_err(Error::Render)?;
        Ok(Self {
            out,
            cols,
            rows,
            axis: build_axis(cols),
            rendered_stamp: -1,
        })
    }

    /// Redraw if the window gained data since the last frame or the terminal
    /// was resized; otherwise a cheap no-op.
    pub fn draw(&mut self, window: &Window, ramp: &ColorRamp) -> Result<()> {
        let (cols, rows) = terminal::size().map_err(Error::Render)?;
        let resized = cols != self.cols || rows != self.rows;
        if resized {
            self.cols = cols;
            self.rows = rows;
            self.axis = build_axis(cols);
            execute!(self.out, Clear(ClearType::All)).map_err(Error::Render)?;
        }
        if !resized && window.high_water() <= self.rendered_stamp {
            return Ok(());
        }
        self.render_frame(window, ramp).map_err(Error::Render)?;
        self.rendered_stamp = window.high_water();
        Ok(())
    }

    fn render_frame(&mut self, window: &Window, ramp: &ColorRamp) -> std::io::Result<()> {
        let cols = self.cols as usize;
        let plot_rows = self.rows.saturating_sub(2) as usize;
        let px_rows = plot_rows * 2;
        let data_cols = cols.saturating_sub(2);

        queue!(self.out, cursor::MoveTo(0, 0), ResetColor)?;
        for &(color, label) in LEGEND {
            queue!(
                self.out,
                SetForegroundColor(term_color(color)),
                SetBackgroundColor(Color::Rgb { r: 0, g: 0, b: 0 }),
                Print(label)
            )?;
        }
        queue!(self.out, ResetColor, Clear(ClearType::UntilNewLine))?;

        // Column c of the window is drawn at x = cols-2-c, newest against the
        // right margin; x = 0 and x = cols-1 stay blank.
        let mut columns: Vec<Vec<Rgb>> = Vec::with_capacity(data_cols);
        for c in 0..data_cols {
            columns.push(aggregate::column_pixels(window, c, px_rows, ramp));
        }

        for row in 0..plot_rows {
            queue!(self.out, cursor::MoveTo(0, row as u16 + 1))?;
            let mut last: Option<(Rgb, Rgb)> = None;
            for x in 0..cols {
                let (upper, lower) = if x >= 1 && x < cols - 1 {
                    let c = cols - 2 - x;
                    match columns.get(c) {
                        Some(px) => (px[row * 2], px[row * 2 + 1]),
                        None => (Rgb::BLACK, Rgb::BLACK),
                    }
                } else {
                    (Rgb::BLACK, Rgb::BLACK)
                };
                // Skip redundant color escapes for runs of identical cells.
                if last != Some((upper, lower)) {
                    queue!(
                        self.out,
                        SetForegroundColor(term_color(upper)),
                        SetBackgroundColor(term_color(lower))
                    )?;
                    last = Some((upper, lower));
                }
                queue!(self.out, Print(HALF_BLOCK))?;
            }
        }

        queue!(
            self.out,
            ResetColor,
            cursor::MoveTo(0, self.rows.saturating_sub(1)),
            Print(&self.axis)
        )?;
        self.out.flush()
    }

    /// Non-blocking check for a quit key: `q`, `Q`, Esc, or Ctrl-C (raw mode
    /// swallows the signal). Resize events are consumed here and picked up by
    /// the size probe on the next [`Grapher::draw`].
    pub fn poll_quit(&mut self) -> Result<bool> {
        while event::poll(Duration::ZERO).map_err(Error::Render)? {
            let Event::Key(key) = event::read().map_err(Error::Render)? else {
                continue;
            };
            if key.kind == KeyEventKind::Release {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(true),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(true)
                }
                _ => {}
            }
        }
        Ok(false)
    }
}

impl Drop for Grapher {
    fn drop(&mut self) {
        let _ = execute!(self.out, ResetColor, cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Time-axis caption: `NOW` flush right, hour marks every four columns (one
/// hour of buckets), day marks beyond the first half day.
fn build_axis(cols: u16) -> String {
    let width = cols as usize;
    let mut axis = vec![b' '; width];
    if width >= 3 {
        axis[width - 3..].copy_from_slice(b"NOW");
    }
    let mut hour = 0usize;
    let mut x = width as i64 - 8;
    while x >= 0 {
        let label = if hour < 12 {
            format!("{:>2}h", hour + 1)
        } else if hour % 24 == 0 {
            format!("{}DAY", hour / 24)
        } else {
            String::new()
        };
        for (i, byte) in label.bytes().enumerate() {
            let pos = x as usize + i;
            if pos < width {
                axis[pos] = byte;
            }
        }
        x -= 4;
        hour += 1;
    }
    String::from_utf8(axis).unwrap_or_default()
}
