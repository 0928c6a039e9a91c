//! Per-pixel-row aggregation over the window.
//!
//! The renderer hands this module a grid shape (columns of pixel rows); each
//! column maps to one bucket, newest on the right, and each pixel row to a
//! slice of that bucket's 900-second span. The output is pure color data; the
//! renderer owns everything about cells, escapes, and resizing.

use crate::colormap::{ColorRamp, Rgb};
use crate::window::{Window, BUCKET_SPAN_SECS, WINDOW_BUCKETS};

/// A healthy harvester runs a plot check roughly every 10 seconds.
pub const EXPECTED_CHECKS_PER_SEC: f64 = 0.1;

/// Gain applied before clamping, so nominal activity lands near the top of
/// the ramp without saturating it.
pub const ACHIEVED_GAIN: f64 = 0.7;

/// Dimming applied to alternating 4-bucket (one hour) bands.
pub const BAND_DIM: u16 = 200;

/// Cell color for a row that holds at least one proof, applied after banding
/// and regardless of the achieved ratio.
pub const PROOF_COLOR: Rgb = Rgb::new(0x40, 0x40, 0xff);

/// Colors for one column of the plot, top row first (start of the span).
///
/// `col` counts from the most recent bucket: column 0 is the newest. Columns
/// past the window yield an all-black column rather than an error, so the
/// renderer can be wider than the history.
pub fn column_pixels(window: &Window, col: usize, rows: usize, ramp: &ColorRamp) -> Vec<Rgb> {
    if col >= WINDOW_BUCKETS {
        return vec![Rgb::BLACK; rows];
    }
    let slot = WINDOW_BUCKETS - 1 - col;
    let lo = window.bucket(slot).lo();
    // Alternating hour bands give the eye a scale reference.
    let banded = (lo / BUCKET_SPAN_SECS / 4) & 1 == 1;
    (0..rows)
        .map(|y| row_pixel(window, slot, lo, y, rows, banded, ramp))
        .collect()
}

fn row_pixel(
    window: &Window,
    slot: usize,
    lo: i64,
    y: usize,
    rows: usize,
    banded: bool,
    ramp: &ColorRamp,
) -> Rgb {
    let h = rows as i64;
    let y = y as i64;
    // Extended range borrows one row-width from each neighbor, clamped at
    // the column edges; it smooths the check density across rows.
    let y0 = if y > 0 { y - 1 } else { y };
    let y1 = if y < h - 1 { y + 2 } else { y + 1 };
    let extended = lo + BUCKET_SPAN_SECS * y0 / h..lo + BUCKET_SPAN_SECS * y1 / h;
    let primary = lo + BUCKET_SPAN_SECS * y / h..lo + BUCKET_SPAN_SECS * (y + 1) / h;
    let span = (extended.end - extended.start) as f64;

    let stats = window.query(slot, primary, extended);

    let expected = span * EXPECTED_CHECKS_PER_SEC;
    let achieved = (ACHIEVED_GAIN * stats.checks as f64 / expected).clamp(0.0, 1.0);
    let mut color = ramp.color(achieved);
    if banded {
        color = color.dimmed(BAND_DIM);
    }
    if stats.proofs > 0 {
        color = PROOF_COLOR;
    }
    color
}
