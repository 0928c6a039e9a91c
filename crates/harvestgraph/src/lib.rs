//! Harvestgraph library.
//!
//! Tails the rotating log of a Chia harvester and aggregates plot-check
//! events into a sliding week of quarter-hour buckets, rendered as a
//! terminal heat map. The pieces, leaves first:
//!
//! - [`event`]: one raw log line in, one structured event (or nothing) out.
//! - [`window`]: the sliding bucket store; owns all aggregated history.
//! - [`tail`]: log handles, startup replay, rotation handling.
//! - [`aggregate`]: read-only per-pixel-row statistics and colors.
//! - [`colormap`], [`render`]: ramps and the crossterm frontend.
//!
//! The binary entry point is in `main.rs`.

pub mod aggregate;
pub mod colormap;
pub mod error;
pub mod event;
pub mod exit_codes;
pub mod logging;
pub mod render;
pub mod tail;
pub mod window;

pub use error::{Error, Result};
