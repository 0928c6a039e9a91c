//! Harvester log line parsing.
//!
//! The harvester writes one line per plot check:
//!
//! ```text
//! 2021-05-13T09:14:35.538 harvester chia.harvester.harvester: INFO
//!     5 plots were eligible for farming abc123... Found 1 proofs. Time: 0.512 s. Total 36 plots
//! ```
//!
//! (a single line in the log; wrapped here for readability.)
//!
//! Almost everything else in the log comes from other subsystems, so
//! "does not match" is the common case and is not an error. The parser is a
//! pure function; duplicate/out-of-order rejection happens at insertion time
//! in [`crate::window::Window`].

use chrono::{Local, LocalResult, NaiveDateTime, TimeZone};
use regex::Regex;
use std::sync::OnceLock;

/// One plot-check event recovered from the log.
///
/// Timestamps are unix seconds. The harvester logs calendar stamps in local
/// time with millisecond precision; the fraction is truncated so an event has
/// whole-second resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarvestEvent {
    /// Unix timestamp, whole seconds, local-time interpretation of the stamp.
    pub stamp: i64,
    /// Number of plots that passed the plot filter for this check.
    pub eligible: u32,
    /// Number of proofs found (almost always 0).
    pub proofs: u32,
    /// How long the harvester spent on the check, in seconds.
    pub duration: f64,
}

fn line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})(?:\.\d+)? ",
            r"harvester chia\.harvester\.harvester: INFO\s+",
            r"(\d+) plots were eligible for farming (\S+) ",
            r"Found (\d+) proofs\. Time: (\d+(?:\.\d+)?) s\. Total (\d+) plots",
        ))
        .expect("valid regex")
    })
}

/// Parse one raw log line into a [`HarvestEvent`].
///
/// Returns `None` for every line that does not match the plot-check template,
/// including truncated or otherwise malformed variants of it. Matching is
/// whitespace-flexible after `INFO` because the harvester pads the level
/// column.
pub fn parse_line(line: &str) -> Option<HarvestEvent> {
    // Cheap prefilter; the full regex only runs on candidate lines.
    if !line.contains("plots were eligible") {
        return None;
    }
    let caps = line_regex().captures(line)?;
    let stamp = local_stamp(caps.get(1)?.as_str())?;
    let eligible = caps.get(2)?.as_str().parse().ok()?;
    let proofs = caps.get(4)?.as_str().parse().ok()?;
    let duration = caps.get(5)?.as_str().parse().ok()?;
    Some(HarvestEvent {
        stamp,
        eligible,
        proofs,
        duration,
    })
}

/// Interpret a `YYYY-MM-DDTHH:MM:SS` stamp as local time, like the harvester
/// that wrote it. An ambiguous stamp (DST fold) resolves to the earlier
/// instant; a nonexistent one (DST gap) is treated as non-matching.
fn local_stamp(text: &str) -> Option<i64> {
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").ok()?;
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.timestamp()),
        LocalResult::Ambiguous(earlier, _) => Some(earlier.timestamp()),
        LocalResult::None => None,
    }
}
