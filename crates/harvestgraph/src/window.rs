//! Sliding quarter-hour window over harvest activity.
//!
//! The window is the only aggregated state in the process: a ring of exactly
//! [`WINDOW_BUCKETS`] buckets, each covering a half-open 900-second span,
//! together forming a contiguous timeline whose newest bucket contains or
//! follows "now". It is built once at startup, owned by `main`, mutated only
//! through [`Window::insert`] and [`Window::advance`], and thrown away at
//! exit; history is rebuilt from log replay on the next run.
//!
//! Invariants, after any sequence of calls:
//! - exactly [`WINDOW_BUCKETS`] buckets exist;
//! - `bucket[i].hi == bucket[i + 1].lo` for every adjacent pair;
//! - every span is exactly [`BUCKET_SPAN_SECS`] seconds;
//! - the high-water mark never decreases.

use crate::event::HarvestEvent;
use std::collections::VecDeque;
use std::ops::Range;

/// Width of one bucket: a quarter hour.
pub const BUCKET_SPAN_SECS: i64 = 900;

/// Buckets kept in the window: a week of quarter-hours.
pub const WINDOW_BUCKETS: usize = 4 * 24 * 7;

/// Events retained per bucket. A healthy harvester checks ~6 times a minute;
/// 180 covers a worst case of 12 per minute for the full quarter-hour.
pub const BUCKET_CAPACITY: usize = 12 * 15;

/// One quarter-hour of recorded plot checks, spanning `[lo, hi)`.
#[derive(Debug, Clone)]
pub struct Bucket {
    lo: i64,
    hi: i64,
    events: Vec<HarvestEvent>,
}

impl Bucket {
    fn new(lo: i64) -> Self {
        Self {
            lo,
            hi: lo + BUCKET_SPAN_SECS,
            events: Vec::new(),
        }
    }

    /// Inclusive lower bound of the span (unix seconds).
    pub fn lo(&self) -> i64 {
        self.lo
    }

    /// Exclusive upper bound of the span (unix seconds).
    pub fn hi(&self) -> i64 {
        self.hi
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Recorded events in insertion order.
    pub fn events(&self) -> &[HarvestEvent] {
        &self.events
    }

    /// Append unless the bucket is at capacity.
    fn push(&mut self, event: HarvestEvent) -> bool {
        if self.events.len() >= BUCKET_CAPACITY {
            return false;
        }
        self.events.push(event);
        true
    }
}

/// Outcome of a single [`Window::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    /// Event appended to its owning bucket.
    Recorded,
    /// Timestamp at or before the high-water mark. Harvesters can log several
    /// checks within one second; everything past the first is rejected.
    Duplicate,
    /// Timestamp precedes the oldest bucket; nothing was mutated.
    TooOld,
    /// The owning bucket is full. The event is dropped (drop-newest) and the
    /// loss is visible through [`Window::dropped`].
    BucketFull,
}

/// Read-only statistics for one sub-range of a bucket, see [`Window::query`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeStats {
    /// Checks whose stamp falls in the extended sub-range.
    pub checks: u32,
    /// Eligible-plot sum over the primary sub-range.
    pub eligible: u32,
    /// Proof sum over the primary sub-range.
    pub proofs: u32,
}

/// The sliding window itself.
///
/// Backed by a ring so that [`Window::advance`] is O(1); catching up after
/// hours of downtime is a cheap loop, and a forward jump of at least
/// [`WINDOW_BUCKETS`] quarter-hours simply empties the window.
#[derive(Debug)]
pub struct Window {
    buckets: VecDeque<Bucket>,
    high_water: i64,
    recorded: u64,
    dropped: u64,
}

impl Window {
    /// Build a window whose newest bucket's upper bound is the first
    /// quarter-hour boundary strictly after `now` (unix seconds).
    pub fn new(now: i64) -> Self {
        let newest_hi = (now.div_euclid(BUCKET_SPAN_SECS) + 1) * BUCKET_SPAN_SECS;
        let mut buckets = VecDeque::with_capacity(WINDOW_BUCKETS);
        for i in 0..WINDOW_BUCKETS {
            let lo = newest_hi - BUCKET_SPAN_SECS * (WINDOW_BUCKETS - i) as i64;
            buckets.push_back(Bucket::new(lo));
        }
        Self {
            buckets,
            high_water: 0,
            recorded: 0,
            dropped: 0,
        }
    }

    /// Always [`WINDOW_BUCKETS`].
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Bucket at `slot`, 0 = oldest. Panics if `slot >= WINDOW_BUCKETS`.
    pub fn bucket(&self, slot: usize) -> &Bucket {
        &self.buckets[slot]
    }

    /// Oldest-to-newest iteration.
    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    /// Latest accepted event timestamp; 0 until the first event.
    pub fn high_water(&self) -> i64 {
        self.high_water
    }

    /// Total events recorded since startup.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    /// Events lost to full buckets since startup.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn oldest_lo(&self) -> i64 {
        self.buckets[0].lo
    }

    fn newest_hi(&self) -> i64 {
        self.buckets[WINDOW_BUCKETS - 1].hi
    }

    /// Slide forward one quarter-hour: evict the oldest bucket, append a
    /// fresh one continuing exactly where the previous newest ended.
    pub fn advance(&mut self) {
        let next_lo = self.newest_hi();
        self.buckets.pop_front();
        self.buckets.push_back(Bucket::new(next_lo));
    }

    /// Owning slot for a stamp known to lie inside the window. Computed from
    /// the offset against the newest bound, never a search.
    fn slot_of(&self, stamp: i64) -> usize {
        let d = stamp - self.newest_hi();
        debug_assert!(d < 0);
        (WINDOW_BUCKETS as i64 + d.div_euclid(BUCKET_SPAN_SECS)) as usize
    }

    /// Record one event. See [`Insert`] for the possible outcomes.
    ///
    /// A stamp at or past the newest bound first advances the window until it
    /// fits, so replay after downtime and forward clock jumps need no special
    /// casing. `TooOld` leaves the high-water mark untouched; every other
    /// accepted stamp advances it, including `BucketFull` (the event was
    /// seen, it just could not be kept).
    pub fn insert(&mut self, event: HarvestEvent) -> Insert {
        if event.stamp <= self.high_water {
            return Insert::Duplicate;
        }
        while event.stamp >= self.newest_hi() {
            self.advance();
        }
        if event.stamp < self.oldest_lo() {
            return Insert::TooOld;
        }
        self.high_water = event.stamp;
        let slot = self.slot_of(event.stamp);
        if self.buckets[slot].push(event) {
            self.recorded += 1;
            Insert::Recorded
        } else {
            self.dropped += 1;
            Insert::BucketFull
        }
    }

    /// Read-only range statistics over one bucket.
    ///
    /// `checks` counts events in `extended` (the smoothing range, one row
    /// wider on each side than `primary`); `eligible` and `proofs` are exact
    /// sums over `primary`. O(bucket length), which is at most
    /// [`BUCKET_CAPACITY`].
    pub fn query(&self, slot: usize, primary: Range<i64>, extended: Range<i64>) -> RangeStats {
        let mut stats = RangeStats::default();
        for event in self.buckets[slot].events() {
            if extended.contains(&event.stamp) {
                stats.checks += 1;
            }
            if primary.contains(&event.stamp) {
                stats.eligible += event.eligible;
                stats.proofs += event.proofs;
            }
        }
        stats
    }
}
