//! Property tests for the sliding window.
//!
//! The shape invariants must hold after any sequence of inserts and
//! advances: exactly WINDOW_BUCKETS buckets, contiguous, 900 seconds each,
//! with a monotonically non-decreasing high-water mark.

use harvestgraph::event::HarvestEvent;
use harvestgraph::window::{Window, BUCKET_CAPACITY, BUCKET_SPAN_SECS, WINDOW_BUCKETS};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

fn assert_shape(w: &Window) -> Result<(), TestCaseError> {
    prop_assert_eq!(w.len(), WINDOW_BUCKETS);
    let mut prev_hi = None;
    for b in w.buckets() {
        prop_assert_eq!(b.hi() - b.lo(), BUCKET_SPAN_SECS);
        if let Some(hi) = prev_hi {
            prop_assert_eq!(b.lo(), hi);
        }
        prev_hi = Some(b.hi());
        prop_assert!(b.len() <= BUCKET_CAPACITY);
    }
    Ok(())
}

proptest! {
    #[test]
    fn shape_survives_any_insert_sequence(
        start in 1_500_000_000i64..1_900_000_000,
        deltas in prop::collection::vec(-5_000i64..50_000, 1..200),
    ) {
        let mut w = Window::new(start);
        assert_shape(&w)?;
        // Begin mid-window; negative deltas exercise the rejection paths.
        let mut stamp = start - (WINDOW_BUCKETS as i64 / 2) * BUCKET_SPAN_SECS;
        let mut prev_mark = w.high_water();
        for d in deltas {
            stamp += d;
            let _ = w.insert(HarvestEvent {
                stamp,
                eligible: 2,
                proofs: 0,
                duration: 0.05,
            });
            assert_shape(&w)?;
            prop_assert!(w.high_water() >= prev_mark);
            prev_mark = w.high_water();
        }
    }

    #[test]
    fn advance_keeps_the_timeline_contiguous(
        start in 1_500_000_000i64..1_900_000_000,
        steps in 1usize..2_000,
    ) {
        let mut w = Window::new(start);
        let first_newest_hi = w.bucket(WINDOW_BUCKETS - 1).hi();
        for _ in 0..steps {
            w.advance();
        }
        assert_shape(&w)?;
        prop_assert_eq!(
            w.bucket(WINDOW_BUCKETS - 1).hi(),
            first_newest_hi + steps as i64 * BUCKET_SPAN_SECS
        );
    }

    #[test]
    fn strictly_increasing_stamps_are_all_observed(
        start in 1_500_000_000i64..1_900_000_000,
        gaps in prop::collection::vec(5i64..3_000, 1..200),
    ) {
        let mut w = Window::new(start);
        let mut stamp = start;
        let mut seen = 0u64;
        for g in gaps {
            stamp += g;
            let _ = w.insert(HarvestEvent {
                stamp,
                eligible: 1,
                proofs: 0,
                duration: 0.01,
            });
            seen += 1;
            prop_assert_eq!(w.high_water(), stamp);
        }
        // Spacing of at least 5s can put at most 180 events in one bucket,
        // which is exactly capacity; nothing may be dropped.
        prop_assert_eq!(w.recorded() + w.dropped(), seen);
        prop_assert_eq!(w.dropped(), 0);
    }
}
