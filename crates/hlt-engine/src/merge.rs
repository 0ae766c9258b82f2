//! Joining nearby clip intervals.

use hlt_models::ClipInterval;

/// Merge consecutive intervals whose gap is at most `join_threshold`.
///
/// Input is expected in event order. The result has strictly increasing
/// starts, every adjacent gap is greater than the threshold, and a second
/// pass changes nothing. A merged interval keeps the label of its first
/// member.
pub fn merge_intervals(intervals: Vec<ClipInterval>, join_threshold: f64) -> Vec<ClipInterval> {
    let mut merged: Vec<ClipInterval> = Vec::with_capacity(intervals.len());

    for interval in intervals {
        match merged.last_mut() {
            Some(current) if current.gap_to(&interval) <= join_threshold => current.absorb(interval),
            _ => merged.push(interval),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_within_threshold() {
        let merged = merge_intervals(
            vec![
                ClipInterval::new(90.0, 104.0, "Chess"),
                ClipInterval::new(100.0, 114.0, "Chess"),
                ClipInterval::new(140.0, 154.0, "Chess"),
            ],
            30.0,
        );

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, 90.0);
        assert_eq!(merged[0].end, 154.0);
        assert_eq!(merged[0].label, "Chess");
    }

    #[test]
    fn test_keeps_distant_intervals() {
        let merged = merge_intervals(
            vec![ClipInterval::new(0.0, 10.0, "A"), ClipInterval::new(41.0, 50.0, "B")],
            30.0,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_gap_equal_to_threshold_merges() {
        let merged = merge_intervals(
            vec![ClipInterval::new(0.0, 10.0, "A"), ClipInterval::new(40.0, 50.0, "B")],
            30.0,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].label, "A");
        assert_eq!(merged[0].marks.len(), 2);
    }

    #[test]
    fn test_chain_merges_transitively() {
        let intervals: Vec<_> = (0..10)
            .map(|i| ClipInterval::new(i as f64 * 20.0, i as f64 * 20.0 + 14.0, ""))
            .collect();
        let merged = merge_intervals(intervals, 30.0);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].end, 194.0);
    }

    #[test]
    fn test_idempotent() {
        let intervals = vec![
            ClipInterval::new(0.0, 14.0, "A"),
            ClipInterval::new(20.0, 34.0, "A"),
            ClipInterval::new(100.0, 114.0, "B"),
            ClipInterval::new(300.0, 314.0, "C"),
            ClipInterval::new(330.0, 344.0, "C"),
        ];

        let once = merge_intervals(intervals, 30.0);
        let twice = merge_intervals(once.clone(), 30.0);

        assert_eq!(once, twice);
        assert!(once.windows(2).all(|w| w[1].start - w[0].end > 30.0));
        assert!(once.windows(2).all(|w| w[0].start < w[1].start));
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_intervals(Vec::new(), 30.0).is_empty());
    }
}
