use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A half-open stay interval `[start, end)`: the checkout day is excluded,
/// so back-to-back stays sharing a checkout/check-in day do not collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Returns `None` unless `start < end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of nights covered by the interval. Always ≥ 1.
    pub fn nights(&self) -> u32 {
        (self.end - self.start).num_days() as u32
    }

    /// Half-open overlap: `a.start < b.end && a.end > b.start`.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && self.end > other.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_rejects_inverted_and_empty_ranges() {
        assert!(DateRange::new(d(2025, 8, 3), d(2025, 8, 1)).is_none());
        assert!(DateRange::new(d(2025, 8, 1), d(2025, 8, 1)).is_none());
    }

    #[test]
    fn test_nights() {
        let range = DateRange::new(d(2025, 8, 1), d(2025, 8, 3)).unwrap();
        assert_eq!(range.nights(), 2);
    }

    #[test]
    fn test_overlap_is_half_open() {
        let first = DateRange::new(d(2025, 8, 1), d(2025, 8, 3)).unwrap();
        let second = DateRange::new(d(2025, 8, 2), d(2025, 8, 4)).unwrap();
        assert!(first.overlaps(&second));
        assert!(second.overlaps(&first));

        // Shared boundary: checkout day equals the next check-in. No conflict.
        let back_to_back = DateRange::new(d(2025, 8, 3), d(2025, 8, 5)).unwrap();
        assert!(!first.overlaps(&back_to_back));

        let disjoint = DateRange::new(d(2025, 9, 1), d(2025, 9, 5)).unwrap();
        assert!(!first.overlaps(&disjoint));
    }

    #[test]
    fn test_containment_overlaps() {
        let outer = DateRange::new(d(2025, 8, 1), d(2025, 8, 10)).unwrap();
        let inner = DateRange::new(d(2025, 8, 4), d(2025, 8, 5)).unwrap();
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }
}
