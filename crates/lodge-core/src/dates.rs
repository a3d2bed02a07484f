//! # Date Interval Algebra
//!
//! Calendar-date intervals and normalized sets of them.
//!
//! ## Two Conventions, One Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HALF-OPEN vs INCLUSIVE                                                 │
//! │                                                                         │
//! │  Storage + engine:   [start, end)   end exclusive                       │
//! │    A stay Jan 10 → Jan 12 occupies the nights of the 10th and 11th.    │
//! │    Adjacency is exact: [10,12) and [12,15) touch without overlapping.  │
//! │                                                                         │
//! │  DateRangeSet:       [from, to]     both inclusive                      │
//! │    Calendar presentation works in inclusive days; converting from the  │
//! │    half-open form subtracts one day from the exclusive end.            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `DateRangeSet` operation returns a fully normalized set (sorted,
//! merged, non-overlapping), so callers may chain `intersect`/`subtract`
//! without re-normalizing.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// =============================================================================
// DateInterval
// =============================================================================

/// A half-open calendar interval `[start, end)`.
///
/// Invariant: `end > start` (at least one night).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateInterval {
    /// Creates an interval, rejecting empty or inverted bounds.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(DateInterval { start, end })
    }

    /// Number of nights covered (days between start and end).
    #[inline]
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Strict open-interval overlap test:
    /// `self.start < other.end AND self.end > other.start`.
    ///
    /// Touching intervals ([10,12) vs [12,15)) do NOT overlap.
    #[inline]
    pub fn overlaps(&self, other: &DateInterval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Whether a single date falls inside the interval.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Whether `other` lies fully within `self`.
    #[inline]
    pub fn encloses(&self, other: &DateInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

// =============================================================================
// DateRange (inclusive export form)
// =============================================================================

/// An inclusive `{from, to}` pair, used to export a [`DateRangeSet`] for
/// presentation (availability calendars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

// =============================================================================
// DateRangeSet
// =============================================================================

/// A normalized set of inclusive date ranges.
///
/// Normalization guarantees, maintained by every constructor and operation:
/// - ranges sorted by start date
/// - no two ranges overlap
/// - ranges separated by a gap of ≤ 1 day are merged into one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateRangeSet {
    // Inclusive (from, to) pairs.
    pairs: Vec<(NaiveDate, NaiveDate)>,
}

impl DateRangeSet {
    /// Builds a set from raw inclusive pairs.
    ///
    /// Pairs with `to < from` are dropped (`to == from` is a valid one-day
    /// range). Remaining pairs are sorted and merged: two pairs separated by
    /// zero uncovered days collapse into one.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use lodge_core::dates::DateRangeSet;
    ///
    /// let d = |day| NaiveDate::from_ymd_opt(2026, 1, day).unwrap();
    /// let set = DateRangeSet::from_pairs(vec![(d(5), d(8)), (d(9), d(12)), (d(20), d(22))]);
    /// // Jan 5-8 and Jan 9-12 are adjacent, so they merge.
    /// assert_eq!(set.as_pairs(), &[(d(5), d(12)), (d(20), d(22))]);
    /// ```
    pub fn from_pairs(pairs: Vec<(NaiveDate, NaiveDate)>) -> Self {
        let mut normalized: Vec<(NaiveDate, NaiveDate)> =
            pairs.into_iter().filter(|(from, to)| to >= from).collect();
        normalized.sort_by_key(|(from, _)| *from);

        let mut merged: Vec<(NaiveDate, NaiveDate)> = Vec::with_capacity(normalized.len());
        for (from, to) in normalized {
            match merged.last_mut() {
                Some((_, last_to)) if next_day(*last_to) >= from => {
                    if to > *last_to {
                        *last_to = to;
                    }
                }
                _ => merged.push((from, to)),
            }
        }

        DateRangeSet { pairs: merged }
    }

    /// Builds a set from half-open intervals, converting exclusive ends to
    /// inclusive ones (one day back).
    pub fn from_intervals<I>(intervals: I) -> Self
    where
        I: IntoIterator<Item = DateInterval>,
    {
        let pairs = intervals
            .into_iter()
            .map(|iv| (iv.start, prev_day(iv.end)))
            .collect();
        Self::from_pairs(pairs)
    }

    /// Whether the set contains no ranges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The internal sorted inclusive pairs.
    #[inline]
    pub fn as_pairs(&self) -> &[(NaiveDate, NaiveDate)] {
        &self.pairs
    }

    /// Intersection of two sets: the days present in both.
    ///
    /// Classic sorted two-pointer merge. An empty input on either side
    /// yields an empty output.
    pub fn intersect(&self, other: &DateRangeSet) -> DateRangeSet {
        let a = &self.pairs;
        let b = &other.pairs;

        let mut i = 0;
        let mut j = 0;
        let mut out = Vec::new();

        while i < a.len() && j < b.len() {
            let (a_from, a_to) = a[i];
            let (b_from, b_to) = b[j];

            let from = a_from.max(b_from);
            let to = a_to.min(b_to);
            if to >= from {
                out.push((from, to));
            }

            if a_to < b_to {
                i += 1;
            } else {
                j += 1;
            }
        }

        // Intersection of normalized inputs cannot create overlaps or
        // mergeable adjacency, so the output is already normalized.
        DateRangeSet { pairs: out }
    }

    /// Difference: the days of `self` not covered by `other`.
    ///
    /// For each range in `self`, walks the overlapping ranges of `other` in
    /// sorted order and emits the uncovered remainders. Ranges of `other`
    /// entirely outside `self` are skipped.
    pub fn subtract(&self, other: &DateRangeSet) -> DateRangeSet {
        let mut result = Vec::new();

        for &(from, to) in &self.pairs {
            let mut cursor = from;
            let mut consumed = false;

            for &(o_from, o_to) in &other.pairs {
                if o_to < cursor {
                    continue;
                }
                if o_from > to {
                    break;
                }

                if o_from > cursor {
                    result.push((cursor, prev_day(o_from).min(to)));
                }

                cursor = cursor.max(next_day(o_to));
                if cursor > to {
                    consumed = true;
                    break;
                }
            }

            if !consumed && cursor <= to {
                result.push((cursor, to));
            }
        }

        Self::from_pairs(result)
    }

    /// Exports the set as inclusive `{from, to}` ranges for presentation.
    pub fn to_range_list(&self) -> Vec<DateRange> {
        self.pairs
            .iter()
            .map(|&(from, to)| DateRange { from, to })
            .collect()
    }
}

#[inline]
fn next_day(date: NaiveDate) -> NaiveDate {
    // NaiveDate covers ±262000 years; adding one day cannot fail for any
    // date this system handles.
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

#[inline]
fn prev_day(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(1)).unwrap_or(date)
}

// =============================================================================
// Unit Tests
// =============================================================================
