//! # Quote Computation
//!
//! The availability pricer: decides whether a candidate stay can be booked
//! and what it costs.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Quote Computation                                │
//! │                                                                         │
//! │  Candidate [start, end)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Bounds check (end > start)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. Segment walk over priced periods                                   │
//! │     cursor = start                                                     │
//! │     ├── period covering cursor? ──── no ──► NotFullyCovered            │
//! │     ├── currency matches first? ──── no ──► CurrencyMismatch           │
//! │     └── cursor = min(period.end, end); repeat until cursor == end      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. Reserved-reservation overlap check ──── hit ──► OverlapsReservation│
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Quote { nights, segments, nightly_price?, currency, total }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This is a pure function: callers load the room's periods and reservations
//! and hand them in. Persistence happens elsewhere, explicitly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{PricedPeriod, Reservation};

// =============================================================================
// Quote Result
// =============================================================================

/// One contiguous sub-range of a stay priced at a single nightly rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSegment {
    /// Half-open sub-range `[start, end)`.
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Nightly rate applied over this sub-range.
    pub nightly_price: Money,
    /// Number of nights in this sub-range.
    pub nights: i64,
}

/// A successful price breakdown for a candidate stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Total nights across all segments.
    pub nights: i64,

    /// Ordered pricing segments, one per priced period touched.
    pub segments: Vec<QuoteSegment>,

    /// The single nightly rate, if every segment shares one.
    /// `None` signals mixed pricing across segments.
    pub nightly_price: Option<Money>,

    /// Currency shared by every segment (mismatch is a hard error).
    pub currency: String,

    /// `sum(segment.nights × segment.rate) + add_on_total`.
    pub total: Money,
}

// =============================================================================
// Pricing
// =============================================================================

/// Computes a quote for a candidate stay `[start_date, end_date)`.
///
/// ## Arguments
/// * `periods` - the room's priced periods (any order; filtered and sorted here)
/// * `reservations` - the room's existing reservations (any status)
/// * `add_on_total` - pre-validated add-on charges to fold into the total
///
/// ## Rejections (typed, never retried)
/// * `InvalidDateRange` - `end_date <= start_date`
/// * `NotFullyCovered` - a gap of even one day between periods, or no period
///   at all; no gaps are tolerated even if both sides are open
/// * `CurrencyMismatch` - the spanned periods use more than one currency
/// * `OverlapsReservation` - strict overlap with a reserved-status reservation
///
/// ## Edge Cases
/// A 1-night stay spanning a period boundary where the next period starts
/// exactly the following day is valid (two one-night segments). Touching an
/// existing reservation (`existing.end == candidate.start`) is not overlap.
pub fn quote_stay(
    periods: &[PricedPeriod],
    reservations: &[Reservation],
    start_date: NaiveDate,
    end_date: NaiveDate,
    add_on_total: Money,
) -> Result<Quote, ValidationError> {
    if end_date <= start_date {
        return Err(ValidationError::InvalidDateRange {
            start: start_date,
            end: end_date,
        });
    }

    // Only periods touching the candidate range matter; sort by start so the
    // cursor walk below visits them in calendar order.
    let mut relevant: Vec<&PricedPeriod> = periods
        .iter()
        .filter(|p| p.start_date < end_date && p.end_date > start_date)
        .collect();
    relevant.sort_by_key(|p| p.start_date);

    let mut segments: Vec<QuoteSegment> = Vec::new();
    let mut currency: Option<&str> = None;
    let mut cursor = start_date;

    while cursor < end_date {
        // Coverage must be contiguous: the period covering `cursor` must
        // start exactly where the previous segment ended (or earlier).
        let period = relevant
            .iter()
            .find(|p| p.covers(cursor))
            .ok_or(ValidationError::NotFullyCovered)?;

        match currency {
            None => currency = Some(period.currency.as_str()),
            Some(first) if first != period.currency => {
                return Err(ValidationError::CurrencyMismatch {
                    first: first.to_string(),
                    second: period.currency.clone(),
                });
            }
            Some(_) => {}
        }

        let segment_end = period.end_date.min(end_date);
        segments.push(QuoteSegment {
            start: cursor,
            end: segment_end,
            nightly_price: period.nightly_price(),
            nights: (segment_end - cursor).num_days(),
        });
        cursor = segment_end;
    }

    // A reservation in a reserved status excludes the candidate range.
    let candidate_overlaps = reservations.iter().any(|r| {
        r.status.is_reserved() && r.start_date < end_date && r.end_date > start_date
    });
    if candidate_overlaps {
        return Err(ValidationError::OverlapsReservation);
    }

    let nights: i64 = segments.iter().map(|s| s.nights).sum();
    let stay_total = segments
        .iter()
        .fold(Money::zero(), |acc, s| acc + s.nightly_price.per_nights(s.nights));

    // Surface a single rate only when uniform; mixed pricing yields None.
    let first_rate = segments[0].nightly_price;
    let nightly_price = segments
        .iter()
        .all(|s| s.nightly_price == first_rate)
        .then_some(first_rate);

    Ok(Quote {
        nights,
        segments,
        nightly_price,
        // currency is Some: the walk above priced at least one night.
        currency: currency.unwrap_or_default().to_string(),
        total: stay_total + add_on_total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
