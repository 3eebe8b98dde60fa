//! Fuzzy consolidation of per-contig hit locations.
//!
//! One reference database produces many overlapping partial hits around the
//! same genomic feature, with bounds jittered by a few coordinates between
//! rows. The builder walks the intervals recorded so far in arrival order and
//! folds a new pair into any interval whose bound differs by at most the
//! configured tolerance, so a fragmented gene collapses into one location
//! while back-to-back genes stay separate.
//!
//! The merge is order-sensitive by contract: the same pairs presented in a
//! different arrival order can produce a different final grouping. Callers
//! must feed pairs in original row order; the result is deterministic for a
//! fixed input order and must not be "fixed" by sorting.

use crate::common::HitRecord;
use rustc_hash::FxHashMap;

/// A consolidated location on a contig. Bounds are closed while building;
/// consumers treat the range as half-open [low, high).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub low: usize,
    pub high: usize,
}

/// Incremental location builder for a single contig.
///
/// Intervals are mutable only inside the builder; `finalize` freezes them
/// into the ordered list handed to the selector.
#[derive(Debug, Clone)]
pub struct LocationBuilder {
    tolerance: i64,
    intervals: Vec<Interval>,
}

impl LocationBuilder {
    pub fn new(tolerance: usize) -> Self {
        Self {
            tolerance: tolerance as i64,
            intervals: Vec::new(),
        }
    }

    /// Feed one observed `(low, high)` pair, in row-arrival order.
    ///
    /// Every recorded interval is visited in list order and the first
    /// matching rule is applied per interval; a single pair may therefore
    /// widen more than one interval. The pair is appended as a new location
    /// only if no rule fired anywhere.
    pub fn observe(&mut self, low: usize, high: usize) {
        let (low_i, high_i) = (low as i64, high as i64);
        let tolerance = self.tolerance;
        let within = move |d: i64| d >= 1 && d <= tolerance;
        let mut append = true;
        for spot in &mut self.intervals {
            let (a, b) = (spot.low as i64, spot.high as i64);
            if within(a - low_i) {
                // New hit starts slightly before this location: widen left
                spot.low = low;
                append = false;
            } else if within(high_i - b) {
                // New hit ends slightly after this location: widen right
                spot.high = high;
                append = false;
            } else if within(low_i - a) {
                // Starts slightly inside: already covered
                append = false;
            } else if within(b - high_i) {
                // Ends slightly short: already covered
                append = false;
            } else if low == spot.low && high == spot.high {
                // Exact duplicate
                append = false;
            }
        }
        if append {
            self.intervals.push(Interval { low, high });
        }
    }

    /// Freeze the builder into the final ordered location list.
    pub fn finalize(self) -> Vec<Interval> {
        self.intervals
    }
}

/// Consolidate hit locations for every contig of a sample.
///
/// Hits must arrive in original row order; contigs come back in first-seen
/// order with their finalized interval lists.
pub fn consolidate(hits: &[HitRecord], tolerance: usize) -> Vec<(String, Vec<Interval>)> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut builders: Vec<(String, LocationBuilder)> = Vec::new();
    for hit in hits {
        let slot = match index.get(hit.contig_id.as_str()) {
            Some(&slot) => slot,
            None => {
                builders.push((hit.contig_id.clone(), LocationBuilder::new(tolerance)));
                index.insert(hit.contig_id.as_str(), builders.len() - 1);
                builders.len() - 1
            }
        };
        builders[slot].1.observe(hit.low, hit.high);
    }
    builders
        .into_iter()
        .map(|(contig, builder)| (contig, builder.finalize()))
        .collect()
}
