//! Best-hit selection over consolidated locations.

use crate::common::HitRecord;
use crate::consolidate::Interval;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;

/// Final selection for one sample.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Winning records, one per selected location, in location order.
    pub winners: Vec<HitRecord>,
    /// Gene identity to percent identity; unique per sample by construction.
    pub identities: FxHashMap<String, f64>,
}

/// Pick the single best hit for each consolidated location.
///
/// A record is grouped under every location its half-open `[low, high)`
/// range intersects. Within a group the highest percent identity wins, ties
/// broken by first arrival in the row stream. A target that already won
/// elsewhere in the sample is passed over in favor of the next-highest free
/// candidate; a location with no free candidate is left unselected.
pub fn select_best(hits: &[HitRecord], locations: &[(String, Vec<Interval>)]) -> Selection {
    let mut selection = Selection::default();
    let mut taken: FxHashSet<&str> = FxHashSet::default();

    for (contig, intervals) in locations {
        for location in intervals {
            let mut group: Vec<&HitRecord> = hits
                .iter()
                .filter(|hit| {
                    hit.contig_id == *contig && hit.overlaps(location.low, location.high)
                })
                .collect();
            group.sort_by(|a, b| {
                b.percent_identity
                    .partial_cmp(&a.percent_identity)
                    .unwrap_or(Ordering::Equal)
                    .then(a.row_index.cmp(&b.row_index))
            });

            if let Some(winner) = group
                .into_iter()
                .find(|hit| !taken.contains(hit.target_id.as_str()))
            {
                taken.insert(winner.target_id.as_str());
                selection
                    .identities
                    .insert(winner.target_id.clone(), winner.percent_identity);
                selection.winners.push(winner.clone());
            }
        }
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Orientation;
    use crate::consolidate::consolidate;

    fn make_hit(
        contig: &str,
        target: &str,
        low: usize,
        high: usize,
        identity: f64,
        row_index: u32,
    ) -> HitRecord {
        HitRecord {
            contig_id: contig.to_string(),
            target_id: target.to_string(),
            low,
            high,
            percent_identity: identity,
            alignment_fraction: 100.0,
            bit_score: 500.0,
            orientation: Orientation::Forward,
            sequence: b"ATGAAA".to_vec(),
            row_index,
        }
    }

    #[test]
    fn test_highest_identity_wins() {
        let hits = vec![
            make_hit("c1", "blaTEM-1", 100, 500, 92.5, 0),
            make_hit("c1", "blaTEM-2", 105, 520, 99.1, 1),
        ];
        let locations = consolidate(&hits, 100);
        let selection = select_best(&hits, &locations);
        assert_eq!(selection.winners.len(), 1);
        assert_eq!(selection.winners[0].target_id, "blaTEM-2");
        assert_eq!(selection.identities["blaTEM-2"], 99.1);
    }

    #[test]
    fn test_tie_breaks_by_arrival_order() {
        let hits = vec![
            make_hit("c1", "allele_2", 100, 500, 98.0, 0),
            make_hit("c1", "allele_1", 100, 500, 98.0, 1),
        ];
        let locations = consolidate(&hits, 100);
        let selection = select_best(&hits, &locations);
        assert_eq!(selection.winners.len(), 1);
        assert_eq!(selection.winners[0].target_id, "allele_2");
    }

    #[test]
    fn test_back_to_back_genes_yield_two_winners() {
        // Half-open ranges: the shared boundary 3393 belongs to strA only
        let hits = vec![
            make_hit("c1", "strB", 2557, 3393, 99.0, 0),
            make_hit("c1", "strA", 3393, 4196, 98.5, 1),
        ];
        let locations = consolidate(&hits, 100);
        let selection = select_best(&hits, &locations);
        assert_eq!(selection.winners.len(), 2);
        assert_eq!(selection.winners[0].target_id, "strB");
        assert_eq!(selection.winners[1].target_id, "strA");
    }

    #[test]
    fn test_target_never_selected_twice() {
        // The same gene wins the first location; the second location must
        // fall through to the runner-up
        let hits = vec![
            make_hit("c1", "aph(6)-Id", 100, 500, 99.0, 0),
            make_hit("c1", "aph(6)-Id", 1000, 1500, 98.0, 1),
            make_hit("c1", "aph(3'')-Ib", 1000, 1500, 95.0, 2),
        ];
        let locations = consolidate(&hits, 100);
        let selection = select_best(&hits, &locations);
        assert_eq!(selection.winners.len(), 2);
        assert_eq!(selection.winners[0].target_id, "aph(6)-Id");
        assert_eq!(selection.winners[1].target_id, "aph(3'')-Ib");
        assert_eq!(selection.identities.len(), 2);
    }

    #[test]
    fn test_location_left_unselected_without_free_candidate() {
        let hits = vec![
            make_hit("c1", "sul1", 100, 500, 99.0, 0),
            make_hit("c1", "sul1", 1000, 1500, 98.0, 1),
        ];
        let locations = consolidate(&hits, 100);
        let selection = select_best(&hits, &locations);
        assert_eq!(selection.winners.len(), 1);
        assert_eq!(selection.winners[0].low, 100);
    }

    #[test]
    fn test_uniqueness_holds_across_contigs() {
        let hits = vec![
            make_hit("c1", "tetA", 100, 500, 99.0, 0),
            make_hit("c2", "tetA", 200, 600, 98.0, 1),
        ];
        let locations = consolidate(&hits, 100);
        let selection = select_best(&hits, &locations);
        assert_eq!(selection.winners.len(), 1);
        assert_eq!(selection.winners[0].contig_id, "c1");
    }

    #[test]
    fn test_no_hits_yield_empty_selection() {
        let selection = select_best(&[], &[]);
        assert!(selection.winners.is_empty());
        assert!(selection.identities.is_empty());
    }
}
