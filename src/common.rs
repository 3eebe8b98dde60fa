use std::fmt;

/// Strand orientation of a hit relative to the reference target,
/// derived from the subject start/end comparison in the report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Forward,
    Reverse,
}

/// One scored alignment hit derived from a single report row.
///
/// Immutable once built by the parser: every derived value (bounds, identity,
/// orientation, sequence) is fixed here and never touched downstream.
#[derive(Debug, Clone)]
pub struct HitRecord {
    /// Contig the hit landed on.
    pub contig_id: String,
    /// Gene/allele identifier of the reference target.
    pub target_id: String,
    /// Lower genomic bound on the contig; the range is half-open [low, high).
    pub low: usize,
    /// Upper genomic bound, excluded from the range.
    pub high: usize,
    /// (positives - gaps) / effective subject length, as a percentage.
    pub percent_identity: f64,
    /// Alignment length over effective subject length, as a percentage.
    pub alignment_fraction: f64,
    pub bit_score: f64,
    pub orientation: Orientation,
    /// Aligned query sequence, reverse-complemented for reverse hits so it
    /// always reads in the reference orientation. May contain `-` gaps.
    pub sequence: Vec<u8>,
    /// Position of the source row in the report. Consolidation and
    /// tie-breaking depend on original row order, so parallel readers must
    /// preserve this tag.
    pub row_index: u32,
}

impl HitRecord {
    /// Half-open intersection test against a consolidated location.
    ///
    /// `high` is excluded on both sides, so back-to-back genes sharing a
    /// single boundary coordinate do not count as overlapping.
    pub fn overlaps(&self, low: usize, high: usize) -> bool {
        self.low < high && low < self.high
    }

    /// Slim projection of a winning hit for reporting layers.
    pub fn summary(&self) -> HitSummary {
        HitSummary {
            target_id: self.target_id.clone(),
            percent_identity: self.percent_identity,
            alignment_fraction: self.alignment_fraction,
            contig_id: self.contig_id.clone(),
            location: format!("{}..{}", self.low, self.high),
        }
    }
}

/// Reporting view of a winning hit.
///
/// Built explicitly from the full record so consumers that want a slim
/// representation never strip fields off a live `HitRecord`.
#[derive(Debug, Clone)]
pub struct HitSummary {
    pub target_id: String,
    pub percent_identity: f64,
    pub alignment_fraction: f64,
    pub contig_id: String,
    pub location: String,
}

impl fmt::Display for HitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.target_id,
            self.percent_identity,
            self.alignment_fraction,
            self.contig_id,
            self.location
        )
    }
}

/// Round to two decimal places, the precision carried by report percentages.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
