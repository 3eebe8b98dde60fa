//! Screening configuration.
//!
//! One `ScreenConfig` value is built at startup and threaded through every
//! component, so the program mode and thresholds are decided in exactly one
//! place instead of being re-derived at each call site.

use clap::ValueEnum;

/// Default fuzzy-merge tolerance in base pairs. Downstream consumers depend
/// on this value; change it only behind an explicit flag.
pub const DEFAULT_TOLERANCE: usize = 100;

/// Default percent-identity cutoff applied while parsing rows.
pub const DEFAULT_CUTOFF: f64 = 70.0;

/// BLAST program that produced the report rows.
///
/// The program decides three things: how the reported subject length scales
/// to residues, whether the aligned query sequence is nucleotide, and whether
/// the reference targets need codon trimming and translation before protein
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Program {
    Blastn,
    Blastp,
    Blastx,
    Tblastn,
    Tblastx,
}

impl Program {
    /// Divisor applied to the reported subject length. Same-alphabet searches
    /// report it directly; translated searches report it in nucleotides,
    /// three per residue.
    pub fn subject_length_scale(self) -> f64 {
        match self {
            Program::Blastn | Program::Blastp | Program::Blastx => 1.0,
            Program::Tblastn | Program::Tblastx => 3.0,
        }
    }

    /// Whether the aligned query sequence in the report is nucleotide.
    pub fn query_is_nucleotide(self) -> bool {
        matches!(self, Program::Blastn)
    }

    /// Whether the reference target sequences are nucleotide and must be
    /// codon-trimmed and translated before protein-level comparison.
    pub fn reference_is_nucleotide(self) -> bool {
        matches!(self, Program::Blastn | Program::Tblastn | Program::Tblastx)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Program::Blastn => "blastn",
            Program::Blastp => "blastp",
            Program::Blastx => "blastx",
            Program::Tblastn => "tblastn",
            Program::Tblastx => "tblastx",
        }
    }
}

/// Configuration shared by the parser, consolidator and selector.
#[derive(Debug, Clone, Copy)]
pub struct ScreenConfig {
    pub program: Program,
    /// Percent-identity cutoff; rows below it are dropped at parse time.
    pub cutoff: f64,
    /// Maximum coordinate jitter merged into an existing location.
    pub tolerance: usize,
}

impl ScreenConfig {
    pub fn new(program: Program) -> Self {
        Self {
            program,
            cutoff: DEFAULT_CUTOFF,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self::new(Program::Blastn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_length_scale() {
        assert_eq!(Program::Blastn.subject_length_scale(), 1.0);
        assert_eq!(Program::Blastx.subject_length_scale(), 1.0);
        assert_eq!(Program::Tblastn.subject_length_scale(), 3.0);
        assert_eq!(Program::Tblastx.subject_length_scale(), 3.0);
    }

    #[test]
    fn test_reference_alphabet() {
        assert!(Program::Blastn.reference_is_nucleotide());
        assert!(Program::Tblastx.reference_is_nucleotide());
        assert!(!Program::Blastp.reference_is_nucleotide());
        assert!(!Program::Blastx.reference_is_nucleotide());
    }
}
