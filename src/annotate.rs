//! Codon-aware alignment annotation for inexact winners.
//!
//! Winning hits below 100% identity are re-aligned against their reference
//! target so reports can show where the sample diverges: an interleaved
//! BLAST-style alignment block at the nucleotide level (nucleotide searches
//! only) and at the protein level, plus the 0-based positions of every
//! mismatch.

use crate::common::round2;
use crate::config::Program;
use crate::error::ScreenError;
use crate::utils::genetic_code::{translate, trim_to_codon};
use bio::alignment::pairwise::Aligner;
use bio::alignment::AlignmentOperation;

// Relative scoring carried over from the upstream pipeline (match 1,
// mismatch 0, gap open -1, gap extend -0.1), scaled by ten to integers.
const MATCH_SCORE: i32 = 10;
const MISMATCH_SCORE: i32 = 0;
const GAP_OPEN: i32 = -10;
const GAP_EXTEND: i32 = -1;

/// Columns per interleaved alignment block.
const BLOCK_WIDTH: usize = 60;

/// Mismatch positions recorded per SNP-index line.
const SNPS_PER_LINE: usize = 11;

/// Reference-aligned annotation attached to one winning hit.
#[derive(Debug, Clone)]
pub struct AlignmentRecord {
    /// Gap-stripped, codon-trimmed nucleotide sequence of the hit.
    /// Empty for protein-level searches.
    pub nt_sequence: Vec<u8>,
    /// Protein sequence of the hit.
    pub aa_sequence: Vec<u8>,
    /// Interleaved nucleotide alignment text (nucleotide searches only).
    pub nt_alignment: Option<String>,
    /// 0-based nucleotide mismatch positions (nucleotide searches only).
    pub nt_snp_index: Option<String>,
    /// Interleaved protein alignment text.
    pub aa_alignment: String,
    /// 0-based protein mismatch positions.
    pub aa_snp_index: String,
    /// Protein-level identity over the full alignment, two decimals.
    pub aa_identity: f64,
}

/// A local pairwise alignment rendered as equal-length, gap-padded strings
/// spanning both full sequences, unaligned flanks included.
struct PaddedAlignment {
    sample: Vec<u8>,
    reference: Vec<u8>,
}

fn align_padded(sample: &[u8], reference: &[u8]) -> PaddedAlignment {
    let score = |a: u8, b: u8| if a == b { MATCH_SCORE } else { MISMATCH_SCORE };
    let mut aligner =
        Aligner::with_capacity(sample.len(), reference.len(), GAP_OPEN, GAP_EXTEND, score);
    let alignment = aligner.local(sample, reference);

    let mut padded_sample = Vec::with_capacity(sample.len() + reference.len());
    let mut padded_reference = Vec::with_capacity(sample.len() + reference.len());

    // Unaligned prefixes, right-aligned against each other
    let sample_prefix = &sample[..alignment.xstart];
    let reference_prefix = &reference[..alignment.ystart];
    let prefix_width = sample_prefix.len().max(reference_prefix.len());
    padded_sample.resize(prefix_width - sample_prefix.len(), b'-');
    padded_sample.extend_from_slice(sample_prefix);
    padded_reference.resize(prefix_width - reference_prefix.len(), b'-');
    padded_reference.extend_from_slice(reference_prefix);

    let mut sample_pos = alignment.xstart;
    let mut reference_pos = alignment.ystart;
    for op in &alignment.operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                padded_sample.push(sample[sample_pos]);
                padded_reference.push(reference[reference_pos]);
                sample_pos += 1;
                reference_pos += 1;
            }
            AlignmentOperation::Ins => {
                padded_sample.push(sample[sample_pos]);
                padded_reference.push(b'-');
                sample_pos += 1;
            }
            AlignmentOperation::Del => {
                padded_sample.push(b'-');
                padded_reference.push(reference[reference_pos]);
                reference_pos += 1;
            }
            _ => {}
        }
    }

    // Unaligned suffixes, left-aligned
    let sample_suffix = &sample[sample_pos..];
    let reference_suffix = &reference[reference_pos..];
    let suffix_width = sample_suffix.len().max(reference_suffix.len());
    padded_sample.extend_from_slice(sample_suffix);
    padded_sample.resize(padded_sample.len() + suffix_width - sample_suffix.len(), b'-');
    padded_reference.extend_from_slice(reference_suffix);
    padded_reference.resize(
        padded_reference.len() + suffix_width - reference_suffix.len(),
        b'-',
    );

    PaddedAlignment {
        sample: padded_sample,
        reference: padded_reference,
    }
}

/// Position-wise match line: `|` where the aligned characters are identical,
/// space otherwise.
fn match_line(sample: &[u8], reference: &[u8]) -> Vec<u8> {
    sample
        .iter()
        .zip(reference)
        .map(|(a, b)| if a == b { b'|' } else { b' ' })
        .collect()
}

/// Interleave sample, match and reference lines into fixed-width blocks,
/// each prefixed with a zero-padded column offset.
fn interleave(sample: &[u8], matches: &[u8], reference: &[u8]) -> String {
    let mut out = String::new();
    let mut pos = 0;
    while pos < sample.len() {
        let end = (pos + BLOCK_WIDTH).min(sample.len());
        out.push_str(&format!(
            "{:04} qry {}\n         {}\n     ref {}\n",
            pos,
            String::from_utf8_lossy(&sample[pos..end]),
            String::from_utf8_lossy(&matches[pos..end]),
            String::from_utf8_lossy(&reference[pos..end]),
        ));
        pos = end;
    }
    out
}

/// Semicolon-separated 0-based mismatch positions, with a line break after
/// every 11th recorded position to bound line length.
fn snp_index(matches: &[u8]) -> String {
    let mut out = String::new();
    let mut on_line = 0;
    for (pos, &column) in matches.iter().enumerate() {
        if column != b' ' {
            continue;
        }
        if on_line >= SNPS_PER_LINE {
            out.push('\n');
            on_line = 0;
        }
        out.push_str(&pos.to_string());
        out.push(';');
        on_line += 1;
    }
    out
}

/// Build the alignment annotation for one winning hit.
///
/// `sequence` is the oriented hit sequence from the report (gaps allowed);
/// `reference` is the target's database sequence. Fails if either side has
/// nothing left to align after gap removal and codon trimming.
pub fn annotate(
    target_id: &str,
    sequence: &[u8],
    reference: &[u8],
    program: Program,
) -> Result<AlignmentRecord, ScreenError> {
    // Internal gaps belong to the report alignment, not to the hit itself
    let stripped: Vec<u8> = sequence
        .iter()
        .copied()
        .filter(|&base| base != b'-')
        .collect();

    let empty = || ScreenError::EmptySequence(target_id.to_string());

    let (nt_sequence, aa_sequence) = if program.query_is_nucleotide() {
        let trimmed = trim_to_codon(&stripped);
        if trimmed.is_empty() {
            return Err(empty());
        }
        (trimmed.to_vec(), translate(trimmed))
    } else {
        if stripped.is_empty() {
            return Err(empty());
        }
        (Vec::new(), stripped)
    };

    let (reference_nt, reference_aa) = if program.reference_is_nucleotide() {
        let trimmed = trim_to_codon(reference);
        if trimmed.is_empty() {
            return Err(empty());
        }
        (trimmed.to_vec(), translate(trimmed))
    } else {
        if reference.is_empty() {
            return Err(empty());
        }
        (Vec::new(), reference.to_vec())
    };

    let (nt_alignment, nt_snp_index) = if program.query_is_nucleotide() {
        let padded = align_padded(&nt_sequence, &reference_nt);
        let line = match_line(&padded.sample, &padded.reference);
        (
            Some(interleave(&padded.sample, &line, &padded.reference)),
            Some(snp_index(&line)),
        )
    } else {
        (None, None)
    };

    if aa_sequence.is_empty() || reference_aa.is_empty() {
        return Err(empty());
    }
    let padded = align_padded(&aa_sequence, &reference_aa);
    let line = match_line(&padded.sample, &padded.reference);
    let matched = line.iter().filter(|&&column| column == b'|').count();
    let aa_identity = round2(matched as f64 / line.len() as f64 * 100.0);

    Ok(AlignmentRecord {
        nt_sequence,
        aa_sequence,
        nt_alignment,
        nt_snp_index,
        aa_alignment: interleave(&padded.sample, &line, &padded.reference),
        aa_snp_index: snp_index(&line),
        aa_identity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_sequences_full_identity() {
        let seq = b"ATGAAACCCGGGTTTTAA";
        let record = annotate("gene", seq, seq, Program::Blastn).unwrap();
        assert_eq!(record.aa_identity, 100.0);
        assert_eq!(record.aa_snp_index, "");
        assert_eq!(record.nt_snp_index.as_deref(), Some(""));
        assert_eq!(record.aa_sequence, b"MKPGF*");
    }

    #[test]
    fn test_gaps_stripped_before_translation() {
        let record = annotate("gene", b"ATG-AAA---TAA", b"ATGAAATAA", Program::Blastn).unwrap();
        assert_eq!(record.nt_sequence, b"ATGAAATAA");
        assert_eq!(record.aa_sequence, b"MK*");
        assert_eq!(record.aa_identity, 100.0);
    }

    #[test]
    fn test_partial_codon_trimmed() {
        // 10 bases trim to 9 before translation
        let record = annotate("gene", b"ATGAAATAAC", b"ATGAAATAA", Program::Blastn).unwrap();
        assert_eq!(record.nt_sequence.len(), 9);
        assert_eq!(record.aa_sequence, b"MK*");
    }

    #[test]
    fn test_snp_positions_recorded() {
        // One substitution at nucleotide position 5 (AAA -> AAG)
        let record = annotate("gene", b"ATGAAGCCCTAA", b"ATGAAACCCTAA", Program::Blastn).unwrap();
        let nt_index = record.nt_snp_index.unwrap();
        assert_eq!(nt_index, "5;");
        // AAG and AAA both code lysine, so the protein level stays exact
        assert_eq!(record.aa_snp_index, "");
        assert_eq!(record.aa_identity, 100.0);
    }

    #[test]
    fn test_protein_mismatch_lowers_identity() {
        // ATG GAA -> M E versus ATG CAA -> M Q: one of two residues differs
        let record = annotate("gene", b"ATGGAA", b"ATGCAA", Program::Blastn).unwrap();
        assert_eq!(record.aa_identity, 50.0);
        assert_eq!(record.aa_snp_index, "1;");
    }

    #[test]
    fn test_protein_program_skips_nucleotide_level() {
        let record = annotate("gene", b"MKTAYIAKQR", b"MKTAYIAKQR", Program::Blastp).unwrap();
        assert!(record.nt_alignment.is_none());
        assert!(record.nt_snp_index.is_none());
        assert!(record.nt_sequence.is_empty());
        assert_eq!(record.aa_identity, 100.0);
    }

    #[test]
    fn test_empty_after_trimming_is_an_error() {
        let err = annotate("gene", b"AT", b"ATGAAATAA", Program::Blastn).unwrap_err();
        assert!(matches!(err, ScreenError::EmptySequence(_)));
    }

    #[test]
    fn test_empty_reference_is_an_error() {
        let err = annotate("gene", b"ATGAAATAA", b"", Program::Blastn).unwrap_err();
        assert!(matches!(err, ScreenError::EmptySequence(_)));
    }

    #[test]
    fn test_interleave_block_shape() {
        let sample = vec![b'A'; 70];
        let matches = vec![b'|'; 70];
        let reference = vec![b'A'; 70];
        let text = interleave(&sample, &matches, &reference);
        let lines: Vec<&str> = text.lines().collect();
        // Two blocks of three lines each
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("0000 qry "));
        assert!(lines[3].starts_with("0060 qry "));
        assert_eq!(lines[0].len(), 9 + 60);
        assert_eq!(lines[3].len(), 9 + 10);
    }

    #[test]
    fn test_snp_index_line_breaks() {
        // 13 mismatch columns: 11 on the first line, 2 on the second
        let matches = vec![b' '; 13];
        let text = snp_index(&matches);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(';').filter(|s| !s.is_empty()).count(), 11);
        assert_eq!(lines[1], "11;12;");
    }
}
