//! Hit parsing: one raw tabular report row in, one scored `HitRecord` out.
//!
//! Reports are tab-separated with no header and a fixed field set:
//! `query_id, query_start, query_end, subject_id, subject_start, subject_end,
//! subject_length, positives, gaps, alignment_length, bit_score,
//! query_sequence`. Parsing a row is a pure function of the row text and the
//! screening configuration.

use crate::common::{round2, HitRecord, Orientation};
use crate::config::ScreenConfig;
use crate::error::ScreenError;
use bio::alphabets::dna;
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// Column count of the fixed report field set.
pub const FIELD_COUNT: usize = 12;

fn numeric<T: FromStr>(
    row: usize,
    field: &'static str,
    value: &str,
) -> Result<T, ScreenError> {
    value.trim().parse().map_err(|_| ScreenError::MalformedField {
        row,
        field,
        value: value.to_string(),
    })
}

/// Parse a single report row.
///
/// Returns `Ok(None)` when the row parses cleanly but its percent identity
/// falls below the configured cutoff. Malformed numeric fields and
/// zero-length effective subjects are errors; the caller decides whether to
/// skip the row or abort.
pub fn parse_row(
    line: &str,
    row_index: u32,
    config: &ScreenConfig,
) -> Result<Option<HitRecord>, ScreenError> {
    let row = row_index as usize;
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < FIELD_COUNT {
        return Err(ScreenError::ShortRow {
            row,
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }

    let contig_id = fields[0];
    let query_start: usize = numeric(row, "query_start", fields[1])?;
    let query_end: usize = numeric(row, "query_end", fields[2])?;
    let target_id = fields[3];
    let subject_start: usize = numeric(row, "subject_start", fields[4])?;
    let subject_end: usize = numeric(row, "subject_end", fields[5])?;
    let subject_length: f64 = numeric(row, "subject_length", fields[6])?;
    let positives: f64 = numeric(row, "positives", fields[7])?;
    let gaps: f64 = numeric(row, "gaps", fields[8])?;
    let alignment_length: f64 = numeric(row, "alignment_length", fields[9])?;
    let bit_score: f64 = numeric(row, "bit_score", fields[10])?;
    let query_sequence = fields[11];

    // Translated searches report subject length in nucleotides, three per
    // residue; scale it down before any ratio is taken.
    let effective = subject_length / config.program.subject_length_scale();
    if effective <= 0.0 {
        return Err(ScreenError::ZeroSubjectLength {
            row,
            target: target_id.to_string(),
        });
    }

    let percent_identity = round2((positives - gaps) / effective * 100.0);
    if percent_identity < config.cutoff {
        return Ok(None);
    }
    let alignment_fraction = round2(alignment_length / effective * 100.0);

    let low = query_start.min(query_end);
    let high = query_start.max(query_end);

    // A subject end before the subject start means the query aligned against
    // the opposite strand; store the reverse complement so the sequence
    // always reads in the reference orientation.
    let (orientation, sequence) = if subject_end < subject_start {
        (Orientation::Reverse, dna::revcomp(query_sequence.as_bytes()))
    } else {
        (Orientation::Forward, query_sequence.as_bytes().to_vec())
    };

    Ok(Some(HitRecord {
        contig_id: contig_id.to_string(),
        target_id: target_id.to_string(),
        low,
        high,
        percent_identity,
        alignment_fraction,
        bit_score,
        orientation,
        sequence,
        row_index,
    }))
}

/// Read a whole report file in row order.
///
/// Malformed rows are logged and skipped rather than aborting the sample;
/// rows below the cutoff are silently dropped. The returned records carry
/// their original row indices.
pub fn read_report(path: &Path, config: &ScreenConfig) -> Result<Vec<HitRecord>, ScreenError> {
    let file = File::open(path).map_err(|source| ScreenError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut hits = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| ScreenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.is_empty() {
            continue;
        }
        match parse_row(&line, index as u32, config) {
            Ok(Some(hit)) => hits.push(hit),
            Ok(None) => {}
            Err(err) => warn!("{}: skipping row: {err}", path.display()),
        }
    }
    Ok(hits)
}
