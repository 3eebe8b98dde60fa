use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while parsing report rows or annotating winning hits.
///
/// Row-level errors are recoverable: the offending row is skipped and the
/// rest of the sample continues. Annotation errors leave the hit selected
/// but without an alignment record.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// A report row did not have the expected number of tab-separated fields.
    #[error("row {row}: expected {expected} fields, found {found}")]
    ShortRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A numeric field in a report row failed to parse.
    #[error("row {row}: field '{field}' is not numeric: '{value}'")]
    MalformedField {
        row: usize,
        field: &'static str,
        value: String,
    },

    /// The effective subject length is zero; identity would divide by zero.
    #[error("row {row}: zero-length effective subject for target '{target}'")]
    ZeroSubjectLength { row: usize, target: String },

    /// No reference sequence is available for a winning target.
    #[error("no reference sequence for target '{0}'")]
    MissingReference(String),

    /// Nothing left to align after gap removal and codon trimming.
    #[error("empty sequence for target '{0}' after gap removal and codon trimming")]
    EmptySequence(String),

    /// The report file could not be read.
    #[error("failed to read report {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
