// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort a consensus search run.
///
/// All variants are recoverable at the level of "abort this run and let the
/// user retry with corrected input"; none are process-fatal. Per-record soft
/// mismatches (sequence too short, substring absent) are not errors and do
/// not appear here.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The consensus specification text did not validate. Carries a
    /// human-readable reason; no partial spec is ever produced.
    #[error("invalid consensus specification: {reason}")]
    ConsensusSpec { reason: String },

    /// A selected FASTA header had no `|`-delimited accession field.
    /// Surfaced as a hard failure rather than silently matching under an
    /// empty or garbage protein ID.
    #[error("malformed fasta header at line {line}: expected '>db|ID|description'")]
    MalformedHeader { line: u64 },

    /// The full file was scanned and no candidate ever matched. The output
    /// file is left untouched when this is returned.
    #[error("no consensus sequences found in {}", fasta.display())]
    NoConsensusFound { fasta: PathBuf },
}

impl SearchError {
    pub(crate) fn spec(reason: impl Into<String>) -> Self {
        SearchError::ConsensusSpec {
            reason: reason.into(),
        }
    }
}
