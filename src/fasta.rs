// src/fasta.rs
//
// Streaming multifasta reader. One pass, line by line; records are handed to
// a callback as soon as their last sequence line has been seen, so the file
// is never buffered whole. Headers are UniProt style, `>db|ID|description`,
// and a header containing the literal word "Fragment" marks an incomplete
// sequence.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::SearchError;
use crate::types::{ProteinRecord, RunCounters};

/// How often the progress callback fires, in input lines.
pub const PROGRESS_LINE_INTERVAL: u64 = 100;

/// Marker for fragmentary records in UniProt headers.
const FRAGMENT_MARK: &str = "Fragment";

/// Record-boundary state machine.
enum ScanState {
    /// No header seen yet.
    BetweenRecords,
    /// Current record passed the completeness filter; sequence lines are
    /// being concatenated.
    AccumulatingSelected {
        id: String,
        is_fragment: bool,
        seq: String,
    },
    /// Current record was filtered out; its sequence lines are dropped.
    AccumulatingSkipped,
}

impl ScanState {
    /// Finalize the record under accumulation, if it was selected.
    fn flush(&mut self, on_record: &mut dyn FnMut(ProteinRecord)) {
        if let ScanState::AccumulatingSelected {
            id,
            is_fragment,
            seq,
        } = mem::replace(self, ScanState::BetweenRecords)
        {
            on_record(ProteinRecord {
                id,
                seq,
                is_fragment,
            });
        }
    }
}

/// Open a fasta file, transparently decompressing `.gz`.
pub fn open_fasta(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);
    Ok(if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    })
}

/// Stream a multifasta file from `path`. See [`scan_fasta`].
pub fn scan_fasta_path(
    path: &Path,
    complete_only: bool,
    on_record: impl FnMut(ProteinRecord),
    on_progress: Option<&mut dyn FnMut(&RunCounters)>,
) -> Result<RunCounters, SearchError> {
    scan_fasta(open_fasta(path)?, complete_only, on_record, on_progress)
}

/// Stream a multifasta text, invoking `on_record` for every selected record
/// with its wrapped sequence lines reassembled, and `on_progress` every
/// [`PROGRESS_LINE_INTERVAL`] lines.
///
/// With `complete_only`, records whose header carries "Fragment" are counted
/// but never emitted. Both `\n` and `\r\n` line endings are tolerated. A
/// selected header without a `|`-delimited accession aborts the scan with
/// `MalformedHeader`; skipped records never have their ID parsed.
pub fn scan_fasta<R: BufRead>(
    mut reader: R,
    complete_only: bool,
    mut on_record: impl FnMut(ProteinRecord),
    mut on_progress: Option<&mut dyn FnMut(&RunCounters)>,
) -> Result<RunCounters, SearchError> {
    let mut counters = RunCounters::default();
    let mut state = ScanState::BetweenRecords;
    let mut raw = String::new();

    loop {
        raw.clear();
        if reader.read_line(&mut raw)? == 0 {
            break;
        }
        counters.total_lines += 1;
        let line = raw.trim();

        if line.is_empty() {
            counters.empty_lines += 1;
        } else if line.starts_with('>') {
            counters.total_proteins += 1;
            state.flush(&mut on_record);

            let is_fragment = line.contains(FRAGMENT_MARK);
            if is_fragment {
                counters.fragment_proteins += 1;
            }
            if is_fragment && complete_only {
                state = ScanState::AccumulatingSkipped;
            } else {
                counters.selected_proteins += 1;
                let id = line
                    .split('|')
                    .nth(1)
                    .ok_or(SearchError::MalformedHeader {
                        line: counters.total_lines,
                    })?
                    .to_string();
                state = ScanState::AccumulatingSelected {
                    id,
                    is_fragment,
                    seq: String::new(),
                };
            }
        } else if let ScanState::AccumulatingSelected { seq, .. } = &mut state {
            seq.push_str(line);
        }

        if counters.total_lines % PROGRESS_LINE_INTERVAL == 0 {
            if let Some(cb) = on_progress.as_deref_mut() {
                cb(&counters);
            }
        }
    }

    // The last record has no following header to trigger emission.
    state.flush(&mut on_record);

    log::debug!(
        "fasta scan done: {} lines, {} proteins ({} selected, {} fragments)",
        counters.total_lines,
        counters.total_proteins,
        counters.selected_proteins,
        counters.fragment_proteins
    );
    Ok(counters)
}
