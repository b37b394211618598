// src/lib.rs
pub mod consensus;
pub mod error;
pub mod fasta;
pub mod matcher;
pub mod report;
pub mod types;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::consensus::ConsensusSpec;
use crate::error::SearchError;
use crate::matcher::Matcher;
use crate::report::SearchReport;
use crate::types::RunCounters;

/// Everything one consensus search run needs, passed in explicitly; the core
/// keeps no process-wide state.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Multifasta protein database (plain or gzipped).
    pub fasta: PathBuf,
    /// Where the report will be written. Echoed into the report; the core
    /// itself never writes it.
    pub output: PathBuf,
    /// The consensus specification text as entered, e.g.
    /// `{2: 'A W', 3: 'S T', 'Pos': True}`.
    pub consensus: String,
    /// Skip records whose header marks them as fragments.
    pub complete_only: bool,
    /// Use the deprecated substring lookup for positional matching instead
    /// of exact equality.
    pub legacy_contains: bool,
}

/// Results of one run: the sorted report tables plus the run parameters, with
/// the report text generated on demand.
#[derive(Debug)]
pub struct SearchResults {
    pub config: SearchConfig,
    pub report: SearchReport,
}

impl SearchResults {
    /// Render the full text report.
    pub fn get_report_text(&self) -> String {
        report::render_report(&self.report, &self.config)
    }

    pub fn counters(&self) -> &RunCounters {
        &self.report.counters
    }
}

/// Check that the report destination can be written, without leaving a file
/// behind. An existing file is opened for writing; a missing one is created
/// and removed again.
fn check_output_writable(path: &Path) -> Result<(), SearchError> {
    if path.exists() {
        OpenOptions::new().write(true).open(path)?;
    } else {
        File::create(path)?;
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// Run the whole pipeline: validate the consensus text and the output path,
/// generate the candidate library, stream the fasta file through the
/// matcher, and build the sorted report.
///
/// Input validation (consensus text, writable output path) happens before
/// the file is opened, so a bad parameter never costs a full scan.
/// `progress` is called every 100 input lines with the running counters, for
/// a status display. Returns `NoConsensusFound` after a complete pass with
/// zero matches; in that case nothing should be written.
pub fn run_consensus_search(
    config: &SearchConfig,
    progress: Option<&mut dyn FnMut(&RunCounters)>,
) -> Result<SearchResults, SearchError> {
    let spec = ConsensusSpec::parse(&config.consensus)?;
    check_output_writable(&config.output)?;
    let mut matcher = Matcher::new(&spec, config.legacy_contains);
    log::info!(
        "searching {} candidate sequences over {} positions ({:?})",
        matcher.candidate_count(),
        spec.motif_len(),
        matcher.policy(),
    );

    let counters = fasta::scan_fasta_path(
        &config.fasta,
        config.complete_only,
        |rec| matcher.scan(&rec),
        progress,
    )?;

    let report = report::build_report(matcher, counters, &config.fasta)?;
    log::info!(
        "{} consensus sequences found in {} of {} analyzed proteins",
        report.total_matches,
        report.matched_proteins,
        counters.selected_proteins,
    );

    Ok(SearchResults {
        config: config.clone(),
        report,
    })
}
