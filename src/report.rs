// src/report.rs
//
// Turns the matcher tallies into the final sorted tables and the two-section
// text report written next to the run.

use std::fmt::Write as FmtWrite;
use std::path::Path;

use ahash::AHashMap;

use crate::error::SearchError;
use crate::matcher::{CandidateTally, MatchPolicy, Matcher};
use crate::types::{CandidateRow, RunCounters};
use crate::SearchConfig;

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Aggregated outcome of one search run.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Candidate table, sorted by count descending then sequence ascending.
    pub rows: Vec<CandidateRow>,
    /// Substring mode only: protein ID -> matched candidates, sorted by ID.
    pub prot_seq: Vec<(String, Vec<String>)>,
    pub counters: RunCounters,
    /// Sum of all candidate counts.
    pub total_matches: u64,
    /// Distinct proteins containing at least one consensus sequence.
    pub matched_proteins: u64,
    pub policy: MatchPolicy,
}

/// Compute percentages, sort, and check the empty-result condition.
///
/// Returns `NoConsensusFound` when nothing matched anywhere in the file, so
/// the caller never writes a report for an empty run.
pub fn build_report(
    matcher: Matcher,
    counters: RunCounters,
    fasta: &Path,
) -> Result<SearchReport, SearchError> {
    let policy = matcher.policy();
    let (tallies, prot_seq, total_matches, matched_proteins) = matcher.into_tallies();

    if total_matches == 0 {
        return Err(SearchError::NoConsensusFound {
            fasta: fasta.to_path_buf(),
        });
    }

    let mut rows: Vec<CandidateRow> = tallies
        .into_iter()
        .map(|(sequence, tally)| candidate_row(sequence, tally, &counters))
        .collect();
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.sequence.cmp(&b.sequence))
    });

    let prot_seq = sorted_prot_seq(prot_seq);

    Ok(SearchReport {
        rows,
        prot_seq,
        counters,
        total_matches,
        matched_proteins,
        policy,
    })
}

fn candidate_row(sequence: String, tally: CandidateTally, counters: &RunCounters) -> CandidateRow {
    CandidateRow {
        sequence,
        count: tally.count,
        percent_selected: percent(tally.count, counters.selected_proteins),
        percent_total: percent(tally.count, counters.total_proteins),
        protein_ids: tally.protein_ids,
    }
}

fn percent(count: u32, denom: u64) -> f64 {
    if denom == 0 {
        0.0
    } else {
        100.0 * count as f64 / denom as f64
    }
}

fn sorted_prot_seq(map: AHashMap<String, Vec<String>>) -> Vec<(String, Vec<String>)> {
    let mut out: Vec<_> = map.into_iter().collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

/// Render the plain-text report: an "Input data:" echo of the run parameters
/// and an "Output data:" section with the summary counts and tables, ending
/// with the fixed application trailer.
pub fn render_report(report: &SearchReport, config: &SearchConfig) -> String {
    let mut out = String::new();
    let c = &report.counters;

    out.push_str("Input data:\n");
    writeln!(out, "Fasta File:\t{}", config.fasta.display()).unwrap();
    writeln!(out, "Output File:\t{}", config.output.display()).unwrap();
    writeln!(out, "Positions & AAs:\t{}", config.consensus).unwrap();
    writeln!(
        out,
        "Complete proteins:\t{}",
        if config.complete_only { "True" } else { "False" }
    )
    .unwrap();
    out.push('\n');

    out.push_str("Output data:\n");
    writeln!(out, "Total proteins:\t{}", c.total_proteins).unwrap();
    writeln!(out, "Complete proteins:\t{}", c.complete_proteins()).unwrap();
    writeln!(out, "Fragment proteins:\t{}", c.fragment_proteins).unwrap();
    writeln!(out, "Analyzed proteins:\t{}", c.selected_proteins).unwrap();
    writeln!(
        out,
        "Proteins with at least one consensus sequence:\t{}",
        report.matched_proteins
    )
    .unwrap();
    writeln!(
        out,
        "Total consensus sequences found:\t{}",
        report.total_matches
    )
    .unwrap();
    out.push('\n');

    out.push_str("Count\tSequence\t%_AP\t%_TP\tProt_IDs\n");
    for row in &report.rows {
        writeln!(
            out,
            "{}\t{}\t{:.2}\t{:.2}\t{}",
            row.count,
            row.sequence,
            row.percent_selected,
            row.percent_total,
            row.protein_ids.join(", ")
        )
        .unwrap();
    }

    if report.policy == MatchPolicy::Substring {
        out.push('\n');
        out.push_str("Protein ID\tSequences\n");
        for (id, seqs) in &report.prot_seq {
            writeln!(out, "{}\t{}", id, seqs.join(", ")).unwrap();
        }
    }

    out.push('\n');
    write!(out, "File generated with\t{APP_NAME}\t{APP_VERSION}").unwrap();
    out
}
