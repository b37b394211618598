use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use peptide_search_rs::types::RunCounters;
use peptide_search_rs::{run_consensus_search, SearchConfig};

/// Count combinatorial consensus amino-acid sequences in a multifasta
/// protein database.
#[derive(Parser)]
#[command(name = "peptide-search-rs", version, about)]
struct Cli {
    /// Multifasta protein database (.fasta, .fasta.gz)
    fasta: PathBuf,

    /// Report file to write
    #[arg(short, long)]
    output: PathBuf,

    /// Consensus specification, e.g. "{2: 'A W', 3: 'S T', 'Pos': True}"
    #[arg(short, long)]
    consensus: String,

    /// Skip protein records marked as fragments
    #[arg(long)]
    complete_only: bool,

    /// Deprecated: substring lookup for positional matching instead of
    /// exact equality
    #[arg(long)]
    legacy_contains: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = SearchConfig {
        fasta: cli.fasta,
        output: cli.output,
        consensus: cli.consensus,
        complete_only: cli.complete_only,
        legacy_contains: cli.legacy_contains,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
            ])
            .template("{spinner:.green} {msg}")
            .expect("Invalid spinner template"),
    );
    spinner.set_message(format!("Scanning {}...", config.fasta.display()));

    let mut on_progress = |c: &RunCounters| {
        spinner.set_message(format!(
            "Match proteins: {}, Total proteins: {}, Empty lines: {}, Total lines: {}",
            c.selected_proteins, c.total_proteins, c.empty_lines, c.total_lines
        ));
        spinner.tick();
    };

    let results = match run_consensus_search(&config, Some(&mut on_progress)) {
        Ok(results) => results,
        Err(err) => {
            spinner.finish_and_clear();
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = fs::write(&config.output, results.get_report_text()) {
        spinner.finish_and_clear();
        eprintln!("error: could not write {}: {err}", config.output.display());
        return ExitCode::FAILURE;
    }

    let c = results.counters();
    spinner.finish_with_message(format!(
        "All done! Consensus sequences found: {}, Empty lines: {}, Total lines: {}",
        results.report.total_matches, c.empty_lines, c.total_lines
    ));
    ExitCode::SUCCESS
}
