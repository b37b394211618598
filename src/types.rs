// src/types.rs

/// One protein record pulled out of a multifasta stream.
#[derive(Debug, Clone)]
pub struct ProteinRecord {
    /// Accession, the second `|`-delimited field of the header.
    pub id: String,
    /// Sequence with all wrapped lines concatenated, exactly as in the file.
    pub seq: String,
    /// Header contained the literal word "Fragment".
    pub is_fragment: bool,
}

/// Line and record counters accumulated during one pass over the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    pub total_lines: u64,
    pub empty_lines: u64,
    /// Every header seen, fragments included.
    pub total_proteins: u64,
    /// Records that passed the completeness filter and were matched.
    pub selected_proteins: u64,
    /// Headers containing "Fragment".
    pub fragment_proteins: u64,
}

impl RunCounters {
    pub fn complete_proteins(&self) -> u64 {
        self.total_proteins - self.fragment_proteins
    }
}

/// One row of the final candidate table, after percentages and sorting.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    pub sequence: String,
    pub count: u32,
    /// Percent of analyzed (selected) proteins containing this candidate.
    pub percent_selected: f64,
    /// Percent of all proteins in the file containing this candidate.
    pub percent_total: f64,
    /// IDs of the proteins attributed to this candidate, in match order.
    pub protein_ids: Vec<String>,
}
