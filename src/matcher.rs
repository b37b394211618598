// src/matcher.rs
//
// Per-protein matching against the candidate library. Two families of
// policies: positional (amino acids extracted at fixed residue indexes, then
// compared to the candidates) and substring (every candidate searched
// anywhere in the sequence). A protein contributes at most one increment per
// candidate, presence not occurrence count.

use ahash::{AHashMap, AHashSet};

use crate::consensus::ConsensusSpec;
use crate::types::ProteinRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Residue numbers given; the extracted motif must equal a candidate.
    PositionalExact,
    /// Residue numbers given; the motif matches the unique candidate that
    /// contains it as a substring, skipped when absent or ambiguous. This is
    /// the behavior of older releases, kept behind a flag.
    PositionalContains,
    /// No residue numbers; candidates are searched anywhere in the sequence.
    Substring,
}

/// Running tally for one candidate.
#[derive(Debug, Default, Clone)]
pub struct CandidateTally {
    pub count: u32,
    pub protein_ids: Vec<String>,
}

/// Accumulates matches over a streamed fasta pass. Built once per run from
/// the validated spec; fed one `ProteinRecord` at a time.
pub struct Matcher {
    policy: MatchPolicy,
    /// Zero-based extraction indexes, entry order. Empty in substring mode.
    residue_indexes: Vec<usize>,
    /// Candidate strings in generation order.
    candidates: Vec<String>,
    /// Tallies parallel to `candidates`.
    tallies: Vec<CandidateTally>,
    /// Candidate string -> index, for exact positional lookup.
    index: AHashMap<String, usize>,
    /// Substring mode only: protein ID -> matched candidates, in match order.
    prot_seq: AHashMap<String, Vec<String>>,
    matched_proteins: AHashSet<String>,
    total_matches: u64,
}

impl Matcher {
    pub fn new(spec: &ConsensusSpec, legacy_contains: bool) -> Self {
        let policy = if spec.positional() {
            if legacy_contains {
                MatchPolicy::PositionalContains
            } else {
                MatchPolicy::PositionalExact
            }
        } else {
            MatchPolicy::Substring
        };
        let residue_indexes = if spec.positional() {
            spec.residue_indexes()
        } else {
            Vec::new()
        };
        let candidates = spec.candidates();
        let index = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let tallies = vec![CandidateTally::default(); candidates.len()];
        Matcher {
            policy,
            residue_indexes,
            candidates,
            tallies,
            index,
            prot_seq: AHashMap::new(),
            matched_proteins: AHashSet::new(),
            total_matches: 0,
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Match one protein record and update the tallies. Soft conditions
    /// (sequence too short, motif absent or ambiguous) contribute nothing.
    pub fn scan(&mut self, record: &ProteinRecord) {
        match self.policy {
            MatchPolicy::PositionalExact => {
                if let Some(motif) = self.extract_motif(&record.seq) {
                    if let Some(&i) = self.index.get(&motif) {
                        self.attribute(i, &record.id);
                    }
                }
            }
            MatchPolicy::PositionalContains => {
                if let Some(motif) = self.extract_motif(&record.seq) {
                    let mut hits = self
                        .candidates
                        .iter()
                        .enumerate()
                        .filter(|(_, c)| c.contains(&motif))
                        .map(|(i, _)| i);
                    // exactly one containing candidate, else no match
                    if let (Some(i), None) = (hits.next(), hits.next()) {
                        self.attribute(i, &record.id);
                    }
                }
            }
            MatchPolicy::Substring => {
                for i in 0..self.candidates.len() {
                    if record.seq.contains(self.candidates[i].as_str()) {
                        self.attribute(i, &record.id);
                        let cand = self.candidates[i].clone();
                        self.prot_seq
                            .entry(record.id.clone())
                            .or_default()
                            .push(cand);
                    }
                }
            }
        }
    }

    /// Amino acids at the configured residue indexes, in spec order. `None`
    /// when the sequence is too short for any index.
    fn extract_motif(&self, seq: &str) -> Option<String> {
        let bytes = seq.as_bytes();
        let mut motif = String::with_capacity(self.residue_indexes.len());
        for &ix in &self.residue_indexes {
            motif.push(*bytes.get(ix)? as char);
        }
        Some(motif)
    }

    fn attribute(&mut self, i: usize, protein_id: &str) {
        let tally = &mut self.tallies[i];
        tally.count += 1;
        tally.protein_ids.push(protein_id.to_string());
        self.matched_proteins.insert(protein_id.to_string());
        self.total_matches += 1;
    }

    /// Tear down into the raw tables for the reporter.
    pub fn into_tallies(
        self,
    ) -> (
        Vec<(String, CandidateTally)>,
        AHashMap<String, Vec<String>>,
        u64,
        u64,
    ) {
        let matched = self.matched_proteins.len() as u64;
        (
            self.candidates.into_iter().zip(self.tallies).collect(),
            self.prot_seq,
            self.total_matches,
            matched,
        )
    }

    #[cfg(test)]
    fn tally_for(&self, candidate: &str) -> &CandidateTally {
        &self.tallies[self.index[candidate]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, seq: &str) -> ProteinRecord {
        ProteinRecord {
            id: id.to_string(),
            seq: seq.to_string(),
            is_fragment: false,
        }
    }

    fn spec(text: &str) -> ConsensusSpec {
        ConsensusSpec::parse(text).expect("valid spec")
    }

    #[test]
    fn positional_exact_increments_exactly_one_candidate() {
        // zero-based indexes 1 and 3; "MAGKQ" yields motif "AK"
        let spec = spec("{2: 'A W', 4: 'K R', 'Pos': True}");
        let mut m = Matcher::new(&spec, false);
        assert_eq!(m.policy(), MatchPolicy::PositionalExact);
        m.scan(&record("P1", "MAGKQ"));
        assert_eq!(m.tally_for("AK").count, 1);
        assert_eq!(m.tally_for("AK").protein_ids, vec!["P1"]);
        for cand in ["AR", "WK", "WR"] {
            assert_eq!(m.tally_for(cand).count, 0);
        }
        assert_eq!(m.total_matches, 1);
    }

    #[test]
    fn positional_skips_too_short_sequences() {
        let spec = spec("{2: 'A', 9: 'K', 'Pos': True}");
        let mut m = Matcher::new(&spec, false);
        m.scan(&record("P1", "MAGKQ"));
        assert_eq!(m.total_matches, 0);
    }

    #[test]
    fn positional_exact_rejects_unlisted_motif() {
        let spec = spec("{1: 'A', 2: 'K', 'Pos': True}");
        let mut m = Matcher::new(&spec, false);
        m.scan(&record("P1", "MAGKQ")); // motif "MA" != "AK"
        assert_eq!(m.total_matches, 0);
    }

    #[test]
    fn legacy_contains_matches_unique_containing_candidate() {
        let spec = spec("{2: 'A W', 3: 'S T', 'Pos': True}");
        let mut m = Matcher::new(&spec, true);
        assert_eq!(m.policy(), MatchPolicy::PositionalContains);
        m.scan(&record("P1", "MAS")); // motif "AS" contained only in "AS"
        assert_eq!(m.tally_for("AS").count, 1);
        assert_eq!(m.total_matches, 1);
    }

    #[test]
    fn substring_mode_counts_presence_not_occurrences() {
        let spec = spec("{1: 'A W', 2: 'S T', 'Pos': False}");
        let mut m = Matcher::new(&spec, false);
        assert_eq!(m.policy(), MatchPolicy::Substring);
        m.scan(&record("P1", "ASGGASAS")); // "AS" occurs three times
        assert_eq!(m.tally_for("AS").count, 1);
        assert_eq!(m.total_matches, 1);
    }

    #[test]
    fn substring_mode_attributes_multiple_candidates_per_protein() {
        let spec = spec("{1: 'A W', 2: 'S T', 'Pos': False}");
        let mut m = Matcher::new(&spec, false);
        m.scan(&record("P1", "MASWTG")); // contains both "AS" and "WT"
        assert_eq!(m.tally_for("AS").count, 1);
        assert_eq!(m.tally_for("WT").count, 1);
        let (_, prot_seq, total, matched) = m.into_tallies();
        assert_eq!(prot_seq["P1"], vec!["AS", "WT"]);
        assert_eq!(total, 2);
        assert_eq!(matched, 1);
    }

    #[test]
    fn substring_scenario_three_proteins() {
        let spec = spec("{1: 'A W', 2: 'S T', 'Pos': False}");
        let mut m = Matcher::new(&spec, false);
        assert_eq!(m.candidate_count(), 4);
        m.scan(&record("P1", "MMASMM")); // contains "AS"
        m.scan(&record("P2", "MMWTMM")); // contains "WT"
        m.scan(&record("P3", "GGGGGG")); // contains neither
        assert_eq!(m.tally_for("AS").count, 1);
        assert_eq!(m.tally_for("WT").count, 1);
        assert_eq!(m.tally_for("AT").count, 0);
        assert_eq!(m.tally_for("WS").count, 0);
        assert_eq!(m.tally_for("AS").protein_ids, vec!["P1"]);
    }
}
