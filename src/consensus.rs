// src/consensus.rs
//
// The consensus specification: what the user wants to search for. The input
// is the legacy text grammar `{2: 'A W', 3: 'S T', 'Pos': True}`: integer
// keys mapping to space-separated amino acids plus the reserved `Pos` flag.
// The grammar is kept for compatibility but goes through a strict scanner
// here; it is never evaluated as live code.

use crate::error::SearchError;

/// The 20 standard one-letter amino-acid codes.
pub const ONE_LETTER_AA: [char; 20] = [
    'A', 'I', 'L', 'V', 'M', 'F', 'W', 'Y', 'R', 'K', 'D', 'E', 'C', 'Q',
    'H', 'S', 'T', 'N', 'G', 'P',
];

/// Reserved key holding the positional flag.
pub const POS_KEY: &str = "Pos";

/// One aligned slot of the consensus motif.
#[derive(Debug, Clone)]
pub struct ConsensusPosition {
    /// The integer key as entered. A 1-based residue number when the spec is
    /// positional, a mere order index otherwise.
    pub residue: u32,
    /// Admissible amino acids at this slot, in entry order, deduplicated by
    /// validation (duplicates are rejected, not silently merged).
    pub candidates: Vec<char>,
}

/// Validated, immutable consensus specification for one run.
///
/// Entry order is significant: candidate strings concatenate the positions in
/// the order they appeared in the input text.
#[derive(Debug, Clone)]
pub struct ConsensusSpec {
    positions: Vec<ConsensusPosition>,
    positional: bool,
}

impl ConsensusSpec {
    /// Parse and validate the user-entered specification text.
    ///
    /// Rejections: missing braces, missing `Pos` key, non-integer or
    /// non-positive keys, duplicate keys, unquoted or empty amino-acid lists,
    /// tokens longer than one letter, letters outside the 20-symbol alphabet
    /// and duplicate letters within one position. Any failure produces a
    /// `ConsensusSpec` error with the reason; no partial spec escapes.
    pub fn parse(text: &str) -> Result<Self, SearchError> {
        let trimmed = text.trim();
        let inner = trimmed
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or_else(|| SearchError::spec("expected a { ... } mapping"))?;

        let mut positions: Vec<ConsensusPosition> = Vec::new();
        let mut positional: Option<bool> = None;

        for entry in split_top_level(inner, ',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (raw_key, raw_val) = split_once_top_level(entry, ':')
                .ok_or_else(|| SearchError::spec(format!("entry '{entry}' has no ':'")))?;
            let raw_key = raw_key.trim();
            let raw_val = raw_val.trim();

            match parse_key(raw_key)? {
                Key::Pos => {
                    if positional.is_some() {
                        return Err(SearchError::spec("duplicate 'Pos' key"));
                    }
                    positional = Some(parse_bool(raw_val)?);
                }
                Key::Residue(residue) => {
                    if positions.iter().any(|p| p.residue == residue) {
                        return Err(SearchError::spec(format!(
                            "duplicate position key {residue}"
                        )));
                    }
                    let candidates = parse_amino_acids(residue, raw_val)?;
                    positions.push(ConsensusPosition {
                        residue,
                        candidates,
                    });
                }
            }
        }

        let positional = positional
            .ok_or_else(|| SearchError::spec(format!("missing '{POS_KEY}' key")))?;
        if positions.is_empty() {
            return Err(SearchError::spec("no positions given"));
        }

        Ok(ConsensusSpec {
            positions,
            positional,
        })
    }

    pub fn positional(&self) -> bool {
        self.positional
    }

    pub fn positions(&self) -> &[ConsensusPosition] {
        &self.positions
    }

    /// Number of aligned slots, i.e. the length of every candidate.
    pub fn motif_len(&self) -> usize {
        self.positions.len()
    }

    /// Zero-based residue indexes for positional extraction, in entry order.
    /// Only meaningful when `positional()` is true.
    pub fn residue_indexes(&self) -> Vec<usize> {
        self.positions
            .iter()
            .map(|p| (p.residue - 1) as usize)
            .collect()
    }

    /// Total number of candidates the Cartesian product will yield.
    pub fn candidate_count(&self) -> usize {
        self.positions
            .iter()
            .map(|p| p.candidates.len())
            .product()
    }

    /// The full combinatorial candidate library: one letter picked from each
    /// position's set, concatenated in entry order. Deterministic odometer
    /// order, last position varying fastest.
    pub fn candidates(&self) -> Vec<String> {
        let n = self.positions.len();
        let mut out = Vec::with_capacity(self.candidate_count());
        let mut idx = vec![0usize; n];
        'next: loop {
            let cand: String = self
                .positions
                .iter()
                .zip(idx.iter())
                .map(|(p, &i)| p.candidates[i])
                .collect();
            out.push(cand);
            let mut k = n;
            while k > 0 {
                k -= 1;
                idx[k] += 1;
                if idx[k] < self.positions[k].candidates.len() {
                    continue 'next;
                }
                idx[k] = 0;
            }
            break;
        }
        out
    }
}

enum Key {
    Pos,
    Residue(u32),
}

fn parse_key(raw: &str) -> Result<Key, SearchError> {
    let bare = strip_quotes(raw).unwrap_or(raw);
    if bare == POS_KEY {
        return Ok(Key::Pos);
    }
    let residue: u32 = bare
        .parse()
        .map_err(|_| SearchError::spec(format!("key '{raw}' is not a positive integer")))?;
    if residue == 0 {
        return Err(SearchError::spec("position keys must be greater than 0"));
    }
    Ok(Key::Residue(residue))
}

fn parse_bool(raw: &str) -> Result<bool, SearchError> {
    match raw {
        "True" | "true" => Ok(true),
        "False" | "false" => Ok(false),
        other => Err(SearchError::spec(format!(
            "'{POS_KEY}' must be True or False, got '{other}'"
        ))),
    }
}

fn parse_amino_acids(residue: u32, raw: &str) -> Result<Vec<char>, SearchError> {
    let list = strip_quotes(raw).ok_or_else(|| {
        SearchError::spec(format!("position {residue}: amino acids must be quoted"))
    })?;
    let mut out: Vec<char> = Vec::new();
    for token in list.split_whitespace() {
        let mut chars = token.chars();
        let c = match (chars.next(), chars.next()) {
            (Some(c), None) => c.to_ascii_uppercase(),
            _ => {
                return Err(SearchError::spec(format!(
                    "position {residue}: '{token}' is not a one-letter code"
                )))
            }
        };
        if !ONE_LETTER_AA.contains(&c) {
            return Err(SearchError::spec(format!(
                "position {residue}: '{token}' is not an amino acid"
            )));
        }
        if out.contains(&c) {
            return Err(SearchError::spec(format!(
                "position {residue}: amino acid '{c}' repeated"
            )));
        }
        out.push(c);
    }
    if out.is_empty() {
        return Err(SearchError::spec(format!(
            "position {residue}: empty amino acid list"
        )));
    }
    Ok(out)
}

fn strip_quotes(s: &str) -> Option<&str> {
    let s = s.trim();
    s.strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| s.strip_prefix('"').and_then(|t| t.strip_suffix('"')))
}

/// Split on `sep` occurring outside single or double quotes.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == sep => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            None => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn split_once_top_level(s: &str, sep: char) -> Option<(&str, &str)> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == sep => return Some((&s[..i], &s[i + c.len_utf8()..])),
            None => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_spec() {
        let spec = ConsensusSpec::parse("{2: 'A W', 3: 'S T', 4: 'I A', 'Pos': True}")
            .expect("valid spec");
        assert!(spec.positional());
        assert_eq!(spec.motif_len(), 3);
        assert_eq!(spec.residue_indexes(), vec![1, 2, 3]);
        assert_eq!(spec.positions()[0].candidates, vec!['A', 'W']);
        assert_eq!(spec.positions()[2].candidates, vec!['I', 'A']);
    }

    #[test]
    fn parses_non_positional_spec_and_bare_pos_key() {
        let spec = ConsensusSpec::parse("{1: 'a w', 2: 's t', Pos: False}").expect("valid spec");
        assert!(!spec.positional());
        // lower-case input is upper-cased
        assert_eq!(spec.positions()[0].candidates, vec!['A', 'W']);
    }

    #[test]
    fn candidate_count_is_product_of_set_sizes() {
        let spec = ConsensusSpec::parse(
            "{2: 'A S', 3: 'E V T Q', 4: 'P A G', 'Pos': True}",
        )
        .unwrap();
        let cands = spec.candidates();
        assert_eq!(cands.len(), 2 * 4 * 3);
        assert_eq!(spec.candidate_count(), cands.len());
        assert!(cands.iter().all(|c| c.len() == 3));
    }

    #[test]
    fn candidates_preserve_entry_order() {
        let spec = ConsensusSpec::parse("{5: 'A W', 2: 'S T', 'Pos': True}").unwrap();
        // position 5 was entered first, so it supplies the first letter
        assert_eq!(spec.candidates(), vec!["AS", "AT", "WS", "WT"]);
        assert_eq!(spec.residue_indexes(), vec![4, 1]);
    }

    #[test]
    fn rejects_missing_pos_key() {
        assert!(ConsensusSpec::parse("{2: 'A W'}").is_err());
    }

    #[test]
    fn rejects_duplicate_amino_acid_within_position() {
        assert!(ConsensusSpec::parse("{2: 'A A', 'Pos': True}").is_err());
    }

    #[test]
    fn rejects_non_amino_acid_letter() {
        assert!(ConsensusSpec::parse("{2: 'A B', 'Pos': True}").is_err());
        assert!(ConsensusSpec::parse("{2: 'A WX', 'Pos': True}").is_err());
    }

    #[test]
    fn rejects_bad_keys_and_shapes() {
        assert!(ConsensusSpec::parse("2: 'A W', 'Pos': True").is_err());
        assert!(ConsensusSpec::parse("{x: 'A W', 'Pos': True}").is_err());
        assert!(ConsensusSpec::parse("{0: 'A W', 'Pos': True}").is_err());
        assert!(ConsensusSpec::parse("{2: 'A W', 2: 'S T', 'Pos': True}").is_err());
        assert!(ConsensusSpec::parse("{'Pos': True}").is_err());
        assert!(ConsensusSpec::parse("{2: A W, 'Pos': True}").is_err());
        assert!(ConsensusSpec::parse("{2: '', 'Pos': True}").is_err());
        assert!(ConsensusSpec::parse("{2: 'A W', 'Pos': Maybe}").is_err());
    }
}
