//! User dictionary: caller-provided analyses that outrank the engine.
//!
//! A plain-text file of serialized analysis blocks (the same grammar the
//! pipeline emits): a header line with the surface form, then one
//! indented candidate line per reading. Lines starting with `# ` and
//! blank lines are ignored. A hit fully answers the word; the main
//! dictionary is not consulted.

use std::path::Path;

use tracing::warn;

use crate::analysis::{parse_line, AnalysisSet, Provenance};
use crate::chars;
use crate::error::Result;

/// Loaded user dictionary, sorted by surface form.
#[derive(Debug, Default)]
pub struct UserDict {
    entries: Vec<(String, AnalysisSet)>,
}

impl UserDict {
    /// Load from a file; a missing file is an error, a malformed line is
    /// a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<UserDict> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_text(&text))
    }

    /// Parse from text.
    pub fn from_text(text: &str) -> UserDict {
        let mut entries: Vec<(String, AnalysisSet)> = Vec::new();
        let mut current: Option<AnalysisSet> = None;
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with("# ") {
                continue;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                match (&mut current, parse_line(line)) {
                    (Some(set), Some(analysis)) => set.analyses.push(analysis),
                    (Some(_), None) => {
                        warn!(lineno = lineno + 1, "unparsable user-dictionary line")
                    }
                    (None, _) => {
                        warn!(lineno = lineno + 1, "candidate line before any headword")
                    }
                }
                continue;
            }
            if let Some(set) = current.take() {
                entries.push((set.word.clone(), set));
            }
            let mut set = AnalysisSet::empty(line.trim_end());
            set.provenance = Provenance::UserDict;
            current = Some(set);
        }
        if let Some(set) = current.take() {
            entries.push((set.word.clone(), set));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        UserDict { entries }
    }

    /// Number of headwords.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries were loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, word: &str) -> Option<&AnalysisSet> {
        self.entries
            .binary_search_by(|(w, _)| w.as_str().cmp(word))
            .ok()
            .map(|i| &self.entries[i].1)
    }

    /// Probe cascade: exact form, outer punctuation trimmed, lowercase,
    /// trimmed lowercase. The returned set carries the caller's surface
    /// form.
    pub fn lookup(&self, word: &str) -> Option<AnalysisSet> {
        let trimmed = chars::strip_outer_punct(word);
        let lower = chars::lowercase(word);
        let trimmed_lower = chars::lowercase(trimmed);
        let hit = self
            .get(word)
            .or_else(|| (trimmed != word).then(|| self.get(trimmed)).flatten())
            .or_else(|| (lower != word).then(|| self.get(&lower)).flatten())
            .or_else(|| {
                (trimmed_lower != lower && trimmed != word)
                    .then(|| self.get(&trimmed_lower))
                    .flatten()
            })?;
        let mut set = hit.clone();
        set.word = word.to_string();
        set.provenance = Provenance::UserDict;
        Some(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# eestikeelsed lisandused
sahkerdis
    sahkerdis+0 //_S_ sg n, //
    sahkerda=is+0 //_S_ sg n, //

Tsahkna
    Tsahkna+0 //_H_ sg n, //
";

    #[test]
    fn parses_blocks_and_counts_headwords() {
        let ud = UserDict::from_text(SAMPLE);
        assert_eq!(ud.len(), 2);
        let set = ud.lookup("sahkerdis").unwrap();
        assert_eq!(set.analyses.len(), 2);
        assert_eq!(set.provenance, Provenance::UserDict);
    }

    #[test]
    fn probe_cascade_finds_cased_and_trimmed_forms() {
        let ud = UserDict::from_text(SAMPLE);
        // lowercase entry found for an uppercased surface form
        let set = ud.lookup("SAHKERDIS").unwrap();
        assert_eq!(set.word, "SAHKERDIS");
        // trimmed punctuation
        let set = ud.lookup("\"Tsahkna\",").unwrap();
        assert_eq!(set.word, "\"Tsahkna\",");
        assert_eq!(set.analyses[0].pos, "H");
    }

    #[test]
    fn misses_return_none() {
        let ud = UserDict::from_text(SAMPLE);
        assert!(ud.lookup("kass").is_none());
    }

    #[test]
    fn comments_and_blanks_are_skipped() {
        let ud = UserDict::from_text("# kommentaar\n\n# veel\n");
        assert!(ud.is_empty());
    }
}
