//! Pipeline token (`Lyli`) and structural tag kinds.
//!
//! The analyzer consumes an already-tokenized stream whose items are either
//! word forms or structural markers. At the analyzer boundary every `Word`
//! becomes an `Analysis` (or is merged into a preceding one by a multi-word
//! expression); structural tags pass through unchanged.

use crate::analysis::AnalysisSet;

/// What a structural string tag marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// Any tag the pipeline merely passes through.
    Arbitrary,
    /// Beginning of sentence, `<s>`.
    Bos,
    /// End of sentence, `</s>`.
    Eos,
    /// Beginning of paragraph, `<p>`.
    Bop,
    /// End of paragraph, `</p>`.
    Eop,
    /// End of file, `<EOF/>`.
    Eof,
    /// Paragraph separator, `<EOP/>`.
    Psep,
    /// Word separator.
    Wsep,
}

impl TagKind {
    /// Classify a literal structural marker, `Arbitrary` when unknown.
    pub fn classify(text: &str) -> TagKind {
        match text {
            "<s>" => TagKind::Bos,
            "</s>" => TagKind::Eos,
            "<p>" => TagKind::Bop,
            "</p>" => TagKind::Eop,
            "<EOF/>" => TagKind::Eof,
            "<EOP/>" => TagKind::Psep,
            _ => TagKind::Arbitrary,
        }
    }
}

/// One link of the pipeline chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Lyli {
    /// A surface word form waiting for analysis.
    Word(String),
    /// Positional marker.
    IntTag(i32),
    /// Structural marker with its literal text.
    StringTag(String, TagKind),
    /// Tag text paired with a caller-supplied id.
    StringWithId(String, u32),
    /// Analyzed word (candidate set attached).
    Analysis(AnalysisSet),
}

impl Lyli {
    /// Structural tag constructor that classifies the text itself.
    pub fn tag(text: impl Into<String>) -> Lyli {
        let text = text.into();
        let kind = TagKind::classify(&text);
        Lyli::StringTag(text, kind)
    }

    /// True for any structural tag variant.
    pub fn is_tag(&self) -> bool {
        matches!(
            self,
            Lyli::IntTag(_) | Lyli::StringTag(..) | Lyli::StringWithId(..)
        )
    }

    /// True for a word still waiting for analysis.
    pub fn is_word(&self) -> bool {
        matches!(self, Lyli::Word(_))
    }

    /// True for a finished analysis.
    pub fn is_analysis(&self) -> bool {
        matches!(self, Lyli::Analysis(_))
    }

    /// Tag kind if this is a string tag.
    pub fn tag_kind(&self) -> Option<TagKind> {
        match self {
            Lyli::StringTag(_, kind) => Some(*kind),
            _ => None,
        }
    }

    /// Borrow the analysis set if present.
    pub fn analysis(&self) -> Option<&AnalysisSet> {
        match self {
            Lyli::Analysis(set) => Some(set),
            _ => None,
        }
    }

    /// Mutably borrow the analysis set if present.
    pub fn analysis_mut(&mut self) -> Option<&mut AnalysisSet> {
        match self {
            Lyli::Analysis(set) => Some(set),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_structural_markers() {
        assert_eq!(TagKind::classify("<s>"), TagKind::Bos);
        assert_eq!(TagKind::classify("</s>"), TagKind::Eos);
        assert_eq!(TagKind::classify("<p>"), TagKind::Bop);
        assert_eq!(TagKind::classify("<EOF/>"), TagKind::Eof);
        assert_eq!(TagKind::classify("<EOP/>"), TagKind::Psep);
        assert_eq!(TagKind::classify("<foo>"), TagKind::Arbitrary);
    }

    #[test]
    fn tag_and_word_predicates() {
        let t = Lyli::tag("<s>");
        assert!(t.is_tag());
        assert_eq!(t.tag_kind(), Some(TagKind::Bos));
        let w = Lyli::Word("kass".into());
        assert!(w.is_word());
        assert!(!w.is_tag());
    }
}
