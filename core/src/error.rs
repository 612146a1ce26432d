//! Error taxonomy for etmorf-core.
//!
//! One sum type covers every failure the engine can report. Recoverable
//! per-token trouble (`BadInput`) never poisons a pipeline: the offending
//! token is turned into an empty analysis and processing continues.
//! `BadDictionary` and `Internal` are fatal for the pipeline instance that
//! raised them.

use std::io;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, EtmorfError>;

/// All errors produced by the core.
#[derive(Debug, thiserror::Error)]
pub enum EtmorfError {
    /// File open/read/seek failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Corrupt, truncated or unsupported dictionary/model file.
    #[error("bad dictionary ({section} at offset {offset}): {reason}")]
    BadDictionary {
        section: &'static str,
        offset: u64,
        reason: BadDictionaryReason,
    },

    /// Malformed input token.
    #[error("bad input at token {token_index}: {reason}")]
    BadInput { token_index: usize, reason: BadInputReason },

    /// A class invariant broke; indicates a bug.
    #[error("internal error in {context}: {reason}")]
    Internal { context: &'static str, reason: String },

    /// Allocation failure; always fatal.
    #[error("resource exhausted")]
    ResourceExhausted,
}

/// Why a dictionary or model file was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadDictionaryReason {
    /// File shorter than the structure being read requires.
    Truncated,
    /// Trailer magic bytes are not `"FS"`.
    BadMagic,
    /// Version field outside the supported range.
    BadVersion(u16),
    /// Anything else (duplicate section, dangling offset, rotten payload).
    Corrupt(String),
}

impl std::fmt::Display for BadDictionaryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BadDictionaryReason::Truncated => write!(f, "truncated"),
            BadDictionaryReason::BadMagic => write!(f, "trailer magic mismatch"),
            BadDictionaryReason::BadVersion(v) => write!(f, "unsupported version {v}"),
            BadDictionaryReason::Corrupt(msg) => write!(f, "{msg}"),
        }
    }
}

/// Why an input token was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadInputReason {
    /// `flush()` was called with an open sentence (missing `</s>`).
    IncompleteSentence,
    /// An XML tag runs past the end of the input.
    UnbalancedMarkup,
    /// A character the engine cannot represent.
    ImpossibleCharacter(char),
    /// Free-form description for everything else.
    Other(String),
}

impl std::fmt::Display for BadInputReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BadInputReason::IncompleteSentence => write!(f, "incomplete sentence"),
            BadInputReason::UnbalancedMarkup => write!(f, "unbalanced markup"),
            BadInputReason::ImpossibleCharacter(c) => write!(f, "impossible character {c:?}"),
            BadInputReason::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl EtmorfError {
    /// Dictionary error helper with a static section name.
    pub fn bad_dictionary(
        section: &'static str,
        offset: u64,
        reason: BadDictionaryReason,
    ) -> Self {
        EtmorfError::BadDictionary { section, offset, reason }
    }

    /// True when the pipeline that raised this error can keep running.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EtmorfError::BadInput { .. })
    }
}
