//! Tag-trigram disambiguation model.
//!
//! Holds the tag inventory, unigram counts, the flat `|T|³` trigram cube
//! of log-probabilities, the lexical emission table and the
//! ambiguity-class table. Stored in the shared binary container under the
//! `T3*` section ids; tag index 0 is the sentence-boundary tag and every
//! loaded model must carry [`crate::tags::UNKNOWN_TAG`] somewhere in its
//! inventory.

use std::path::Path;

use ahash::AHashMap;
use tracing::info;

use crate::dictionary::{
    read_trailer, section_offset, write_trailer, ByteWriter, Cursor,
};
use crate::error::{BadDictionaryReason, EtmorfError, Result};
use crate::tags::{BOUNDARY_TAG, UNKNOWN_TAG};

// Model-file section ids.
pub const T3TAGS: u8 = 1;
pub const T3GRAMS: u8 = 2;
pub const T3LEX_WLST: u8 = 3;
pub const T3M_KLASSID: u8 = 4;
pub const T3LEXCOOP: u8 = 5;

/// Log-probability of an unseen event.
pub const LOG_ZERO: f32 = f32::NEG_INFINITY;

/// `(tag index, log probability)` pair used by both emission tables.
pub type TagProb = (u8, f32);

/// Loaded disambiguation model; immutable and `Sync`.
#[derive(Debug, Default)]
pub struct TrigramModel {
    /// Distinct tag strings; position is the tag index.
    tags: Vec<String>,
    /// Occurrence counts in the training corpus, aligned with `tags`.
    unigram: Vec<u32>,
    /// Flat `|T|³` cube; see [`TrigramModel::trigram`].
    grams: Vec<f32>,
    /// Surface form (spaces as `_`) -> lexical emission distribution.
    lexicon: AHashMap<String, Vec<TagProb>>,
    /// Sorted candidate tag set -> smoothed distribution.
    classes: AHashMap<Vec<u8>, Vec<TagProb>>,
}

impl TrigramModel {
    /// Load a compiled model file.
    pub fn load(path: impl AsRef<Path>) -> Result<TrigramModel> {
        let bytes = std::fs::read(path.as_ref())?;
        let model = Self::from_bytes(&bytes)?;
        info!(
            path = %path.as_ref().display(),
            tags = model.tags.len(),
            lexicon = model.lexicon.len(),
            classes = model.classes.len(),
            "disambiguation model loaded"
        );
        Ok(model)
    }

    /// Decode a model from container bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<TrigramModel> {
        let sections = read_trailer(bytes)?;
        let mut model = TrigramModel::default();

        let off = section_offset(&sections, T3TAGS, "t3-tags")?;
        let mut cur = Cursor::at(bytes, off, "t3-tags");
        let n = cur.u32()? as usize;
        if n == 0 || n > u8::MAX as usize {
            return Err(EtmorfError::bad_dictionary(
                "t3-tags",
                off as u64,
                BadDictionaryReason::Corrupt(format!("tag count {n} out of range")),
            ));
        }
        for _ in 0..n {
            model.tags.push(cur.c_str()?);
        }
        for _ in 0..n {
            model.unigram.push(cur.u32()?);
        }
        if model.tags[0] != BOUNDARY_TAG {
            return Err(EtmorfError::bad_dictionary(
                "t3-tags",
                off as u64,
                BadDictionaryReason::Corrupt("tag 0 is not the boundary tag".into()),
            ));
        }
        if !model.tags.iter().any(|t| t == UNKNOWN_TAG) {
            return Err(EtmorfError::bad_dictionary(
                "t3-tags",
                off as u64,
                BadDictionaryReason::Corrupt("tag inventory lacks X".into()),
            ));
        }

        let off = section_offset(&sections, T3GRAMS, "t3-grams")?;
        let mut cur = Cursor::at(bytes, off, "t3-grams");
        let cube = n * n * n;
        model.grams.reserve_exact(cube);
        for _ in 0..cube {
            model.grams.push(cur.f32()?);
        }

        let off = section_offset(&sections, T3LEX_WLST, "t3-lexicon")?;
        let mut cur = Cursor::at(bytes, off, "t3-lexicon");
        let entries = cur.u32()? as usize;
        let mut heads = Vec::with_capacity(entries);
        for _ in 0..entries {
            let record_off = cur.u32()? as usize;
            let form = cur.c_str()?;
            heads.push((form, record_off));
        }
        for (form, record_off) in heads {
            let mut rcur = Cursor::at(bytes, record_off, "t3-lexicon");
            let k = rcur.u8()? as usize;
            let mut probs = Vec::with_capacity(k);
            for _ in 0..k {
                let tag = rcur.u8()?;
                let p = rcur.f32()?;
                probs.push((tag, p));
            }
            model.lexicon.insert(form, probs);
        }

        let off = section_offset(&sections, T3M_KLASSID, "t3-classes")?;
        let mut cur = Cursor::at(bytes, off, "t3-classes");
        let classes = cur.u32()? as usize;
        for _ in 0..classes {
            let k = cur.u8()? as usize;
            let mut probs = Vec::with_capacity(k);
            for _ in 0..k {
                let tag = cur.u8()?;
                let p = cur.f32()?;
                probs.push((tag, p));
            }
            let mut key: Vec<u8> = probs.iter().map(|(t, _)| *t).collect();
            key.sort_unstable();
            model.classes.insert(key, probs);
        }

        Ok(model)
    }

    /// Number of tags (including the boundary tag).
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Tag string by index.
    pub fn tag(&self, idx: u8) -> &str {
        self.tags.get(idx as usize).map(String::as_str).unwrap_or(UNKNOWN_TAG)
    }

    /// Index of a tag string.
    pub fn tag_index(&self, tag: &str) -> Option<u8> {
        self.tags.iter().position(|t| t == tag).map(|i| i as u8)
    }

    /// Index of the guaranteed `X` tag.
    pub fn unknown_index(&self) -> u8 {
        self.tag_index(UNKNOWN_TAG).unwrap_or(0)
    }

    /// Corpus count of a tag.
    pub fn unigram_count(&self, idx: u8) -> u32 {
        self.unigram.get(idx as usize).copied().unwrap_or(0)
    }

    /// `ln P(t3 | t1, t2)`, `LOG_ZERO` when unseen.
    ///
    /// The cube is kept in file order: `t1` outermost, `t3` innermost.
    pub fn trigram(&self, t3: u8, t1: u8, t2: u8) -> f32 {
        let n = self.tags.len();
        let idx = (t1 as usize * n + t2 as usize) * n + t3 as usize;
        self.grams.get(idx).copied().unwrap_or(LOG_ZERO)
    }

    /// Lexical emission distribution for a surface form.
    pub fn lexical(&self, form: &str) -> Option<&[TagProb]> {
        self.lexicon.get(form).map(Vec::as_slice)
    }

    /// Smoothed distribution of an ambiguity class (sorted tag indices).
    pub fn ambiguity_class(&self, key: &[u8]) -> Option<&[TagProb]> {
        self.classes.get(key).map(Vec::as_slice)
    }
}

/// In-memory model under construction; the write side of the `T3*`
/// sections, used by the model-compilation tool and the tests.
#[derive(Debug, Default)]
pub struct TrigramModelBuilder {
    tags: Vec<String>,
    unigram: Vec<u32>,
    grams: AHashMap<(u8, u8, u8), f32>,
    lexicon: Vec<(String, Vec<TagProb>)>,
    classes: Vec<Vec<TagProb>>,
    timestamp: Option<String>,
}

impl TrigramModelBuilder {
    /// Start a builder with the boundary tag preinstalled at index 0.
    pub fn new() -> Self {
        let mut b = TrigramModelBuilder::default();
        b.tags.push(BOUNDARY_TAG.to_string());
        b.unigram.push(0);
        b
    }

    /// Build stamp for the trailer.
    pub fn timestamp(&mut self, stamp: &str) -> &mut Self {
        self.timestamp = Some(stamp.to_string());
        self
    }

    /// Intern a tag, returning its index.
    pub fn tag(&mut self, tag: &str) -> u8 {
        if let Some(i) = self.tags.iter().position(|t| t == tag) {
            return i as u8;
        }
        self.tags.push(tag.to_string());
        self.unigram.push(0);
        (self.tags.len() - 1) as u8
    }

    /// Set a tag's corpus count.
    pub fn unigram_count(&mut self, tag: &str, count: u32) -> &mut Self {
        let i = self.tag(tag);
        self.unigram[i as usize] = count;
        self
    }

    /// Set `ln P(t3 | t1, t2)`.
    pub fn trigram(&mut self, t3: &str, t1: &str, t2: &str, log_p: f32) -> &mut Self {
        let key = (self.tag(t3), self.tag(t1), self.tag(t2));
        self.grams.insert(key, log_p);
        self
    }

    /// Add a lexical emission entry (`form` with spaces already as `_`).
    pub fn lexical(&mut self, form: &str, probs: &[(&str, f32)]) -> &mut Self {
        let probs = probs
            .iter()
            .map(|(t, p)| (self.tag(t), *p))
            .collect::<Vec<_>>();
        self.lexicon.push((form.to_string(), probs));
        self
    }

    /// Add an ambiguity class over the given tags.
    pub fn class(&mut self, probs: &[(&str, f32)]) -> &mut Self {
        let probs = probs
            .iter()
            .map(|(t, p)| (self.tag(t), *p))
            .collect::<Vec<_>>();
        self.classes.push(probs);
        self
    }

    /// Serialize into container bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let n = self.tags.len();
        let mut out = ByteWriter::new();
        let mut sections: Vec<(u8, u32)> = Vec::new();

        sections.push((T3TAGS, out.len() as u32));
        out.u32(n as u32);
        for tag in &self.tags {
            out.c_str(tag);
        }
        for count in &self.unigram {
            out.u32(*count);
        }

        sections.push((T3GRAMS, out.len() as u32));
        for t1 in 0..n as u8 {
            for t2 in 0..n as u8 {
                for t3 in 0..n as u8 {
                    let p = self.grams.get(&(t3, t1, t2)).copied().unwrap_or(LOG_ZERO);
                    out.f32(p);
                }
            }
        }

        // Lexicon: entry table first, records right behind it; offsets in
        // the table are absolute file positions.
        let mut entries = self.lexicon.clone();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        sections.push((T3LEX_WLST, out.len() as u32));
        let table_len: usize =
            4 + entries.iter().map(|(form, _)| 4 + form.len() + 1).sum::<usize>();
        let mut record_off = out.len() + table_len;
        out.u32(entries.len() as u32);
        for (form, probs) in &entries {
            out.u32(record_off as u32);
            out.c_str(form);
            record_off += 1 + probs.len() * 5;
        }
        for (_, probs) in &entries {
            out.u8(probs.len() as u8);
            for (tag, p) in probs {
                out.u8(*tag);
                out.f32(*p);
            }
        }

        sections.push((T3M_KLASSID, out.len() as u32));
        out.u32(self.classes.len() as u32);
        for probs in &self.classes {
            out.u8(probs.len() as u8);
            for (tag, p) in probs {
                out.u8(*tag);
                out.f32(*p);
            }
        }

        write_trailer(&mut out, &sections, self.timestamp.as_deref());
        out.buf
    }

    /// Write the compiled model to disk.
    pub fn write_all(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes();
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            path = %path.as_ref().display(),
            tags = self.tags.len(),
            bytes = bytes.len(),
            "disambiguation model written"
        );
        Ok(())
    }
}
