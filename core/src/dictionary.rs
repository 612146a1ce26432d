//! Binary dictionary container and the main-dictionary tables.
//!
//! One container format serves the main dictionary, user-compiled
//! dictionaries and the disambiguation-model file: payload sections
//! followed by a trailer of `"FS"` magic, a `(u8 id, u32 offset)` section
//! table, the `u8` section count and an 18-byte `\nYY.MM.DD HH:MM:SS`
//! timestamp. Readers find everything from the end of the file; every
//! multi-byte integer is little-endian with explicit width.
//!
//! The stem area is prefix-compressed in fixed-size blocks behind a
//! binary-searchable block index; the block size is recorded in the
//! section payload, never assumed.
//!
//! `Dictionary::load` and `DictionaryBuilder::write_all` are the reference
//! read/write operations.

use std::path::Path;

use tracing::info;

use crate::error::{BadDictionaryReason, EtmorfError, Result};

/// Trailer magic.
pub const MAGIC: &[u8; 2] = b"FS";

/// Timestamp length, without any terminating NUL.
pub const TIMESTAMP_LEN: usize = 18;

/// Supported container versions.
pub const VERSION_MIN: u16 = 1;
pub const VERSION: u16 = 2;

/// Placeholder build stamp used when the caller does not supply one.
const DEFAULT_TIMESTAMP: &str = "\n26.01.01 00:00:00";

// Main-dictionary section ids.
pub const SEC_HEADER: u8 = 1;
pub const SEC_ENDINGS: u8 = 2;
pub const SEC_ENDING_GROUPS: u8 = 3;
pub const SEC_FORMS: u8 = 4;
pub const SEC_FORM_GROUPS: u8 = 5;
pub const SEC_SUFFIXES: u8 = 6;
pub const SEC_PREFIXES: u8 = 7;
pub const SEC_JUNCTIONS: u8 = 8;
pub const SEC_STRESS_MARKS: u8 = 9;
pub const SEC_POS_TABLE: u8 = 10;
pub const SEC_TABOO: u8 = 11;
pub const SEC_PROPER_ENDINGS: u8 = 12;
pub const SEC_GUESS_ENDINGS: u8 = 13;
pub const SEC_GUESS_STEMS: u8 = 14;
pub const SEC_STEM_INDEX: u8 = 15;
pub const SEC_STEM_BLOCKS: u8 = 16;
pub const SEC_BAD_STEMS: u8 = 17;
pub const SEC_BAD_SUFFIXES: u8 = 18;
pub const SEC_BAD_SG_NOM: u8 = 19;
pub const SEC_MWE_KEYS: u8 = 20;

/// Compound-position bits in [`StemRecord::compound_flags`].
pub const COMPOUND_LEAD: u8 = 0x01;
pub const COMPOUND_TAIL: u8 = 0x02;

/// Stem entries per compressed block (default; recorded on disk).
const DEFAULT_BLOCK_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Cursor / writer over raw bytes
// ---------------------------------------------------------------------------

/// Bounds-checked little-endian reader used by all section decoders.
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    section: &'static str,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8], section: &'static str) -> Self {
        Cursor { buf, pos: 0, section }
    }

    pub(crate) fn at(buf: &'a [u8], pos: usize, section: &'static str) -> Self {
        Cursor { buf, pos, section }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    fn truncated(&self) -> EtmorfError {
        EtmorfError::bad_dictionary(self.section, self.pos as u64, BadDictionaryReason::Truncated)
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(self.truncated());
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn f32(&mut self) -> Result<f32> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// `u8` length-prefixed UTF-8 string.
    pub(crate) fn short_str(&mut self) -> Result<String> {
        let n = self.u8()? as usize;
        let bytes = self.take(n)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            EtmorfError::bad_dictionary(
                self.section,
                self.pos as u64,
                BadDictionaryReason::Corrupt("invalid utf-8 in string".into()),
            )
        })
    }

    /// NUL-terminated UTF-8 string.
    pub(crate) fn c_str(&mut self) -> Result<String> {
        let start = self.pos;
        while self.pos < self.buf.len() && self.buf[self.pos] != 0 {
            self.pos += 1;
        }
        if self.pos >= self.buf.len() {
            return Err(self.truncated());
        }
        let s = String::from_utf8(self.buf[start..self.pos].to_vec()).map_err(|_| {
            EtmorfError::bad_dictionary(
                self.section,
                start as u64,
                BadDictionaryReason::Corrupt("invalid utf-8 in string".into()),
            )
        })?;
        self.pos += 1; // the NUL
        Ok(s)
    }
}

/// Growable little-endian writer used by the builders.
#[derive(Default)]
pub(crate) struct ByteWriter {
    pub(crate) buf: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub(crate) fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn short_str(&mut self, s: &str) {
        debug_assert!(s.len() <= u8::MAX as usize);
        self.u8(s.len() as u8);
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub(crate) fn c_str(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.u8(0);
    }
}

// ---------------------------------------------------------------------------
// Container trailer
// ---------------------------------------------------------------------------

/// Append the trailer to `out`: magic, section table, count, timestamp.
pub(crate) fn write_trailer(out: &mut ByteWriter, sections: &[(u8, u32)], timestamp: Option<&str>) {
    out.buf.extend_from_slice(MAGIC);
    for (id, offset) in sections {
        out.u8(*id);
        out.u32(*offset);
    }
    out.u8(sections.len() as u8);
    let stamp = timestamp.unwrap_or(DEFAULT_TIMESTAMP);
    debug_assert_eq!(stamp.len(), TIMESTAMP_LEN);
    out.buf.extend_from_slice(stamp.as_bytes());
}

/// Validate the `\nYY.MM.DD HH:MM:SS` shape.
fn timestamp_ok(stamp: &[u8]) -> bool {
    stamp.len() == TIMESTAMP_LEN
        && stamp[0] == b'\n'
        && stamp[3] == b'.'
        && stamp[6] == b'.'
        && stamp[9] == b' '
        && stamp[12] == b':'
        && stamp[15] == b':'
}

/// Locate and decode the trailer from the end of `bytes`.
pub(crate) fn read_trailer(bytes: &[u8]) -> Result<Vec<(u8, u32)>> {
    let err = |reason| EtmorfError::bad_dictionary("trailer", bytes.len() as u64, reason);
    if bytes.len() < TIMESTAMP_LEN + 1 + MAGIC.len() {
        return Err(err(BadDictionaryReason::Truncated));
    }
    let stamp = &bytes[bytes.len() - TIMESTAMP_LEN..];
    if !timestamp_ok(stamp) {
        return Err(err(BadDictionaryReason::Corrupt("bad timestamp".into())));
    }
    let count_pos = bytes.len() - TIMESTAMP_LEN - 1;
    let n = bytes[count_pos] as usize;
    let table_len = n * 5;
    if count_pos < table_len + MAGIC.len() {
        return Err(err(BadDictionaryReason::Truncated));
    }
    let table_pos = count_pos - table_len;
    if &bytes[table_pos - MAGIC.len()..table_pos] != MAGIC {
        return Err(err(BadDictionaryReason::BadMagic));
    }
    let mut cur = Cursor::at(bytes, table_pos, "trailer");
    let mut sections = Vec::with_capacity(n);
    for _ in 0..n {
        let id = cur.u8()?;
        let offset = cur.u32()?;
        if offset as usize >= table_pos {
            return Err(err(BadDictionaryReason::Corrupt(format!(
                "section {id} offset {offset} runs into the trailer"
            ))));
        }
        sections.push((id, offset));
    }
    Ok(sections)
}

/// Offset of a section, or a corrupt-file error naming it.
pub(crate) fn section_offset(sections: &[(u8, u32)], id: u8, name: &'static str) -> Result<usize> {
    sections
        .iter()
        .find(|(sid, _)| *sid == id)
        .map(|(_, off)| *off as usize)
        .ok_or_else(|| {
            EtmorfError::bad_dictionary(
                name,
                0,
                BadDictionaryReason::Corrupt("section missing".into()),
            )
        })
}

// ---------------------------------------------------------------------------
// Typed tables
// ---------------------------------------------------------------------------

/// Per-stem dictionary record.
///
/// Keyed by the surface stem allomorph; `root` carries the normalized
/// dictionary root when it differs (e.g. allomorph `pee` of `pida`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StemRecord {
    /// Part-of-speech character.
    pub pos: char,
    /// Ending group this stem inflects with.
    pub ending_group: u16,
    /// Inflection class.
    pub stem_class: u16,
    /// Junction-marker id used when this stem joins a compound.
    pub junction: u8,
    /// Stress/length marker id, 0 for none.
    pub stress: u8,
    /// Grammar-alternation class for the synthesizer.
    pub paradigm: u16,
    /// `COMPOUND_LEAD` / `COMPOUND_TAIL` bits.
    pub compound_flags: u8,
    /// Normalized root when the keyed stem is a mere allomorph.
    pub root: Option<String>,
}

impl StemRecord {
    pub fn can_lead_compound(&self) -> bool {
        self.compound_flags & COMPOUND_LEAD != 0
    }

    pub fn can_tail_compound(&self) -> bool {
        self.compound_flags & COMPOUND_TAIL != 0
    }

    /// Output root for a stem keyed as `stem`.
    pub fn root_for<'a>(&'a self, stem: &'a str) -> &'a str {
        self.root.as_deref().unwrap_or(stem)
    }
}

/// Derivational suffix entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SuffixInfo {
    pub suffix: String,
    /// Stem class the suffix attaches to; 0 accepts any.
    pub required_stem_class: u16,
    /// Part of speech of the derived word.
    pub result_pos: char,
    /// Ending groups available after the suffix.
    pub ending_groups: Vec<u16>,
}

/// Prefix entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixInfo {
    pub prefix: String,
    /// Stem class the prefix combines with; 0 accepts any.
    pub allowed_stem_class: u16,
    pub markers: u8,
}

/// One guess-table pattern record (shared by both guess tables).
#[derive(Debug, Clone, PartialEq)]
pub struct GuessRecord {
    /// Trailing characters of the word this record matches.
    pub key: String,
    /// Part of speech of the proposed analysis.
    pub pos: char,
    /// Proposed ending (`"0"` allowed).
    pub ending: String,
    /// Proposed form string.
    pub form: String,
    /// Appended to the trimmed stem to build the dictionary-style stem.
    pub stem_suffix: String,
    /// Phonotype constraint letters (`V L P D C B`) checked right-to-left
    /// against the candidate stem tail.
    pub phonotype: String,
    /// Inclusive window for syllables from the last stressed one.
    pub min_syllables: u8,
    pub max_syllables: u8,
    /// Paradigm exemplar; `"ragin"` triggers the quantity-1 restriction.
    pub type_word: String,
}

/// Compressed stem area: block index plus raw blocks.
#[derive(Debug, Default)]
pub(crate) struct StemArea {
    /// First stem of each block, sorted.
    pub(crate) index: Vec<String>,
    /// Byte range of each block inside `blocks`.
    pub(crate) ranges: Vec<(usize, usize)>,
    pub(crate) blocks: Vec<u8>,
    pub(crate) block_size: usize,
    pub(crate) stem_count: usize,
}

/// Loaded, immutable dictionary. Thread-safe for reads; share via `Arc`.
#[derive(Debug, Default)]
pub struct Dictionary {
    pub version: u16,
    pub endings: Vec<String>,
    /// Ending indices per group.
    pub ending_groups: Vec<Vec<u16>>,
    pub forms: Vec<String>,
    /// Form indices per group, aligned with `ending_groups`.
    pub form_groups: Vec<Vec<u16>>,
    pub suffixes: Vec<SuffixInfo>,
    pub prefixes: Vec<PrefixInfo>,
    pub junctions: Vec<String>,
    pub stress_marks: Vec<String>,
    pub pos_table: Vec<char>,
    pub taboo: Vec<String>,
    /// `(ending, preferred)` pairs for capitalized-word guessing.
    pub proper_endings: Vec<(String, bool)>,
    pub guess_endings: Vec<GuessRecord>,
    pub guess_stems: Vec<GuessRecord>,
    pub bad_stems: Vec<String>,
    pub bad_suffixes: Vec<String>,
    pub bad_sg_nom: Vec<String>,
    /// Multi-word keys (`_`-joined) for the expression merge.
    pub mwe_keys: Vec<String>,
    pub(crate) stems: StemArea,
}

impl Dictionary {
    /// Load a compiled dictionary file.
    pub fn load(path: impl AsRef<Path>) -> Result<Dictionary> {
        let bytes = std::fs::read(path.as_ref())?;
        let dict = Self::from_bytes(&bytes)?;
        info!(
            path = %path.as_ref().display(),
            stems = dict.stems.stem_count,
            endings = dict.endings.len(),
            groups = dict.ending_groups.len(),
            "dictionary loaded"
        );
        Ok(dict)
    }

    /// Decode a dictionary from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Dictionary> {
        let sections = read_trailer(bytes)?;
        let mut dict = Dictionary::default();

        let off = section_offset(&sections, SEC_HEADER, "header")?;
        let mut cur = Cursor::at(bytes, off, "header");
        dict.version = cur.u16()?;
        if !(VERSION_MIN..=VERSION).contains(&dict.version) {
            return Err(EtmorfError::bad_dictionary(
                "header",
                off as u64,
                BadDictionaryReason::BadVersion(dict.version),
            ));
        }

        dict.endings = read_string_table(bytes, &sections, SEC_ENDINGS, "endings")?;
        dict.ending_groups = read_index_groups(bytes, &sections, SEC_ENDING_GROUPS, "ending-groups")?;
        dict.forms = read_string_table(bytes, &sections, SEC_FORMS, "forms")?;
        dict.form_groups = read_index_groups(bytes, &sections, SEC_FORM_GROUPS, "form-groups")?;

        for (g, (eg, fg)) in dict.ending_groups.iter().zip(&dict.form_groups).enumerate() {
            if eg.len() != fg.len() {
                return Err(EtmorfError::bad_dictionary(
                    "form-groups",
                    0,
                    BadDictionaryReason::Corrupt(format!("group {g} misaligned with ending group")),
                ));
            }
        }

        let off = section_offset(&sections, SEC_SUFFIXES, "suffixes")?;
        let mut cur = Cursor::at(bytes, off, "suffixes");
        let n = cur.u16()? as usize;
        for _ in 0..n {
            let suffix = cur.short_str()?;
            let required_stem_class = cur.u16()?;
            let result_pos = cur.u8()? as char;
            let ng = cur.u8()? as usize;
            let mut ending_groups = Vec::with_capacity(ng);
            for _ in 0..ng {
                ending_groups.push(cur.u16()?);
            }
            dict.suffixes.push(SuffixInfo { suffix, required_stem_class, result_pos, ending_groups });
        }

        let off = section_offset(&sections, SEC_PREFIXES, "prefixes")?;
        let mut cur = Cursor::at(bytes, off, "prefixes");
        let n = cur.u16()? as usize;
        for _ in 0..n {
            let prefix = cur.short_str()?;
            let allowed_stem_class = cur.u16()?;
            let markers = cur.u8()?;
            dict.prefixes.push(PrefixInfo { prefix, allowed_stem_class, markers });
        }

        dict.junctions = read_string_table8(bytes, &sections, SEC_JUNCTIONS, "junctions")?;
        dict.stress_marks = read_string_table8(bytes, &sections, SEC_STRESS_MARKS, "stress-marks")?;

        let off = section_offset(&sections, SEC_POS_TABLE, "pos-table")?;
        let mut cur = Cursor::at(bytes, off, "pos-table");
        let n = cur.u8()? as usize;
        for _ in 0..n {
            dict.pos_table.push(cur.u8()? as char);
        }

        dict.taboo = read_string_table(bytes, &sections, SEC_TABOO, "taboo")?;
        dict.bad_stems = read_string_table(bytes, &sections, SEC_BAD_STEMS, "bad-stems")?;
        dict.bad_suffixes = read_string_table(bytes, &sections, SEC_BAD_SUFFIXES, "bad-suffixes")?;
        dict.bad_sg_nom = read_string_table(bytes, &sections, SEC_BAD_SG_NOM, "bad-sg-nom")?;
        dict.mwe_keys = read_string_table(bytes, &sections, SEC_MWE_KEYS, "mwe-keys")?;

        let off = section_offset(&sections, SEC_PROPER_ENDINGS, "proper-endings")?;
        let mut cur = Cursor::at(bytes, off, "proper-endings");
        let n = cur.u16()? as usize;
        for _ in 0..n {
            let ending = cur.short_str()?;
            let preferred = cur.u8()? != 0;
            dict.proper_endings.push((ending, preferred));
        }

        dict.guess_endings = read_guess_table(bytes, &sections, SEC_GUESS_ENDINGS, "guess-endings")?;
        dict.guess_stems = read_guess_table(bytes, &sections, SEC_GUESS_STEMS, "guess-stems")?;

        dict.stems = read_stem_area(bytes, &sections)?;
        Ok(dict)
    }

    /// Endings of an ending group.
    pub fn endings_of_group(&self, group: u16) -> &[u16] {
        self.ending_groups
            .get(group as usize)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Form strings allowed for `ending` within `group`.
    pub fn forms_for(&self, group: u16, ending: &str) -> Vec<&str> {
        let Some(eg) = self.ending_groups.get(group as usize) else {
            return Vec::new();
        };
        let Some(fg) = self.form_groups.get(group as usize) else {
            return Vec::new();
        };
        eg.iter()
            .zip(fg)
            .filter(|(e, _)| self.endings.get(**e as usize).map(String::as_str) == Some(ending))
            .filter_map(|(_, f)| self.forms.get(*f as usize).map(String::as_str))
            .collect()
    }

    /// True when the ending belongs to the group.
    pub fn group_has_ending(&self, group: u16, ending: &str) -> bool {
        self.endings_of_group(group)
            .iter()
            .any(|e| self.endings.get(*e as usize).map(String::as_str) == Some(ending))
    }

    /// Junction-marker literal for an id (`=` by convention at id 0).
    pub fn junction_marker(&self, id: u8) -> &str {
        self.junctions.get(id as usize).map(String::as_str).unwrap_or("=")
    }

    /// Taboo check over the markup-free lemma.
    pub fn is_taboo(&self, lemma: &str) -> bool {
        self.taboo.binary_search_by(|t| t.as_str().cmp(lemma)).is_ok()
    }

    /// Number of stems stored.
    pub fn stem_count(&self) -> usize {
        self.stems.stem_count
    }

    /// True when the `_`-joined key names a multi-word expression.
    pub fn is_mwe_key(&self, key: &str) -> bool {
        self.mwe_keys.binary_search_by(|k| k.as_str().cmp(key)).is_ok()
    }
}

fn read_string_table(
    bytes: &[u8],
    sections: &[(u8, u32)],
    id: u8,
    name: &'static str,
) -> Result<Vec<String>> {
    let off = section_offset(sections, id, name)?;
    let mut cur = Cursor::at(bytes, off, name);
    let n = cur.u16()? as usize;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(cur.short_str()?);
    }
    Ok(out)
}

fn read_string_table8(
    bytes: &[u8],
    sections: &[(u8, u32)],
    id: u8,
    name: &'static str,
) -> Result<Vec<String>> {
    let off = section_offset(sections, id, name)?;
    let mut cur = Cursor::at(bytes, off, name);
    let n = cur.u8()? as usize;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        out.push(cur.short_str()?);
    }
    Ok(out)
}

fn read_index_groups(
    bytes: &[u8],
    sections: &[(u8, u32)],
    id: u8,
    name: &'static str,
) -> Result<Vec<Vec<u16>>> {
    let off = section_offset(sections, id, name)?;
    let mut cur = Cursor::at(bytes, off, name);
    let n = cur.u16()? as usize;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let k = cur.u16()? as usize;
        let mut group = Vec::with_capacity(k);
        for _ in 0..k {
            group.push(cur.u16()?);
        }
        out.push(group);
    }
    Ok(out)
}

fn read_guess_table(
    bytes: &[u8],
    sections: &[(u8, u32)],
    id: u8,
    name: &'static str,
) -> Result<Vec<GuessRecord>> {
    let off = section_offset(sections, id, name)?;
    let mut cur = Cursor::at(bytes, off, name);
    let n = cur.u16()? as usize;
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let key = cur.short_str()?;
        let pos = cur.u8()? as char;
        let ending = cur.short_str()?;
        let form = cur.short_str()?;
        let stem_suffix = cur.short_str()?;
        let phonotype = cur.short_str()?;
        let min_syllables = cur.u8()?;
        let max_syllables = cur.u8()?;
        let type_word = cur.short_str()?;
        out.push(GuessRecord {
            key,
            pos,
            ending,
            form,
            stem_suffix,
            phonotype,
            min_syllables,
            max_syllables,
            type_word,
        });
    }
    Ok(out)
}

fn read_stem_area(bytes: &[u8], sections: &[(u8, u32)]) -> Result<StemArea> {
    let idx_off = section_offset(sections, SEC_STEM_INDEX, "stem-index")?;
    let blk_off = section_offset(sections, SEC_STEM_BLOCKS, "stem-blocks")?;

    let mut cur = Cursor::at(bytes, blk_off, "stem-blocks");
    let block_size = cur.u16()? as usize;
    let stem_count = cur.u32()? as usize;
    let blob_len = cur.u32()? as usize;
    let blocks = cur.take(blob_len)?.to_vec();

    let mut cur = Cursor::at(bytes, idx_off, "stem-index");
    let n_blocks = cur.u32()? as usize;
    let mut index = Vec::with_capacity(n_blocks);
    let mut ranges = Vec::with_capacity(n_blocks);
    let mut prev_end = 0usize;
    for _ in 0..n_blocks {
        let first = cur.short_str()?;
        let start = cur.u32()? as usize;
        let end = cur.u32()? as usize;
        if start != prev_end || end < start || end > blocks.len() {
            return Err(EtmorfError::bad_dictionary(
                "stem-index",
                cur.pos() as u64,
                BadDictionaryReason::Corrupt("block range out of order".into()),
            ));
        }
        prev_end = end;
        index.push(first);
        ranges.push((start, end));
    }
    if block_size == 0 && n_blocks > 0 {
        return Err(EtmorfError::bad_dictionary(
            "stem-blocks",
            blk_off as u64,
            BadDictionaryReason::Corrupt("zero block size".into()),
        ));
    }
    Ok(StemArea { index, ranges, blocks, block_size, stem_count })
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// In-memory dictionary under construction; `write_all` emits the binary
/// file the loader reads back.
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    pub endings: Vec<String>,
    pub ending_groups: Vec<Vec<u16>>,
    pub forms: Vec<String>,
    pub form_groups: Vec<Vec<u16>>,
    pub suffixes: Vec<SuffixInfo>,
    pub prefixes: Vec<PrefixInfo>,
    pub junctions: Vec<String>,
    pub stress_marks: Vec<String>,
    pub pos_table: Vec<char>,
    pub taboo: Vec<String>,
    pub proper_endings: Vec<(String, bool)>,
    pub guess_endings: Vec<GuessRecord>,
    pub guess_stems: Vec<GuessRecord>,
    pub bad_stems: Vec<String>,
    pub bad_suffixes: Vec<String>,
    pub bad_sg_nom: Vec<String>,
    pub mwe_keys: Vec<String>,
    stems: Vec<(String, Vec<StemRecord>)>,
    block_size: usize,
    timestamp: Option<String>,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        DictionaryBuilder {
            junctions: vec!["=".to_string(), "_".to_string()],
            block_size: DEFAULT_BLOCK_SIZE,
            ..Default::default()
        }
    }

    /// Override the stem-block size (entries per block).
    pub fn block_size(&mut self, size: usize) -> &mut Self {
        self.block_size = size.max(1);
        self
    }

    /// Build stamp for the trailer (`\nYY.MM.DD HH:MM:SS`).
    pub fn timestamp(&mut self, stamp: &str) -> &mut Self {
        if stamp.len() == TIMESTAMP_LEN {
            self.timestamp = Some(stamp.to_string());
        }
        self
    }

    /// Intern an ending string, returning its index.
    pub fn ending(&mut self, ending: &str) -> u16 {
        intern(&mut self.endings, ending)
    }

    /// Intern a form string, returning its index.
    pub fn form(&mut self, form: &str) -> u16 {
        intern(&mut self.forms, form)
    }

    /// Register an aligned (ending, form) group; returns the group id.
    pub fn group(&mut self, pairs: &[(&str, &str)]) -> u16 {
        let mut eg = Vec::with_capacity(pairs.len());
        let mut fg = Vec::with_capacity(pairs.len());
        for (e, f) in pairs {
            let ei = self.ending(e);
            let fi = self.form(f);
            eg.push(ei);
            fg.push(fi);
        }
        self.ending_groups.push(eg);
        self.form_groups.push(fg);
        (self.ending_groups.len() - 1) as u16
    }

    /// Add one stem record; stems may be added in any order.
    pub fn stem(&mut self, stem: &str, record: StemRecord) -> &mut Self {
        if let Some((_, records)) = self.stems.iter_mut().find(|(s, _)| s == stem) {
            records.push(record);
        } else {
            self.stems.push((stem.to_string(), vec![record]));
        }
        self
    }

    /// All records currently registered for a stem (builder-side lookup).
    pub fn records_of(&self, stem: &str) -> &[StemRecord] {
        self.stems
            .iter()
            .find(|(s, _)| s == stem)
            .map(|(_, r)| r.as_slice())
            .unwrap_or(&[])
    }

    /// Serialize the whole dictionary into container bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = ByteWriter::new();
        let mut sections: Vec<(u8, u32)> = Vec::new();
        let mut begin = |out: &mut ByteWriter, sections: &mut Vec<(u8, u32)>, id: u8| {
            sections.push((id, out.len() as u32));
        };

        begin(&mut out, &mut sections, SEC_HEADER);
        out.u16(VERSION);

        begin(&mut out, &mut sections, SEC_ENDINGS);
        write_string_table(&mut out, &self.endings);
        begin(&mut out, &mut sections, SEC_ENDING_GROUPS);
        write_index_groups(&mut out, &self.ending_groups);
        begin(&mut out, &mut sections, SEC_FORMS);
        write_string_table(&mut out, &self.forms);
        begin(&mut out, &mut sections, SEC_FORM_GROUPS);
        write_index_groups(&mut out, &self.form_groups);

        begin(&mut out, &mut sections, SEC_SUFFIXES);
        out.u16(self.suffixes.len() as u16);
        for s in &self.suffixes {
            out.short_str(&s.suffix);
            out.u16(s.required_stem_class);
            out.u8(s.result_pos as u8);
            out.u8(s.ending_groups.len() as u8);
            for g in &s.ending_groups {
                out.u16(*g);
            }
        }

        begin(&mut out, &mut sections, SEC_PREFIXES);
        out.u16(self.prefixes.len() as u16);
        for p in &self.prefixes {
            out.short_str(&p.prefix);
            out.u16(p.allowed_stem_class);
            out.u8(p.markers);
        }

        begin(&mut out, &mut sections, SEC_JUNCTIONS);
        out.u8(self.junctions.len() as u8);
        for j in &self.junctions {
            out.short_str(j);
        }
        begin(&mut out, &mut sections, SEC_STRESS_MARKS);
        out.u8(self.stress_marks.len() as u8);
        for s in &self.stress_marks {
            out.short_str(s);
        }
        begin(&mut out, &mut sections, SEC_POS_TABLE);
        out.u8(self.pos_table.len() as u8);
        for p in &self.pos_table {
            out.u8(*p as u8);
        }

        let mut sorted_taboo = self.taboo.clone();
        sorted_taboo.sort();
        begin(&mut out, &mut sections, SEC_TABOO);
        write_string_table(&mut out, &sorted_taboo);

        begin(&mut out, &mut sections, SEC_PROPER_ENDINGS);
        out.u16(self.proper_endings.len() as u16);
        for (e, preferred) in &self.proper_endings {
            out.short_str(e);
            out.u8(u8::from(*preferred));
        }

        begin(&mut out, &mut sections, SEC_GUESS_ENDINGS);
        write_guess_table(&mut out, &self.guess_endings);
        begin(&mut out, &mut sections, SEC_GUESS_STEMS);
        write_guess_table(&mut out, &self.guess_stems);

        begin(&mut out, &mut sections, SEC_BAD_STEMS);
        write_string_table(&mut out, &self.bad_stems);
        begin(&mut out, &mut sections, SEC_BAD_SUFFIXES);
        write_string_table(&mut out, &self.bad_suffixes);
        begin(&mut out, &mut sections, SEC_BAD_SG_NOM);
        write_string_table(&mut out, &self.bad_sg_nom);

        let mut sorted_mwe = self.mwe_keys.clone();
        sorted_mwe.sort();
        begin(&mut out, &mut sections, SEC_MWE_KEYS);
        write_string_table(&mut out, &sorted_mwe);

        // Stem area: sort, cut into blocks, prefix-compress each block.
        let mut stems = self.stems.clone();
        stems.sort_by(|a, b| a.0.cmp(&b.0));

        let block_size = self.block_size.max(1);
        let mut blob = ByteWriter::new();
        let mut index: Vec<(String, u32, u32)> = Vec::new();
        for chunk in stems.chunks(block_size) {
            let start = blob.len() as u32;
            let mut prev = "";
            for (stem, records) in chunk {
                let shared = shared_prefix_bytes(prev, stem);
                blob.u8(shared as u8);
                let rest = &stem.as_bytes()[shared..];
                blob.u8(rest.len() as u8);
                blob.buf.extend_from_slice(rest);
                blob.u8(records.len() as u8);
                for r in records {
                    blob.u8(r.pos as u8);
                    blob.u16(r.ending_group);
                    blob.u16(r.stem_class);
                    blob.u8(r.junction);
                    blob.u8(r.stress);
                    blob.u16(r.paradigm);
                    blob.u8(r.compound_flags);
                    blob.short_str(r.root.as_deref().unwrap_or(""));
                }
                prev = stem;
            }
            index.push((chunk[0].0.clone(), start, blob.len() as u32));
        }

        begin(&mut out, &mut sections, SEC_STEM_INDEX);
        out.u32(index.len() as u32);
        for (first, start, end) in &index {
            out.short_str(first);
            out.u32(*start);
            out.u32(*end);
        }

        begin(&mut out, &mut sections, SEC_STEM_BLOCKS);
        out.u16(block_size as u16);
        out.u32(stems.len() as u32);
        out.u32(blob.len() as u32);
        out.buf.extend_from_slice(&blob.buf);

        write_trailer(&mut out, &sections, self.timestamp.as_deref());
        out.buf
    }

    /// Write the compiled dictionary to disk.
    pub fn write_all(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes();
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            path = %path.as_ref().display(),
            stems = self.stems.len(),
            bytes = bytes.len(),
            "dictionary written"
        );
        Ok(())
    }
}

fn intern(table: &mut Vec<String>, value: &str) -> u16 {
    if let Some(i) = table.iter().position(|v| v == value) {
        return i as u16;
    }
    table.push(value.to_string());
    (table.len() - 1) as u16
}

fn write_string_table(out: &mut ByteWriter, table: &[String]) {
    out.u16(table.len() as u16);
    for s in table {
        out.short_str(s);
    }
}

fn write_index_groups(out: &mut ByteWriter, groups: &[Vec<u16>]) {
    out.u16(groups.len() as u16);
    for g in groups {
        out.u16(g.len() as u16);
        for i in g {
            out.u16(*i);
        }
    }
}

fn write_guess_table(out: &mut ByteWriter, table: &[GuessRecord]) {
    out.u16(table.len() as u16);
    for r in table {
        out.short_str(&r.key);
        out.u8(r.pos as u8);
        out.short_str(&r.ending);
        out.short_str(&r.form);
        out.short_str(&r.stem_suffix);
        out.short_str(&r.phonotype);
        out.u8(r.min_syllables);
        out.u8(r.max_syllables);
        out.short_str(&r.type_word);
    }
}

/// Whole bytes shared between consecutive keys, clamped to char and u8
/// boundaries.
fn shared_prefix_bytes(prev: &str, next: &str) -> usize {
    let mut n = prev
        .as_bytes()
        .iter()
        .zip(next.as_bytes())
        .take_while(|(a, b)| a == b)
        .count()
        .min(u8::MAX as usize);
    while n > 0 && !next.is_char_boundary(n) {
        n -= 1;
    }
    n
}
