//! Stem lookup over the compressed stem area.
//!
//! Binary search over the block index picks the block whose first stem is
//! the greatest one not after the key; the block is then decoded entry by
//! entry (each entry shares a byte prefix with its predecessor) until the
//! key is found or passed. Stored stems are lowercase; casing is handled
//! above this layer.

use crate::dictionary::{Cursor, Dictionary, StemRecord};
use crate::error::Result;

/// Outcome of an ending-compatibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compat {
    /// Ending not lawful for this stem.
    No,
    /// Lawful, nothing to re-attach.
    Yes,
    /// Lawful; the analyzer must re-attach this stress/junction marker.
    YesWithMarker(u8),
}

impl Dictionary {
    /// All records stored for `stem`, empty when unknown.
    pub fn lookup_stem(&self, stem: &str) -> Vec<StemRecord> {
        match self.lookup_stem_checked(stem) {
            Ok(records) => records,
            // A decode failure here means a corrupt block; lookups treat
            // it as an absent stem after the loader validated the file.
            Err(_) => Vec::new(),
        }
    }

    /// Fallible variant used by the loader's self-check.
    pub fn lookup_stem_checked(&self, stem: &str) -> Result<Vec<StemRecord>> {
        let area = &self.stems;
        if area.index.is_empty() {
            return Ok(Vec::new());
        }
        // Rightmost block whose first key is <= stem.
        let block = match area.index.binary_search_by(|first| first.as_str().cmp(stem)) {
            Ok(i) => i,
            Err(0) => return Ok(Vec::new()),
            Err(i) => i - 1,
        };
        let (start, end) = area.ranges[block];
        let mut cur = Cursor::at(&area.blocks[..end], start, "stem-blocks");
        let mut prev = String::new();
        while cur.pos() < end {
            let shared = cur.u8()? as usize;
            let rest_len = cur.u8()? as usize;
            let rest = cur.take(rest_len)?;
            let mut key = String::with_capacity(shared + rest_len);
            key.push_str(&prev[..shared.min(prev.len())]);
            key.push_str(std::str::from_utf8(rest).unwrap_or_default());
            let n_records = cur.u8()? as usize;
            if key == stem {
                let mut records = Vec::with_capacity(n_records);
                for _ in 0..n_records {
                    records.push(read_record(&mut cur)?);
                }
                return Ok(records);
            }
            if key.as_str() > stem {
                return Ok(Vec::new()); // sorted block, key passed
            }
            for _ in 0..n_records {
                let _ = read_record(&mut cur)?;
            }
            prev = key;
        }
        Ok(Vec::new())
    }

    /// True when the stem exists at all.
    pub fn has_stem(&self, stem: &str) -> bool {
        !self.lookup_stem(stem).is_empty()
    }

    /// Visit every (stem, record) pair in dictionary order.
    ///
    /// Decodes all blocks; meant for offline consumers (synthesizer index
    /// construction, inspection tools), not the per-word lookup path.
    pub fn for_each_stem<F: FnMut(&str, &StemRecord)>(&self, mut f: F) -> Result<()> {
        let area = &self.stems;
        for &(start, end) in &area.ranges {
            let mut cur = Cursor::at(&area.blocks[..end], start, "stem-blocks");
            let mut prev = String::new();
            while cur.pos() < end {
                let shared = cur.u8()? as usize;
                let rest_len = cur.u8()? as usize;
                let rest = cur.take(rest_len)?;
                let mut key = String::with_capacity(shared + rest_len);
                key.push_str(&prev[..shared.min(prev.len())]);
                key.push_str(std::str::from_utf8(rest).unwrap_or_default());
                let n_records = cur.u8()? as usize;
                for _ in 0..n_records {
                    let record = read_record(&mut cur)?;
                    f(&key, &record);
                }
                prev = key;
            }
        }
        Ok(())
    }

    /// Check an ending against a stem record's group tables.
    pub fn ending_compat(&self, record: &StemRecord, ending: &str) -> Compat {
        if !self.group_has_ending(record.ending_group, ending) {
            return Compat::No;
        }
        if record.stress != 0 {
            Compat::YesWithMarker(record.stress)
        } else {
            Compat::Yes
        }
    }

    /// Prefix entry by its literal text.
    pub fn prefix_info(&self, prefix: &str) -> Option<&crate::dictionary::PrefixInfo> {
        self.prefixes.iter().find(|p| p.prefix == prefix)
    }
}

fn read_record(cur: &mut Cursor<'_>) -> Result<StemRecord> {
    let pos = cur.u8()? as char;
    let ending_group = cur.u16()?;
    let stem_class = cur.u16()?;
    let junction = cur.u8()?;
    let stress = cur.u8()?;
    let paradigm = cur.u16()?;
    let compound_flags = cur.u8()?;
    let root = cur.short_str()?;
    Ok(StemRecord {
        pos,
        ending_group,
        stem_class,
        junction,
        stress,
        paradigm,
        compound_flags,
        root: (!root.is_empty()).then_some(root),
    })
}
