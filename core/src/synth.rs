//! Synthesizer: lemma + target form -> surface form(s).
//!
//! The inverse of the analyzer over the same tables. An index from
//! normalized root to its stem allomorphs is built once per dictionary;
//! generation walks the allomorphs, keeps those whose paradigm offers the
//! requested form and appends the matching endings. Out-of-vocabulary
//! lemmas fall back to the stem-shape guess table.

use ahash::AHashMap;
use tracing::debug;

use crate::analysis::{Analysis, AnalysisSet, Provenance, ZERO_ENDING};
use crate::chars;
use crate::dictionary::{Dictionary, StemRecord};
use crate::error::Result;
use crate::flags::Flags;

/// Reverse lookup over a loaded dictionary.
pub struct Synthesizer<'d> {
    dict: &'d Dictionary,
    /// Normalized root -> stem allomorphs carrying that root.
    by_root: AHashMap<String, Vec<(String, StemRecord)>>,
}

impl<'d> Synthesizer<'d> {
    /// Build the root index by one walk over the stem area.
    pub fn new(dict: &'d Dictionary) -> Result<Self> {
        let mut by_root: AHashMap<String, Vec<(String, StemRecord)>> = AHashMap::new();
        dict.for_each_stem(|stem, record| {
            by_root
                .entry(record.root_for(stem).to_string())
                .or_default()
                .push((stem.to_string(), record.clone()));
        })?;
        debug!(roots = by_root.len(), "synthesizer index built");
        Ok(Synthesizer { dict, by_root })
    }

    /// Generate every surface form of `lemma` matching `pos` and `form`.
    ///
    /// `form` is matched per item against the paradigm's form strings; an
    /// empty `form` generates the whole paradigm. Clitic, when given, is
    /// appended to each surface form.
    pub fn synthesize(
        &self,
        lemma: &str,
        pos: char,
        form: &str,
        clitic: &str,
        flags: &Flags,
    ) -> Vec<AnalysisSet> {
        let mut out: Vec<AnalysisSet> = Vec::new();
        if !self.dict.pos_table.is_empty() && !self.dict.pos_table.contains(&pos) {
            debug!(pos = %pos, "unknown part of speech requested");
            return out;
        }
        let lemma_lower = chars::lowercase(lemma);

        // Verb lemmas arrive in the ma-infinitive.
        let mut roots: Vec<String> = vec![lemma_lower.clone()];
        if pos == 'V' {
            if let Some(base) = lemma_lower.strip_suffix("ma") {
                roots.push(base.to_string());
            }
        }

        for root in &roots {
            let Some(allomorphs) = self.by_root.get(root) else { continue };
            for (stem, record) in allomorphs {
                if record.pos != pos {
                    continue;
                }
                self.expand(stem, record, lemma, form, clitic, &mut out);
            }
        }

        if out.is_empty() && flags.guess {
            self.guess_forms(&lemma_lower, lemma, pos, form, clitic, &mut out);
        }
        out
    }

    fn expand(
        &self,
        stem: &str,
        record: &StemRecord,
        lemma: &str,
        form: &str,
        clitic: &str,
        out: &mut Vec<AnalysisSet>,
    ) {
        let group = record.ending_group;
        let Some(endings) = self.dict.ending_groups.get(group as usize) else { return };
        let Some(forms) = self.dict.form_groups.get(group as usize) else { return };
        for (e_idx, f_idx) in endings.iter().zip(forms) {
            let Some(ending) = self.dict.endings.get(*e_idx as usize) else { continue };
            let Some(form_str) = self.dict.forms.get(*f_idx as usize) else { continue };
            if !form.is_empty() && !form_matches(form_str, form) {
                continue;
            }
            let mut surface = stem.replace('_', " ");
            if ending != ZERO_ENDING {
                surface.push_str(ending);
            }
            surface.push_str(clitic);
            if chars::starts_upper(lemma) {
                surface = chars::capitalize_first(&surface);
            }
            let mut analysis = Analysis::new(
                record.root_for(stem),
                ending.clone(),
                clitic,
                record.pos.to_string(),
                form_str.clone(),
            );
            analysis.lemma = Some(lemma.to_string());
            let mut set = AnalysisSet::with(surface, vec![analysis], Provenance::MainDict);
            set.span_count = 1 + stem.matches('_').count();
            if !out.contains(&set) {
                out.push(set);
            }
        }
    }

    /// Stem-shape guess table for lemmas the dictionary does not know.
    fn guess_forms(
        &self,
        lemma_lower: &str,
        lemma: &str,
        pos: char,
        form: &str,
        clitic: &str,
        out: &mut Vec<AnalysisSet>,
    ) {
        for record in &self.dict.guess_stems {
            if record.pos != pos {
                continue;
            }
            if !form.is_empty() && !form_matches(&record.form, form) {
                continue;
            }
            if !lemma_lower.ends_with(record.key.as_str()) {
                continue;
            }
            let base = &lemma_lower[..lemma_lower.len() - record.key.len()];
            let mut surface = format!("{base}{}", record.stem_suffix);
            if record.ending != ZERO_ENDING {
                surface.push_str(&record.ending);
            }
            surface.push_str(clitic);
            if chars::starts_upper(lemma) {
                surface = chars::capitalize_first(&surface);
            }
            let mut analysis = Analysis::new(
                format!("{base}{}", record.stem_suffix),
                record.ending.clone(),
                clitic,
                record.pos.to_string(),
                record.form.clone(),
            );
            analysis.lemma = Some(lemma.to_string());
            let set = AnalysisSet::with(surface, vec![analysis], Provenance::Guesser);
            if !out.contains(&set) {
                out.push(set);
            }
        }
    }
}

/// True when any item of the stored form string equals the request.
fn form_matches(stored: &str, requested: &str) -> bool {
    let requested = requested.trim().trim_end_matches(',');
    stored
        .split(',')
        .map(str::trim)
        .any(|item| item == requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::DictionaryBuilder;

    fn rec(pos: char, group: u16, root: Option<&str>) -> StemRecord {
        StemRecord {
            pos,
            ending_group: group,
            stem_class: 1,
            junction: 0,
            stress: 0,
            paradigm: 0,
            compound_flags: 0,
            root: root.map(str::to_string),
        }
    }

    fn build() -> Dictionary {
        let mut b = DictionaryBuilder::new();
        let g_noun = b.group(&[("0", "sg n,"), ("le", "sg all,"), ("d", "pl n,")]);
        let g_ti = b.group(&[("ti", "ti,")]);
        let g_verb = b.group(&[("b", "b,"), ("ma", "ma,")]);
        b.stem("kass", rec('S', g_noun, None));
        b.stem("pee", rec('V', g_ti, Some("pida")));
        b.stem("pida", rec('V', g_verb, None));
        Dictionary::from_bytes(&b.to_bytes()).unwrap()
    }

    #[test]
    fn noun_case_form_is_generated() {
        let dict = build();
        let synth = Synthesizer::new(&dict).unwrap();
        let sets = synth.synthesize("kass", 'S', "sg all", "", &Flags::default());
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].word, "kassle");
        assert_eq!(sets[0].analyses[0].form, "sg all,");
    }

    #[test]
    fn empty_form_generates_whole_paradigm() {
        let dict = build();
        let synth = Synthesizer::new(&dict).unwrap();
        let sets = synth.synthesize("kass", 'S', "", "", &Flags::default());
        let words: Vec<&str> = sets.iter().map(|s| s.word.as_str()).collect();
        assert!(words.contains(&"kass"));
        assert!(words.contains(&"kassle"));
        assert!(words.contains(&"kassd"));
    }

    #[test]
    fn verb_allomorph_is_found_through_ma_lemma() {
        let dict = build();
        let synth = Synthesizer::new(&dict).unwrap();
        let sets = synth.synthesize("pidama", 'V', "ti", "", &Flags::default());
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].word, "peeti");
        assert_eq!(sets[0].analyses[0].root, "pida");
    }

    #[test]
    fn clitic_is_appended_to_surface() {
        let dict = build();
        let synth = Synthesizer::new(&dict).unwrap();
        let sets = synth.synthesize("kass", 'S', "sg n", "ki", &Flags::default());
        assert_eq!(sets[0].word, "kasski");
        assert_eq!(sets[0].analyses[0].clitic, "ki");
    }

    #[test]
    fn capitalized_lemma_keeps_its_capital() {
        let mut b = DictionaryBuilder::new();
        let g = b.group(&[("0", "sg n,"), ("le", "sg all,")]);
        b.stem("mets", rec('H', g, None));
        let dict = Dictionary::from_bytes(&b.to_bytes()).unwrap();
        let synth = Synthesizer::new(&dict).unwrap();
        let sets = synth.synthesize("Mets", 'H', "sg all", "", &Flags::default());
        assert_eq!(sets[0].word, "Metsle");
    }

    #[test]
    fn pos_outside_the_table_generates_nothing() {
        let mut b = DictionaryBuilder::new();
        let g = b.group(&[("0", "sg n,")]);
        b.pos_table.extend("SV".chars());
        b.stem("kass", rec('S', g, None));
        let dict = Dictionary::from_bytes(&b.to_bytes()).unwrap();
        let synth = Synthesizer::new(&dict).unwrap();
        assert!(synth.synthesize("kass", 'Q', "sg n", "", &Flags::default()).is_empty());
        assert!(!synth.synthesize("kass", 'S', "sg n", "", &Flags::default()).is_empty());
    }

    #[test]
    fn unknown_lemma_uses_stem_guess_table(){
        let mut b = DictionaryBuilder::new();
        b.guess_stems.push(crate::dictionary::GuessRecord {
            key: "a".into(),
            pos: 'S',
            ending: "le".into(),
            form: "sg all,".into(),
            stem_suffix: "a".into(),
            phonotype: String::new(),
            min_syllables: 1,
            max_syllables: 5,
            type_word: String::new(),
        });
        let dict = Dictionary::from_bytes(&b.to_bytes()).unwrap();
        let synth = Synthesizer::new(&dict).unwrap();
        let sets = synth.synthesize("roheka", 'S', "sg all", "", &Flags::default());
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].word, "rohekale");
        assert_eq!(sets[0].provenance, Provenance::Guesser);
    }
}
