//! Guesser for out-of-vocabulary words.
//!
//! Matches the word tail against a table of ending-shape records; each
//! hit proposes a stem and an analysis, accepted only when the stem
//! passes the record's phonotype letters, the syllable window counted
//! from the last stressed syllable, and the blacklist checks. Capitalized
//! words shaped like names yield proper-name (`H`) analyses.

use once_cell::sync::Lazy;
use tracing::trace;

use crate::analysis::{Analysis, AnalysisSet, Provenance};
use crate::chars;
use crate::dictionary::{Dictionary, GuessRecord};
use crate::flags::Flags;
use crate::syllable;

/// Built-in ending-shape table, used when the dictionary carries none.
static DEFAULT_GUESS_ENDINGS: Lazy<Vec<GuessRecord>> = Lazy::new(|| {
    let entry = |key: &str, pos: char, ending: &str, form: &str| GuessRecord {
        key: key.to_string(),
        pos,
        ending: ending.to_string(),
        form: form.to_string(),
        stem_suffix: String::new(),
        phonotype: String::new(),
        min_syllables: 1,
        max_syllables: 5,
        type_word: String::new(),
    };
    vec![
        entry("ile", 'S', "le", "sg all,"),
        entry("ele", 'S', "le", "sg all,"),
        entry("ilt", 'S', "lt", "sg abl,"),
        entry("ist", 'S', "st", "sg el,"),
        entry("est", 'S', "st", "sg el,"),
        entry("iga", 'S', "ga", "sg kom,"),
        entry("ini", 'S', "ni", "sg ter,"),
        entry("iks", 'S', "ks", "sg tr,"),
        entry("isse", 'S', "sse", "sg ill,"),
        entry("idele", 'S', "dele", "pl all,"),
        entry("isid", 'S', "sid", "pl p,"),
        entry("id", 'S', "id", "pl p,"),
        entry("it", 'S', "t", "sg p,"),
        entry("is", 'S', "s", "sg in,"),
        entry("il", 'S', "l", "sg ad,"),
        entry("i", 'S', "0", "sg g,"),
        entry("ima", 'V', "ma", "ma,"),
        entry("ib", 'V', "b", "b,"),
    ]
});

/// Guess analyses for a word the dictionaries did not recognize.
pub fn guess(dict: &Dictionary, word: &str, flags: &Flags) -> AnalysisSet {
    let mut set = AnalysisSet::empty(word);
    if !flags.guess || !word_shaped(word) {
        return set;
    }
    let lowered = chars::lowercase(word);
    let name_shaped = name_shaped(word);

    let table: &[GuessRecord] = if dict.guess_endings.is_empty() {
        &DEFAULT_GUESS_ENDINGS
    } else {
        &dict.guess_endings
    };

    for record in table {
        let Some(stem) = candidate_stem(&lowered, record) else {
            continue;
        };
        if !stem_passes(dict, &stem, record) {
            continue;
        }
        if name_shaped {
            // The proper-name ending table vetoes endings never seen on
            // capitalized words.
            if dict
                .proper_endings
                .iter()
                .any(|(e, preferred)| !preferred && *e == record.ending)
            {
                continue;
            }
            let root = chars::capitalize_first(&stem);
            set.push_unique(Analysis::new(root, record.ending.clone(), "", "H", record.form.clone()));
        } else {
            set.push_unique(Analysis::new(
                stem,
                record.ending.clone(),
                "",
                record.pos.to_string(),
                record.form.clone(),
            ));
        }
    }

    if set.has_result() {
        set.provenance = Provenance::Guesser;
        set.sort_unique();
        if flags.first_only && set.analyses.len() > 1 {
            set.analyses.truncate(1);
        }
        if flags.add_lemmas || flags.lemma_only {
            set.fill_lemmas();
        }
    } else {
        trace!(word, "guesser found nothing");
    }
    set
}

/// Trim the record key, append the record's stem suffix.
fn candidate_stem(lowered: &str, record: &GuessRecord) -> Option<String> {
    let base = lowered.strip_suffix(record.key.as_str())?;
    let stem = format!("{base}{}", record.stem_suffix);
    (stem.chars().count() >= 3).then_some(stem)
}

/// Phonotype letters, syllable window and blacklists.
fn stem_passes(dict: &Dictionary, stem: &str, record: &GuessRecord) -> bool {
    if !record.phonotype.is_empty() && !phonotype_ok(stem, &record.stem_suffix, &record.phonotype) {
        return false;
    }

    let syllables = syllable::syllabify(stem);
    if syllables.is_empty() {
        return false;
    }
    let last_stressed = syllable::last_stressed(&syllables).unwrap_or(0);
    let window = syllables.len() - last_stressed;
    if window < record.min_syllables as usize || window > record.max_syllables as usize {
        return false;
    }

    if record.pos == 'V' && stem.ends_with("ne") && syllables.len() > 3 {
        return false;
    }
    if record.type_word == "ragin"
        && !(syllables.len() == 2 && window == 2 && syllables[0].quantity == 1)
    {
        return false;
    }
    // Overlong single-window stems in bare -l tend to be truncations.
    if window == 1
        && stem.ends_with('l')
        && !stem.ends_with("ll")
        && !stem.ends_with("rl")
        && !stem.ends_with("hl")
        && syllables[last_stressed].quantity == 3
    {
        let mut tail = stem.chars().rev();
        tail.next();
        if tail.next().is_some_and(chars::is_consonant) {
            return false;
        }
    }

    if dict.bad_stems.iter().any(|b| b == stem) {
        return false;
    }
    if dict.bad_suffixes.iter().any(|b| stem.ends_with(b.as_str())) {
        return false;
    }
    if record.ending == "0"
        && record.form.starts_with("sg n")
        && dict.bad_sg_nom.iter().any(|b| stem.ends_with(b.as_str()))
    {
        return false;
    }
    true
}

/// Check meta letters right-to-left against the stem tail before the
/// appended suffix.
fn phonotype_ok(stem: &str, stem_suffix: &str, meta: &str) -> bool {
    let core: Vec<char> = stem
        .strip_suffix(stem_suffix)
        .unwrap_or(stem)
        .chars()
        .collect();
    let k = meta.chars().count();
    if core.len() < k {
        return false;
    }
    let tail = &core[core.len() - k..];
    for (m, &c) in meta.chars().zip(tail.iter()) {
        let ok = match m {
            'V' => chars::is_vowel(c) || c == 'y',
            'L' => chars::is_lmnr(c),
            'P' => chars::is_kpt(c),
            'D' => chars::is_consonant(c) && c != 's',
            'C' => chars::is_consonant(c),
            'B' => chars::is_consonant(c) && !chars::is_kpt(c),
            _ => false,
        };
        if !ok {
            return false;
        }
    }
    true
}

/// Letters and inner hyphens only, at least three characters; an all-caps
/// run shorter than five reads as an acronym.
pub fn word_shaped(word: &str) -> bool {
    let n = word.chars().count();
    if n < 3 {
        return false;
    }
    if !word.chars().all(|c| chars::is_letter(c) || matches!(c, '-' | '/' | '\'')) {
        return false;
    }
    let upper_run = word.chars().take_while(|&c| chars::is_upper(c)).count();
    if upper_run == n && n < 5 {
        return false;
    }
    true
}

/// Could the casing make this a proper name?
pub fn name_shaped(word: &str) -> bool {
    if !word_shaped(word) {
        return false;
    }
    let cs: Vec<char> = word.chars().collect();
    // Nimi or eNimi, nothing else.
    if !chars::is_upper(cs[0]) && !(cs.len() > 1 && chars::is_upper(cs[1])) {
        return false;
    }
    // The lowercase tail must be long enough, apart from Mc/Mac names.
    let trailing_lower = cs.iter().rev().take_while(|&&c| !chars::is_upper(c)).count();
    if trailing_lower < 2 {
        let text: String = cs.iter().collect();
        if text.starts_with("Mc") || text.starts_with("Mac") {
            return true;
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::DictionaryBuilder;

    fn empty_dict() -> Dictionary {
        Dictionary::from_bytes(&DictionaryBuilder::new().to_bytes()).unwrap()
    }

    #[test]
    fn guesses_allative_proper_name() {
        let dict = empty_dict();
        let flags = Flags { guess: true, propername_inject: true, ..Flags::default() };
        let set = guess(&dict, "Dudajevile", &flags);
        assert!(
            set.analyses
                .iter()
                .any(|a| a.root == "Dudajev" && a.ending == "le" && a.pos == "H" && a.form == "sg all,"),
            "{:?}",
            set.analyses
        );
        assert_eq!(set.provenance, Provenance::Guesser);
    }

    #[test]
    fn lowercase_word_gets_common_noun_guess() {
        let dict = empty_dict();
        let set = guess(&dict, "krokodillile", &Flags::default());
        assert!(set
            .analyses
            .iter()
            .any(|a| a.root == "krokodill" && a.ending == "le" && a.pos == "S"));
    }

    #[test]
    fn guess_flag_off_means_no_result() {
        let dict = empty_dict();
        let flags = Flags { guess: false, ..Flags::default() };
        assert!(!guess(&dict, "Dudajevile", &flags).has_result());
    }

    #[test]
    fn short_and_nonalphabetic_words_are_skipped() {
        let dict = empty_dict();
        assert!(!guess(&dict, "ab", &Flags::default()).has_result());
        assert!(!guess(&dict, "a1b2c3", &Flags::default()).has_result());
    }

    #[test]
    fn acronym_is_not_guessed() {
        assert!(!word_shaped("NATO"));
        assert!(!name_shaped("NATOLE"));
    }

    #[test]
    fn blacklisted_stem_is_rejected() {
        let mut b = DictionaryBuilder::new();
        b.bad_stems.push("krokodill".into());
        let dict = Dictionary::from_bytes(&b.to_bytes()).unwrap();
        let set = guess(&dict, "krokodillile", &Flags::default());
        assert!(!set.analyses.iter().any(|a| a.root == "krokodill"));
    }

    #[test]
    fn forbidden_proper_name_ending_is_vetoed() {
        let mut b = DictionaryBuilder::new();
        b.proper_endings.push(("le".into(), false));
        let dict = Dictionary::from_bytes(&b.to_bytes()).unwrap();
        let set = guess(&dict, "Dudajevile", &Flags::default());
        assert!(!set.analyses.iter().any(|a| a.ending == "le"));
        // Lowercase words are unaffected by the proper-name table.
        let set = guess(&dict, "krokodillile", &Flags::default());
        assert!(set.analyses.iter().any(|a| a.ending == "le"));
    }

    #[test]
    fn phonotype_letters_filter_stems() {
        assert!(phonotype_ok("kana", "", "V"));
        assert!(!phonotype_ok("kann", "", "V"));
        assert!(phonotype_ok("kann", "", "L"));
        assert!(phonotype_ok("katk", "", "P"));
        assert!(!phonotype_ok("kass", "", "D"));
        assert!(phonotype_ok("kass", "", "C"));
    }

    #[test]
    fn name_shape_rules() {
        assert!(name_shaped("Dudajev"));
        assert!(name_shaped("McDonald"));
        assert!(!name_shaped("dudajev"));
        assert!(name_shaped("eNimi"));
    }
}
