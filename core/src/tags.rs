//! Mapping from (pos, form, surface) to compact disambiguation tags.
//!
//! The trigram model works over a closed tag inventory; this module
//! derives the tag candidates of a morphological analysis. Most of the
//! mapping is table-driven: punctuation and a list of fixed words map
//! directly, nominals combine a pos prefix with a case code, verbs
//! combine `VM` with a form code. The past-tense form `sid` is genuinely
//! two readings (2nd singular and 3rd plural) and always expands into two
//! tag candidates.

use crate::analysis::{Analysis, AnalysisSet};
use crate::chars;

/// The guaranteed-present fallback tag.
pub const UNKNOWN_TAG: &str = "X";

/// Sentence-boundary tag; must sit at index 0 of every model.
pub const BOUNDARY_TAG: &str = "###";

/// Punctuation surface -> tag.
static PUNCT_TAGS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "\"" => "WIQ",
    "«" => "WIQ",
    "»" => "WIQ",
    "“" => "WIQ",
    "”" => "WIQ",
    "„" => "WIQ",
    "‘" => "WIQ",
    "’" => "WIQ",
    "‹" => "WIQ",
    "›" => "WIQ",
    ":" => "WIL",
    ";" => "WIM",
    "," => "WIC",
    "." => "WCP",
    "?" => "WCU",
    "!" => "WCX",
    "-" => "WID",
    "--" => "WID",
    "(" => "WOB",
    "[" => "WOB",
    "{" => "WOB",
    ")" => "WCB",
    "]" => "WCB",
    "}" => "WCB",
    "/" => "WIA",
    ".." => "WIE",
    "..." => "WIE",
};

/// Fixed surface words with an unconditional tag (checked for non-proper
/// analyses before anything else).
static WORD_TAGS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "aga" => "CCJA",
    "ja" => "CCJA",
    "ning" => "CCJA",
    "hoopis" => "RRM",
    "iial" => "RRM",
    "jälle" => "RRM",
    "kas" => "RRY",
    "kuhu" => "RRY",
    "kuidas" => "RRY",
    "kus" => "RRY",
    "miks" => "RRY",
    "millal" => "RRY",
    "justkui" => "CSRR",
    "kui" => "CSRR",
    "kuigi" => "CSRR",
    "nagu" => "CSRR",
    "otsekui" => "CSRR",
    "kunagi" => "RRM",
    "maha" => "RRM",
    "nii" => "RRM",
    "nüüd" => "RRM",
    "peaaegu" => "RRM",
    "praegu" => "RRM",
    "rohkem" => "RRM",
    "täiesti" => "RRM",
    "uuesti" => "RRM",
    "väga" => "RRM",
    "üldse" => "RRM",
    "üles" => "RRM",
    "äkki" => "RRM",
    "koju" => "NCSA",
    "oli" => "VOLI",
    "on" => "VON",
};

/// Adverb subtypes by surface; everything else is a plain `RR`.
static ADVERB_TAGS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "aina" => "RRO",
    "ainult" => "RRM",
    "algul" => "RRK",
    "all" => "RRK",
    "alla" => "RRK",
    "alt" => "RRK",
    "arvatavasti" => "RRO",
    "edasi" => "RRK",
    "ees" => "RRK",
    "eest" => "RRK",
    "ehk" => "RRO",
    "enne" => "RRK",
    "ette" => "RRK",
    "juba" => "RRM",
    "juurde" => "RRK",
    "kaasa" => "RRK",
    "kinni" => "RRK",
    "kokku" => "RRK",
    "käest" => "RRK",
    "lahti" => "RRK",
    "läbi" => "RRK",
    "peale" => "RRK",
    "päris" => "RRO",
    "sisse" => "RRK",
    "taga" => "RRK",
    "vastu" => "RRK",
    "välja" => "RRK",
    "ära" => "RRK",
    "üle" => "RRK",
};

/// Conjunction surfaces that are coordinating.
static CONJ_TAGS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "ega" => "CCJV",
    "ehk" => "CCJV",
    "elik" => "CCJV",
    "või" => "CCJV",
    "vaid" => "CCJP",
    "kuid" => "CCJP",
    "ent" => "CCJP",
};

/// Adpositions usable both before and after their complement.
static ADPOS_BOTH: phf::Map<&'static str, (&'static str, &'static str)> = phf::phf_map! {
    "läbi" => ("ST", "SP"),
    "peale" => ("ST", "SP"),
    "vastu" => ("ST", "SP"),
    "üle" => ("ST", "SP"),
    "mööda" => ("ST", "SP"),
    "keset" => ("SP", "ST"),
};

/// Adpositions with one fixed order.
static ADPOS_ONE: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "alla" => "ST",
    "juurde" => "ST",
    "järgi" => "ST",
    "kohta" => "ST",
    "käest" => "ST",
    "poolest" => "ST",
    "pärast" => "ST",
    "sees" => "ST",
    "vahel" => "ST",
    "eest" => "ST",
    "enne" => "SP",
    "hoolimata" => "SP",
    "ilma" => "SP",
    "koos" => "SP",
    "kuni" => "SP",
    "tänu" => "SP",
};

/// Case code from a single form item (`sg `/`pl ` prefix already cut).
fn case_code(case: &str) -> Option<&'static str> {
    Some(match case {
        "ab" => "S",
        "abl" => "SA",
        "ad" => "SA",
        "adt" => "SA",
        "all" => "SA",
        "el" => "SA",
        "es" => "S",
        "g" => "SG",
        "ill" => "SA",
        "in" => "SA",
        "kom" => "S",
        "n" => "SN",
        "p" => "S1",
        "ter" => "S",
        "tr" => "S",
        _ => return None,
    })
}

/// Verb-form code; `None` means the invariable `S` tail, and the special
/// `sid` form is handled by the caller.
fn verb_code(form: &str) -> Option<&'static str> {
    Some(match form {
        "b" => "3",
        "d" => "2",
        "da" => "D",
        "des" => "G",
        "ge" => "K",
        "gem" => "K",
        "gu" => "3",
        "ks" => "S",
        "ksid" => "S",
        "ksime" => "S",
        "ksin" => "S",
        "ksite" => "S",
        "ma" => "M",
        "maks" => "G",
        "mas" => "M",
        "mast" => "M",
        "mata" => "ASS",
        "me" => "1",
        "n" => "1",
        "neg" => "E",
        "neg ge" => "S",
        "neg gem" => "S",
        "neg gu" => "S",
        "neg ks" => "S",
        "neg me" => "S",
        "neg nud" => "AS",
        "neg nuks" => "S",
        "neg o" => "K",
        "neg tud" => "AA",
        "neg vat" => "Q",
        "nud" => "AS",
        "nuks" => "S",
        "nuksid" => "S",
        "nuksime" => "S",
        "nuksin" => "S",
        "nuksite" => "S",
        "nuvat" => "Q",
        "o" => "K",
        "s" => "3",
        "sime" => "1",
        "sin" => "1",
        "site" => "2",
        "ta" => "N",
        "tagu" => "P",
        "taks" => "P",
        "takse" => "P",
        "tama" => "M",
        "tav" => "AP",
        "tavat" => "Q",
        "te" => "2",
        "ti" => "P",
        "tud" => "AS",
        "tuks" => "P",
        "tuvat" => "Q",
        "vat" => "Q",
        _ => return None,
    })
}

/// Nominal pos -> tag prefix.
fn nominal_prefix(pos: char) -> Option<&'static str> {
    Some(match pos {
        'S' => "NC",
        'H' => "NP",
        'A' | 'C' | 'U' => "A",
        'N' => "MC",
        'O' => "MO",
        'P' => "P",
        'Y' => "Y",
        _ => return None,
    })
}

/// Individual form items of a comma-separated form string.
fn form_items(form: &str) -> impl Iterator<Item = &str> {
    form.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Strip the number marker, keeping the case part.
fn cut_number(item: &str) -> &str {
    item.strip_prefix("sg ")
        .or_else(|| item.strip_prefix("pl "))
        .unwrap_or(item)
}

/// Tags for one analysis, in emission-candidate order.
pub fn tags_for(word: &str, analysis: &Analysis) -> Vec<String> {
    let surface = chars::lowercase(word);
    let pos = analysis.pos.chars().next().unwrap_or('X');

    if pos == 'Z' {
        let tag = PUNCT_TAGS
            .get(surface.as_str())
            .or_else(|| {
                let mut first = [0u8; 4];
                let c = surface.chars().next()?;
                PUNCT_TAGS.get(c.encode_utf8(&mut first))
            })
            .copied()
            .unwrap_or(UNKNOWN_TAG);
        return vec![tag.to_string()];
    }

    if pos != 'H' {
        if let Some(tag) = WORD_TAGS.get(surface.as_str()) {
            return vec![tag.to_string()];
        }
    }

    // Uninflecting classes: adverbs, interjections, abbreviation-like.
    if matches!(pos, 'D' | 'X' | 'I' | 'G') {
        let tag = ADVERB_TAGS.get(surface.as_str()).copied().unwrap_or("RR");
        return vec![tag.to_string()];
    }

    // nud/tud/dud participles of verbs and adjectives.
    if matches!(pos, 'V' | 'A')
        && (surface.ends_with("nud") || surface.ends_with("tud") || surface.ends_with("dud"))
    {
        return vec!["VMAZ".to_string()];
    }

    // üks/teine behave like pronouns regardless of their nominal pos.
    if matches!(pos, 'N' | 'O' | 'P') {
        let stem = analysis.plain_root();
        let special = match stem.as_str() {
            "üks" => Some("YK"),
            "teine" => Some("TEINE"),
            _ => None,
        };
        if let Some(prefix) = special {
            return vec![with_case(prefix, &analysis.form, "PSX")];
        }
    }

    if pos == 'P' {
        let stem = analysis.plain_root();
        let person = match stem.as_str() {
            "mina" => Some("PP1"),
            "sina" => Some("PP2"),
            "tema" => Some("PP3"),
            _ => None,
        };
        if let Some(prefix) = person {
            return vec![with_case(prefix, &analysis.form, "PSX")];
        }
    }

    if pos == 'J' {
        let tag = CONJ_TAGS.get(surface.as_str()).copied().unwrap_or("CS");
        return vec![tag.to_string()];
    }

    if pos == 'K' {
        if let Some((t1, t2)) = ADPOS_BOTH.get(surface.as_str()) {
            return vec![t1.to_string(), t2.to_string()];
        }
        if let Some(tag) = ADPOS_ONE.get(surface.as_str()) {
            return vec![tag.to_string()];
        }
        if surface.len() > 5
            && (surface.ends_with("poole") || surface.ends_with("pool") || surface.ends_with("poolt"))
        {
            return vec!["SP".to_string()];
        }
        return vec!["ST".to_string()];
    }

    if pos == 'V' {
        let mut tags: Vec<String> = Vec::new();
        for item in form_items(&analysis.form) {
            if item == "sid" {
                // sid is both 2nd singular and 3rd plural past.
                push_unique(&mut tags, "VM2".to_string());
                push_unique(&mut tags, "VM3".to_string());
            } else if let Some(code) = verb_code(item) {
                push_unique(&mut tags, format!("VM{code}"));
            }
        }
        if tags.is_empty() {
            tags.push("VMS".to_string());
        }
        return tags;
    }

    if let Some(prefix) = nominal_prefix(pos) {
        let mut tags: Vec<String> = Vec::new();
        for item in form_items(&analysis.form) {
            if let Some(code) = case_code(cut_number(item)) {
                push_unique(&mut tags, format!("{prefix}{code}"));
            }
        }
        if tags.is_empty() {
            // Invariable nominal.
            let fixed = if prefix == "NP" { "NC" } else { prefix };
            tags.push(format!("{fixed}SX"));
        }
        return tags;
    }

    vec![UNKNOWN_TAG.to_string()]
}

/// Prefix plus the case code of the first recognizable form item.
fn with_case(prefix: &str, form: &str, fallback: &str) -> String {
    for item in form_items(form) {
        if let Some(code) = case_code(cut_number(item)) {
            return format!("{prefix}{code}");
        }
    }
    fallback.to_string()
}

fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}

/// Attach disambiguation tags to every candidate of a set.
///
/// A candidate whose mapping yields several tags is cloned once per extra
/// tag, so the disambiguator sees one tag per candidate.
pub fn attach_tags(set: &mut AnalysisSet) {
    let word = set.word.clone();
    let mut expanded: Vec<Analysis> = Vec::new();
    for analysis in &set.analyses {
        let tags = tags_for(&word, analysis);
        for tag in tags {
            let mut clone = analysis.clone();
            clone.tag = Some(tag);
            if !expanded.contains(&clone) {
                expanded.push(clone);
            }
        }
    }
    set.analyses = expanded;
    set.sort_unique();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analysis;

    #[test]
    fn punctuation_maps_to_w_tags() {
        let a = Analysis::new(".", "0", "", "Z", "");
        assert_eq!(tags_for(".", &a), vec!["WCP"]);
        let a = Analysis::new(",", "0", "", "Z", "");
        assert_eq!(tags_for(",", &a), vec!["WIC"]);
        let a = Analysis::new("«", "0", "", "Z", "");
        assert_eq!(tags_for("«", &a), vec!["WIQ"]);
    }

    #[test]
    fn fixed_words_win_over_pos_rules() {
        let a = Analysis::new("ole", "0", "", "V", "b,");
        assert_eq!(tags_for("on", &a), vec!["VON"]);
        let a = Analysis::new("ja", "0", "", "J", "");
        assert_eq!(tags_for("ja", &a), vec!["CCJA"]);
    }

    #[test]
    fn noun_combines_prefix_and_case() {
        let a = Analysis::new("kass", "0", "", "S", "sg n,");
        assert_eq!(tags_for("kass", &a), vec!["NCSN"]);
        let a = Analysis::new("mets", "le", "", "H", "sg all,");
        assert_eq!(tags_for("Metsale", &a), vec!["NPSA"]);
    }

    #[test]
    fn sid_expands_to_two_verb_tags() {
        let a = Analysis::new("anda", "sid", "", "V", "sid,");
        assert_eq!(tags_for("andsid", &a), vec!["VM2", "VM3"]);
    }

    #[test]
    fn verb_without_code_is_invariable() {
        let a = Analysis::new("pida", "xyz", "", "V", "xyz,");
        assert_eq!(tags_for("pidaxyz", &a), vec!["VMS"]);
    }

    #[test]
    fn participle_is_vmaz() {
        let a = Analysis::new("luge", "nud", "", "V", "nud,");
        assert_eq!(tags_for("lugenud", &a), vec!["VMAZ"]);
    }

    #[test]
    fn personal_pronoun_gets_person_prefix() {
        let a = Analysis::new("tema", "0", "", "P", "sg n,");
        assert_eq!(tags_for("ta", &a), vec!["PP3SN"]);
    }

    #[test]
    fn attach_tags_clones_per_extra_tag() {
        let mut set = AnalysisSet::empty("andsid");
        set.analyses.push(Analysis::new("anda", "sid", "", "V", "sid,"));
        attach_tags(&mut set);
        assert_eq!(set.analyses.len(), 2);
        let tags: Vec<_> = set.analyses.iter().filter_map(|a| a.tag.clone()).collect();
        assert!(tags.contains(&"VM2".to_string()));
        assert!(tags.contains(&"VM3".to_string()));
    }

    #[test]
    fn invariable_nominal_gets_sx_tail() {
        let a = Analysis::new("kino", "0", "", "S", "?");
        assert_eq!(tags_for("kino", &a), vec!["NCSX"]);
    }
}
