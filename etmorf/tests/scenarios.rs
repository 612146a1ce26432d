//! End-to-end scenarios over a dictionary and model built in the test,
//! written to disk and loaded back through the real file path.

use std::path::Path;
use std::sync::Arc;

use etmorf::{Engine, MAIN_DICT, T3_MODEL};
use etmorf_core::dictionary::{DictionaryBuilder, StemRecord, COMPOUND_LEAD, COMPOUND_TAIL};
use etmorf_core::{parse_set, Dictionary, Flags, Lyli, Provenance, TrigramModelBuilder};

fn rec(pos: char, group: u16) -> StemRecord {
    StemRecord {
        pos,
        ending_group: group,
        stem_class: 1,
        junction: 0,
        stress: 0,
        paradigm: 0,
        compound_flags: COMPOUND_LEAD | COMPOUND_TAIL,
        root: None,
    }
}

fn rec_root(pos: char, group: u16, root: &str) -> StemRecord {
    StemRecord { root: Some(root.to_string()), ..rec(pos, group) }
}

fn build_dictionary() -> DictionaryBuilder {
    let mut b = DictionaryBuilder::new();
    let g_noun = b.group(&[("0", "sg n,"), ("d", "pl n,"), ("le", "sg all,"), ("s", "sg in,")]);
    let g_adt = b.group(&[("0", "adt, sg p,")]);
    let g_ti = b.group(&[("ti", "ti,")]);
    let g_verb = b.group(&[("b", "b,"), ("ma", "ma,")]);
    let g_on = b.group(&[("0", "b,")]);
    let g_pron = b.group(&[("0", "sg n,")]);

    b.stem("kass", rec('S', g_noun));
    b.stem("maja", rec('S', g_noun));
    b.stem("kodu", rec('S', g_noun));
    b.stem("raud", rec('S', g_noun));
    b.stem("tee", rec('S', g_noun));
    b.stem("peeti", rec_root('S', g_adt, "peet"));
    b.stem("pee", rec_root('V', g_ti, "pida"));
    b.stem("pida", rec('V', g_verb));
    b.stem("on", rec_root('V', g_on, "ole"));
    b.stem("ta", rec_root('P', g_pron, "tema"));
    b.stem("ta", rec('S', g_pron));
    b.stem("sri_lanka", rec('H', g_noun));
    b.mwe_keys.push("sri_lanka".into());
    b
}

fn build_model() -> TrigramModelBuilder {
    let mut m = TrigramModelBuilder::new();
    for t in ["PP3SN", "NCSN", "VON", "NCSA", "WCP", "X", "NPSN", "S1"] {
        m.tag(t);
    }
    m.unigram_count("PP3SN", 50)
        .unigram_count("NCSN", 100)
        .unigram_count("VON", 90)
        .unigram_count("NCSA", 40)
        .unigram_count("WCP", 70)
        .unigram_count("X", 3)
        .trigram("PP3SN", "###", "###", -0.5)
        .trigram("NCSN", "###", "###", -1.5)
        .trigram("VON", "###", "PP3SN", -0.4)
        .trigram("VON", "###", "NCSN", -2.0)
        .trigram("NCSA", "PP3SN", "VON", -0.6)
        .trigram("NCSN", "PP3SN", "VON", -1.8)
        .trigram("WCP", "VON", "NCSA", -0.3)
        .trigram("WCP", "VON", "NCSN", -1.2)
        .trigram("###", "NCSA", "WCP", -0.2)
        .trigram("###", "NCSN", "WCP", -0.9);
    m
}

fn write_all(dir: &Path) {
    build_dictionary().write_all(dir.join(MAIN_DICT)).unwrap();
    build_model().write_all(dir.join(T3_MODEL)).unwrap();
}

fn engine(dir: &Path, flags: Flags) -> Engine {
    Engine::open(dir, flags).unwrap()
}

fn tuples(set: &etmorf_core::AnalysisSet) -> Vec<(String, String, String, String, String)> {
    set.analyses
        .iter()
        .map(|a| {
            (
                a.root.clone(),
                a.ending.clone(),
                a.clitic.clone(),
                a.pos.clone(),
                a.form.clone(),
            )
        })
        .collect()
}

#[test]
fn scenario_unambiguous_noun() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let e = engine(dir.path(), Flags::default());
    let out = e.run(["kass"]).unwrap();
    let set = out[0].analysis().unwrap();
    assert_eq!(
        tuples(set),
        vec![(
            "kass".into(),
            "0".into(),
            "".into(),
            "S".into(),
            "sg n,".into()
        )]
    );
}

#[test]
fn scenario_partitive_ambiguity() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let e = engine(dir.path(), Flags { guess: false, ..Flags::default() });
    let out = e.run(["peeti"]).unwrap();
    let set = out[0].analysis().unwrap();
    let got = tuples(set);
    assert!(got.contains(&("peet".into(), "0".into(), "".into(), "S".into(), "adt, sg p,".into())), "{got:?}");
    assert!(got.contains(&("pida".into(), "ti".into(), "".into(), "V".into(), "ti,".into())), "{got:?}");
    assert_eq!(got.len(), 2);
}

#[test]
fn scenario_multiword_proper_name_merge() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let flags = Flags { merge_mwe: true, ..Flags::default() };
    let e = engine(dir.path(), flags);
    let out = e.run(["Sri", "Lanka"]).unwrap();
    let sets: Vec<_> = out.iter().filter_map(|l| l.analysis()).collect();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].word, "Sri Lanka");
    assert_eq!(sets[0].span_count, 2);
    assert!(sets[0].analyses.iter().any(|a| a.pos == "H"));
}

#[test]
fn scenario_clitic_attachment() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let e = engine(dir.path(), Flags::default());
    let out = e.run(["majagi"]).unwrap();
    let set = out[0].analysis().unwrap();
    assert!(
        set.analyses
            .iter()
            .any(|a| a.root == "maja" && a.ending == "0" && a.clitic == "gi" && a.pos == "S" && a.form == "sg n,"),
        "{:?}",
        set.analyses
    );
}

#[test]
fn scenario_unknown_word_guessed_as_proper_name() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let flags = Flags { guess: true, propername_inject: true, ..Flags::default() };
    let e = engine(dir.path(), flags);
    let out = e.run(["Dudajevile"]).unwrap();
    let set = out[0].analysis().unwrap();
    assert_eq!(set.provenance, Provenance::Guesser);
    assert!(
        set.analyses
            .iter()
            .any(|a| a.root == "Dudajev" && a.ending == "le" && a.pos == "H" && a.form == "sg all,"),
        "{:?}",
        set.analyses
    );
}

#[test]
fn scenario_disambiguation_picks_context_tags() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let flags = Flags {
        disambiguate: true,
        tag_with_dtag: true,
        ..Flags::default()
    };
    let e = engine(dir.path(), flags);
    let out = e
        .run(["<s>", "Ta", "on", "kodus", ".", "</s>"])
        .unwrap();
    let sets: Vec<_> = out.iter().filter_map(|l| l.analysis()).collect();
    assert_eq!(sets.len(), 4);
    for set in &sets {
        assert_eq!(set.analyses.len(), 1, "one analysis must survive: {set:?}");
    }
    let tags: Vec<&str> = sets
        .iter()
        .map(|s| s.analyses[0].tag.as_deref().unwrap())
        .collect();
    assert!(tags[0].starts_with('P'), "Ta should be a pronoun: {tags:?}");
    assert!(tags[1].starts_with('V'), "on should be a verb: {tags:?}");
    assert_eq!(tags[2], "NCSA", "kodus should be the locative noun: {tags:?}");
    assert_eq!(tags[3], "WCP");
}

#[test]
fn invariant_token_count_preservation() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let flags = Flags { merge_mwe: true, ..Flags::default() };
    let e = engine(dir.path(), flags);
    let out = e
        .run(["<s>", "kass", "Sri", "Lanka", "maja", "</s>"])
        .unwrap();
    let structural = out.iter().filter(|l| l.is_tag()).count();
    assert_eq!(structural, 2);
    let sets: Vec<_> = out.iter().filter_map(|l| l.analysis()).collect();
    let consumed: usize = sets.iter().map(|s| s.span_count).sum();
    assert_eq!(consumed, 4);
    assert_eq!(sets.len(), 4 - 1); // one merge consumed one extra token
}

#[test]
fn invariant_determinism() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let run = || {
        let e = engine(
            dir.path(),
            Flags { merge_mwe: true, tag_with_dtag: true, ..Flags::default() },
        );
        let out = e
            .run(["kass", "peeti", "majagi", "Sri", "Lanka", "."])
            .unwrap();
        out.iter()
            .filter_map(|l| l.analysis())
            .map(|s| s.serialize(false))
            .collect::<String>()
    };
    assert_eq!(run(), run());
}

#[test]
fn invariant_serialization_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let e = engine(dir.path(), Flags::default());
    let out = e.run(["peeti", "majagi"]).unwrap();
    for lyli in out {
        let Lyli::Analysis(set) = lyli else { continue };
        let text = set.serialize(false);
        let parsed = parse_set(&text).unwrap();
        assert_eq!(parsed.word, set.word);
        assert_eq!(parsed.analyses, set.analyses);
    }
}

#[test]
fn invariant_guesser_never_runs_for_known_words() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let e = engine(dir.path(), Flags::default());
    let out = e.run(["kass", "krokodillile"]).unwrap();
    let sets: Vec<_> = out.iter().filter_map(|l| l.analysis()).collect();
    assert_eq!(sets[0].provenance, Provenance::MainDict);
    assert_eq!(sets[1].provenance, Provenance::Guesser);
}

#[test]
fn invariant_clitic_phonology_holds_on_output() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let e = engine(dir.path(), Flags::default());
    let out = e.run(["majagi", "kasski"]).unwrap();
    for lyli in out {
        let Lyli::Analysis(set) = lyli else { continue };
        for a in &set.analyses {
            let stem_final = a
                .plain_root()
                .chars()
                .chain(if a.ending == "0" { "".chars() } else { a.ending.chars() })
                .last();
            let Some(c) = stem_final else { continue };
            match a.clitic.as_str() {
                "ki" => assert!(
                    "kptgbdfhsšž".contains(c),
                    "ki after voiced final {c} in {a:?}"
                ),
                "gi" => assert!(
                    !"kptgbdfhs".contains(c) || "šž".contains(c),
                    "gi after voiceless final {c} in {a:?}"
                ),
                _ => {}
            }
        }
    }
}

#[test]
fn invariant_compiled_stems_read_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let builder = build_dictionary();
    builder.write_all(dir.path().join(MAIN_DICT)).unwrap();
    let dict = Dictionary::load(dir.path().join(MAIN_DICT)).unwrap();
    for stem in ["kass", "maja", "peeti", "pee", "ta", "sri_lanka"] {
        let written = builder.records_of(stem);
        let read = dict.lookup_stem(stem);
        assert_eq!(written, read.as_slice(), "records differ for {stem}");
    }
    assert_eq!(dict.stem_count(), 11);
}

#[test]
fn pipelines_share_one_dictionary() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path());
    let e = engine(dir.path(), Flags::default());
    let dict: Arc<Dictionary> = e.dictionary().clone();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let e = e.clone();
            std::thread::spawn(move || {
                let out = e.run(["kass", "peeti", "majagi"]).unwrap();
                out.iter()
                    .filter_map(|l| l.analysis())
                    .map(|s| s.serialize(false))
                    .collect::<String>()
            })
        })
        .collect();
    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    drop(dict);
}
