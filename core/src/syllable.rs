//! Syllabifier with quantity and stress assignment.
//!
//! Splits an Estonian word into syllables, then annotates each with its
//! quantity (vältus, 1–3) and stress. The rules operate on the substring
//! after the last `-` or `/`; a leading `Mc` or digit block is kept as a
//! zero-quantity, zero-stress preamble. A one-syllable word is always
//! quantity 3. First and third quantity are reliable when assigned; the
//! default second quantity may stand in for an overlong syllable the rules
//! cannot prove.

use crate::chars;

/// One syllable with its prosodic annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syllable {
    /// Syllable text (lowercase, except a preserved leading capital).
    pub text: String,
    /// Quantity 1–3; 0 for the `Mc`/digit preamble.
    pub quantity: u8,
    /// Primary stress.
    pub stress: bool,
}

/// Vowel for boundary placement; `y` counts in foreign material.
fn is_syl_vowel(c: char) -> bool {
    chars::is_vowel(c) || c == 'y'
}

/// Foreign vowel runs that stay in one syllable (`Pau-a` vs `oua`).
fn is_foreign_vowel_run(s: &[char]) -> bool {
    matches!(
        s.iter().collect::<String>().as_str(),
        "ieu" | "iou" | "eau" | "oui" | "oua"
    )
}

/// Latinate endings whose vowel pair splits (`muuse-um`, `geeni-us`).
fn splits_inside_diphthong(prefix: &[char]) -> bool {
    let s: String = prefix.iter().collect();
    s.ends_with("eum")
        || s.ends_with("eus")
        || s.ends_with("ius")
        || s.ends_with("ium")
        || (s.ends_with("iel") && !s.ends_with("fiel"))
}

/// Position of a vowel directly followed by another vowel, if any.
fn vowel_pair_at(syl: &[char]) -> Option<usize> {
    let k = syl.iter().position(|&c| chars::is_vowel(c))?;
    if k + 1 < syl.len() && chars::is_vowel(syl[k + 1]) {
        Some(k)
    } else {
        None
    }
}

/// Split `word` into syllables and assign quantity and stress.
pub fn syllabify(word: &str) -> Vec<Syllable> {
    let mut texts = split_syllables(word);
    if texts.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<Syllable> = texts
        .drain(..)
        .map(|text| Syllable { text, quantity: 2, stress: false })
        .collect();
    assign_quantities(&mut out);
    out
}

/// Boundary placement only; returns the syllable texts.
pub fn split_syllables(word: &str) -> Vec<String> {
    // The syllabifier works on the final morpheme.
    let tail = match word.rfind(['-', '/']) {
        Some(i) => &word[i + 1..],
        None => word,
    };
    if tail.is_empty() {
        return Vec::new();
    }

    let keep_capital = chars::starts_upper(tail);
    let mut rest: Vec<char> = tail.chars().map(chars::fold).collect();
    let mut syllables: Vec<Vec<char>> = Vec::new();

    // Foreign prefix and digit blocks stay outside the rule walk.
    if rest.len() >= 2 && rest[0] == 'm' && rest[1] == 'c' && keep_capital {
        syllables.push(vec!['m', 'c']);
        rest.drain(..2);
    } else {
        let digits = rest.iter().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 {
            syllables.push(rest[..digits].to_vec());
            rest.drain(..digits);
        }
    }

    while !rest.is_empty() {
        let cut = next_boundary(&rest, !syllables.is_empty());
        let taken: Vec<char> = rest.drain(..cut).collect();
        syllables.push(taken);
    }

    let mut out: Vec<String> = syllables
        .into_iter()
        .map(|s| s.into_iter().collect::<String>())
        .collect();
    if keep_capital {
        if let Some(first) = out.first_mut() {
            *first = chars::capitalize_first(first);
        }
    }
    out
}

/// Length of the next syllable at the front of `rest`.
fn next_boundary(rest: &[char], have_prior: bool) -> usize {
    let n = rest.len();
    let mut at_word_start = true;
    let mut saw_consonant_run = false;

    for i in 0..n {
        if is_syl_vowel(rest[i]) {
            if i > 0 {
                if chars::is_vowel(rest[i - 1]) {
                    // Two adjacent vowels: maybe the boundary runs between.
                    if have_prior {
                        if rest[i - 1] == 'i' && rest[i] == 'a' {
                            return i; // ia -> i_a
                        }
                        if i + 1 < n && splits_inside_diphthong(&rest[..i + 2]) {
                            return i; // eus -> e_us
                        }
                        if i + 2 < n
                            && rest[i - 1] != 'i'
                            && (rest[i..i + 3] == ['i', 's', 't'] || rest[i..i + 3] == ['i', 's', 'm'])
                        {
                            return i; // ego_ist
                        }
                    }
                    if i + 1 < n && chars::is_vowel(rest[i + 1]) {
                        if rest[i - 1] != rest[i] && rest[i + 1] == rest[i] {
                            return i; // spi-oon
                        }
                        if rest[i + 1] != rest[i] && !is_foreign_vowel_run(&rest[i - 1..i + 2]) {
                            return i + 1; // Vii-o
                        }
                    }
                    if have_prior && rest[i - 1] == 'e' && rest[i] == 'o' {
                        return i; // eo -> e_o
                    }
                }
                if saw_consonant_run {
                    // A consonant run separates two vocalic nuclei; a short
                    // run leaves its last consonant to the next syllable, a
                    // run of three or more breaks after its first member.
                    let run_start = (0..i).rev().take_while(|&j| !is_syl_vowel(rest[j])).count();
                    let run_len = run_start;
                    if run_len >= 3 {
                        return i - run_len + 1;
                    }
                    return i - 1;
                }
            }
            at_word_start = false;
        } else if !at_word_start {
            saw_consonant_run = true;
        }
        if i == n - 1 {
            return n; // last syllable takes the remainder
        }
    }
    n
}

/// Quantity and stress per the decision table.
fn assign_quantities(syllables: &mut [Syllable]) {
    let n = syllables.len();
    if n == 0 {
        return;
    }
    if n == 1 {
        syllables[0].quantity = 3;
        syllables[0].stress = true;
        return;
    }

    let mut first = 0;
    {
        let head = &syllables[0].text;
        if head.eq_ignore_ascii_case("mc") || head.chars().all(|c| c.is_ascii_digit()) {
            syllables[0].quantity = 0;
            syllables[0].stress = false;
            first = 1;
        }
    }

    for i in first..n {
        let syl: Vec<char> = syllables[i].text.chars().map(chars::fold).collect();
        let sl = syl.len();
        syllables[i].quantity = 2;
        syllables[i].stress = false;
        if sl == 0 {
            continue;
        }
        let next_first = if i + 1 < n {
            syllables[i + 1].text.chars().next().map(chars::fold)
        } else {
            None
        };

        if sl == 1 {
            // Bare nucleus: short unless a plosive closes it from the right.
            match next_first {
                Some(c) if chars::is_kpt(c) => {}
                _ => syllables[i].quantity = 1,
            }
            continue;
        }

        let last = syl[sl - 1];
        let before_last = syl[sl - 2];

        if chars::is_vowel(last) {
            if chars::is_consonant(before_last) {
                // Open CV syllable.
                match next_first {
                    Some(c) if chars::is_kpt(c) => {}
                    _ => syllables[i].quantity = 1,
                }
                continue;
            }
            // Ends in a vowel pair: long, usually stressed.
            let tail2: String = syl[sl - 2..].iter().collect();
            if tail2 == "io" || tail2 == "iu" {
                continue; // unstressed exception
            }
            syllables[i].stress = true;
            if last == 'a' && before_last != 'a' && before_last != 'e' {
                // Va is overlong apart from aa and ea.
                syllables[i].quantity = 3;
                continue;
            }
            if i == n - 1 {
                syllables[i].quantity = 3;
                continue;
            }
            if let Some(c) = next_first {
                if chars::is_kpt(c) && i > first {
                    syllables[i].quantity = 3; // au_to pattern past the first syllable
                    continue;
                }
            }
            if i + 2 < n {
                let next_ends_i = syllables[i + 1].text.chars().last() == Some('i');
                let after_starts_vowel = syllables[i + 2]
                    .text
                    .chars()
                    .next()
                    .is_some_and(|c| chars::is_vowel(chars::fold(c)));
                if next_ends_i && after_starts_vowel {
                    syllables[i].quantity = 3; // naa_li_um
                    continue;
                }
            }
        } else {
            // Closed syllable.
            if i == n - 1 {
                let text: String = syl.iter().collect();
                if text.ends_with("ich") {
                    continue; // Lurich, Kranich
                }
                if vowel_pair_at(&syl).is_some() {
                    syllables[i].stress = true;
                    syllables[i].quantity = 3; // _loog
                    continue;
                }
                if syllables[i - 1].quantity == 1 {
                    if chars::is_kpt(last) && text != "bot" {
                        syllables[i].stress = true;
                        syllables[i].quantity = 3; // _ent _ist
                        continue;
                    }
                    if chars::is_consonant(before_last) {
                        syllables[i].stress = true;
                        syllables[i].quantity = 3;
                        continue;
                    }
                }
            } else {
                if let Some(c) = next_first {
                    if chars::is_kpt(c) && c == last {
                        syllables[i].stress = true;
                        syllables[i].quantity = 3; // nak_ki geminate
                        continue;
                    }
                    if chars::is_lmnr(last) && chars::is_gbd(c) && vowel_pair_at(&syl).is_some() {
                        syllables[i].stress = true;
                        syllables[i].quantity = 3; // loor_du
                        continue;
                    }
                }
                if i + 2 < n {
                    let next_ends_i = syllables[i + 1].text.chars().last() == Some('i');
                    let after_starts_vowel = syllables[i + 2]
                        .text
                        .chars()
                        .next()
                        .is_some_and(|c| chars::is_vowel(chars::fold(c)));
                    if next_ends_i && after_starts_vowel && vowel_pair_at(&syl).is_some() {
                        syllables[i].stress = true;
                        syllables[i].quantity = 3; // naab_ri_um
                        continue;
                    }
                }
            }
        }
    }

    // Stress falls on the first vocalic syllable when no rule placed one.
    if syllables.iter().all(|s| !s.stress) {
        syllables[first].stress = true;
    }
}

/// Index of the last stressed syllable, if any.
pub fn last_stressed(syllables: &[Syllable]) -> Option<usize> {
    syllables.iter().rposition(|s| s.stress)
}
