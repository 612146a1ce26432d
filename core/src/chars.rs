//! Estonian character classes.
//!
//! The closed sets the phonological rules work over: vowels, consonants,
//! the `kpt`/`gbd`/`lmnr` groups, voiceless consonants and the letters
//! that count as Estonian at all. `õ ä ö ü š ž` are first-class members.

/// Vowels, lowercase.
pub const VOWELS: &str = "aeiouõäöü";

/// Consonants, lowercase (includes `š` and `ž`).
pub const CONSONANTS: &str = "bcdfghjklmnpqrstvwxyzžš";

/// The plosive set used by the syllable-quantity rules.
pub const KPT: &str = "kpt";

/// Voiced plosives.
pub const GBD: &str = "gbd";

/// Sonorants that close a stressed syllable.
pub const LMNR: &str = "lmnr";

/// Vowel subset the guesser's phonotype letters refer to.
pub const AEIU: &str = "aeiu";

/// Voiceless finals; `ki` attaches after these.
pub const VOICELESS: &str = "kptgbdfhsš";

/// Voiced sounds (vowels plus sonorants and `v`).
pub const VOICED: &str = "aeiouõäöülmnrv";

/// Estonian uppercase letters.
pub const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZÕÄÖÜŠŽ";

/// Estonian lowercase letters.
pub const LOWER: &str = "abcdefghijklmnopqrstuvwxyzõäöüšž";

/// Decimal digits.
pub const DIGITS: &str = "0123456789";

/// Characters a roman numeral may consist of.
pub const ROMAN: &str = "IVXLCDM";

/// Junk that may precede a word (quotes, brackets, dashes).
pub const LEADING_PUNCT: &str = "{<[(\"'«‹“”„*-/";

/// Junk that may follow a word.
pub const TRAILING_PUNCT: &str = "}>])\"'»›“”?!:;,.-/";

/// Full punctuation set used by the number/punctuation classifiers.
pub const PUNCT: &str = ":;,.\"'?!-([<{*}>])/\\_+=«»‹›“”„";

/// True if `c` is an Estonian vowel (case-insensitive).
pub fn is_vowel(c: char) -> bool {
    VOWELS.contains(fold(c))
}

/// True if `c` is an Estonian consonant (case-insensitive).
pub fn is_consonant(c: char) -> bool {
    CONSONANTS.contains(fold(c))
}

/// True if `c` is in the `kpt` plosive set.
pub fn is_kpt(c: char) -> bool {
    KPT.contains(fold(c))
}

/// True if `c` is in the `gbd` set.
pub fn is_gbd(c: char) -> bool {
    GBD.contains(fold(c))
}

/// True if `c` is one of `l m n r`.
pub fn is_lmnr(c: char) -> bool {
    LMNR.contains(fold(c))
}

/// True if `c` is voiceless; decides `ki` vs `gi`.
pub fn is_voiceless(c: char) -> bool {
    VOICELESS.contains(fold(c))
}

/// True if `c` is `š` or `ž`, after which both clitics are lawful.
pub fn is_sibilant_caron(c: char) -> bool {
    matches!(fold(c), 'š' | 'ž')
}

/// True if `c` is an Estonian letter of either case.
pub fn is_letter(c: char) -> bool {
    LOWER.contains(fold(c))
}

/// True if `c` is an Estonian uppercase letter.
pub fn is_upper(c: char) -> bool {
    UPPER.contains(c)
}

/// Case fold over the Estonian alphabet.
pub fn fold(c: char) -> char {
    match c {
        'Õ' => 'õ',
        'Ä' => 'ä',
        'Ö' => 'ö',
        'Ü' => 'ü',
        'Š' => 'š',
        'Ž' => 'ž',
        _ => c.to_ascii_lowercase(),
    }
}

/// Uppercase over the Estonian alphabet.
pub fn unfold(c: char) -> char {
    match c {
        'õ' => 'Õ',
        'ä' => 'Ä',
        'ö' => 'Ö',
        'ü' => 'Ü',
        'š' => 'Š',
        'ž' => 'Ž',
        _ => c.to_ascii_uppercase(),
    }
}

/// True if the word starts with an uppercase letter.
pub fn starts_upper(word: &str) -> bool {
    word.chars().next().is_some_and(is_upper)
}

/// Lowercase the whole string.
pub fn lowercase(word: &str) -> String {
    word.chars().map(fold).collect()
}

/// Lowercase everything except a preserved leading capital.
pub fn lowercase_keep_initial(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for (i, c) in word.chars().enumerate() {
        out.push(if i == 0 { c } else { fold(c) });
    }
    out
}

/// Capitalize the first letter, leave the rest alone.
pub fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => {
            let mut out = String::with_capacity(word.len());
            out.push(unfold(c));
            out.extend(chars);
            out
        }
        None => String::new(),
    }
}

/// True if every character of the word belongs to `set`.
pub fn all_in(word: &str, set: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| set.contains(c))
}

/// Strip leading and trailing punctuation junk; returns the trimmed slice.
pub fn strip_outer_punct(word: &str) -> &str {
    word.trim_start_matches(|c| LEADING_PUNCT.contains(c))
        .trim_end_matches(|c| TRAILING_PUNCT.contains(c))
}

/// True if the token parses as a roman numeral (strict, uppercase only).
pub fn is_roman_numeral(word: &str) -> bool {
    if word.is_empty() || !all_in(word, ROMAN) {
        return false;
    }
    // Reject runs a roman numeral cannot contain.
    !(word.contains("IIII")
        || word.contains("XXXX")
        || word.contains("CCCC")
        || word.contains("VV")
        || word.contains("LL")
        || word.contains("DD"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estonian_letters_are_first_class() {
        for c in "õäöüšž".chars() {
            assert!(is_letter(c), "{c} should be a letter");
        }
        assert!(is_vowel('õ'));
        assert!(is_vowel('Ü'));
        assert!(is_consonant('ž'));
        assert!(!is_vowel('ž'));
    }

    #[test]
    fn clitic_environment_sets() {
        assert!(is_voiceless('t'));
        assert!(is_voiceless('s'));
        assert!(!is_voiceless('a'));
        assert!(!is_voiceless('l'));
        assert!(is_sibilant_caron('š'));
        assert!(is_sibilant_caron('Ž'));
    }

    #[test]
    fn casing_helpers_round_trip() {
        assert_eq!(lowercase("ÄRA"), "ära");
        assert_eq!(capitalize_first("mets"), "Mets");
        assert_eq!(capitalize_first("ülo"), "Ülo");
        assert_eq!(lowercase_keep_initial("DUDAJEV"), "Dudajev");
        assert!(starts_upper("Õnne"));
        assert!(!starts_upper("õnne"));
    }

    #[test]
    fn outer_punct_stripping() {
        assert_eq!(strip_outer_punct("\"maja\","), "maja");
        assert_eq!(strip_outer_punct("(«tere»)"), "tere");
        assert_eq!(strip_outer_punct("maja"), "maja");
    }

    #[test]
    fn roman_numerals() {
        assert!(is_roman_numeral("XIV"));
        assert!(is_roman_numeral("MCMXCIX"));
        assert!(!is_roman_numeral("XXXX"));
        assert!(!is_roman_numeral("xiv"));
        assert!(!is_roman_numeral("XA"));
    }
}
