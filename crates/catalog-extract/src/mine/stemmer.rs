//! Suffix-stripping stemmer for product nouns.
//!
//! Folds plural and simple verb forms onto one stem so taxonomy keywords
//! match regardless of inflection (`case`/`cases`, `knives`/`knife`).

/// Suffix rules checked in order: (suffix, replacement).
const SUFFIXES: &[(&str, &str)] = &[
    ("ives", "ife"),
    ("lves", "lf"),
    ("ies", "y"),
    ("sses", "ss"),
    ("shes", "sh"),
    ("ches", "ch"),
    ("xes", "x"),
    ("zzes", "zz"),
    ("ss", "ss"),
    ("us", "us"),
    ("is", "is"),
    ("s", ""),
];

const VERB_SUFFIXES: &[(&str, &str)] = &[
    ("ying", "y"),
    ("ing", ""),
    ("ied", "y"),
    ("ed", ""),
];

/// Stem a single lowercase word.
pub fn stem(word: &str) -> String {
    let word = word.to_lowercase();
    if word.chars().count() <= 3 {
        return word;
    }

    for (suffix, replacement) in SUFFIXES {
        if let Some(base) = word.strip_suffix(suffix) {
            if base.chars().count() >= 2 {
                return format!("{}{}", base, replacement);
            }
            return word;
        }
    }

    for (suffix, replacement) in VERB_SUFFIXES {
        if let Some(base) = word.strip_suffix(suffix) {
            // Keep short roots intact: "ring", "bed", "sled".
            if base.chars().count() >= 4 {
                return format!("{}{}", base, replacement);
            }
            return word;
        }
    }

    word
}

/// Split text into lowercase alphanumeric words and stem each one.
pub fn stem_phrase(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(stem)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plurals_fold_onto_singular() {
        assert_eq!(stem("cases"), stem("case"));
        assert_eq!(stem("lanterns"), "lantern");
        assert_eq!(stem("batteries"), "battery");
        assert_eq!(stem("knives"), "knife");
        assert_eq!(stem("shelves"), "shelf");
        assert_eq!(stem("brushes"), "brush");
        assert_eq!(stem("watches"), "watch");
        assert_eq!(stem("boxes"), "box");
    }

    #[test]
    fn test_words_that_only_look_plural() {
        assert_eq!(stem("glass"), "glass");
        assert_eq!(stem("glasses"), "glass");
        assert_eq!(stem("cactus"), "cactus");
        assert_eq!(stem("chassis"), "chassis");
        assert_eq!(stem("bus"), "bus");
    }

    #[test]
    fn test_verb_forms() {
        assert_eq!(stem("camping"), "camp");
        assert_eq!(stem("ring"), "ring");
        assert_eq!(stem("bedding"), "bedd");
        assert_eq!(stem("padded"), "padd");
    }

    #[test]
    fn test_stem_phrase() {
        assert_eq!(stem_phrase("Phone Cases"), vec!["phone", "case"]);
        assert_eq!(stem_phrase("women's  shoes"), vec!["women", "s", "shoe"]);
        assert!(stem_phrase(" - ").is_empty());
    }
}
