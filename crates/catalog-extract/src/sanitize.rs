//! Markup stripping and boilerplate removal for product text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexicon::{normalize_phrase, Lexicon};

/// Plain text with markup, boilerplate lines and redundant whitespace removed.
///
/// Lines are separated by a single `\n`; within a line whitespace is a
/// single space. Only [`sanitize`] produces values of this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SanitizedText(String);

impl SanitizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0.lines()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for SanitizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SanitizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static HIDDEN_ELEMENTS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["script", "style", "noscript", "head", "template"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?(?:</{tag}\s*>|\z)")).unwrap()
        })
        .collect()
});

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?(?:-->|\z)").unwrap());

static DECLARATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[!?][^>]*>").unwrap());

static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<li\b[^>]*>").unwrap());

static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)</?\s*(?:br|p|div|li|ul|ol|tr|table|tbody|thead|tfoot|h[1-6]|section|article|header|footer|blockquote|pre|dd|dt|dl|hr)\b[^>]*>",
    )
    .unwrap()
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").unwrap());

/// An unterminated tag: a tag name followed by whitespace or `/` and no `>`.
static DANGLING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[a-zA-Z][a-zA-Z0-9-]*[\s/][^<>]*\z").unwrap());

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z][a-zA-Z0-9]{1,7});").unwrap());

/// Fuzzy matching is only applied to phrases at least this long.
const MIN_FUZZY_PHRASE_CHARS: usize = 12;

/// Strip markup and boilerplate from raw product text.
///
/// List items keep a `• ` marker. Unterminated tags at the end of the input are dropped.
pub fn sanitize(raw: &str, lexicon: &Lexicon) -> SanitizedText {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = strip_markup(&text);
    let text = decode_entities(&text);
    // Entities may have encoded markup (`&lt;b&gt;`).
    let text = strip_markup(&text);

    let lines: Vec<String> = text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| line.chars().any(char::is_alphanumeric))
        .filter(|line| !is_boilerplate(line, lexicon))
        .filter(|line| !lexicon.heading_tokens.contains(&normalize_phrase(line)))
        .filter_map(|line| strip_boilerplate_sentences(&line, lexicon))
        .collect();

    SanitizedText(lines.join("\n"))
}

fn strip_markup(text: &str) -> String {
    let mut text = text.to_string();
    for element in HIDDEN_ELEMENTS.iter() {
        text = element.replace_all(&text, " ").into_owned();
    }
    let text = COMMENT.replace_all(&text, " ");
    let text = DECLARATION.replace_all(&text, " ");
    let text = LIST_ITEM.replace_all(&text, "\n• ");
    let text = BLOCK_TAG.replace_all(&text, "\n");
    let text = TAG.replace_all(&text, " ");
    DANGLING_TAG.replace_all(&text, "").into_owned()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(name)
            };
            match decoded {
                Some('\u{a0}') => " ".to_string(),
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "deg" => '°',
        "times" => '×',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "bull" => '•',
        "middot" => '·',
        "frac12" => '½',
        "plusmn" => '±',
        _ => return None,
    };
    Some(c)
}

/// Drop boilerplate sentences inside a kept line. `None` when nothing remains.
fn strip_boilerplate_sentences(line: &str, lexicon: &Lexicon) -> Option<String> {
    let sentences = split_sentences(line);
    if sentences.len() < 2 {
        return Some(line.to_string());
    }
    let kept: Vec<&str> = sentences
        .into_iter()
        .filter(|sentence| !is_boilerplate(sentence, lexicon))
        .collect();
    (!kept.is_empty()).then(|| kept.join(" "))
}

/// Split after `.`, `!` or `?` when followed by whitespace.
fn split_sentences(line: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
            let sentence = line[start..i + c.len_utf8()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = i + c.len_utf8();
        }
    }
    let tail = line[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn is_boilerplate(line: &str, lexicon: &Lexicon) -> bool {
    let lower = line.to_lowercase();
    if lexicon
        .boilerplate_tokens
        .iter()
        .any(|token| lower.contains(token.as_str()))
    {
        return true;
    }

    if let Some((key, _)) = line.split_once([':', '：']) {
        if lexicon.boilerplate_keys.contains(&normalize_phrase(key)) {
            return true;
        }
    }

    let normalized = normalize_phrase(line);
    if normalized.is_empty() {
        return false;
    }
    lexicon.boilerplate_phrases.iter().any(|phrase| {
        *phrase == normalized
            || (phrase.chars().count() >= MIN_FUZZY_PHRASE_CHARS
                && similarity(phrase, &normalized) >= lexicon.similarity)
    })
}

/// Normalized Levenshtein similarity in `0.0..=1.0`.
pub(crate) fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    let diff = a.len().abs_diff(b.len());
    if diff as f64 / longest as f64 > 0.5 {
        return 1.0 - diff as f64 / longest as f64;
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j] + cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    1.0 - previous[b.len()] as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{PipelineConfig, Vocabulary};

    fn lexicon() -> Lexicon {
        Lexicon::new(&Vocabulary::default(), &PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_boilerplate_lines_removed() {
        let raw = "Brand Name: NoEnName_Null<br>Origin: Mainland China<br>SPECIFICATIONS<br>Waterproof: Yes";
        let clean = sanitize(raw, &lexicon());
        assert_eq!(clean.as_str(), "Waterproof: Yes");
    }

    #[test]
    fn test_block_tags_become_lines() {
        let raw = "<p>Bright   LED lantern.</p><ul><li>USB charging</li><li>IPX4 rated</li></ul>";
        let clean = sanitize(raw, &lexicon());
        let lines: Vec<&str> = clean.lines().collect();
        assert_eq!(lines, vec!["Bright LED lantern.", "• USB charging", "• IPX4 rated"]);
    }

    #[test]
    fn test_hidden_elements_and_comments_dropped() {
        let raw = "<style>.a{color:red}</style>Visible<!-- hidden --> text<script>alert(1)</script>";
        assert_eq!(sanitize(raw, &lexicon()).as_str(), "Visible text");
    }

    #[test]
    fn test_malformed_markup() {
        let raw = "<div><b>Strong <i>nested</div> tail <span class=\"x";
        assert_eq!(sanitize(raw, &lexicon()).as_str(), "Strong nested\ntail");
    }

    #[test]
    fn test_entities_decoded() {
        let raw = "Size&nbsp;30&times;20 cm &amp; 5&#176; tilt &#x2013; &bogus;";
        assert_eq!(
            sanitize(raw, &lexicon()).as_str(),
            "Size 30×20 cm & 5° tilt – &bogus;"
        );
    }

    #[test]
    fn test_encoded_markup_stripped() {
        let raw = "&lt;p&gt;Soft grip&lt;/p&gt;";
        assert_eq!(sanitize(raw, &lexicon()).as_str(), "Soft grip");
    }

    #[test]
    fn test_fuzzy_boilerplate_phrase() {
        let mut vocab = Vocabulary::default();
        vocab.boilerplate_phrases = vec!["Please allow 1-3cm error due to manual measurement".into()];
        let lex = Lexicon::new(&vocab, &PipelineConfig::default()).unwrap();
        let raw = "Great bag\nPlease allow 1-3 cm errors due to manual measurement.";
        assert_eq!(sanitize(raw, &lex).as_str(), "Great bag");
    }

    #[test]
    fn test_boilerplate_sentence_inside_paragraph() {
        let raw = "<p>Great bag for travel. 100% brand new and high quality. Waterproof: Yes</p>";
        assert_eq!(
            sanitize(raw, &lexicon()).as_str(),
            "Great bag for travel. Waterproof: Yes"
        );

        let raw = "<li>Brand new and high quality! Please allow 1-2cm error due to manual measurement.</li>";
        assert!(sanitize(raw, &lexicon()).is_empty());
    }

    #[test]
    fn test_less_than_sign_kept_at_end() {
        assert_eq!(sanitize("Sizes S<M<L", &lexicon()).as_str(), "Sizes S<M<L");
        assert_eq!(sanitize("Holds 2<3 kg", &lexicon()).as_str(), "Holds 2<3 kg");
    }

    #[test]
    fn test_plain_text_keeps_paragraphs() {
        let raw = "First paragraph.\r\n\r\n  Second   paragraph.  ";
        assert_eq!(
            sanitize(raw, &lexicon()).as_str(),
            "First paragraph.\nSecond paragraph."
        );
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert!(similarity("kitten", "sitting") < 0.6);
        assert!(similarity("shipping worldwide", "shipping world wide") > 0.9);
    }
}
