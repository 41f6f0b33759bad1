//! Sentence segmentation over sanitized product text.

use once_cell::sync::Lazy;
use regex::Regex;

static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*]+\s+|[•●◆◇★☆✓✔►▶·]+\s*|\d{1,2}[.)]\s+)").unwrap());

static BRACKET_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[【\[]([^】\]]{1,60})[】\]]\s*").unwrap());

/// A sentence together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
    /// Position in reading order.
    pub order: usize,
    /// First sentence of a bulleted line.
    pub bulleted: bool,
    /// The line it came from reads as `key: value`.
    pub spec_line: bool,
}

/// Strip a leading list marker. Returns the remaining text and whether one was present.
pub fn strip_bullet(line: &str) -> (&str, bool) {
    let line = line.trim();
    if let Some(m) = BULLET.find(line) {
        let rest = &line[m.end()..];
        if !rest.is_empty() {
            return (rest.trim_start(), true);
        }
    }
    (line, false)
}

/// Split each line into sentences at `.`, `!`, `?` or `;` followed by whitespace.
///
/// Decimal points (`2.5`) never split because no whitespace follows them.
pub fn split_sentences(text: &str, is_spec_line: impl Fn(&str) -> bool) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    for raw_line in text.lines() {
        let (line, mut bulleted) = strip_bullet(raw_line);
        let spec_line = is_spec_line(line);
        // `【Durable】 Made of steel` reads as a bullet with a header.
        let line = match BRACKET_HEADER.captures(line) {
            Some(caps) => {
                bulleted = true;
                let header = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
                let rest = caps.get(0).map(|m| &line[m.end()..]).unwrap_or(line);
                if rest.is_empty() {
                    header.to_string()
                } else {
                    format!("{}: {}", header, rest)
                }
            }
            None => line.to_string(),
        };
        if line.is_empty() {
            continue;
        }

        let mut start = 0;
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        for (i, &(pos, c)) in chars.iter().enumerate() {
            let terminator = matches!(c, '.' | '!' | '?' | ';' | '。' | '！' | '？');
            let next_is_space = chars.get(i + 1).map(|&(_, n)| n.is_whitespace()).unwrap_or(false);
            if terminator && next_is_space {
                let end = pos + c.len_utf8();
                push(&mut sentences, &line[start..end], &mut bulleted, spec_line);
                start = end;
            }
        }
        push(&mut sentences, &line[start..], &mut bulleted, spec_line);
    }
    sentences
}

fn push(out: &mut Vec<Sentence>, text: &str, bulleted: &mut bool, spec_line: bool) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    out.push(Sentence {
        text: text.to_string(),
        order: out.len(),
        bulleted: *bulleted,
        spec_line,
    });
    *bulleted = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_decimals() {
        let found = split_sentences("Holds 2.5 L of water. Lasts all day! Really?", |_| false);
        let texts: Vec<&str> = found.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Holds 2.5 L of water.", "Lasts all day!", "Really?"]);
        assert_eq!(found[2].order, 2);
    }

    #[test]
    fn test_bullets_and_headers() {
        let text = "- Waterproof design. Easy to carry\n1. Fast charging\n【Durable】 Made of steel";
        let found = split_sentences(text, |_| false);
        assert_eq!(found[0].text, "Waterproof design.");
        assert!(found[0].bulleted);
        assert!(!found[1].bulleted);
        assert_eq!(found[2].text, "Fast charging");
        assert!(found[2].bulleted);
        assert_eq!(found[3].text, "Durable: Made of steel");
        assert!(found[3].bulleted);
    }

    #[test]
    fn test_strip_bullet() {
        assert_eq!(strip_bullet("• USB-C"), ("USB-C", true));
        assert_eq!(strip_bullet("-"), ("-", false));
        assert_eq!(strip_bullet("2.5 kg total"), ("2.5 kg total", false));
    }
}
