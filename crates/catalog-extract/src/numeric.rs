//! Locale-aware parsing of numeric tokens (`1,234.5`, `1.234,5`, `2,5`).

use catalog_core::NumericLocale;

/// Converts a numeric token taken from product text into a value.
///
/// Tokens contain only ASCII digits and `.`/`,` separators.
pub trait NumericParser: Send + Sync {
    fn parse(&self, token: &str) -> Option<f64>;
}

/// `.` is the decimal separator, `,` groups thousands.
pub struct DotDecimal;

/// `,` is the decimal separator, `.` groups thousands.
pub struct CommaDecimal;

/// Decides per token.
///
/// With both separators present the last one is the decimal point. A lone
/// comma followed by exactly three digits groups thousands (`1,500`),
/// otherwise it is decimal (`2,5`). A lone dot is decimal. A separator that
/// repeats (`1.000.000`) groups thousands.
pub struct AutoDetect;

impl NumericParser for DotDecimal {
    fn parse(&self, token: &str) -> Option<f64> {
        finite(&token.replace(',', ""))
    }
}

impl NumericParser for CommaDecimal {
    fn parse(&self, token: &str) -> Option<f64> {
        finite(&token.replace('.', "").replace(',', "."))
    }
}

impl NumericParser for AutoDetect {
    fn parse(&self, token: &str) -> Option<f64> {
        let commas = token.matches(',').count();
        let dots = token.matches('.').count();

        match (commas, dots) {
            (0, 0) | (0, 1) => finite(token),
            (c, d) if c > 0 && d > 0 => {
                let last_comma = token.rfind(',')?;
                let last_dot = token.rfind('.')?;
                if last_comma > last_dot {
                    CommaDecimal.parse(token)
                } else {
                    DotDecimal.parse(token)
                }
            }
            (1, 0) => {
                let (before, after) = token.split_once(',')?;
                if after.len() == 3 && (1..=3).contains(&before.len()) {
                    finite(&format!("{}{}", before, after))
                } else {
                    finite(&format!("{}.{}", before, after))
                }
            }
            (_, 0) => finite(&token.replace(',', "")),
            _ => finite(&token.replace('.', "")),
        }
    }
}

/// The parser for a configured locale.
pub fn parser_for(locale: NumericLocale) -> &'static dyn NumericParser {
    match locale {
        NumericLocale::DotDecimal => &DotDecimal,
        NumericLocale::CommaDecimal => &CommaDecimal,
        NumericLocale::Auto => &AutoDetect,
    }
}

fn finite(text: &str) -> Option<f64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_decimal() {
        assert_eq!(DotDecimal.parse("1,234.5"), Some(1234.5));
        assert_eq!(DotDecimal.parse("2.5"), Some(2.5));
        assert_eq!(DotDecimal.parse("1.2.3"), None);
    }

    #[test]
    fn test_comma_decimal() {
        assert_eq!(CommaDecimal.parse("1.234,5"), Some(1234.5));
        assert_eq!(CommaDecimal.parse("2,5"), Some(2.5));
        assert_eq!(CommaDecimal.parse("30"), Some(30.0));
    }

    #[test]
    fn test_auto_detect() {
        let p = AutoDetect;
        assert_eq!(p.parse("30"), Some(30.0));
        assert_eq!(p.parse("2.5"), Some(2.5));
        assert_eq!(p.parse("2,5"), Some(2.5));
        assert_eq!(p.parse("1,500"), Some(1500.0));
        assert_eq!(p.parse("1234,567"), Some(1234.567));
        assert_eq!(p.parse("1,234.5"), Some(1234.5));
        assert_eq!(p.parse("1.234,5"), Some(1234.5));
        assert_eq!(p.parse("1.000.000"), Some(1_000_000.0));
        assert_eq!(p.parse("1,000,000"), Some(1_000_000.0));
        assert_eq!(p.parse(""), None);
        assert_eq!(p.parse("12a"), None);
    }

    #[test]
    fn test_parser_for_locale() {
        assert_eq!(parser_for(NumericLocale::CommaDecimal).parse("1,5"), Some(1.5));
        assert_eq!(parser_for(NumericLocale::DotDecimal).parse("1,500"), Some(1500.0));
        assert_eq!(parser_for(NumericLocale::Auto).parse("0,75"), Some(0.75));
    }
}
