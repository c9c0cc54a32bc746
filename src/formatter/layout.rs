//! User time layouts
//!
//! Layouts are written with Java-style tokens (`yyyy-MM-dd HH:mm:ss.SSS`).
//! At each position the first matching token wins, in the order
//! `yyyy yy MM dd HH mm ss SSS SS S`; every other character is literal.

use chrono::{Datelike, NaiveDateTime, Timelike};

/// Tokens in match priority order.
const TOKENS: &[(&str, Token)] = &[
    ("yyyy", Token::Year4),
    ("yy", Token::Year2),
    ("MM", Token::Month),
    ("dd", Token::Day),
    ("HH", Token::Hour),
    ("mm", Token::Minute),
    ("ss", Token::Second),
    ("SSS", Token::Millis),
    ("SS", Token::Centis),
    ("S", Token::Decis),
];

const DATE_TOKENS: &[&str] = &["yyyy", "yy", "MM", "dd"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Year4,
    Year2,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millis,
    Centis,
    Decis,
    Literal(String),
}

/// Parsed time layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLayout {
    source: String,
    tokens: Vec<Token>,
}

impl TimeLayout {
    pub fn parse(layout: &str) -> Self {
        let mut tokens: Vec<Token> = Vec::new();
        let mut rest = layout;

        'outer: while !rest.is_empty() {
            for (pattern, token) in TOKENS {
                if let Some(tail) = rest.strip_prefix(pattern) {
                    tokens.push(token.clone());
                    rest = tail;
                    continue 'outer;
                }
            }

            let mut chars = rest.chars();
            let Some(c) = chars.next() else { break };
            match tokens.last_mut() {
                Some(Token::Literal(lit)) => lit.push(c),
                _ => tokens.push(Token::Literal(c.to_string())),
            }
            rest = chars.as_str();
        }

        Self {
            source: layout.to_string(),
            tokens,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the layout contains at least one date or time token.
    pub fn has_tokens(&self) -> bool {
        self.tokens.iter().any(|t| !matches!(t, Token::Literal(_)))
    }

    /// Render a timestamp.
    pub fn render(&self, ts: &NaiveDateTime) -> String {
        let mut out = String::with_capacity(self.source.len() + 8);
        let nanos = ts.nanosecond() % 1_000_000_000;

        for token in &self.tokens {
            match token {
                Token::Year4 => out.push_str(&format!("{:04}", ts.year())),
                Token::Year2 => out.push_str(&format!("{:02}", ts.year().rem_euclid(100))),
                Token::Month => out.push_str(&format!("{:02}", ts.month())),
                Token::Day => out.push_str(&format!("{:02}", ts.day())),
                Token::Hour => out.push_str(&format!("{:02}", ts.hour())),
                Token::Minute => out.push_str(&format!("{:02}", ts.minute())),
                Token::Second => out.push_str(&format!("{:02}", ts.second())),
                Token::Millis => out.push_str(&format!("{:03}", nanos / 1_000_000)),
                Token::Centis => out.push_str(&format!("{:02}", nanos / 10_000_000)),
                Token::Decis => out.push_str(&format!("{}", nanos / 100_000_000)),
                Token::Literal(lit) => out.push_str(lit),
            }
        }

        out
    }

    /// Equivalent Excel number format.
    pub fn to_excel_format(&self) -> String {
        let mut out = String::new();

        for token in &self.tokens {
            match token {
                Token::Year4 => out.push_str("yyyy"),
                Token::Year2 => out.push_str("yy"),
                Token::Month => out.push_str("mm"),
                Token::Day => out.push_str("dd"),
                Token::Hour => out.push_str("hh"),
                Token::Minute => out.push_str("mm"),
                Token::Second => out.push_str("ss"),
                Token::Millis => out.push_str("000"),
                Token::Centis => out.push_str("00"),
                Token::Decis => out.push('0'),
                Token::Literal(lit) => {
                    for c in lit.chars() {
                        if matches!(c, ' ' | '-' | '/' | ':' | '.' | ',') {
                            out.push(c);
                        } else {
                            out.push('\\');
                            out.push(c);
                        }
                    }
                }
            }
        }

        out
    }
}

/// Reduce a datetime layout to its date portion.
///
/// Finds the rightmost occurrence of each of `yyyy`, `yy`, `MM` and `dd`,
/// truncates right after the one ending last and trims whitespace. A layout
/// without any date token is returned unchanged.
pub fn extract_date_layout(layout: &str) -> String {
    let end = DATE_TOKENS
        .iter()
        .filter_map(|tok| layout.rfind(tok).map(|idx| idx + tok.len()))
        .max();

    match end {
        Some(end) => layout[..end].trim().to_string(),
        None => layout.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_milli_opt(9, 5, 3, 456)
            .unwrap()
    }

    #[test]
    fn test_render_default_layout() {
        let layout = TimeLayout::parse("yyyy-MM-dd HH:mm:ss");
        assert_eq!(layout.render(&ts()), "2024-03-07 09:05:03");
    }

    #[test]
    fn test_render_fractions_and_literals() {
        assert_eq!(
            TimeLayout::parse("dd/MM/yy HH:mm:ss.SSS").render(&ts()),
            "07/03/24 09:05:03.456"
        );
        assert_eq!(TimeLayout::parse("ss.SS").render(&ts()), "03.45");
        assert_eq!(TimeLayout::parse("ss.S").render(&ts()), "03.4");
        assert_eq!(TimeLayout::parse("T HH").render(&ts()), "T 09");
    }

    #[test]
    fn test_longest_token_first() {
        assert_eq!(TimeLayout::parse("yyy").render(&ts()), "24y");
    }

    #[test]
    fn test_has_tokens() {
        assert!(TimeLayout::parse("HH:mm").has_tokens());
        assert!(!TimeLayout::parse("none here").has_tokens());
    }

    #[test]
    fn test_extract_date_layout() {
        assert_eq!(extract_date_layout("yyyy-MM-dd HH:mm:ss"), "yyyy-MM-dd");
        assert_eq!(extract_date_layout("dd/MM/yyyy HH:mm"), "dd/MM/yyyy");
        assert_eq!(extract_date_layout("HH:mm MM/dd"), "HH:mm MM/dd");
        assert_eq!(extract_date_layout("HH:mm:ss"), "HH:mm:ss");
    }

    #[test]
    fn test_excel_format() {
        assert_eq!(
            TimeLayout::parse("yyyy-MM-dd HH:mm:ss.SSS").to_excel_format(),
            "yyyy-mm-dd hh:mm:ss.000"
        );
        assert_eq!(TimeLayout::parse("dd at HH").to_excel_format(), "dd \\a\\t hh");
    }
}
