//! Small text helpers shared by the parser and the reply builders

use rust_decimal::Decimal;

/// First character upper-cased, the rest lower-cased ("comida RÁPIDA" -> "Comida rápida")
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Escape the three characters Telegram's HTML parse mode cares about
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Two decimals with comma thousands separators: 1234.5 -> "1,234.50"
pub fn format_amount(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.round_dp(2));
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("comida"), "Comida");
        assert_eq!(capitalize("COMIDA rápida"), "Comida rápida");
        assert_eq!(capitalize("ñoquis"), "Ñoquis");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b> & c"), "a&lt;b&gt; &amp; c");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::from_str("12.5").unwrap()), "12.50");
        assert_eq!(format_amount(Decimal::from_str("1234567.891").unwrap()), "1,234,567.89");
        assert_eq!(format_amount(Decimal::from_str("999").unwrap()), "999.00");
        assert_eq!(format_amount(Decimal::from_str("1000").unwrap()), "1,000.00");
    }
}
