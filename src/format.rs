//! Display helpers shared by the PDF renderer and the terminal UI.

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "INR" => Some("₹"),
        _ => None,
    }
}

fn decimal_places(currency: &str) -> usize {
    match currency {
        "JPY" => 0,
        _ => 2,
    }
}

/// Amount with thousands separators and the currency's number of decimals, no symbol
pub fn format_amount(amount: f64, currency: &str) -> String {
    let decimals = decimal_places(currency);
    let fixed = format!("{:.*}", decimals, amount.abs());

    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Amount with the currency symbol when one is known, e.g. `$1,234.50`, else `CHF 1,234.50`
pub fn format_money(amount: f64, currency: &str) -> String {
    let number = format_amount(amount, currency);
    let (sign, digits) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number.as_str()),
    };

    match currency_symbol(currency) {
        Some(symbol) => format!("{}{}{}", sign, symbol, digits),
        None => format!("{}{} {}", sign, currency, digits),
    }
}

/// Up to two decimals without trailing zeros, for quantities and rates
pub fn trim_number(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    formatted.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Greedy word wrap. Existing line breaks are kept and words longer than a
/// line are split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            // hard split anything that cannot fit on a line by itself
            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            if word.is_empty() {
                continue;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }

            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_known_currencies_with_symbols() {
        assert_eq!(format_money(1234.5, "USD"), "$1,234.50");
        assert_eq!(format_money(1050.0, "EUR"), "€1,050.00");
        assert_eq!(format_money(0.5, "GBP"), "£0.50");
        assert_eq!(format_money(1234567.0, "JPY"), "¥1,234,567");
    }

    #[test]
    fn trims_trailing_zeros() {
        assert_eq!(trim_number(2.0), "2");
        assert_eq!(trim_number(2.5), "2.5");
        assert_eq!(trim_number(12.25), "12.25");
        assert_eq!(trim_number(0.0), "0");
    }

    #[test]
    fn unknown_currencies_use_their_code() {
        assert_eq!(format_money(99.999, "CHF"), "CHF 100.00");
    }

    #[test]
    fn negative_amounts_put_sign_first() {
        assert_eq!(format_money(-1500.25, "USD"), "-$1,500.25");
        assert_eq!(format_amount(-0.001, "USD"), "0.00");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_amount(999.0, "USD"), "999.00");
        assert_eq!(format_amount(1000.0, "USD"), "1,000.00");
        assert_eq!(format_amount(123456789.123, "USD"), "123,456,789.12");
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]);
    }

    #[test]
    fn splits_long_words_and_keeps_line_breaks() {
        let lines = wrap_text("abcdefghijkl\nshort", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl", "short"]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(wrap_text("", 10).is_empty());
    }
}
