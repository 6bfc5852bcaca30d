// Formatting utilities

use chrono::{DateTime, FixedOffset, Utc};

/// Two decimal places, ties rounded away from zero ("4.625" -> "4.63").
/// `{:.2}` alone rounds exact ties to even.
pub fn two_decimals(value: f64) -> String {
    format!("{:.2}", (value * 100.0).round() / 100.0)
}

/// Format an amount with a currency symbol and 2 decimals (e.g. "₱150.00")
pub fn format_currency(symbol: &str, amount: f64) -> String {
    format!("{}{}", symbol, two_decimals(amount))
}

/// Format a count with thousands separators
pub fn format_number(n: i64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 && chars[i - 1] != '-' {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Keep at most `max_chars` characters, no ellipsis (chart labels)
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Long date in local time, e.g. "October 18, 2026"
pub fn format_long_date(instant: &DateTime<Utc>, offset: FixedOffset) -> String {
    instant.with_timezone(&offset).format("%B %-d, %Y").to_string()
}

/// Star bar like "★★★★☆"; the rating is clamped to 0..=5
pub fn star_bar(rating: u8) -> String {
    let full = rating.min(5) as usize;
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}
