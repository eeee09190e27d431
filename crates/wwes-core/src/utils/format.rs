use rust_decimal::{Decimal, RoundingStrategy};

/// Width of the label column in report lines
pub const LABEL_WIDTH: usize = 30;

/// Width of the value column in report lines
pub const VALUE_WIDTH: usize = 20;

/// Format an amount with thousands separators and two decimals,
/// e.g. `1234567.891` becomes `1,234,567.89`.
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

/// One aligned `label : value` report line.
pub fn amount_line(label: &str, value: Decimal) -> String {
    format!(
        "{:<width$}:{:>value_width$}",
        truncate_string(label, LABEL_WIDTH),
        format_amount(value),
        width = LABEL_WIDTH,
        value_width = VALUE_WIDTH
    )
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// File-system safe form of a display name
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
