//! Number formatting shared by the views.

/// Format an integer with thousands separators (1234567 -> "1,234,567").
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format milliseconds with two decimals.
pub fn format_ms(ms: f64) -> String {
    format!("{:.2}ms", ms)
}

/// Format a 0..=1 fraction as a percentage with two decimals.
pub fn format_rate(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

/// Shorten a string to `max_len` characters, ending with an ellipsis.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

/// List up to `max` names, then a "+N" count for the rest.
pub fn format_name_list(names: &[String], max: usize) -> String {
    let listed = names.iter().take(max).map(String::as_str).collect::<Vec<_>>().join(", ");
    match names.len().saturating_sub(max) {
        0 => listed,
        rest => format!("{} +{}", listed, rest),
    }
}
