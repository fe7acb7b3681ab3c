//! Internal byte-scanning primitives for price text.
//!
//! Price regions contain currency symbols, labels ("Sale price"), ranges and
//! both `1,299.00` and `1.299,00` conventions. These routines find the first
//! number and decide which separator is the decimal point.

/// Returns the first run of digits and `.`/`,` separators in `s`, trimmed of
/// trailing separators. A run must contain at least one digit.
///
/// `"Sale price$1,299.00 USD"` → `"1,299.00"`.
pub(crate) fn first_numeric_run(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut i = 0usize;

    while i < len {
        let starts_number = bytes[i].is_ascii_digit()
            || (matches!(bytes[i], b'.' | b',') && i + 1 < len && bytes[i + 1].is_ascii_digit());
        if !starts_number {
            i += 1;
            continue;
        }

        let start = i;
        while i < len && (bytes[i].is_ascii_digit() || matches!(bytes[i], b'.' | b',')) {
            i += 1;
        }
        let run = s[start..i].trim_end_matches(['.', ',']);
        if run.bytes().any(|b| b.is_ascii_digit()) {
            return Some(run);
        }
    }
    None
}

/// Rewrites a numeric run into plain `1234.56` form.
///
/// - Both separators present: the last one is the decimal point.
/// - Only commas: a single comma followed by exactly two digits is a decimal
///   comma (`"12,50"`); otherwise commas group thousands.
/// - Only dots: several dots group thousands (`"1.299.000"`); a single dot
///   is the decimal point.
pub(crate) fn normalize_separators(run: &str) -> String {
    let last_dot = run.rfind('.');
    let last_comma = run.rfind(',');

    let decimal_at = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(d.max(c)),
        (None, Some(c)) => {
            let single = run.matches(',').count() == 1;
            (single && run.len() - c - 1 == 2).then_some(c)
        }
        (Some(d), None) => (run.matches('.').count() == 1).then_some(d),
        (None, None) => None,
    };

    run.char_indices()
        .filter_map(|(idx, ch)| match ch {
            '0'..='9' => Some(ch),
            _ if Some(idx) == decimal_at => Some('.'),
            _ => None,
        })
        .collect()
}
