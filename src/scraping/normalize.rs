//! Price text normalization
//!
//! Converts raw extracted price text ("₹1,234.50", "Rs. 12,999", …) into a
//! canonical numeric amount. Pure and total: same input, same output, no I/O.

/// Normalize raw price text into a numeric amount.
///
/// Policy, applied in order:
/// 1. discard every character that is not a digit, `.`, or `,`;
/// 2. discard `,` entirely (thousands separator, never a decimal mark);
/// 3. if more than one `.` remains, keep only the part before the first `.`
///    and treat it as an integer amount (lossy policy for malformed input);
/// 4. parse as `f64`; empty or unparseable input yields `None`.
pub fn normalize_price(raw: &str) -> Option<f64> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let digits: String = kept.chars().filter(|c| *c != ',').collect();

    if digits.is_empty() {
        return None;
    }

    let digits = if digits.matches('.').count() > 1 {
        // Malformed decimal: keep the integer part before the first dot
        digits.split('.').next().unwrap_or_default().to_string()
    } else {
        digits
    };

    digits.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_currency_symbols_and_thousands_separators() {
        assert_eq!(normalize_price("₹1,234.50"), Some(1234.50));
        assert_eq!(normalize_price("Rs. 12,999"), Some(12999.0));
        assert_eq!(normalize_price("$ 49.99 only"), Some(49.99));
    }

    #[test]
    fn empty_and_symbol_only_input_yield_none() {
        assert_eq!(normalize_price(""), None);
        assert_eq!(normalize_price("₹"), None);
        assert_eq!(normalize_price("price unavailable"), None);
    }

    #[test]
    fn multiple_dots_fall_back_to_integer_part() {
        assert_eq!(normalize_price("12.34.56"), Some(12.0));
        assert_eq!(normalize_price("1,2.3.4"), Some(12.0));
    }

    #[test]
    fn leading_dot_after_truncation_yields_none() {
        // ".1.2" truncates to "" before the first dot
        assert_eq!(normalize_price(".1.2"), None);
    }

    #[test]
    fn plain_numbers_round_trip() {
        for (text, expected) in [
            ("0.99", 0.99),
            ("12999", 12999.0),
            ("1234.5", 1234.5),
            ("  777  ", 777.0),
        ] {
            assert_eq!(normalize_price(text), Some(expected), "input: {text:?}");
        }
    }

    #[test]
    fn extraneous_symbols_do_not_change_the_value() {
        assert_eq!(normalize_price("1234.5"), normalize_price("₹1,234.5 /-"));
        assert_eq!(normalize_price("49.99"), normalize_price("USD 49.99*"));
    }

    #[test]
    fn is_deterministic() {
        let input = "₹12,999.00";
        assert_eq!(normalize_price(input), normalize_price(input));
    }

    #[test]
    fn non_ascii_digits_are_discarded() {
        // Only ASCII digits participate; Devanagari digits are stripped
        assert_eq!(normalize_price("१२३"), None);
    }
}
