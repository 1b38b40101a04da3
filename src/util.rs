// Utility helpers for parsing and number formatting.
//
// Loader and reports both go through here so CSV quirks and display rules
// live in one place.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, `$`).
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators and a leading currency sign.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace([',', '$'], "");
    s.parse::<f64>().ok()
}

/// Lot counts must be whole and non-negative; `12.0` is accepted.
pub fn parse_lots_safe(s: Option<&str>) -> Option<u64> {
    let v = parse_f64_safe(s)?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64 {
        Some(v as u64)
    } else {
        None
    }
}

/// Round to one decimal place.
pub fn round1(n: f64) -> f64 {
    (n * 10.0).round() / 10.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus `en` thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// `$160,000`
pub fn format_currency(n: f64) -> String {
    format!("${}", format_number(n, 0))
}

/// `$10,666.67`
pub fn format_currency_dec(n: f64) -> String {
    format!("${}", format_number(n, 2))
}

/// Axis-style amounts: `$1.2M`, `$160k`, `$950`.
pub fn format_currency_compact(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("${:.1}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("${:.0}k", n / 1_000.0)
    } else {
        format!("${:.0}", n)
    }
}

/// Ratio to percent with one decimal: `0.125` → `12.5%`.
pub fn format_pct(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_f64_safe() {
        assert_eq!(parse_f64_safe(Some(" 1,234.5 ")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("$40,000")), Some(40_000.0));
        assert_eq!(parse_f64_safe(Some("12abc")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn test_parse_lots_safe() {
        assert_eq!(parse_lots_safe(Some("12")), Some(12));
        assert_eq!(parse_lots_safe(Some("12.0")), Some(12));
        assert_eq!(parse_lots_safe(Some("1.5")), None);
        assert_eq!(parse_lots_safe(Some("-3")), None);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(6.666), 6.7);
        assert_eq!(round1(-12.04), -12.0);
    }

    #[test]
    fn test_currency_formats() {
        assert_eq!(format_currency(160_000.0), "$160,000");
        assert_eq!(format_currency_dec(10_666.666), "$10,666.67");
        assert_eq!(format_currency_compact(1_240_000.0), "$1.2M");
        assert_eq!(format_currency_compact(160_000.0), "$160k");
        assert_eq!(format_currency_compact(950.0), "$950");
        assert_eq!(format_pct(0.125), "12.5%");
        assert_eq!(format_number(-1234.5, 1), "-1,234.5");
        assert_eq!(format_int(9855u64), "9,855");
    }
}
