//! Display formatting for optional market figures.
//!
//! Absent values always render as [`NOT_AVAILABLE`].

pub const NOT_AVAILABLE: &str = "N/A";

/// `$1,234.56`; sub-dollar prices keep up to six significant digits.
pub fn format_price(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return NOT_AVAILABLE.to_string();
    };
    if v.abs() >= 1.0 || v == 0.0 {
        return format!("${}", group_thousands(v, 2));
    }

    // Zeros between the point and the first significant digit
    let leading = (-v.abs().log10()).ceil() as usize - 1;
    if leading >= MAX_LEADING_ZEROS {
        return format!("${}", group_thousands(v, 2));
    }

    let fixed = format!("{:.*}", leading + SIGNIFICANT_DIGITS, v);
    if fixed.parse::<f64>().map_or(false, |r| r.abs() >= 1.0) {
        return format!("${}", group_thousands(v, 2));
    }
    format!("${}", fixed.trim_end_matches('0').trim_end_matches('.'))
}

const SIGNIFICANT_DIGITS: usize = 6;
const MAX_LEADING_ZEROS: usize = 12;

/// `+1.23%` / `-0.50%`.
pub fn format_percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) if v > 0.0 => format!("+{:.2}%", v),
        Some(v) => format!("{:.2}%", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Compact dollar amount: `$1.23T`, `$4.56B`, `$7.89M`, `$12.3K`.
pub fn format_compact(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return NOT_AVAILABLE.to_string();
    };
    let abs = v.abs();
    if abs >= 1e12 {
        format!("${:.2}T", v / 1e12)
    } else if abs >= 1e9 {
        format!("${:.2}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", v / 1e6)
    } else if abs >= 1e3 {
        format!("${:.1}K", v / 1e3)
    } else {
        format!("${:.2}", v)
    }
}

pub fn format_rank(rank: Option<u32>) -> String {
    rank.map(|r| format!("#{}", r))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn group_thousands(v: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, v.abs());
    let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if v < 0.0 { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_values_render_na() {
        assert_eq!(format_price(None), "N/A");
        assert_eq!(format_percent(None), "N/A");
        assert_eq!(format_compact(None), "N/A");
        assert_eq!(format_rank(None), "N/A");
        assert_eq!(format_price(Some(f64::NAN)), "N/A");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(67234.5)), "$67,234.50");
        assert_eq!(format_price(Some(1.0)), "$1.00");
        assert_eq!(format_price(Some(1234567.891)), "$1,234,567.89");
        assert_eq!(format_price(Some(0.000123)), "$0.000123");
        assert_eq!(format_price(Some(0.5)), "$0.5");
        assert_eq!(format_price(Some(0.0)), "$0.00");
    }

    #[test]
    fn test_format_price_small_values() {
        assert_eq!(format_price(Some(0.0000123456)), "$0.0000123456");
        assert_eq!(format_price(Some(1e-7)), "$0.0000001");
        assert_eq!(format_price(Some(0.9999999)), "$1.00");
        assert_eq!(format_price(Some(0.1)), "$0.1");
        assert_eq!(format_price(Some(1e-20)), "$0.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(Some(1.234)), "+1.23%");
        assert_eq!(format_percent(Some(-0.5)), "-0.50%");
        assert_eq!(format_percent(Some(0.0)), "0.00%");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(Some(1.23e12)), "$1.23T");
        assert_eq!(format_compact(Some(4.56e9)), "$4.56B");
        assert_eq!(format_compact(Some(7.891e6)), "$7.89M");
        assert_eq!(format_compact(Some(12_345.0)), "$12.3K");
        assert_eq!(format_compact(Some(999.0)), "$999.00");
    }

    #[test]
    fn test_format_rank() {
        assert_eq!(format_rank(Some(1)), "#1");
    }
}
