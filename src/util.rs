// Locale helpers for Brazilian currency strings and basic statistics.
//
// Scraped salary cells look like `R$ 1.234,56`, `4.000` or `3500,5`. Every
// numeric value the rest of the crate sees goes through `parse_brl`, and every
// value a human sees goes back out through `format_currency` or
// `format_percentage`.
use num_format::{Locale, ToFormattedString};

/// Parse a pt-BR formatted amount into `f64`.
///
/// - Strips a leading `R$` and surrounding whitespace.
/// - With a comma present, `.` is a thousands separator and `,` the decimal one.
/// - Without a comma, every `.` is a thousands separator.
/// - Anything that does not parse, or parses to a negative or non-finite
///   value, becomes `0.0`. A bad cell never fails its row.
pub fn parse_brl(raw: &str) -> f64 {
    let s = raw.trim();
    let s = s.strip_prefix("R$").unwrap_or(s).trim();
    if s.is_empty() {
        return 0.0;
    }
    let cleaned = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s.replace('.', "")
    };
    // `f64::from_str` accepts "inf" and "NaN"; neither is a salary.
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// `1234.5` -> `"R$ 1.234,50"`. Non-finite values come back as their plain
/// string form.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    format!("R$ {}", swap_separators(&format_number(value, 2)))
}

/// `0.4523` -> `"45,23%"`. The input is a fraction.
pub fn format_percentage(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    format!("{:.2}%", value * 100.0).replace('.', ",")
}

/// Exchange `,` and `.` so an en-US rendering reads as pt-BR.
fn swap_separators(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            other => other,
        })
        .collect()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus en-US thousands grouping (`1,234,567.89`).
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Past u128 range the digits are kept ungrouped rather than lost.
    let mut res = match int_part.parse::<u128>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    // Values that round to zero print without a sign.
    let neg = n < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0');
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

pub fn average(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

// `tabled(display_with = ...)` hooks for the console previews.
pub fn display_currency(v: &f64) -> String {
    format_currency(*v)
}

pub fn display_percentage(v: &f64) -> String {
    format_percentage(*v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grouped_amount_with_decimal_comma() {
        assert_eq!(parse_brl("1.234,56"), 1234.56);
    }

    #[test]
    fn parses_currency_prefix() {
        assert_eq!(parse_brl("R$ 50,00"), 50.0);
        assert_eq!(parse_brl("  R$12.000  "), 12000.0);
    }

    #[test]
    fn dots_without_comma_are_thousands() {
        assert_eq!(parse_brl("4.000"), 4000.0);
        assert_eq!(parse_brl("1.250.000"), 1_250_000.0);
    }

    #[test]
    fn garbage_parses_to_zero() {
        assert_eq!(parse_brl("garbage"), 0.0);
        assert_eq!(parse_brl(""), 0.0);
        assert_eq!(parse_brl("R$"), 0.0);
        assert_eq!(parse_brl("NaN"), 0.0);
        assert_eq!(parse_brl("inf"), 0.0);
        assert_eq!(parse_brl("-500,00"), 0.0);
    }

    #[test]
    fn formats_currency_in_pt_br() {
        assert_eq!(format_currency(1234.5), "R$ 1.234,50");
        assert_eq!(format_currency(0.0), "R$ 0,00");
        assert_eq!(format_currency(1_500_000.0), "R$ 1.500.000,00");
        assert_eq!(format_currency(999.999), "R$ 1.000,00");
    }

    #[test]
    fn non_finite_currency_is_passed_through() {
        assert_eq!(format_currency(f64::NAN), "NaN");
    }

    #[test]
    fn currency_survives_reparse() {
        for x in [0.01, 12.3, 999.99, 1234.56, 48_750.1, 2_000_000.0] {
            let back = parse_brl(&format_currency(x));
            assert!((back - x).abs() < 0.005, "{} -> {}", x, back);
        }
    }

    #[test]
    fn amounts_beyond_i64_keep_their_digits() {
        let x = parse_brl("10000000000000000000");
        assert_eq!(x, 1e19);
        assert_eq!(format_currency(x), "R$ 10.000.000.000.000.000.000,00");
        assert_eq!(parse_brl(&format_currency(x)), x);

        let huge = 1e40;
        let back = parse_brl(&format_currency(huge));
        assert!((back - huge).abs() / huge < 1e-12, "{} -> {}", huge, back);
    }

    #[test]
    fn formats_percentage_from_fraction() {
        assert_eq!(format_percentage(0.4523), "45,23%");
        assert_eq!(format_percentage(0.0), "0,00%");
        assert_eq!(format_percentage(-0.1), "-10,00%");
    }

    #[test]
    fn format_number_groups_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 2), "-1,500.00");
        assert_eq!(format_number(-0.001, 2), "0.00");
    }

    #[test]
    fn average_of_empty_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[1.0, 2.0, 6.0]), 3.0);
    }
}
