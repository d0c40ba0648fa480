//! Advisory booking estimate. The server never sees these numbers.

use crate::models::TourPackage;

/// Reads the amount out of a display price such as `"$135"` or
/// `"LKR 12,500 per person"`. Everything except digits, `.` and `-` is
/// dropped, then the longest numeric prefix is taken, so `"1200-1500"`
/// yields 1200.
pub fn parse_display_price(display: &str) -> Option<f64> {
    let cleaned: String = display
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let bytes = cleaned.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }

    let mut digits = 0;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    if digits == 0 {
        return None;
    }
    cleaned[..end].trim_end_matches('.').parse().ok()
}

pub fn estimate_total(display_price: &str, guests: u32) -> Option<f64> {
    if guests == 0 {
        return None;
    }
    parse_display_price(display_price).map(|price| price * f64::from(guests))
}

pub fn estimate_for(tour: Option<&TourPackage>, guests: Option<u32>) -> Option<f64> {
    estimate_total(&tour?.price, guests?)
}

/// `1350` → `"1,350"`, `1350.5` → `"1,350.50"`.
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let (whole, fraction) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    if fraction == 0 {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollar_price_times_guests() {
        for guests in 1..=12 {
            assert_eq!(estimate_total("$135", guests), Some(135.0 * guests as f64));
        }
    }

    #[test]
    fn longest_numeric_prefix_is_used() {
        assert_eq!(parse_display_price("1200-1500"), Some(1200.0));
        assert_eq!(parse_display_price("$99.50 pp"), Some(99.5));
        assert_eq!(parse_display_price("1.2.3"), Some(1.2));
        assert_eq!(parse_display_price("LKR 12,500"), Some(12500.0));
        assert_eq!(parse_display_price(".5"), Some(0.5));
        assert_eq!(parse_display_price("5."), Some(5.0));
        assert_eq!(parse_display_price("-20"), Some(-20.0));
    }

    #[test]
    fn non_numeric_price_gives_no_estimate() {
        assert_eq!(parse_display_price("Contact us"), None);
        assert_eq!(parse_display_price("-"), None);
        assert_eq!(parse_display_price("--5"), None);
        assert_eq!(parse_display_price("."), None);
        assert_eq!(estimate_total("On request", 3), None);
    }

    #[test]
    fn missing_package_or_guests_gives_no_estimate() {
        let tour = TourPackage {
            price: "$135".into(),
            ..Default::default()
        };
        assert_eq!(estimate_for(None, Some(2)), None);
        assert_eq!(estimate_for(Some(&tour), None), None);
        assert_eq!(estimate_for(Some(&tour), Some(0)), None);
        assert_eq!(estimate_for(Some(&tour), Some(2)), Some(270.0));
    }

    #[test]
    fn amounts_are_grouped() {
        assert_eq!(format_amount(135.0), "135");
        assert_eq!(format_amount(1350.0), "1,350");
        assert_eq!(format_amount(1234567.5), "1,234,567.50");
        assert_eq!(format_amount(0.0), "0");
    }
}
