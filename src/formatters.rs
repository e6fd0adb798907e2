//! Display formatting for prices, changes, market caps and reset times

use chrono::Utc;

/// Formats a USD price
///
/// Sub-cent prices keep six decimals (`$0.000123`); everything else is shown as
/// currency with two decimals and thousands separators (`$1,234.50`).
pub fn format_price(price: f64) -> String {
    if price < 0.01 {
        return format!("${:.6}", price);
    }
    if !price.is_finite() {
        return format!("${}", price);
    }
    format!("${}", group_thousands(&format!("{:.2}", price)))
}

/// Formats a 24h percentage change with an explicit sign for gains
pub fn format_change(change: f64) -> String {
    let sign = if change >= 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, change)
}

/// Formats a market cap in trillions, billions or millions
///
/// Anything below a million falls back to `format_price`.
pub fn format_market_cap(market_cap: f64) -> String {
    if market_cap >= 1e12 {
        return format!("${:.2}T", market_cap / 1e12);
    }
    if market_cap >= 1e9 {
        return format!("${:.2}B", market_cap / 1e9);
    }
    if market_cap >= 1e6 {
        return format!("${:.2}M", market_cap / 1e6);
    }
    format_price(market_cap)
}

/// Formats the time left until a rate limit resets, relative to now
pub fn format_time_until_reset(reset_at: Option<i64>) -> String {
    format_time_until_reset_at(reset_at, Utc::now().timestamp_millis())
}

/// Formats the time left until `reset_at`, both in epoch milliseconds
///
/// Returns `""` when there is no reset time, `"now"` once it has passed,
/// otherwise `"in N minute(s)"` or `"in N second(s)"`.
pub fn format_time_until_reset_at(reset_at: Option<i64>, now_ms: i64) -> String {
    let reset_at = match reset_at {
        Some(ts) if ts != 0 => ts,
        _ => return String::new(),
    };

    let diff = reset_at.saturating_sub(now_ms);
    if diff <= 0 {
        return "now".to_string();
    }

    let seconds = diff / 1000;
    let minutes = seconds / 60;

    if minutes > 0 {
        return format!("in {} minute{}", minutes, plural(minutes));
    }
    format!("in {} second{}", seconds, plural(seconds))
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Inserts `,` every three digits of the integer part of a fixed-point string
fn group_thousands(fixed: &str) -> String {
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed, None),
    };

    let len = int_part.len();
    let mut out = String::with_capacity(fixed.len() + len / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(1234.5), "$1,234.50");
        assert_eq!(format_price(0.01), "$0.01");
        assert_eq!(format_price(0.000123), "$0.000123");
        assert_eq!(format_price(65_432.109), "$65,432.11");
        assert_eq!(format_price(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_price(999.999), "$1,000.00");
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(0.0), "+0.00%");
        assert_eq!(format_change(-2.456), "-2.46%");
        assert_eq!(format_change(5.234), "+5.23%");
    }

    #[test]
    fn test_format_market_cap() {
        assert_eq!(format_market_cap(1.5e12), "$1.50T");
        assert_eq!(format_market_cap(2.3e9), "$2.30B");
        assert_eq!(format_market_cap(4.5e6), "$4.50M");
        assert_eq!(format_market_cap(12_345.0), "$12,345.00");
    }

    #[test]
    fn test_format_time_until_reset() {
        let now = 1_700_000_000_000;
        assert_eq!(format_time_until_reset_at(None, now), "");
        assert_eq!(format_time_until_reset_at(Some(now - 1), now), "now");
        assert_eq!(format_time_until_reset_at(Some(now + 1_500), now), "in 1 second");
        assert_eq!(format_time_until_reset_at(Some(now + 30_000), now), "in 30 seconds");
        assert_eq!(format_time_until_reset_at(Some(now + 60_000), now), "in 1 minute");
        assert_eq!(format_time_until_reset_at(Some(now + 185_000), now), "in 3 minutes");
    }

    #[test]
    fn test_format_time_until_reset_extremes() {
        assert_eq!(
            format_time_until_reset_at(Some(i64::MAX), -1),
            format!("in {} minutes", i64::MAX / 60_000)
        );
        assert_eq!(format_time_until_reset_at(Some(i64::MIN), 1), "now");
    }
}
