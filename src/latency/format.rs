/// Human-readable latency: `<1ms`, whole milliseconds below a second,
/// seconds with two decimals above.
pub fn format_ms(ms: f64) -> String {
    if ms < 1.0 {
        "<1ms".to_string()
    } else if ms < 1000.0 {
        format!("{}ms", ms.round() as i64)
    } else {
        format!("{:.2}s", ms / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_millisecond() {
        assert_eq!(format_ms(0.5), "<1ms");
        assert_eq!(format_ms(0.0), "<1ms");
    }

    #[test]
    fn test_milliseconds() {
        assert_eq!(format_ms(42.0), "42ms");
        assert_eq!(format_ms(999.0), "999ms");
        assert_eq!(format_ms(12.4), "12ms");
    }

    #[test]
    fn test_seconds() {
        assert_eq!(format_ms(1500.0), "1.50s");
        assert_eq!(format_ms(2345.0), "2.35s");
    }
}
