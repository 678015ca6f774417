use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_OUT_DIR};
use std::path::PathBuf;

/// Get raw CSV directory from environment variable or use default
pub fn get_data_dir() -> PathBuf {
    std::env::var("TICKER_TAPE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Get rendered HTML directory from environment variable or use default
pub fn get_out_dir() -> PathBuf {
    std::env::var("TICKER_TAPE_OUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUT_DIR))
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Friendly name as used in artifact file names: `.`, space and `\` become `-`
pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '.' | ' ' | '\\' => '-',
            other => other,
        })
        .collect()
}

/// Escape text for use inside HTML element content or a quoted attribute
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(10.0025, 2), 10.0);
        assert_eq!(round_to(1.125, 2), 1.13);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(123.456, 1), 123.5);
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("BRK.B"), "BRK-B");
        assert_eq!(sanitize_file_stem(r"a\b c"), "a-b-c");
        assert_eq!(sanitize_file_stem("A.B"), sanitize_file_stem("A B"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("AT&T <b>"), "AT&amp;T &lt;b&gt;");
        assert_eq!(escape_html(r#"say "hi""#), "say &quot;hi&quot;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
