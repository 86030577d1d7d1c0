//! String utilities for the domain layer.

/// Truncate a reason or transcript to at most `max_chars` characters.
///
/// Counts characters, not bytes, so a limit of 200 keeps 200 visible
/// characters regardless of script. A trailing `...` marks the cut.
pub fn truncate_detail(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let cut: String = trimmed.chars().take(keep).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_detail_is_unchanged() {
        assert_eq!(truncate_detail("exit code 1", 200), "exit code 1");
    }

    #[test]
    fn test_long_detail_is_bounded() {
        let detail = "x".repeat(500);
        let out = truncate_detail(&detail, 200);
        assert_eq!(out.chars().count(), 200);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_multibyte_counts_chars() {
        let out = truncate_detail("ñandú ñandú ñandú", 8);
        assert_eq!(out, "ñandú...");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(truncate_detail("  Traceback\n", 50), "Traceback");
    }
}
