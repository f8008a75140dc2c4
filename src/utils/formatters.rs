// Formatting utilities

/// Format with two decimals, like upstream's displayed ratios
pub fn fixed2(value: f64) -> String {
    format!("{:.2}", value)
}

/// `num / den` to two decimals, or `"0"` when nothing was played
pub fn ratio_or_zero(num: u64, den: u64) -> String {
    if den == 0 {
        "0".to_string()
    } else {
        fixed2(num as f64 / den as f64)
    }
}

/// `num / den` as a percentage to two decimals (no `%` sign), or `"0"`
pub fn percent_or_zero(num: u64, den: u64) -> String {
    if den == 0 {
        "0".to_string()
    } else {
        fixed2(num as f64 / den as f64 * 100.0)
    }
}

/// `"1 kill"` / `"3 kills"`
pub fn plural(n: u64, singular: &str, plural: &str) -> String {
    format!("{} {}", n, if n == 1 { singular } else { plural })
}

/// Format elapsed seconds as `" 2d 3h 15m"`.
///
/// With `days_only` the output is always just the day count (`" 0d"`), which
/// is how recent-match ages are shown.
pub fn format_seconds(seconds: i64, days_only: bool) -> String {
    let seconds = seconds.max(0);
    let days = seconds / 86_400;
    let hrs = (seconds % 86_400) / 3_600;
    let mnts = (seconds % 3_600) / 60;

    let mut res = String::new();
    if days_only || days > 0 {
        res.push_str(&format!(" {}d", days));
    }
    if !days_only && (hrs > 0 || days > 0) {
        res.push_str(&format!(" {}h", hrs));
    }
    if !days_only && (mnts > 0 || hrs > 0) {
        res.push_str(&format!(" {}m", mnts));
    }
    res
}

/// Turn a column-oriented matrix into rows
pub fn transpose(columns: &[Vec<String>]) -> Vec<Vec<String>> {
    let height = columns.iter().map(|c| c.len()).max().unwrap_or(0);
    (0..height)
        .map(|row| {
            columns
                .iter()
                .map(|col| col.get(row).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Render a column-oriented matrix as aligned plain-text rows
pub fn render_table(columns: &[Vec<String>]) -> String {
    let widths: Vec<usize> = columns
        .iter()
        .map(|col| col.iter().map(|c| c.chars().count()).max().unwrap_or(0))
        .collect();

    transpose(columns)
        .iter()
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate string to max length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_guards() {
        assert_eq!(ratio_or_zero(50, 0), "0");
        assert_eq!(percent_or_zero(0, 0), "0");
        assert_eq!(ratio_or_zero(769, 100), "7.69");
        assert_eq!(percent_or_zero(10, 100), "10.00");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "kill", "kills"), "1 kill");
        assert_eq!(plural(0, "kill", "kills"), "0 kills");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(3 * 86_400 + 7_200, true), " 3d");
        assert_eq!(format_seconds(600, true), " 0d");
        assert_eq!(format_seconds(86_400 + 3_600 + 120, false), " 1d 1h 2m");
        assert_eq!(format_seconds(300, false), " 5m");
        assert_eq!(format_seconds(-50, true), " 0d");
    }

    #[test]
    fn test_transpose_and_render() {
        let columns = vec![
            vec!["Mode".to_string(), "Solo".to_string()],
            vec!["Kills".to_string(), "12 kills".to_string()],
        ];
        assert_eq!(
            transpose(&columns),
            vec![
                vec!["Mode".to_string(), "Kills".to_string()],
                vec!["Solo".to_string(), "12 kills".to_string()],
            ]
        );
        assert_eq!(render_table(&columns), "Mode  Kills\nSolo  12 kills");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }
}
