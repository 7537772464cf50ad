//! Base text normalization.

/// Placeholder tokens that read as "no value", compared after
/// whitespace collapsing, case-insensitively for ASCII forms.
const PLACEHOLDERS: [&str; 12] = [
    "-", "--", "—", "——", "–", "n/a", "na", "null", "none", "无", "暂无", "待定",
];

/// Trims, collapses internal whitespace runs, converts full-width
/// spaces, and maps placeholder tokens to the empty string.
///
/// Total and idempotent: `clean_text(clean_text(v)) == clean_text(v)`.
pub fn clean_text(raw: &str) -> String {
    let unified = raw.replace('\u{3000}', " ");
    let collapsed = unified.split_whitespace().collect::<Vec<_>>().join(" ");
    if is_placeholder(&collapsed) {
        String::new()
    } else {
        collapsed
    }
}

fn is_placeholder(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    let lowered = value.to_lowercase();
    PLACEHOLDERS.contains(&lowered.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(clean_text("  张   牧师  "), "张 牧师");
        assert_eq!(clean_text("a\t b\n c"), "a b c");
    }

    #[test]
    fn converts_full_width_spaces() {
        assert_eq!(clean_text("张\u{3000}牧师"), "张 牧师");
    }

    #[test]
    fn placeholders_become_empty() {
        for raw in ["-", "--", "—", "N/A", "n/a", "null", "NONE", "无", " - "] {
            assert_eq!(clean_text(raw), "", "placeholder: {raw:?}");
        }
    }

    #[test]
    fn idempotent() {
        for raw in ["  张   牧师  ", "N/A", "", "hello  world", "—"] {
            let once = clean_text(raw);
            assert_eq!(clean_text(&once), once, "input: {raw:?}");
        }
    }
}
