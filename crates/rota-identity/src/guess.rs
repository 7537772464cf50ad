//! Best-effort guess at which raw columns hold person names.
//!
//! Used only by alias-extraction tooling; the cleaning/resolution
//! pipeline never depends on it.

const NAME_COLUMN_KEYWORDS: [&str; 14] = [
    "讲员", "牧师", "传道", "司琴", "领会", "主领", "招待", "司事", "同工", "负责",
    "preacher", "pianist", "lead", "usher",
];

/// Returns the labels that look like person-name columns, in input
/// order. Purely keyword-based and deliberately conservative.
pub fn guess_name_columns(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .filter(|label| {
            let lowered = label.trim().to_lowercase();
            !lowered.is_empty()
                && NAME_COLUMN_KEYWORDS
                    .iter()
                    .any(|keyword| lowered.contains(keyword))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_columns_are_picked() {
        let labels: Vec<String> = ["日期", "讲员", "敬拜主领", "诗歌", "Usher Team"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            guess_name_columns(&labels),
            vec!["讲员", "敬拜主领", "Usher Team"]
        );
    }
}
