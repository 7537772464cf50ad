//! Best-effort canonical-name suggestions for unmapped source labels.
//!
//! Vocabulary lookup first, then a fuzzy pass over the vocabulary, then
//! a fallback transliteration into a safe identifier. Output is only a
//! hint for configuration authors.

use std::sync::LazyLock;

use rapidfuzz::distance::jaro_winkler::similarity as jaro_similarity;

use rota_clean::clean_text;

const FUZZY_MIN: f64 = 0.85;

static VOCABULARY: LazyLock<Vec<(&'static str, &'static str)>> = LazyLock::new(|| {
    vec![
        ("日期", "service_date"),
        ("主日日期", "service_date"),
        ("时间", "service_time"),
        ("讲员", "preacher"),
        ("讲道人", "preacher"),
        ("证道", "sermon_title"),
        ("讲道题目", "sermon_title"),
        ("题目", "sermon_title"),
        ("经文", "scripture"),
        ("读经", "scripture"),
        ("诗歌", "songs"),
        ("敬拜诗歌", "songs"),
        ("领会", "worship_lead"),
        ("主领", "worship_lead"),
        ("敬拜", "worship_lead"),
        ("司琴", "pianist"),
        ("钢琴", "pianist"),
        ("招待", "usher"),
        ("司事", "usher"),
        ("音控", "av_tech"),
        ("音响", "av_tech"),
        ("投影", "projection"),
        ("儿童", "childcare"),
        ("备注", "notes"),
    ]
});

/// Suggests a canonical field name for a raw column label.
pub fn suggest_field_name(label: &str) -> String {
    let cleaned = clean_text(label);
    if cleaned.is_empty() {
        return "unnamed_column".to_string();
    }
    for (term, field) in VOCABULARY.iter() {
        if *term == cleaned {
            return (*field).to_string();
        }
    }
    let mut best: Option<(&str, f64)> = None;
    for (term, field) in VOCABULARY.iter() {
        let score = jaro_similarity(cleaned.chars(), term.chars());
        if score >= FUZZY_MIN && best.is_none_or(|(_, b)| score > b) {
            best = Some((field, score));
        }
    }
    if let Some((field, _)) = best {
        return field.to_string();
    }
    transliterate(&cleaned)
}

/// Lower-cases and keeps alphanumerics (any script), mapping runs of
/// everything else to a single underscore.
fn transliterate(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_was_separator = false;
    for ch in label.to_lowercase().chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_was_separator = false;
        } else if !out.is_empty() && !last_was_separator {
            out.push('_');
            last_was_separator = true;
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "unnamed_column".to_string()
    } else {
        trimmed.to_string()
    }
}
