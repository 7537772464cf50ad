//! Field-specific cleaning: scripture references, song lists, names.

use std::sync::LazyLock;

use regex::Regex;

use rota_model::RawRecord;

use crate::dates::strip_embedded_dates;
use crate::text::clean_text;

/// Book-name/chapter boundary: a letter or ideograph immediately
/// followed by a digit.
static BOOK_CHAPTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{L})(\d)").expect("book chapter pattern"));

/// Cleans a scripture reference, inserting a single space between a
/// trailing letter/ideograph and the chapter number. Applied once.
pub fn clean_scripture(raw: &str) -> String {
    let cleaned = clean_text(raw);
    BOOK_CHAPTER.replace_all(&cleaned, "$1 $2").into_owned()
}

/// Splits a song-list cell on any configured delimiter character,
/// trimming pieces, dropping empties, and de-duplicating while
/// preserving first-seen order.
pub fn split_songs(raw: &str, delimiters: &str) -> Vec<String> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return Vec::new();
    }
    let mut songs: Vec<String> = Vec::new();
    for piece in cleaned.split(|c| delimiters.contains(c)) {
        let song = piece.trim();
        if song.is_empty() {
            continue;
        }
        if !songs.iter().any(|s| s == song) {
            songs.push(song.to_string());
        }
    }
    songs
}

/// Collects cleaned values across the named source labels, skipping
/// empties and de-duplicating while preserving order.
pub fn merge_columns(record: &RawRecord, labels: &[&str]) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for label in labels {
        let Some(raw) = record.value(label) else {
            continue;
        };
        let cleaned = clean_text(raw);
        if cleaned.is_empty() {
            continue;
        }
        if !values.iter().any(|v| v == &cleaned) {
            values.push(cleaned);
        }
    }
    values
}

/// Cleans a person name: text cleaning, then embedded date-like
/// substrings stripped, then a final text pass.
pub fn clean_name(raw: &str) -> String {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return cleaned;
    }
    clean_text(&strip_embedded_dates(&cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripture_gets_chapter_space() {
        assert_eq!(clean_scripture("约翰福音3:16"), "约翰福音 3:16");
        assert_eq!(clean_scripture("John3:16"), "John 3:16");
        assert_eq!(clean_scripture("约翰福音 3:16"), "约翰福音 3:16");
        assert_eq!(clean_scripture(""), "");
    }

    #[test]
    fn songs_split_and_dedupe() {
        assert_eq!(
            split_songs("奇异恩典、奇异恩典", "、,，;；/|"),
            vec!["奇异恩典"]
        );
        assert_eq!(
            split_songs("奇异恩典、这世界非我家, 有福的确据", "、,，;；/|"),
            vec!["奇异恩典", "这世界非我家", "有福的确据"]
        );
        assert!(split_songs("", "、,").is_empty());
        assert!(split_songs("N/A", "、,").is_empty());
    }

    #[test]
    fn merge_skips_empty_and_dedupes() {
        let record = RawRecord::new(vec![
            ("司琴".to_string(), "王姊妹".to_string()),
            ("钢琴".to_string(), String::new()),
            ("伴奏".to_string(), "王姊妹".to_string()),
            ("吉他".to_string(), "陈弟兄".to_string()),
        ]);
        assert_eq!(
            merge_columns(&record, &["司琴", "钢琴", "伴奏", "吉他"]),
            vec!["王姊妹", "陈弟兄"]
        );
    }

    #[test]
    fn name_loses_embedded_dates() {
        assert_eq!(clean_name("张牧师 2025-10-05"), "张牧师");
        assert_eq!(clean_name("10月5日 张牧师"), "张牧师");
        assert_eq!(clean_name("  张牧师  "), "张牧师");
        assert_eq!(clean_name("N/A"), "");
    }
}
