//! Date parsing, derived calendar fields, and embedded-date stripping.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::text::clean_text;

/// Strict formats tried before any fuzzy extraction.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日"];

static CJK_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日?").expect("cjk date pattern")
});

static DELIMITED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[/\-.]\s*(\d{1,2})\s*[/\-.]\s*(\d{1,2})").expect("delimited pattern")
});

/// Date-like substrings stripped out of names, longest form first.
static EMBEDDED_DATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\d{2,4}\s*年\s*\d{1,2}\s*月\s*\d{1,2}\s*日?",
        r"\d{2,4}\s*[/\-.]\s*\d{1,2}\s*[/\-.]\s*\d{1,2}",
        r"\d{1,2}\s*月\s*\d{1,2}\s*日?",
        r"\d{1,2}\s*[/\-.]\s*\d{1,2}",
        r"\d{4}\s*年",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("embedded date pattern"))
    .collect()
});

/// Parses a free-form date into canonical `YYYY-MM-DD`.
///
/// Strict formats first, then ordered fallbacks: the CJK
/// `YYYY年M月D日` textual form, then slash/dash/dot-delimited
/// `YYYY-M-D`. Month and day are zero-padded and checked for calendar
/// validity. Returns `None` for anything unparseable.
pub fn clean_date(raw: &str) -> Option<String> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    for pattern in [&*CJK_DATE, &*DELIMITED_DATE] {
        if let Some(captures) = pattern.captures(&cleaned) {
            let year: i32 = captures[1].parse().ok()?;
            let month: u32 = captures[2].parse().ok()?;
            let day: u32 = captures[3].parse().ok()?;
            if NaiveDate::from_ymd_opt(year, month, day).is_some() {
                return Some(format!("{year:04}-{month:02}-{day:02}"));
            }
            return None;
        }
    }
    None
}

/// ISO week number of a canonical `YYYY-MM-DD` date; `None` otherwise.
pub fn get_service_week(date: &str) -> Option<u32> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.iso_week().week())
}

/// Coarse time-of-day bucket for a dated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slot {
    #[default]
    Morning,
    Noon,
    Evening,
}

impl Slot {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Noon => "noon",
            Self::Evening => "evening",
        }
    }
}

static HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})\s*[::点时h]").expect("hour pattern"));

/// Buckets a free-text service time into a [`Slot`].
///
/// Keyword match wins over the bare hour heuristic. "下午" is the one
/// keyword that also reads the hour: "下午2点" is 14:00 and stays in
/// the noon bucket, "下午5点" is 17:00 and moves to evening. A missing
/// or uninterpretable time defaults to morning.
pub fn infer_service_slot(time: Option<&str>) -> Slot {
    let Some(raw) = time else {
        return Slot::Morning;
    };
    let cleaned = clean_text(raw).to_lowercase();
    if cleaned.is_empty() {
        return Slot::Morning;
    }
    if ["上午", "早", "晨", "morning"].iter().any(|k| cleaned.contains(k)) {
        return Slot::Morning;
    }
    if ["中午", "正午", "noon"].iter().any(|k| cleaned.contains(k)) {
        return Slot::Noon;
    }
    if ["晚", "夜", "evening", "night"].iter().any(|k| cleaned.contains(k)) {
        return Slot::Evening;
    }
    if cleaned.contains("下午") {
        // Hours after 下午 are twelve-hour clock.
        let hour = captured_hour(&cleaned).map(|h| if h < 12 { h + 12 } else { h });
        return match hour {
            Some(h) if h >= 17 => Slot::Evening,
            _ => Slot::Noon,
        };
    }
    match captured_hour(&cleaned) {
        Some(0..=10) => Slot::Morning,
        Some(11..=16) => Slot::Noon,
        Some(_) => Slot::Evening,
        None => Slot::Morning,
    }
}

fn captured_hour(cleaned: &str) -> Option<u32> {
    HOUR.captures(cleaned)
        .and_then(|captures| captures[1].parse().ok())
}

/// Removes embedded date-like substrings (leading, interior, trailing).
///
/// Applied to a fixpoint so that removing one match can never leave a
/// newly formed date-like substring behind.
pub fn strip_embedded_dates(raw: &str) -> String {
    let mut current = raw.to_string();
    loop {
        let mut next = current.clone();
        for pattern in EMBEDDED_DATES.iter() {
            next = pattern.replace_all(&next, "").into_owned();
        }
        if next == current {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cjk_textual_form() {
        assert_eq!(clean_date("2025年10月5日"), Some("2025-10-05".to_string()));
        assert_eq!(clean_date("2025年 10月 5日"), Some("2025-10-05".to_string()));
    }

    #[test]
    fn parses_delimited_forms() {
        assert_eq!(clean_date("2025-10-05"), Some("2025-10-05".to_string()));
        assert_eq!(clean_date("2025/10/5"), Some("2025-10-05".to_string()));
        assert_eq!(clean_date("2025.1.5"), Some("2025-01-05".to_string()));
    }

    #[test]
    fn rejects_garbage_and_invalid_calendar_dates() {
        assert_eq!(clean_date("not a date"), None);
        assert_eq!(clean_date("2025-02-30"), None);
        assert_eq!(clean_date(""), None);
        assert_eq!(clean_date("N/A"), None);
    }

    #[test]
    fn service_week_is_iso() {
        assert_eq!(get_service_week("2025-01-01"), Some(1));
        assert_eq!(get_service_week("2024-12-30"), Some(1));
        assert_eq!(get_service_week("not a date"), None);
    }

    #[test]
    fn slot_keywords_win() {
        assert_eq!(infer_service_slot(Some("主日上午 9:30")), Slot::Morning);
        assert_eq!(infer_service_slot(Some("中午12点")), Slot::Noon);
        assert_eq!(infer_service_slot(Some("晚堂 19:00")), Slot::Evening);
    }

    #[test]
    fn slot_hour_heuristic() {
        assert_eq!(infer_service_slot(Some("9:30")), Slot::Morning);
        assert_eq!(infer_service_slot(Some("12:00")), Slot::Noon);
        assert_eq!(infer_service_slot(Some("19:00")), Slot::Evening);
    }

    #[test]
    fn slot_afternoon_follows_the_clock() {
        assert_eq!(infer_service_slot(Some("下午")), Slot::Noon);
        assert_eq!(infer_service_slot(Some("下午2点")), Slot::Noon);
        assert_eq!(infer_service_slot(Some("下午14:30")), Slot::Noon);
        assert_eq!(infer_service_slot(Some("下午5点")), Slot::Evening);
    }

    #[test]
    fn slot_defaults_to_morning() {
        assert_eq!(infer_service_slot(None), Slot::Morning);
        assert_eq!(infer_service_slot(Some("")), Slot::Morning);
        assert_eq!(infer_service_slot(Some("待定")), Slot::Morning);
    }

    #[test]
    fn strips_dates_wherever_they_sit() {
        assert_eq!(strip_embedded_dates("张牧师2025-10-05"), "张牧师");
        assert_eq!(strip_embedded_dates("10月5日张牧师"), "张牧师");
        assert_eq!(strip_embedded_dates("张2025年10月5日牧师"), "张牧师");
        assert_eq!(strip_embedded_dates("张牧师"), "张牧师");
    }

    #[test]
    fn stripping_reaches_a_fixpoint() {
        let stripped = strip_embedded_dates("12025-10-050-12-31");
        assert_eq!(strip_embedded_dates(&stripped), stripped);
    }
}
