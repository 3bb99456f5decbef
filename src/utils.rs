//! Text, name and date normalization shared by the extractors.
//!
//! - Sentence handling: [`first_sentence`], [`first_sentences`]
//! - Name handling: [`format_name`], [`title_case`]
//! - Leading-word repair for pages that shout their first word: [`recapitalize_lead`]
//! - Dates and times: [`parse_loose_date`], [`to_twelve_hour`]
//! - Small helpers for URLs and log output

use std::ops::Range;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PARENTHESISED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").expect("static regex"));
static NEE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bNée?\b").expect("static regex"));
static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|wed|thurs|thur|thu|fri|sat|sun)\b\.?")
        .expect("static regex")
});
static ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("static regex"));
static SPACED_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+[-–—]\s+").expect("static regex"));
static AT_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bat\b").expect("static regex"));
static DOTTED_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\.(\d{2})\s*([ap])\.?m\b\.?").expect("static regex"));
static MERIDIEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d)\s*([ap])\.?m\b\.?").expect("static regex"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%d %B %Y %I:%M %p",
    "%B %d %Y %H:%M",
    "%B %d %Y %I:%M %p",
    "%H:%M %d %B %Y",
    "%I:%M %p %d %B %Y",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d %B %Y",
    "%B %d %Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
];

/// Returns the text up to and including the first sentence-ending period.
///
/// A period ends a sentence when it is followed by an uppercase letter
/// (directly or after whitespace) or by the end of the text. A period
/// between two digits is a decimal point and never ends a sentence. Text
/// with no boundary is returned whole.
///
/// ```
/// use bailiwick_news::utils::first_sentence;
/// assert_eq!(first_sentence("Value is 3.14. Next sentence."), "Value is 3.14.");
/// assert_eq!(first_sentence("No terminator here"), "No terminator here");
/// ```
pub fn first_sentence(text: &str) -> &str {
    sentence_end(text, 0).map_or(text, |end| &text[..end])
}

/// The first `n` sentences, using the same boundary rule as [`first_sentence`].
pub fn first_sentences(text: &str, n: usize) -> &str {
    let mut end = 0;
    for _ in 0..n {
        match sentence_end(text, end) {
            Some(next) => end = next,
            None => return text,
        }
    }
    &text[..end]
}

/// Byte offset just past the first sentence-ending period at or after `from`.
fn sentence_end(text: &str, from: usize) -> Option<usize> {
    let mut prev: Option<char> = text[..from].chars().next_back();
    let mut chars = text[from..].char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c == '.' {
            let idx = from + offset;
            let rest = &text[idx + 1..];
            let next = rest.chars().next();
            let decimal = prev.is_some_and(|p| p.is_ascii_digit())
                && next.is_some_and(|n| n.is_ascii_digit());

            if !decimal {
                let after_space = rest.trim_start();
                let boundary = match next {
                    None => true,
                    Some(n) if n.is_uppercase() => true,
                    Some(n) if n.is_whitespace() => {
                        after_space.is_empty()
                            || after_space.chars().next().is_some_and(char::is_uppercase)
                    }
                    _ => false,
                };
                if boundary {
                    return Some(idx + 1);
                }
            }
        }
        prev = Some(c);
    }
    None
}

/// Title-cases `text`: a letter following a non-letter is uppercased, every
/// other letter lowercased ("o'brien" becomes "O'Brien").
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Uppercases the first character and lowercases the rest.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    }
}

/// Reformats "Last, First (Extra)" as "First Last (Extra)".
///
/// Every parenthesised part is lifted out, the remainder is split on its
/// first comma and swapped, and the parts are re-attached in their original
/// order. The result is title-cased, except that "née" and "né" stay
/// lowercase. Names without a comma keep their word order.
///
/// ```
/// use bailiwick_news::utils::format_name;
/// assert_eq!(format_name("Smith, John (né Jones)"), "John Smith (né Jones)");
/// ```
pub fn format_name(name: &str) -> String {
    let bracketed: Vec<&str> = PARENTHESISED.find_iter(name).map(|m| m.as_str()).collect();
    let without_brackets = PARENTHESISED.replace_all(name, "");
    let without_brackets = without_brackets.trim();

    let mut formatted = match without_brackets.split_once(',') {
        Some((last, first)) => format!("{} {}", first.trim(), last.trim()),
        None => without_brackets.to_string(),
    };

    if !bracketed.is_empty() {
        formatted.push(' ');
        formatted.push_str(&bracketed.join(" "));
    }

    let titled = title_case(&formatted);
    NEE.replace_all(&titled, |caps: &Captures| caps[0].to_lowercase())
        .into_owned()
}

/// Repairs a body whose first word is printed in capitals.
///
/// The first word is capitalized ("COUNCILLORS" becomes "Councillors").
/// When that word is the article "a", the second word is lowercased too,
/// since the page capitalizes the whole opening phrase ("A MAN" becomes
/// "A man"). All other text, including line breaks, is left untouched.
pub fn recapitalize_lead(text: &str) -> String {
    let spans = leading_word_spans(text, 2);
    let Some(first) = spans.first().cloned() else {
        return text.to_string();
    };

    let first_word = &text[first.clone()];
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..first.start]);
    out.push_str(&capitalize(first_word));

    match spans.get(1) {
        Some(second) if first_word.eq_ignore_ascii_case("a") => {
            out.push_str(&text[first.end..second.start]);
            out.push_str(&text[second.clone()].to_lowercase());
            out.push_str(&text[second.end..]);
        }
        _ => out.push_str(&text[first.end..]),
    }
    out
}

fn leading_word_spans(text: &str, n: usize) -> Vec<Range<usize>> {
    let mut spans = Vec::with_capacity(n);
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                spans.push(s..i);
                if spans.len() == n {
                    return spans;
                }
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        spans.push(s..text.len());
    }
    spans
}

/// Parses loosely formatted, human-written dates.
///
/// Accepts ISO 8601 / RFC 3339, RFC 2822 and the usual British and American
/// long forms, with or without weekday names, ordinal suffixes ("17th"),
/// commas, an "at" or a spaced dash before the time, and 12 or 24 hour times:
///
/// ```
/// use bailiwick_news::utils::parse_loose_date;
/// assert!(parse_loose_date("Saturday 17th October 2026").is_some());
/// assert!(parse_loose_date("October 17, 2026 at 2:30pm").is_some());
/// assert!(parse_loose_date("yesterday-ish").is_none());
/// ```
///
/// Date-only inputs resolve to midnight. Offsets are dropped; the wall-clock
/// time as written is kept.
pub fn parse_loose_date(text: &str) -> Option<NaiveDateTime> {
    let raw = text.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.naive_local());
    }

    let cleaned = normalize_date_text(raw);

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&cleaned, fmt).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|fmt| {
                NaiveDate::parse_from_str(&cleaned, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
}

fn normalize_date_text(raw: &str) -> String {
    let text = raw.replace([',', '|'], " ");
    let text = SPACED_DASH.replace_all(&text, " ");
    let text = WEEKDAY.replace_all(&text, " ");
    let text = ORDINAL.replace_all(&text, "$1");
    let text = AT_WORD.replace_all(&text, " ");
    let text = DOTTED_TIME.replace_all(&text, "$1:$2 ${3}m");
    let text = MERIDIEM.replace_all(&text, |caps: &Captures| {
        format!("{} {}M", &caps[1], caps[2].to_uppercase())
    });
    collapse_whitespace(&text)
}

/// Converts a 24-hour "HH:MM" time (trailing characters ignored) to
/// "hh:MM AM/PM". Returns `None` when the leading five characters are not
/// a valid time.
pub fn to_twelve_hour(time: &str) -> Option<String> {
    let head: String = time.trim().chars().take(5).collect();
    NaiveTime::parse_from_str(&head, "%H:%M")
        .ok()
        .map(|t| t.format("%I:%M %p").to_string())
}

/// Drops the query string and fragment from a URL.
pub fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Joins all whitespace runs (including line breaks) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary before `max` bytes
/// and suffixed with `"…(+N bytes)"`.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max)
        .last()
        .unwrap_or(0);
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}
