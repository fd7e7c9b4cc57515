//! Workload signals pulled out of free-form chat messages.

use std::sync::LazyLock;

use regex::Regex;

static DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+days?").expect("days regex should be valid"));

static LABS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(?:labs?|practicals?)").expect("labs regex should be valid")
});

static ASSIGNMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(?:assignments?|hw|homework)").expect("assignments regex should be valid")
});

static EXAM_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"exam\D*(?:in\s+)?(\d+)\s+days?").expect("exam regex should be valid")
});

static HOURS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)").expect("hours regex should be valid")
});

/// Bytes of context either side of a day count searched for a "behind" word.
const DAYS_WINDOW: usize = 20;

pub(super) fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

/// "5 days behind", "missed 6 days": the first day count near a word
/// saying the student is behind.
pub(super) fn days_behind(text: &str) -> Option<u32> {
    DAYS.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let window = window(text, whole.start(), whole.end(), DAYS_WINDOW);
        if contains_any(window, &["behind", "missed", "absent"]) {
            caps[1].parse().ok()
        } else {
            None
        }
    })
}

pub(super) fn labs_count(text: &str) -> Option<u32> {
    first_number(&LABS, text)
}

pub(super) fn assignments_count(text: &str) -> Option<u32> {
    first_number(&ASSIGNMENTS, text)
}

/// "exam in 3 days", "exams start 4 days from now".
pub(super) fn exam_in_days(text: &str) -> Option<u32> {
    first_number(&EXAM_IN, text)
}

pub(super) fn hours_available(text: &str) -> Option<f64> {
    first_number(&HOURS, text)
}

fn first_number<T: std::str::FromStr>(re: &Regex, text: &str) -> Option<T> {
    re.captures(text).and_then(|caps| caps[1].parse().ok())
}

/// `text[start - pad .. end + pad]`, widened to char boundaries.
fn window(text: &str, start: usize, end: usize, pad: usize) -> &str {
    let mut from = start.saturating_sub(pad);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + pad).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    &text[from..to]
}
