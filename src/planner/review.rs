//! Spaced-repetition review schedules.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Recall score assumed when laying out a schedule in advance.
const PLANNED_PERFORMANCE: f64 = 0.8;
/// Cap on the exponential exponent so intervals stay within a few decades.
const MAX_DOUBLINGS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Leitner,
    Sm2,
    Fibonacci,
    Exponential,
}

const LEITNER: &[u64] = &[1, 2, 4, 7, 15, 30];
const SM2: &[u64] = &[1, 6];
const FIBONACCI: &[u64] = &[1, 1, 2, 3, 5, 8, 13, 21];

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [Self::Leitner, Self::Sm2, Self::Fibonacci, Self::Exponential];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leitner => "leitner",
            Self::Sm2 => "sm2",
            Self::Fibonacci => "fibonacci",
            Self::Exponential => "exponential",
        }
    }

    /// Base interval in days before the `review_count`-th review (1-based).
    /// Table algorithms repeat their last step.
    pub fn base_interval(self, review_count: u32) -> u64 {
        let n = review_count.max(1);
        let table = match self {
            Self::Exponential => return 1u64 << (n - 1).min(MAX_DOUBLINGS),
            Self::Leitner => LEITNER,
            Self::Sm2 => SM2,
            Self::Fibonacci => FIBONACCI,
        };
        table[(n as usize - 1).min(table.len() - 1)]
    }
}

impl FromStr for Algorithm {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "unknown algorithm '{needle}'; expected one of: leitner, sm2, fibonacci, exponential"
                ))
            })
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next review date. `performance` in `0.0..=1.0` scales the interval
/// between half and one and a half times its base length, truncated.
pub fn next_review(algorithm: Algorithm, review_count: u32, last_review: NaiveDate, performance: f64) -> NaiveDate {
    let performance = if performance.is_nan() { 0.0 } else { performance.clamp(0.0, 1.0) };
    let days = (algorithm.base_interval(review_count) as f64 * (0.5 + performance)) as u64;
    last_review
        .checked_add_days(Days::new(days))
        .unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSession {
    pub session_number: u32,
    pub date: NaiveDate,
    pub topic: String,
    pub focus: &'static str,
    pub technique: &'static str,
    pub estimated_duration: &'static str,
}

const TECHNIQUES: &[&str] = &[
    "Note-taking and concept mapping",
    "Practice testing and self-quizzing",
    "Teaching the material to someone else",
    "Spaced retrieval practice",
    "Interleaved practice with related topics",
    "Elaborative interrogation",
    "Dual coding (diagrams + text)",
];

fn focus(session: u32) -> &'static str {
    match session {
        1 => "Initial exposure and overview",
        2..=3 => "Active recall and practice",
        4..=5 => "Deep understanding and connections",
        _ => "Mastery and long-term retention",
    }
}

fn estimated_duration(session: u32) -> &'static str {
    match session {
        1 => "45-60 minutes",
        2..=3 => "30-45 minutes",
        _ => "20-30 minutes",
    }
}

/// `sessions` study dates for `topic`, the first on `start`.
pub fn review_schedule(topic: &str, sessions: u32, algorithm: Algorithm, start: NaiveDate) -> Vec<ReviewSession> {
    let mut date = start;
    let mut out = Vec::with_capacity(sessions as usize);
    for n in 1..=sessions {
        out.push(ReviewSession {
            session_number: n,
            date,
            topic: topic.to_string(),
            focus: focus(n),
            technique: TECHNIQUES[(n as usize - 1).min(TECHNIQUES.len() - 1)],
            estimated_duration: estimated_duration(n),
        });
        date = next_review(algorithm, n, date, PLANNED_PERFORMANCE);
    }
    out
}
