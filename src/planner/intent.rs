//! Keyword intent classifier.
//!
//! Rules are checked in order and the first hit wins, so crisis words beat
//! everything else. Matching is by substring on the lowercased message.

use serde::{Deserialize, Serialize};

use crate::models::AgentContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    #[serde(rename = "bca_crisis")]
    Crisis,
    #[serde(rename = "bca_exam_prep")]
    ExamPrep,
    #[serde(rename = "bca_assignment")]
    Assignment,
    #[serde(rename = "bca_lab")]
    Lab,
    #[serde(rename = "generic_study")]
    GenericStudy,
    #[serde(rename = "work")]
    Work,
    #[serde(rename = "life")]
    Life,
    #[serde(rename = "meta_productivity")]
    MetaProductivity,
}

impl Intent {
    /// Agent context that should pick the message up.
    pub fn context(self) -> AgentContext {
        match self {
            Self::Crisis => AgentContext::Coordinator,
            Self::ExamPrep | Self::Assignment | Self::Lab | Self::GenericStudy => AgentContext::Study,
            Self::Work => AgentContext::Work,
            Self::Life => AgentContext::Life,
            Self::MetaProductivity => AgentContext::Scheduling,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f64,
    pub context: AgentContext,
}

struct Rule {
    intent: Intent,
    confidence: f64,
    keywords: &'static [&'static str],
}

const RULES: &[Rule] = &[
    Rule {
        intent: Intent::Crisis,
        confidence: 0.8,
        keywords: &["panic", "stressed", "overwhelmed", "crisis", "behind"],
    },
    Rule { intent: Intent::ExamPrep, confidence: 0.75, keywords: &["exam", "test"] },
    Rule {
        intent: Intent::Assignment,
        confidence: 0.7,
        keywords: &["assignment", "homework", "sheet", "submission"],
    },
    Rule { intent: Intent::Lab, confidence: 0.7, keywords: &["lab", "practical"] },
    Rule { intent: Intent::GenericStudy, confidence: 0.65, keywords: &["project"] },
    Rule { intent: Intent::Work, confidence: 0.6, keywords: &["job", "shift", "office"] },
    Rule {
        intent: Intent::Life,
        confidence: 0.6,
        keywords: &["family", "chores", "cooking", "cleaning"],
    },
    Rule {
        intent: Intent::MetaProductivity,
        confidence: 0.6,
        keywords: &["schedule", "plan my day", "productivity", "focus"],
    },
];

const FALLBACK: (Intent, f64) = (Intent::GenericStudy, 0.5);

pub fn classify(message: &str) -> Classification {
    let text = message.to_lowercase();
    let (intent, confidence) = RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| text.contains(k)))
        .map_or(FALLBACK, |rule| (rule.intent, rule.confidence));
    Classification { intent, confidence, context: intent.context() }
}
