//! Catch-up plans for a student who has fallen behind.
//!
//! A plan is deliberately small: a handful of low-effort micro-tasks in one
//! focus block, sized so it survives interruptions at home.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{micro_task, minutes_of, signals};
use crate::toon::schemas::{CrisisEpisode, ScheduleBlock, Severity, Task};

/// Upper bound on micro-tasks in one plan.
pub const MAX_TASKS: usize = 5;

/// Block length used when no usable time budget was given.
const FALLBACK_BLOCK_MIN: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchupRequest {
    #[serde(default)]
    pub days_missed: u32,
    #[serde(default)]
    pub labs_missed: u32,
    #[serde(default)]
    pub assignments_pending: u32,
    #[serde(default)]
    pub upcoming_exam_in_days: Option<u32>,
    #[serde(default)]
    pub stress_level: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_available_hours")]
    pub available_hours: f64,
}

fn default_available_hours() -> f64 { 2.0 }

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatchupPlan {
    pub episode: CrisisEpisode,
    pub block: ScheduleBlock,
    pub summary: String,
}

/// Six or more days missed, or an exam within two days, is severe.
pub fn assess_severity(req: &CatchupRequest) -> Severity {
    if req.days_missed >= 6 || req.upcoming_exam_in_days.is_some_and(|d| d <= 2) {
        Severity::Severe
    } else if req.days_missed >= 3 || req.assignments_pending >= 2 || req.labs_missed >= 1 {
        Severity::Moderate
    } else {
        Severity::Mild
    }
}

/// Build the plan. Task ids are `{id_prefix}-{step}`.
pub fn plan_catchup(req: &CatchupRequest, id_prefix: &str) -> CatchupPlan {
    let severity = assess_severity(req);
    let location = req.location.as_deref();

    let episode = CrisisEpisode {
        severity,
        days_missed: req.days_missed,
        labs_missed: req.labs_missed,
        assignments_pending: req.assignments_pending,
        upcoming_exam_in_days: req.upcoming_exam_in_days,
        stress_level: req.stress_level.clone(),
        notes: Some(format!(
            "location={}, available_hours={}",
            location.unwrap_or("unknown"),
            req.available_hours
        )),
    };

    let task = |step: &str, title: &str, kind: &str, minutes: u32, energy: &str| {
        micro_task(format!("{id_prefix}-{step}"), title, kind, minutes, location, energy)
    };

    // Lowest-resistance step first.
    let mut tasks = vec![task(
        "notes",
        "Message 1-2 classmates and ask for notes of missed classes",
        "notes",
        10,
        "low",
    )];
    if req.assignments_pending > 0 {
        tasks.push(task(
            "assignments-overview",
            "List all pending assignments with deadlines in one place",
            "assignment",
            20,
            "medium",
        ));
    }
    if req.labs_missed > 0 {
        tasks.push(task(
            "lab-plan",
            "Ask lab partner or class group what was covered in missed labs",
            "lab",
            15,
            "low",
        ));
    }
    if req.upcoming_exam_in_days.is_some_and(|d| d <= 7) {
        tasks.push(task(
            "exam-outline",
            "Write a 5-10 bullet outline of topics for the nearest exam",
            "exam_prep",
            25,
            "medium",
        ));
    }
    tasks.truncate(MAX_TASKS);

    let block_min = block_minutes(req.available_hours);
    let summary = summary(req, severity, block_min, &tasks);

    let block = ScheduleBlock {
        label: "crisis_catchup_block_1".to_string(),
        tasks,
        start_window: None,
        duration_min: Some(block_min),
        location: Some(location.unwrap_or("home").to_string()),
        confidence: None,
        explanation: Some(
            "Focus on tiny wins: get notes, list assignments, and understand what you \
             missed before deep study."
                .to_string(),
        ),
    };

    info!(
        severity = ?severity,
        tasks = block.tasks.len(),
        block_min,
        "catch-up plan built"
    );
    CatchupPlan { episode, block, summary }
}

/// Over an hour leaves a 15 minute buffer and caps the block at 90.
fn block_minutes(available_hours: f64) -> u32 {
    match minutes_of(available_hours) {
        0 => FALLBACK_BLOCK_MIN,
        total if total > 60 => (total - 15).min(90),
        total => total,
    }
}

fn summary(req: &CatchupRequest, severity: Severity, block_min: u32, tasks: &[Task]) -> String {
    let exam = req
        .upcoming_exam_in_days
        .map_or_else(|| "none".to_string(), |d| d.to_string());
    let mut lines = vec![
        format!(
            "Crisis level: {} (days missed={}, labs missed={}, assignments pending={}, upcoming exam in days={exam})",
            severity_label(severity),
            req.days_missed,
            req.labs_missed,
            req.assignments_pending,
        ),
        String::new(),
        format!(
            "Next ~{block_min} minutes at {}:",
            req.location.as_deref().unwrap_or("wherever you are right now")
        ),
    ];
    for (idx, t) in tasks.iter().enumerate() {
        let est = t
            .duration_estimate_min
            .map(|m| format!(" (~{m} min)"))
            .unwrap_or_default();
        lines.push(format!("{}. {}{est}", idx + 1, t.title));
    }
    lines.push(String::new());
    lines.push("Remember: small wins count. Even completing the first 1-2 tasks is progress.".to_string());
    lines.join("\n")
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Mild => "MILD",
        Severity::Moderate => "MODERATE",
        Severity::Severe => "SEVERE",
    }
}

/// Read catch-up parameters out of a chat message. Anything not mentioned
/// falls back to a "five days behind, one assignment" situation.
pub fn infer_catchup(message: &str) -> CatchupRequest {
    let text = message.to_lowercase();
    let stressed = signals::contains_any(&text, &["stressed", "overwhelmed", "panic", "anxious"]);

    CatchupRequest {
        days_missed: signals::days_behind(&text).unwrap_or(5),
        labs_missed: signals::labs_count(&text).unwrap_or(0),
        assignments_pending: signals::assignments_count(&text).unwrap_or(1),
        upcoming_exam_in_days: signals::exam_in_days(&text),
        stress_level: Some(if stressed { "high" } else { "medium" }.to_string()),
        location: None,
        available_hours: default_available_hours(),
    }
}
