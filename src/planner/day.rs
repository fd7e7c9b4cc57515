//! Ordinary-day plans: up to three blocks (morning, afternoon, evening)
//! filled from the day's workload signals.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{micro_task, minutes_of, signals};
use crate::toon::schemas::{ScheduleBlock, Task};

/// Shortest day worth planning.
const MIN_DAY_MIN: u32 = 90;
/// Longest day: anything above is clamped.
const MAX_DAY_MIN: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayLocation {
    Home,
    College,
}

impl DayLocation {
    /// `college` or `home`; anything else plans like a day at home.
    pub fn from_loose(text: &str) -> Self {
        if text.trim().eq_ignore_ascii_case("college") {
            Self::College
        } else {
            Self::Home
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::College => "college",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRequest {
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_available_hours")]
    pub available_hours: f64,
    #[serde(default)]
    pub assignments_pending: u32,
    #[serde(default)]
    pub labs_today: u32,
    #[serde(default)]
    pub projects_active: bool,
    #[serde(default)]
    pub upcoming_exam_in_days: Option<u32>,
}

fn default_location() -> String { "home".to_string() }
fn default_available_hours() -> f64 { 6.0 }

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    pub location: DayLocation,
    pub total_min: u32,
    pub blocks: Vec<ScheduleBlock>,
    pub summary: String,
}

/// Hands out `day-{kind}-{n}` ids, numbered across the whole day.
struct Drafts {
    location: DayLocation,
    count: usize,
}

impl Drafts {
    fn task(&mut self, title: &str, kind: &str, minutes: u32, energy: &str) -> Task {
        self.count += 1;
        let id = format!("day-{kind}-{}", self.count);
        micro_task(id, title, kind, minutes, Some(self.location.as_str()), energy)
    }
}

pub fn plan_day(req: &DayRequest) -> DayPlan {
    let location = DayLocation::from_loose(&req.location);
    let total_min = minutes_of(req.available_hours).clamp(MIN_DAY_MIN, MAX_DAY_MIN);
    let num_blocks: u32 = if total_min >= 240 {
        3
    } else if total_min >= 150 {
        2
    } else {
        1
    };
    let block_min = total_min / num_blocks;
    let exam_within = |days: u32| req.upcoming_exam_in_days.is_some_and(|d| d <= days);
    let mut drafts = Drafts { location, count: 0 };

    // Heaviest cognitive work first.
    let mut morning = Vec::new();
    match location {
        DayLocation::College => {
            morning.push(drafts.task(
                "Attend or review today's core classes and take concise notes",
                "notes",
                block_min / 2,
                "high",
            ));
            if req.labs_today > 0 {
                morning.push(drafts.task(
                    "Prepare questions or code snippets for today's lab sessions",
                    "lab_prep",
                    block_min / 3,
                    "medium",
                ));
            }
        }
        DayLocation::Home => {
            if req.assignments_pending > 0 {
                morning.push(drafts.task(
                    "Work on the most urgent assignment (core theory or coding)",
                    "assignment",
                    block_min / 2,
                    "high",
                ));
            }
            if exam_within(10) {
                morning.push(drafts.task(
                    "Deep study: revise key topics for the nearest exam",
                    "exam_prep",
                    block_min / 3,
                    "high",
                ));
            }
        }
    }
    if morning.is_empty() {
        morning.push(drafts.task(
            "Focused study on the hardest subject right now",
            "study",
            block_min / 2,
            "high",
        ));
    }

    let mut blocks = vec![block(
        if num_blocks > 1 { "morning_block" } else { "main_block" },
        morning,
        block_min,
        location,
        "Start the day with your highest-impact work: classes and labs at college, \
         urgent assignments or exam prep at home.",
    )];

    if num_blocks >= 2 {
        let mut afternoon = Vec::new();
        if req.assignments_pending > 1 {
            afternoon.push(drafts.task(
                "Continue or start the second most urgent assignment",
                "assignment",
                block_min / 2,
                "medium",
            ));
        }
        if req.projects_active {
            afternoon.push(drafts.task(
                "Project progress: implement or debug one small feature",
                "project",
                block_min / 3,
                "medium",
            ));
        }
        if afternoon.is_empty() {
            afternoon.push(drafts.task(
                "Organize notes and consolidate what you studied earlier",
                "notes",
                block_min / 2,
                "medium",
            ));
        }
        blocks.push(block(
            "afternoon_block",
            afternoon,
            block_min,
            location,
            "Use the afternoon for steady progress on assignments and projects, \
             or for consolidating class material.",
        ));
    }

    if num_blocks >= 3 {
        let mut evening = vec![drafts.task(
            "Coding practice: 1-3 small problems (DSA or the language of the semester)",
            "practice",
            block_min / 2,
            "medium",
        )];
        if exam_within(7) {
            evening.push(drafts.task(
                "Light revision: flashcards or a quick recap of today's topics",
                "revision",
                block_min / 3,
                "low",
            ));
        }
        blocks.push(block(
            "evening_block",
            evening,
            block_min,
            location,
            "In the evening, do lighter coding practice and gentle revision so you \
             can wind down without wasting the time.",
        ));
    }

    let summary = summary(location, total_min, &blocks);
    info!(location = location.as_str(), total_min, blocks = blocks.len(), "day plan built");
    DayPlan { location, total_min, blocks, summary }
}

fn block(label: &str, tasks: Vec<Task>, minutes: u32, location: DayLocation, explanation: &str) -> ScheduleBlock {
    ScheduleBlock {
        label: label.to_string(),
        tasks,
        start_window: None,
        duration_min: Some(minutes),
        location: Some(location.as_str().to_string()),
        confidence: None,
        explanation: Some(explanation.to_string()),
    }
}

fn summary(location: DayLocation, total_min: u32, blocks: &[ScheduleBlock]) -> String {
    let place = match location {
        DayLocation::College => "college",
        DayLocation::Home => "home / your own space",
    };
    let mut lines = vec![
        format!(
            "Planned day at {place} (~{total_min} minutes total, {} block(s)).",
            blocks.len()
        ),
        String::new(),
    ];
    for b in blocks {
        let minutes = b.duration_min.unwrap_or_default();
        lines.push(format!("Block: {} (~{minutes} min)", title_case(&b.label)));
        for (i, t) in b.tasks.iter().enumerate() {
            let est = t
                .duration_estimate_min
                .map(|m| format!(" (~{m} min)"))
                .unwrap_or_default();
            lines.push(format!("  {}. {}{est}", i + 1, t.title));
        }
        lines.push(String::new());
    }
    lines.push(
        "Tip: it's okay if reality shifts. Treat these blocks as anchors, not a rigid timetable."
            .to_string(),
    );
    lines.join("\n")
}

/// `morning_block` → `Morning Block`.
fn title_case(label: &str) -> String {
    label
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read day-plan parameters out of a chat message.
pub fn infer_day(message: &str, fallback_location: Option<&str>) -> DayRequest {
    let text = message.to_lowercase();

    let location = if signals::contains_any(&text, &["college", "campus", "class"]) {
        "college".to_string()
    } else if signals::contains_any(&text, &["home", "house"]) {
        "home".to_string()
    } else {
        fallback_location.map_or_else(default_location, str::to_string)
    };

    let mentions_assignment = signals::contains_any(&text, &["assignment", "homework"]);
    let assignments_pending = signals::assignments_count(&text)
        .unwrap_or(u32::from(mentions_assignment));

    DayRequest {
        location,
        available_hours: signals::hours_available(&text).unwrap_or_else(default_available_hours),
        assignments_pending,
        labs_today: u32::from(signals::contains_any(&text, &["lab", "practical"])),
        projects_active: text.contains("project"),
        upcoming_exam_in_days: signals::exam_in_days(&text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(location: &str, hours: f64) -> DayRequest {
        DayRequest {
            location: location.into(),
            available_hours: hours,
            assignments_pending: 0,
            labs_today: 0,
            projects_active: false,
            upcoming_exam_in_days: None,
        }
    }

    fn labels(plan: &DayPlan) -> Vec<&str> {
        plan.blocks.iter().map(|b| b.label.as_str()).collect()
    }

    #[test]
    fn block_count_follows_available_time() {
        assert_eq!(labels(&plan_day(&request("home", 1.0))), ["main_block"]);
        assert_eq!(plan_day(&request("home", 1.0)).total_min, MIN_DAY_MIN);
        assert_eq!(
            labels(&plan_day(&request("home", 3.0))),
            ["morning_block", "afternoon_block"]
        );
        assert_eq!(
            labels(&plan_day(&request("home", 6.0))),
            ["morning_block", "afternoon_block", "evening_block"]
        );
        assert_eq!(plan_day(&request("home", 100.0)).total_min, MAX_DAY_MIN);
    }

    #[test]
    fn block_minutes_split_evenly() {
        let plan = plan_day(&request("home", 6.0));
        assert!(plan.blocks.iter().all(|b| b.duration_min == Some(120)));
    }

    #[test]
    fn college_morning_with_lab() {
        let mut req = request("College", 6.0);
        req.labs_today = 1;
        let plan = plan_day(&req);
        assert_eq!(plan.location, DayLocation::College);
        let kinds: Vec<&str> = plan.blocks[0].tasks.iter().map(|t| t.kind.as_str()).collect();
        assert_eq!(kinds, ["notes", "lab_prep"]);
        assert_eq!(plan.blocks[0].tasks[0].duration_estimate_min, Some(60));
    }

    #[test]
    fn home_morning_falls_back_to_focused_study() {
        let plan = plan_day(&request("library", 6.0));
        assert_eq!(plan.location, DayLocation::Home);
        assert_eq!(plan.blocks[0].tasks[0].kind, "study");
        assert_eq!(plan.blocks[1].tasks[0].kind, "notes");
    }

    #[test]
    fn busy_home_day() {
        let req = DayRequest {
            assignments_pending: 2,
            projects_active: true,
            upcoming_exam_in_days: Some(5),
            ..request("home", 6.0)
        };
        let plan = plan_day(&req);
        let kinds: Vec<Vec<&str>> = plan
            .blocks
            .iter()
            .map(|b| b.tasks.iter().map(|t| t.kind.as_str()).collect())
            .collect();
        assert_eq!(
            kinds,
            vec![
                vec!["assignment", "exam_prep"],
                vec!["assignment", "project"],
                vec!["practice", "revision"],
            ]
        );
        let ids: Vec<&str> = plan.blocks.iter().flat_map(|b| &b.tasks).map(|t| t.id.as_str()).collect();
        assert_eq!(ids[0], "day-assignment-1");
        assert_eq!(ids[5], "day-revision-6");
    }

    #[test]
    fn summary_lists_blocks() {
        let plan = plan_day(&request("home", 3.0));
        assert!(plan.summary.starts_with("Planned day at home / your own space (~180 minutes total, 2 block(s))."));
        assert!(plan.summary.contains("Block: Morning Block (~90 min)"));
        assert!(plan.summary.contains("Block: Afternoon Block (~90 min)"));
    }

    #[test]
    fn blocks_are_valid_schedule_payloads() {
        for block in plan_day(&request("college", 8.0)).blocks {
            let value = serde_json::to_value(&block).unwrap();
            crate::toon::MessageType::Schedule.canonicalize(value).unwrap();
        }
    }

    #[test]
    fn infers_from_message() {
        let req = infer_day("At college today, 4 hours free, 2 assignments, lab at 3, exam in 9 days", None);
        assert_eq!(req.location, "college");
        assert_eq!(req.available_hours, 4.0);
        assert_eq!(req.assignments_pending, 2);
        assert_eq!(req.labs_today, 1);
        assert!(!req.projects_active);
        assert_eq!(req.upcoming_exam_in_days, Some(9));
    }

    #[test]
    fn inference_defaults() {
        let req = infer_day("need to finish my homework and the mini project", Some("home"));
        assert_eq!(req.location, "home");
        assert_eq!(req.available_hours, 6.0);
        assert_eq!(req.assignments_pending, 1);
        assert!(req.projects_active);

        assert_eq!(infer_day("plan please", Some("college")).location, "college");
        assert_eq!(infer_day("plan please", None).location, "home");
    }
}
