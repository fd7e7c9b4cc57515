//! Typed message shapes carried in Toon form between agents and the model.
//!
//! A [`MessageType`] names one of the shapes; [`MessageType::canonicalize`]
//! checks a JSON payload against it and fills in defaults, so the encoded
//! text is the same however sparse the caller's input was.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use super::ToonError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// assignment, lab, project, exam_prep, practice, ...
    #[serde(default = "default_task_kind")]
    pub kind: String,
    /// ISO date or datetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_estimate_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    #[serde(default = "default_task_status")]
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

fn default_task_kind() -> String { "general".to_string() }
fn default_task_status() -> TaskStatus { TaskStatus::Pending }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScheduleBlock {
    pub label: String,
    pub tasks: Vec<Task>,
    /// ISO datetime or a human range such as "evening".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StudentProfile {
    #[serde(default = "default_persona")]
    pub persona: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semester: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_wake_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_sleep_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_duty_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_preferences: Option<Map<String, Value>>,
}

fn default_persona() -> String { "bca_student".to_string() }
fn default_branch() -> String { "BCA".to_string() }

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CrisisEpisode {
    pub severity: Severity,
    pub days_missed: u32,
    pub labs_missed: u32,
    pub assignments_pending: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upcoming_exam_in_days: Option<u32>,
    /// low / medium / high / overwhelmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payload shape named by encode/decode requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Task,
    Schedule,
    Profile,
    Crisis,
    #[default]
    Generic,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Schedule => "schedule",
            Self::Profile => "profile",
            Self::Crisis => "crisis",
            Self::Generic => "generic",
        }
    }

    /// Validate `value` against this shape and return it with defaults
    /// applied. `Generic` passes any value through untouched.
    pub fn canonicalize(self, value: Value) -> Result<Value, ToonError> {
        match self {
            Self::Task => roundtrip::<Task>(self, value),
            Self::Schedule => roundtrip::<ScheduleBlock>(self, value),
            Self::Profile => roundtrip::<StudentProfile>(self, value),
            Self::Crisis => roundtrip::<CrisisEpisode>(self, value),
            Self::Generic => Ok(value),
        }
    }
}

fn roundtrip<T: DeserializeOwned + Serialize>(kind: MessageType, value: Value) -> Result<Value, ToonError> {
    let schema_err = |e: serde_json::Error| ToonError::Schema { kind: kind.as_str(), message: e.to_string() };
    let typed: T = serde_json::from_value(value).map_err(schema_err)?;
    serde_json::to_value(typed).map_err(schema_err)
}

impl FromStr for MessageType {
    type Err = ToonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task" => Ok(Self::Task),
            "schedule" => Ok(Self::Schedule),
            "profile" => Ok(Self::Profile),
            "crisis" => Ok(Self::Crisis),
            "generic" | "" => Ok(Self::Generic),
            _ => Err(ToonError::UnknownMessageType(s.to_string())),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_defaults_are_filled() {
        let v = MessageType::Task
            .canonicalize(json!({ "id": "task_001", "title": "Calculus assignment" }))
            .unwrap();
        assert_eq!(v["kind"], "general");
        assert_eq!(v["status"], "pending");
        assert!(v.get("subject").is_none());
    }

    #[test]
    fn task_missing_title_is_schema_error() {
        let err = MessageType::Task.canonicalize(json!({ "id": "t" })).unwrap_err();
        assert!(matches!(err, ToonError::Schema { kind: "task", .. }));
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = MessageType::Profile
            .canonicalize(json!({ "persona": "x", "favourite_colour": "blue" }))
            .unwrap_err();
        assert!(err.to_string().contains("favourite_colour"));
    }

    #[test]
    fn schedule_nests_tasks() {
        let v = MessageType::Schedule
            .canonicalize(json!({
                "label": "Morning Study Session",
                "tasks": [{ "id": "t1", "title": "Read", "status": "in_progress" }],
                "confidence": 0.85,
            }))
            .unwrap();
        assert_eq!(v["tasks"][0]["status"], "in_progress");
        assert_eq!(v["tasks"][0]["kind"], "general");
    }

    #[test]
    fn crisis_severity_is_checked() {
        let ok = json!({ "severity": "moderate", "days_missed": 3, "labs_missed": 1, "assignments_pending": 2 });
        assert!(MessageType::Crisis.canonicalize(ok).is_ok());
        let bad = json!({ "severity": "apocalyptic", "days_missed": 3, "labs_missed": 1, "assignments_pending": 2 });
        assert!(MessageType::Crisis.canonicalize(bad).is_err());
    }

    #[test]
    fn generic_passes_anything() {
        let v = json!([1, "two", { "three": 3 }]);
        assert_eq!(MessageType::Generic.canonicalize(v.clone()).unwrap(), v);
    }

    #[test]
    fn message_type_parsing() {
        assert_eq!("Task".parse::<MessageType>().unwrap(), MessageType::Task);
        assert_eq!("".parse::<MessageType>().unwrap(), MessageType::Generic);
        assert!(matches!("invoice".parse::<MessageType>(), Err(ToonError::UnknownMessageType(_))));
    }
}
