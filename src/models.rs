//! Domain records shared by the store and the HTTP layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
pub use crate::toon::schemas::TaskStatus;

// ── Enumerations ──────────────────────────────────────────────────────────────

/// Life domain an agent operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentContext {
    Study,
    Work,
    Life,
    Scheduling,
    Coordinator,
}

impl AgentContext {
    pub const ALL: [AgentContext; 5] = [
        Self::Study,
        Self::Work,
        Self::Life,
        Self::Scheduling,
        Self::Coordinator,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Study => "study",
            Self::Work => "work",
            Self::Life => "life",
            Self::Scheduling => "scheduling",
            Self::Coordinator => "coordinator",
        }
    }
}

/// Instruction-tuning strategy an optimizer record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizerType {
    #[serde(rename = "GEPA")]
    Gepa,
    #[serde(rename = "MIPROv2")]
    MiproV2,
    BootstrapFewShot,
    BootstrapFewShotWithRandomSearch,
    #[serde(rename = "COPRO")]
    Copro,
}

impl OptimizerType {
    pub const ALL: [OptimizerType; 5] = [
        Self::Gepa,
        Self::MiproV2,
        Self::BootstrapFewShot,
        Self::BootstrapFewShotWithRandomSearch,
        Self::Copro,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gepa => "GEPA",
            Self::MiproV2 => "MIPROv2",
            Self::BootstrapFewShot => "BootstrapFewShot",
            Self::BootstrapFewShotWithRandomSearch => "BootstrapFewShotWithRandomSearch",
            Self::Copro => "COPRO",
        }
    }
}

/// Grouping of built-in tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Web,
    Utility,
    File,
    Code,
    System,
}

impl ToolCategory {
    pub const ALL: [ToolCategory; 5] = [
        Self::Web,
        Self::Utility,
        Self::File,
        Self::Code,
        Self::System,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Utility => "utility",
            Self::File => "file",
            Self::Code => "code",
            Self::System => "system",
        }
    }
}

/// Priority of a stored task or of an item being ranked by deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// 1 for `low` up to 4 for `urgent`.
    pub fn weight(self) -> i64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }
}

/// Case-insensitive lookup over an enum's `ALL` table.
macro_rules! impl_str_enum {
    ($ty:ty, $what:literal) => {
        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(needle))
                    .ok_or_else(|| {
                        let known: Vec<&str> = <$ty>::ALL.iter().map(|v| v.as_str()).collect();
                        AppError::Validation(format!(
                            "unknown {} '{}'; expected one of: {}",
                            $what,
                            needle,
                            known.join(", ")
                        ))
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_str_enum!(AgentContext, "agent context");
impl_str_enum!(OptimizerType, "optimizer_type");
impl_str_enum!(ToolCategory, "tool category");
impl_str_enum!(Priority, "priority");
impl_str_enum!(TaskStatus, "task status");

// ── Records ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub context: AgentContext,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Optimizer {
    pub id: i64,
    pub agent_id: i64,
    pub agent_name: String,
    pub optimizer_type: OptimizerType,
    pub name: String,
    pub is_active: bool,
    pub config: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToonConfig {
    pub id: i64,
    pub agent_id: i64,
    pub agent_name: String,
    pub enabled: bool,
    pub config: serde_json::Value,
    pub config_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    pub id: i64,
    pub tool_key: String,
    pub name: String,
    pub description: String,
    pub category: ToolCategory,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A to-do item in the task store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: String,
    pub deadline: Option<String>,
    pub status: TaskStatus,
    pub created_at: String,
    pub completed_at: Option<String>,
}

/// A calendar entry. Times are local, `YYYY-MM-DDTHH:MM:SS`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub created_at: String,
}

/// Toon state as shown on the dashboard card.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToonStatus {
    pub enabled: bool,
    pub config_id: Option<String>,
}

/// One dashboard row: an agent plus everything attached to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub context: AgentContext,
    pub optimizers: Vec<Optimizer>,
    pub toon: ToonStatus,
    pub tools_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimizer_type_parses_case_insensitively() {
        assert_eq!("gepa".parse::<OptimizerType>().unwrap(), OptimizerType::Gepa);
        assert_eq!("MIPROV2".parse::<OptimizerType>().unwrap(), OptimizerType::MiproV2);
        assert_eq!(
            " BootstrapFewShot ".parse::<OptimizerType>().unwrap(),
            OptimizerType::BootstrapFewShot
        );
    }

    #[test]
    fn unknown_optimizer_type_is_validation_error() {
        let err = "SGD".parse::<OptimizerType>().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("GEPA"));
    }

    #[test]
    fn wire_names_match_display() {
        for t in OptimizerType::ALL {
            let json = serde_json::to_value(t).unwrap();
            assert_eq!(json, serde_json::Value::String(t.to_string()));
        }
        for c in AgentContext::ALL {
            let json = serde_json::to_value(c).unwrap();
            assert_eq!(json, serde_json::Value::String(c.to_string()));
        }
        for c in ToolCategory::ALL {
            let json = serde_json::to_value(c).unwrap();
            assert_eq!(json, serde_json::Value::String(c.to_string()));
        }
    }

    #[test]
    fn context_rejects_unknown() {
        assert!("balanced".parse::<AgentContext>().is_err());
        assert_eq!("Study".parse::<AgentContext>().unwrap(), AgentContext::Study);
    }

    #[test]
    fn priority_and_status_parse() {
        assert_eq!("URGENT".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!(Priority::default(), Priority::Medium);
        assert!(Priority::Low.weight() < Priority::Urgent.weight());
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("done".parse::<TaskStatus>().is_err());
        for p in Priority::ALL {
            assert_eq!(serde_json::to_value(p).unwrap(), serde_json::Value::String(p.to_string()));
        }
    }

    #[test]
    fn category_parses() {
        assert_eq!("WEB".parse::<ToolCategory>().unwrap(), ToolCategory::Web);
        assert!("network".parse::<ToolCategory>().is_err());
    }
}
