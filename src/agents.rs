//! The built-in agent roster.
//!
//! Agents are seeded into the store on open and are read-only afterwards.
//! Their identifiers are database row ids, stable across restarts because
//! seeding never replaces an existing row.

use crate::models::AgentContext;

/// Static description of a seeded agent.
#[derive(Debug, Clone, Copy)]
pub struct AgentSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub context: AgentContext,
}

pub const ROSTER: [AgentSpec; 5] = [
    AgentSpec {
        name: "Study Agent",
        description: "Academic assistant for students: assignments, exam prep and study plans",
        context: AgentContext::Study,
    },
    AgentSpec {
        name: "Work Agent",
        description: "Job schedules, career tasks and work commitments",
        context: AgentContext::Work,
    },
    AgentSpec {
        name: "Life Agent",
        description: "Personal tasks, wellness, habits and chores",
        context: AgentContext::Life,
    },
    AgentSpec {
        name: "Scheduling Agent",
        description: "Time management across all domains and conflict detection",
        context: AgentContext::Scheduling,
    },
    AgentSpec {
        name: "Coordinator",
        description: "Routes requests to the specialist agents and merges their answers",
        context: AgentContext::Coordinator,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn roster_covers_every_context_once() {
        let contexts: HashSet<_> = ROSTER.iter().map(|a| a.context).collect();
        assert_eq!(contexts.len(), AgentContext::ALL.len());
    }

    #[test]
    fn roster_names_are_unique_and_non_empty() {
        let names: HashSet<_> = ROSTER.iter().map(|a| a.name).collect();
        assert_eq!(names.len(), ROSTER.len());
        assert!(ROSTER.iter().all(|a| !a.name.trim().is_empty()));
    }
}
