//! Catalog of built-in tools an agent may be given.
//!
//! The catalog is static; registering a tool copies its entry into the
//! store where it gets an id and an active flag.

use serde::Serialize;

use crate::models::{AgentContext, ToolCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: ToolCategory,
}

pub const BUILTIN_TOOLS: [CatalogEntry; 8] = [
    CatalogEntry {
        key: "duckduckgo",
        name: "DuckDuckGo Search",
        description: "Search the web for current information",
        category: ToolCategory::Web,
    },
    CatalogEntry {
        key: "wikipedia",
        name: "Wikipedia",
        description: "Look up encyclopedia articles",
        category: ToolCategory::Web,
    },
    CatalogEntry {
        key: "arxiv",
        name: "arXiv",
        description: "Search and summarise academic papers",
        category: ToolCategory::Web,
    },
    CatalogEntry {
        key: "calculator",
        name: "Calculator",
        description: "Evaluate arithmetic expressions",
        category: ToolCategory::Utility,
    },
    CatalogEntry {
        key: "datetime_tools",
        name: "Date & Time",
        description: "Current date, time zones and date arithmetic",
        category: ToolCategory::Utility,
    },
    CatalogEntry {
        key: "file_tools",
        name: "File Tools",
        description: "Read, write and list files in the workspace",
        category: ToolCategory::File,
    },
    CatalogEntry {
        key: "python_tools",
        name: "Python",
        description: "Run Python snippets",
        category: ToolCategory::Code,
    },
    CatalogEntry {
        key: "shell_tools",
        name: "Shell",
        description: "Run shell commands",
        category: ToolCategory::System,
    },
];

pub fn lookup(key: &str) -> Option<&'static CatalogEntry> {
    BUILTIN_TOOLS.iter().find(|t| t.key == key)
}

/// Tool keys considered safe for an agent working in `context`.
///
/// Code and system tools are never recommended.
pub fn recommended_for(context: AgentContext) -> &'static [&'static str] {
    match context {
        AgentContext::Study => &["duckduckgo", "wikipedia", "arxiv", "calculator", "datetime_tools"],
        AgentContext::Work => &["duckduckgo", "calculator", "datetime_tools", "file_tools"],
        AgentContext::Life => &["duckduckgo", "datetime_tools"],
        AgentContext::Scheduling => &["datetime_tools", "calculator"],
        AgentContext::Coordinator => &["duckduckgo", "datetime_tools"],
    }
}

/// Catalog entries recommended for `context`, in recommendation order.
pub fn recommended_entries(context: AgentContext) -> Vec<&'static CatalogEntry> {
    recommended_for(context).iter().filter_map(|k| lookup(k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = BUILTIN_TOOLS.iter().map(|t| t.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), BUILTIN_TOOLS.len());
    }

    #[test]
    fn every_recommendation_exists_in_catalog() {
        for ctx in AgentContext::ALL {
            for key in recommended_for(ctx) {
                assert!(lookup(key).is_some(), "{key} recommended for {ctx} but not in catalog");
            }
        }
    }

    #[test]
    fn unsafe_categories_never_recommended() {
        for ctx in AgentContext::ALL {
            for entry in recommended_entries(ctx) {
                assert!(
                    !matches!(entry.category, ToolCategory::Code | ToolCategory::System),
                    "{} should not be recommended for {ctx}",
                    entry.key
                );
            }
        }
    }

    #[test]
    fn every_category_has_a_tool() {
        for cat in ToolCategory::ALL {
            assert!(BUILTIN_TOOLS.iter().any(|t| t.category == cat), "no tool in {cat}");
        }
    }

    #[test]
    fn lookup_unknown_is_none() {
        assert!(lookup("telnet").is_none());
        assert_eq!(lookup("calculator").map(|t| t.category), Some(ToolCategory::Utility));
    }
}
