//! Effectiva: backend for the student-productivity agent dashboard.
//!
//! Agents are seeded from a fixed roster; optimizers, Toon configs and
//! tool registrations hang off them in SQLite next to the student's task
//! list and calendar. [`planner`] holds the rule-based study planners. The
//! HTTP layer in [`server`] is a thin shell over [`db`], [`toon`],
//! [`context`] and [`planner`].

pub mod agents;
pub mod catalog;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod logger;
pub mod models;
pub mod planner;
pub mod server;
pub mod toon;
