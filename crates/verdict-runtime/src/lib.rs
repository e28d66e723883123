//! Reasoning-action loop for verdict
//!
//! The [`AnalysisEngine`] alternates between a think phase, which decides
//! whether the run has enough information or which tool category to try
//! next, and an act phase, which invokes exactly one tool and folds its
//! output into a fresh [`AgentState`] snapshot. Tool categories are invoked
//! at most once per run.

pub mod config;
pub mod engine;
pub mod error;
pub mod planner;
pub mod state;

pub use config::{LoopConfig, LoopConfigBuilder};
pub use engine::{AnalysisEngine, AnalysisEngineBuilder};
pub use error::{LoopError, Result};
pub use planner::{ModelPlanner, Planner, SequentialPlanner};
pub use state::AgentState;
