//! Adversarial bull/bear debate for verdict
//!
//! A debate gathers one shared data set, lets a growth-biased and a
//! risk-biased agent draft their cases concurrently, runs a single
//! rebuttal round and hands everything to an impartial [`Synthesizer`]:
//!
//! ```text
//! DebateStarted -> data tools -> BullDrafting / BearDrafting
//!     -> BullComplete, BearComplete -> RebuttalRound -> SynthesisStarted
//!     -> DebateCompleted (Verdict)
//! ```
//!
//! Agents see the same data ordered by their [`EmphasisProfile`]. Claims are
//! graded against that data by an [`EvidenceIndex`]; the mapping from
//! argument strength to scenario probabilities is a configurable
//! [`ScenarioCurve`].

pub mod agent;
pub mod case;
pub mod config;
pub mod error;
pub mod evidence;
pub mod orchestrator;
pub mod policy;
mod prompts;
pub mod rebuttal;
pub mod role;
pub mod shared;
pub mod synthesis;

pub use agent::DebateAgent;
pub use case::{Case, Catalyst, Claim, Level, Risk, Timeframe};
pub use config::{DebateConfig, DebateConfigBuilder};
pub use error::{DebateError, Result};
pub use evidence::EvidenceIndex;
pub use orchestrator::{DebateOrchestrator, DebateOrchestratorBuilder, DebatePhase, DebateReport};
pub use policy::{GradingPolicy, Recommendation, RecommendationScale, ScenarioCurve};
pub use rebuttal::Rebuttal;
pub use role::{EmphasisProfile, Role};
pub use shared::{PriceStats, SharedData};
pub use synthesis::{ArgumentStrength, EvidenceGrade, ScenarioProbabilities, Synthesizer, Verdict};
