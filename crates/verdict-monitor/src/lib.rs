//! Kill-criteria monitoring
//!
//! A thesis records the conditions under which its owner wants to
//! reconsider a position. [`KillCriteriaMonitor::check`] compares those
//! conditions against the [`AnalysisDigest`](verdict_core::AnalysisDigest)
//! of a new analysis and raises a [`KillAlert`] for each one that appears
//! to be met. The monitor never mutates theses; alerts change status only
//! through [`KillAlert::transition`]. [`KillCriteriaMonitor::sweep`] runs
//! the check for every monitored thesis, one analysis per ticker.

pub mod alert;
pub mod error;
pub mod lexicon;
pub mod monitor;
pub mod signal;
pub mod sweep;
pub mod thesis;

pub use alert::{AlertStatus, KillAlert};
pub use error::{MonitorError, Result};
pub use lexicon::ConceptLexicon;
pub use monitor::{CriterionMatch, KillCriteriaMonitor, MonitorPolicy};
pub use signal::{Signal, SignalSource, extract_signals};
pub use sweep::{DigestSource, SweepReport};
pub use thesis::{InMemoryThesisStore, Thesis, ThesisStatus, ThesisStore};

#[cfg(test)]
pub use sweep::MockDigestSource;
#[cfg(test)]
pub use thesis::MockThesisStore;
