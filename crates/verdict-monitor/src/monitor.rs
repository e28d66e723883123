//! Kill-criteria matching
//!
//! Each criterion is reduced to a set of concepts through the
//! [`ConceptLexicon`] and compared against every signal of the new
//! analysis. Confidence is the share of the criterion's concepts a signal
//! mentions, raised to `coverage_exponent` so partial matches fall off
//! quickly. The best signal per criterion wins, ties going to the earlier
//! signal. Matching is deterministic: the same thesis and analysis always
//! give the same alerts.

use crate::{
    AlertStatus, ConceptLexicon, KillAlert, MonitorError, Result, Signal, Thesis, ThesisStore,
    extract_signals,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};
use verdict_core::AnalysisDigest;

/// Thresholds for raising an alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorPolicy {
    /// Minimum match confidence for an alert
    pub threshold: f64,
    pub coverage_exponent: f64,
}

impl Default for MonitorPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            coverage_exponent: 1.5,
        }
    }
}

impl MonitorPolicy {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MonitorError::Config(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if !(self.coverage_exponent.is_finite() && self.coverage_exponent > 0.0) {
            return Err(MonitorError::Config(format!(
                "coverage_exponent must be positive, got {}",
                self.coverage_exponent
            )));
        }
        Ok(())
    }
}

/// Best signal found for one criterion
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionMatch {
    pub criterion: String,
    pub signal: Signal,
    pub confidence: f64,
    pub shared: BTreeSet<String>,
    pub missing: BTreeSet<String>,
}

/// Stateless matcher of kill criteria against new analysis
#[derive(Debug, Clone, Default)]
pub struct KillCriteriaMonitor {
    policy: MonitorPolicy,
    lexicon: ConceptLexicon,
}

impl KillCriteriaMonitor {
    pub fn new(policy: MonitorPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            lexicon: ConceptLexicon::default(),
        })
    }

    pub fn with_lexicon(mut self, lexicon: ConceptLexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    pub fn policy(&self) -> &MonitorPolicy {
        &self.policy
    }

    /// Alerts for every criterion of `thesis` the analysis meets
    ///
    /// Criteria are checked independently, so one analysis may trigger
    /// several alerts for the same thesis.
    pub fn check(&self, thesis: &Thesis, digest: &AnalysisDigest) -> Vec<KillAlert> {
        let signals = extract_signals(digest);
        thesis
            .kill_criteria
            .iter()
            .filter_map(|criterion| self.best_match(criterion, &signals))
            .filter(|m| m.confidence >= self.policy.threshold)
            .map(|m| {
                debug!(
                    criterion = %m.criterion,
                    confidence = m.confidence,
                    source = m.signal.source.as_str(),
                    "Kill criterion matched"
                );
                KillAlert {
                    thesis_id: thesis.id,
                    ticker: thesis.ticker.clone(),
                    explanation: explain(&m),
                    criterion: m.criterion,
                    triggering_signal: m.signal.text,
                    match_confidence: m.confidence,
                    status: AlertStatus::Pending,
                }
            })
            .collect()
    }

    /// Best matching signal for a criterion, whatever its confidence
    pub fn best_match(&self, criterion: &str, signals: &[Signal]) -> Option<CriterionMatch> {
        let wanted = self.lexicon.concepts(criterion);
        if wanted.is_empty() {
            return None;
        }

        let mut best: Option<CriterionMatch> = None;
        for signal in signals {
            let present = self.lexicon.concepts(&signal.text);
            let shared: BTreeSet<String> = wanted.intersection(&present).cloned().collect();
            if shared.is_empty() {
                continue;
            }
            let coverage = shared.len() as f64 / wanted.len() as f64;
            let confidence = coverage.powf(self.policy.coverage_exponent).clamp(0.0, 1.0);
            if best.as_ref().is_none_or(|b| confidence > b.confidence) {
                best = Some(CriterionMatch {
                    criterion: criterion.to_string(),
                    signal: signal.clone(),
                    confidence,
                    missing: wanted.difference(&shared).cloned().collect(),
                    shared,
                });
            }
        }
        best
    }

    /// Check every monitored thesis recorded for the digest's ticker
    #[instrument(skip(self, store, digest), fields(ticker = %digest.ticker))]
    pub async fn check_theses(
        &self,
        store: &dyn ThesisStore,
        digest: &AnalysisDigest,
    ) -> Result<Vec<KillAlert>> {
        let theses = store.theses_for(&digest.ticker).await?;
        let monitored: Vec<&Thesis> = theses.iter().filter(|t| t.is_monitored()).collect();
        let alerts: Vec<KillAlert> = monitored
            .iter()
            .flat_map(|thesis| self.check(thesis, digest))
            .collect();
        info!(
            theses = monitored.len(),
            alerts = alerts.len(),
            "Kill criteria checked"
        );
        Ok(alerts)
    }
}

fn explain(m: &CriterionMatch) -> String {
    let shared: Vec<&str> = m.shared.iter().map(String::as_str).collect();
    let mut text = format!(
        "{} '{}' covers {} of criterion '{}' ({:.0}% confidence)",
        capitalize(m.signal.source.as_str()),
        m.signal.text,
        shared.join(", "),
        m.criterion,
        m.confidence * 100.0
    );
    if !m.missing.is_empty() {
        let missing: Vec<&str> = m.missing.iter().map(String::as_str).collect();
        text.push_str(&format!("; not mentioned: {}", missing.join(", ")));
    }
    text
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockThesisStore, SignalSource, ThesisStatus};
    use verdict_core::SentimentLabel;

    fn digest(summary: &str) -> AnalysisDigest {
        AnalysisDigest::new("AAPL", summary)
    }

    #[test]
    fn test_synonym_match_raises_alert() {
        let monitor = KillCriteriaMonitor::default();
        let thesis = Thesis::new("AAPL").with_criterion("CEO resigns");
        let alerts = monitor.check(&thesis, &digest("Quarter was mixed. CEO departure announced."));

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.criterion, "CEO resigns");
        assert_eq!(alert.triggering_signal, "CEO departure announced.");
        assert!(alert.match_confidence >= 0.5);
        assert_eq!(alert.status, AlertStatus::Pending);
        assert!(alert.explanation.starts_with("Summary 'CEO departure announced.'"));
    }

    #[test]
    fn test_partial_overlap_stays_below_threshold() {
        let monitor = KillCriteriaMonitor::default();
        let thesis = Thesis::new("AAPL").with_criterion("CEO resigns");
        let alerts = monitor.check(&thesis, &digest("The CEO unveils a new product line."));
        assert!(alerts.is_empty());

        let signals = extract_signals(&digest("The CEO unveils a new product line."));
        let best = monitor.best_match("CEO resigns", &signals).unwrap();
        assert!((best.confidence - 0.5_f64.powf(1.5)).abs() < 1e-9);
        assert!(best.missing.contains("departure"));
    }

    #[test]
    fn test_criteria_alert_independently() {
        let monitor = KillCriteriaMonitor::default();
        let thesis = Thesis::new("AAPL")
            .with_criterion("CEO resigns")
            .with_criterion("Sentiment turns bearish")
            .with_criterion("Dividend cut");
        let digest = digest("CEO steps down unexpectedly.").with_sentiment(SentimentLabel::Bearish);

        let alerts = monitor.check(&thesis, &digest);
        let criteria: Vec<_> = alerts.iter().map(|a| a.criterion.as_str()).collect();
        assert_eq!(criteria, vec!["CEO resigns", "Sentiment turns bearish"]);
    }

    #[test]
    fn test_best_signal_prefers_earlier_on_tie() {
        let monitor = KillCriteriaMonitor::default();
        let signals = vec![
            Signal::new("Revenue falls", SignalSource::Risk),
            Signal::new("Sales drop", SignalSource::Highlight),
        ];
        let best = monitor.best_match("Revenue decline", &signals).unwrap();
        assert_eq!(best.signal.text, "Revenue falls");
        assert_eq!(best.confidence, 1.0);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let strict = KillCriteriaMonitor::new(MonitorPolicy::default().with_threshold(0.3)).unwrap();
        let thesis = Thesis::new("AAPL").with_criterion("CEO resigns");
        assert_eq!(strict.check(&thesis, &digest("The CEO unveils a product.")).len(), 1);

        assert!(KillCriteriaMonitor::new(MonitorPolicy::default().with_threshold(1.5)).is_err());
    }

    #[test]
    fn test_criterion_without_concepts_never_matches() {
        let monitor = KillCriteriaMonitor::default();
        let thesis = Thesis::new("AAPL").with_criterion("the 10%");
        assert!(monitor.check(&thesis, &digest("the 10% of the")).is_empty());
    }

    #[tokio::test]
    async fn test_check_theses_skips_inactive() {
        let active = Thesis::new("AAPL").with_criterion("CEO resigns");
        let closed = Thesis::new("AAPL")
            .with_criterion("CEO resigns")
            .with_status(ThesisStatus::Closed);
        let empty = Thesis::new("AAPL");
        let active_id = active.id;

        let mut store = MockThesisStore::new();
        store
            .expect_theses_for()
            .withf(|ticker| ticker == "AAPL")
            .times(1)
            .returning(move |_| Ok(vec![active.clone(), closed.clone(), empty.clone()]));

        let monitor = KillCriteriaMonitor::default();
        let alerts = monitor
            .check_theses(&store, &digest("CEO departure announced."))
            .await
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].thesis_id, active_id);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockThesisStore::new();
        store
            .expect_theses_for()
            .returning(|_| Err(MonitorError::Store("offline".to_string())));

        let err = KillCriteriaMonitor::default()
            .check_theses(&store, &digest("anything"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), verdict_core::ErrorKind::Tool);
    }
}
