//! Evidence grading and verdict synthesis

use crate::{
    Case, EvidenceIndex, GradingPolicy, Rebuttal, Recommendation, RecommendationScale, Role,
    ScenarioCurve, SharedData,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Credibility of one claim after support and rebuttals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceGrade {
    pub claim_id: String,
    pub claim: String,
    pub source_agent: Role,
    /// At least one valid rebuttal targets the claim
    pub has_counter_evidence: bool,
    pub data_support_score: f64,
    /// Strongest rebuttal received, 0 when none
    pub rebuttal_strength: f64,
    pub final_credibility: f64,
}

/// Mean credibility per side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArgumentStrength {
    pub bull: f64,
    pub bear: f64,
}

/// Scenario probabilities; always sum to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProbabilities {
    pub bull: f64,
    pub base: f64,
    pub bear: f64,
}

impl ScenarioProbabilities {
    pub fn total(&self) -> f64 {
        self.bull + self.base + self.bear
    }
}

/// Reconciled outcome of a debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub analysis_id: Uuid,
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub probabilities: ScenarioProbabilities,
    pub recommendation: Recommendation,
    /// |bull - bear| probability spread
    pub conviction: f64,
    pub argument_strength: ArgumentStrength,
    pub evidence_grades: Vec<EvidenceGrade>,
    pub decisive_factors: Vec<String>,
    pub unresolved_questions: Vec<String>,
    pub bull_summary: String,
    pub bear_summary: String,
    pub synthesis_reasoning: String,
    /// Sides that fell back to a placeholder case
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_sides: Vec<Role>,
}

impl Verdict {
    pub fn grade(&self, claim_id: &str) -> Option<&EvidenceGrade> {
        self.evidence_grades.iter().find(|g| g.claim_id == claim_id)
    }
}

/// Impartial judge of the two cases
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    grading: GradingPolicy,
    curve: ScenarioCurve,
    scale: RecommendationScale,
    decisive_factor_count: usize,
}

impl Synthesizer {
    pub fn new(grading: GradingPolicy, curve: ScenarioCurve, scale: RecommendationScale) -> Self {
        Self {
            grading,
            curve,
            scale,
            decisive_factor_count: 3,
        }
    }

    pub fn with_decisive_factor_count(mut self, count: usize) -> Self {
        self.decisive_factor_count = count;
        self
    }

    /// Grade every claim and reconcile both cases into a verdict
    ///
    /// Rebuttals whose target is not a claim of the opposing case are
    /// ignored. Output is deterministic for fixed inputs apart from the id
    /// and timestamp.
    pub fn synthesize(
        &self,
        bull: &Case,
        bear: &Case,
        rebuttals: &[Rebuttal],
        shared: &SharedData,
    ) -> Verdict {
        let index = EvidenceIndex::from_shared(shared);

        let bull_grades = self.grade_case(bull, rebuttals, &index);
        let bear_grades = self.grade_case(bear, rebuttals, &index);
        let strength = ArgumentStrength {
            bull: self.side_strength(bull, &bull_grades),
            bear: self.side_strength(bear, &bear_grades),
        };

        let catalysts = bull.outlook_pressure();
        let risks = bear.outlook_pressure();
        let tilt = (catalysts - risks) / (catalysts + risks + 1.0);
        let (p_bull, p_base, p_bear) = self.curve.probabilities(strength.bull - strength.bear, tilt);
        let probabilities = ScenarioProbabilities {
            bull: p_bull,
            base: p_base,
            bear: p_bear,
        };
        let conviction = (p_bull - p_bear).abs();
        let recommendation = self.scale.classify(conviction, p_bull - p_bear);

        let mut evidence_grades = bull_grades;
        evidence_grades.extend(bear_grades);

        let mut ranked: Vec<&EvidenceGrade> = evidence_grades.iter().collect();
        ranked.sort_by(|a, b| {
            b.final_credibility
                .total_cmp(&a.final_credibility)
                .then_with(|| a.claim_id.cmp(&b.claim_id))
        });
        let decisive_factors = ranked
            .iter()
            .take(self.decisive_factor_count)
            .map(|g| format!("{}: {}", g.source_agent.label(), g.claim))
            .collect();

        let (low, high) = self.grading.ambiguous_band;
        let unresolved_questions = evidence_grades
            .iter()
            .filter(|g| (low..=high).contains(&g.final_credibility))
            .map(|g| {
                format!(
                    "{} claim '{}' is contested (credibility {:.2})",
                    g.source_agent.label(),
                    g.claim,
                    g.final_credibility
                )
            })
            .collect();

        let degraded_sides: Vec<Role> = [bull, bear]
            .into_iter()
            .filter(|c| c.degraded)
            .map(|c| c.role)
            .collect();

        let synthesis_reasoning = format!(
            "Bull arguments scored {:.2} against {:.2} for the bear side; catalyst pressure {:.2} \
             vs risk pressure {:.2}. Scenario odds {:.0}% bull / {:.0}% base / {:.0}% bear give a \
             conviction of {:.2}, which maps to {}.{}",
            strength.bull,
            strength.bear,
            catalysts,
            risks,
            p_bull * 100.0,
            p_base * 100.0,
            p_bear * 100.0,
            conviction,
            recommendation,
            if degraded_sides.is_empty() {
                String::new()
            } else {
                format!(
                    " The {} case was unavailable and has been down-weighted.",
                    degraded_sides
                        .iter()
                        .map(Role::as_str)
                        .collect::<Vec<_>>()
                        .join(" and ")
                )
            }
        );

        debug!(
            ticker = %shared.ticker,
            bull_strength = strength.bull,
            bear_strength = strength.bear,
            %recommendation,
            "Verdict synthesized"
        );

        Verdict {
            analysis_id: Uuid::new_v4(),
            ticker: shared.ticker.to_string(),
            timestamp: Utc::now(),
            probabilities,
            recommendation,
            conviction,
            argument_strength: strength,
            evidence_grades,
            decisive_factors,
            unresolved_questions,
            bull_summary: bull.thesis.clone(),
            bear_summary: bear.thesis.clone(),
            synthesis_reasoning,
            degraded_sides,
        }
    }

    fn grade_case(&self, case: &Case, rebuttals: &[Rebuttal], index: &EvidenceIndex) -> Vec<EvidenceGrade> {
        let policy = &self.grading;
        let degraded_factor = if case.degraded {
            1.0 - policy.degraded_penalty
        } else {
            1.0
        };

        case.claims
            .iter()
            .map(|claim| {
                let received: Vec<&Rebuttal> = rebuttals
                    .iter()
                    .filter(|r| r.author == case.role.opponent() && r.target_claim_id == claim.id)
                    .collect();
                let rebuttal_strength = received
                    .iter()
                    .map(|r| r.strength.clamp(0.0, 1.0))
                    .fold(0.0, f64::max);

                let support = index.data_support(claim);
                let base = policy.data_weight * support
                    + policy.confidence_weight * claim.confidence.clamp(0.0, 1.0);
                let credibility =
                    base * (1.0 - policy.rebuttal_penalty * rebuttal_strength) * degraded_factor;

                EvidenceGrade {
                    claim_id: claim.id.clone(),
                    claim: claim.statement.clone(),
                    source_agent: case.role,
                    has_counter_evidence: !received.is_empty(),
                    data_support_score: support,
                    rebuttal_strength,
                    final_credibility: credibility.clamp(0.0, 1.0),
                }
            })
            .collect()
    }

    fn side_strength(&self, case: &Case, grades: &[EvidenceGrade]) -> f64 {
        if grades.is_empty() {
            let penalty = if case.degraded {
                self.grading.degraded_penalty
            } else {
                0.0
            };
            return self.grading.empty_side_strength * (1.0 - penalty);
        }
        grades.iter().map(|g| g.final_credibility).sum::<f64>() / grades.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Catalyst, Claim, Level, Risk, Timeframe};
    use verdict_core::{Fundamentals, Ticker};

    fn claim(role: Role, n: usize, statement: &str, confidence: f64) -> Claim {
        Claim {
            id: format!("{}-{n}", role.as_str()),
            statement: statement.to_string(),
            evidence: String::new(),
            data_source: "fundamentals".to_string(),
            confidence,
        }
    }

    fn bull_case(claims: Vec<Claim>) -> Case {
        Case {
            ticker: "AAPL".into(),
            role: Role::Bull,
            thesis: "Growth continues".into(),
            claims,
            catalysts: vec![Catalyst {
                description: "New product cycle".into(),
                timeframe: Timeframe::NearTerm,
                probability: 0.6,
                impact: Level::High,
            }],
            risks: vec![],
            weaknesses: vec!["Valuation".into()],
            confidence: 0.7,
            degraded: false,
            low_confidence: false,
        }
    }

    fn bear_case(claims: Vec<Claim>) -> Case {
        Case {
            ticker: "AAPL".into(),
            role: Role::Bear,
            thesis: "Multiple compresses".into(),
            claims,
            catalysts: vec![],
            risks: vec![Risk {
                description: "Regulation".into(),
                category: "regulatory".into(),
                severity: Level::Medium,
                probability: 0.5,
                timeframe: Timeframe::MediumTerm,
            }],
            weaknesses: vec!["Strong cash flow".into()],
            confidence: 0.6,
            degraded: false,
            low_confidence: false,
        }
    }

    fn shared(growth: f64) -> SharedData {
        SharedData::new(Ticker::parse("AAPL").unwrap()).with_fundamentals(
            Fundamentals::default()
                .with_metric("revenue_growth", growth)
                .with_metric("debt_to_equity", 1.45),
        )
    }

    fn rebuttal(author: Role, target: &str, strength: f64) -> Rebuttal {
        Rebuttal {
            author,
            target_claim_id: target.into(),
            target_statement: String::new(),
            counter_argument: "No".into(),
            counter_evidence: None,
            strength,
        }
    }

    #[test]
    fn test_unbacked_claim_lowers_bull_strength() {
        let bull = bull_case(vec![claim(Role::Bull, 1, "Revenue growth of 20%", 0.8)]);
        let bear = bear_case(vec![claim(Role::Bear, 1, "Debt to equity of 1.45", 0.6)]);
        let synth = Synthesizer::default();

        let backed = synth.synthesize(&bull, &bear, &[], &shared(0.2));
        let unbacked = synth.synthesize(&bull, &bear, &[], &shared(0.05));

        let backed_grade = backed.grade("bull-1").unwrap();
        let unbacked_grade = unbacked.grade("bull-1").unwrap();
        assert!(unbacked_grade.data_support_score < 0.5);
        assert!(unbacked_grade.data_support_score < backed_grade.data_support_score);
        assert!(unbacked.argument_strength.bull < backed.argument_strength.bull);
        assert!(unbacked.probabilities.bull < backed.probabilities.bull);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let bull = bull_case(vec![claim(Role::Bull, 1, "Revenue growth of 20%", 0.9)]);
        let bear = bear_case(vec![]);
        let verdict = Synthesizer::default().synthesize(&bull, &bear, &[], &shared(0.2));
        assert!((verdict.probabilities.total() - 1.0).abs() < 1e-6);
        assert!((verdict.conviction - (verdict.probabilities.bull - verdict.probabilities.bear).abs()).abs() < 1e-12);
    }

    #[test]
    fn test_rebuttal_penalty_and_stray_rebuttals() {
        let bull = bull_case(vec![claim(Role::Bull, 1, "Revenue growth of 20%", 0.8)]);
        let bear = bear_case(vec![claim(Role::Bear, 1, "Debt to equity of 1.45", 0.6)]);
        let rebuttals = vec![
            rebuttal(Role::Bear, "bull-1", 0.5),
            // a bull rebuttal cannot target a bull claim
            rebuttal(Role::Bull, "bull-1", 1.0),
            rebuttal(Role::Bear, "bull-9", 1.0),
        ];
        let verdict = Synthesizer::default().synthesize(&bull, &bear, &rebuttals, &shared(0.2));

        let grade = verdict.grade("bull-1").unwrap();
        assert!(grade.has_counter_evidence);
        assert_eq!(grade.rebuttal_strength, 0.5);
        // (0.5 * 1.0 + 0.5 * 0.8) * (1 - 0.6 * 0.5)
        assert!((grade.final_credibility - 0.63).abs() < 1e-9);
        assert!(!verdict.grade("bear-1").unwrap().has_counter_evidence);
    }

    #[test]
    fn test_degraded_side_is_down_weighted() {
        let bull = bull_case(vec![claim(Role::Bull, 1, "Revenue growth of 20%", 0.8)]);
        let bear = Case::degraded("AAPL", Role::Bear, "invalid output");
        let verdict = Synthesizer::default().synthesize(&bull, &bear, &[], &shared(0.2));

        assert_eq!(verdict.degraded_sides, vec![Role::Bear]);
        assert!((verdict.argument_strength.bear - 0.25).abs() < 1e-9);
        assert!(verdict.probabilities.bull > verdict.probabilities.bear);
        assert!(verdict.synthesis_reasoning.contains("bear case was unavailable"));
    }

    #[test]
    fn test_decisive_factors_and_unresolved() {
        let bull = bull_case(vec![
            claim(Role::Bull, 1, "Revenue growth of 20%", 0.9),
            claim(Role::Bull, 2, "Management is visionary", 0.9),
        ]);
        let bear = bear_case(vec![claim(Role::Bear, 1, "Debt to equity of 1.45", 0.7)]);
        let verdict = Synthesizer::default()
            .with_decisive_factor_count(2)
            .synthesize(&bull, &bear, &[], &shared(0.2));

        assert_eq!(verdict.decisive_factors.len(), 2);
        assert_eq!(verdict.decisive_factors[0], "Bull: Revenue growth of 20%");
        // 0.5 * 0 + 0.5 * 0.9 = 0.45 lands in the ambiguous band
        assert_eq!(verdict.unresolved_questions.len(), 1);
        assert!(verdict.unresolved_questions[0].contains("Management is visionary"));
    }

    #[test]
    fn test_stronger_bull_strictly_increases_bull_probability() {
        let bear = bear_case(vec![claim(Role::Bear, 1, "Debt to equity of 1.45", 0.6)]);
        let weak = bull_case(vec![claim(Role::Bull, 1, "Revenue growth of 20%", 0.4)]);
        let strong = bull_case(vec![claim(Role::Bull, 1, "Revenue growth of 20%", 0.9)]);
        let synth = Synthesizer::default();

        let a = synth.synthesize(&weak, &bear, &[], &shared(0.2));
        let b = synth.synthesize(&strong, &bear, &[], &shared(0.2));
        assert!(b.probabilities.bull > a.probabilities.bull);
        assert!(b.probabilities.bear < a.probabilities.bear);
    }
}
