//! Lookup of concrete data points a claim can cite

use crate::{Claim, SharedData};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?\d+(?:,\d{3})*(?:\.\d+)?").expect("number pattern is a valid regex")
});

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "has", "have", "are", "was", "its",
    "will", "into", "over", "than", "which", "their", "been", "more", "less",
];

/// Relative tolerance when matching a cited number
const NUMBER_TOLERANCE: f64 = 0.05;

/// Numbers and terms present in the shared data
#[derive(Debug, Clone, Default)]
pub struct EvidenceIndex {
    numbers: Vec<f64>,
    terms: BTreeSet<String>,
}

impl EvidenceIndex {
    pub fn from_shared(shared: &SharedData) -> Self {
        let mut index = Self::default();

        for (name, value) in &shared.fundamentals.metrics {
            index.add_number(*value);
            // ratios are stored as fractions but cited as percentages
            index.add_number(value * 100.0);
            index.add_terms(&name.replace('_', " "));
        }
        for text in [&shared.fundamentals.company_name, &shared.fundamentals.sector]
            .into_iter()
            .flatten()
        {
            index.add_terms(text);
        }

        if let Some(stats) = shared.price_stats() {
            for value in [
                stats.first_close,
                stats.last_close,
                stats.change_pct,
                stats.period_high,
                stats.period_low,
            ] {
                index.add_number(value);
            }
            index.add_terms("price stock shares trading");
        }

        for headline in &shared.headlines {
            index.add_terms(&headline.title);
            for number in numbers_in(&headline.title) {
                index.add_number(number);
            }
        }

        if let Some(report) = &shared.sentiment {
            index.add_number(report.overall_confidence * 100.0);
            for count in [report.bullish_count, report.bearish_count, report.neutral_count] {
                index.add_number(count as f64);
            }
            for theme in &report.key_themes {
                index.add_terms(&theme.theme);
            }
        }

        index
    }

    fn add_number(&mut self, value: f64) {
        if value.is_finite() {
            self.numbers.push(value);
        }
    }

    fn add_terms(&mut self, text: &str) {
        self.terms.extend(content_words(text));
    }

    /// Whether a cited number matches a data point within 5%
    pub fn has_number(&self, cited: f64) -> bool {
        self.numbers
            .iter()
            .any(|v| (cited - v).abs() <= NUMBER_TOLERANCE * v.abs().max(1.0))
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    /// How well a claim is backed by the shared data, in [0, 1]
    ///
    /// Claims citing numbers score 0.7 for matching numbers plus 0.3 for
    /// referencing known terms; claims without numbers can reach 0.5.
    pub fn data_support(&self, claim: &Claim) -> f64 {
        let text = format!("{} {}", claim.statement, claim.evidence);

        let words: BTreeSet<String> = content_words(&text).collect();
        let hits = words.iter().filter(|w| self.has_term(w)).count();
        let reference = (hits as f64 / 2.0).min(1.0);

        let cited: Vec<f64> = numbers_in(&text).collect();
        if cited.is_empty() {
            return 0.5 * reference;
        }
        let matched = cited.iter().filter(|n| self.has_number(**n)).count();
        let numeric = matched as f64 / cited.len() as f64;
        0.7 * numeric + 0.3 * reference
    }
}

fn numbers_in(text: &str) -> impl Iterator<Item = f64> + '_ {
    NUMBER
        .find_iter(text)
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
}

/// Lower-cased words longer than three letters, minus stopwords
pub(crate) fn content_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3 && w.chars().all(char::is_alphabetic))
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
}
