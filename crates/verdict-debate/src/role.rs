//! Debate roles and their emphasis profiles
//!
//! Both agents see the same data. The profile only changes the order in
//! which fundamentals, headlines and themes are presented.

use serde::{Deserialize, Serialize};
use std::fmt;
use verdict_core::{Fundamentals, Headline, KeyTheme, SentimentLabel};

/// Side of the debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Bull,
    Bear,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bull => "bull",
            Self::Bear => "bear",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bull => "Bull",
            Self::Bear => "Bear",
        }
    }

    pub fn opponent(&self) -> Self {
        match self {
            Self::Bull => Self::Bear,
            Self::Bear => Self::Bull,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a role sees first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmphasisProfile {
    /// Fundamentals surfaced first, in this order
    pub priority_metrics: Vec<String>,
    /// Phrases that make a theme or headline relevant
    pub focus_terms: Vec<String>,
    /// Theme direction that earns an extra point
    pub favored_direction: SentimentLabel,
}

impl EmphasisProfile {
    /// Growth and catalyst emphasis
    pub fn bull() -> Self {
        Self {
            priority_metrics: strings(&[
                "revenue_growth",
                "market_cap",
                "forward_pe",
                "recommendation_mean",
                "target_high",
                "target_mean",
            ]),
            focus_terms: strings(&[
                "positive themes",
                "analyst upgrades",
                "product launches",
                "market expansion",
                "competitive wins",
            ]),
            favored_direction: SentimentLabel::Bullish,
        }
    }

    /// Risk and leverage emphasis
    pub fn bear() -> Self {
        Self {
            priority_metrics: strings(&[
                "debt_to_equity",
                "profit_margins",
                "pe_ratio",
                "price_to_book",
                "current_ratio",
                "quick_ratio",
            ]),
            focus_terms: strings(&[
                "negative themes",
                "insider selling",
                "competitive threats",
                "regulatory risks",
                "margin compression",
            ]),
            favored_direction: SentimentLabel::Bearish,
        }
    }

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Bull => Self::bull(),
            Role::Bear => Self::bear(),
        }
    }

    /// Metrics with priority fields first, the rest alphabetically
    pub fn prioritize(&self, fundamentals: &Fundamentals) -> Vec<(String, f64)> {
        let mut ordered: Vec<(String, f64)> = self
            .priority_metrics
            .iter()
            .filter_map(|name| fundamentals.metric(name).map(|v| (name.clone(), v)))
            .collect();
        ordered.extend(
            fundamentals
                .metrics
                .iter()
                .filter(|(name, _)| !self.priority_metrics.contains(*name))
                .map(|(name, value)| (name.clone(), *value)),
        );
        ordered
    }

    /// Relevance of a piece of text to this profile
    ///
    /// +2 when a whole focus phrase appears, +1 for each of its words.
    pub fn relevance(&self, text: &str) -> usize {
        let text = text.to_lowercase();
        let words: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        self.focus_terms
            .iter()
            .map(|phrase| {
                let phrase = phrase.to_lowercase();
                let whole = if text.contains(&phrase) { 2 } else { 0 };
                let partial = phrase
                    .split_whitespace()
                    .filter(|term| words.iter().any(|w| stem_match(w, term)))
                    .count();
                whole + partial
            })
            .sum()
    }

    /// Themes ordered by relevance, ties kept in input order
    pub fn rank_themes(&self, themes: &[KeyTheme]) -> Vec<KeyTheme> {
        let mut scored: Vec<(usize, &KeyTheme)> = themes
            .iter()
            .map(|theme| {
                let bonus = usize::from(theme.direction == self.favored_direction);
                let text = format!("{} {}", theme.theme, theme.summary);
                (self.relevance(&text) + bonus, theme)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, theme)| theme.clone()).collect()
    }

    /// Headlines ordered by relevance, ties kept in input order
    pub fn rank_headlines(&self, headlines: &[Headline]) -> Vec<Headline> {
        let mut scored: Vec<(usize, &Headline)> = headlines
            .iter()
            .map(|h| (self.relevance(&h.title), h))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, h)| h.clone()).collect()
    }
}

/// "upgrades" matches "upgrade", "launches" matches "launch"
fn stem_match(word: &str, term: &str) -> bool {
    let stem = |s: &str| -> String {
        s.strip_suffix("es")
            .filter(|r| r.len() > 3)
            .or_else(|| s.strip_suffix('s').filter(|r| r.len() > 2))
            .unwrap_or(s)
            .to_string()
    };
    stem(word) == stem(term)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_metrics_come_first() {
        let fundamentals = Fundamentals::default()
            .with_metric("beta", 1.2)
            .with_metric("debt_to_equity", 1.5)
            .with_metric("revenue_growth", 0.1);

        let bull: Vec<String> = EmphasisProfile::bull()
            .prioritize(&fundamentals)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(bull, ["revenue_growth", "beta", "debt_to_equity"]);

        let bear: Vec<String> = EmphasisProfile::bear()
            .prioritize(&fundamentals)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(bear, ["debt_to_equity", "beta", "revenue_growth"]);
    }

    #[test]
    fn test_relevance_scoring() {
        let bull = EmphasisProfile::bull();
        // whole phrase (+2) and both words (+2)
        assert_eq!(bull.relevance("Wave of analyst upgrades"), 4);
        // single word
        assert_eq!(bull.relevance("New product on the way"), 1);
        assert_eq!(bull.relevance("Quarterly dividend declared"), 0);
    }

    #[test]
    fn test_same_themes_ranked_differently() {
        let themes = vec![
            KeyTheme {
                theme: "Regulatory risks".into(),
                direction: SentimentLabel::Bearish,
                headline_count: 2,
                summary: String::new(),
            },
            KeyTheme {
                theme: "Product launches".into(),
                direction: SentimentLabel::Bullish,
                headline_count: 3,
                summary: String::new(),
            },
        ];
        assert_eq!(EmphasisProfile::bull().rank_themes(&themes)[0].theme, "Product launches");
        assert_eq!(EmphasisProfile::bear().rank_themes(&themes)[0].theme, "Regulatory risks");
    }

    #[test]
    fn test_opponent() {
        assert_eq!(Role::Bull.opponent(), Role::Bear);
        assert_eq!(Role::Bear.to_string(), "Bear");
    }
}
