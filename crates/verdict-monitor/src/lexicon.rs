//! Concept normalisation for free-form criteria and analysis text
//!
//! Words and short phrases that mean the same thing for an investor map to
//! one concept ("steps down", "departure" and "resigns" are all
//! `departure`). Anything not in the lexicon stands for itself after light
//! stemming. Numbers and filler words carry no concept.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Longest phrase the lexicon looks up, in words
const MAX_PHRASE_WORDS: usize = 3;

/// Inflections stripped before lookup, with the shortest stem allowed
const SUFFIXES: [(&str, usize); 4] = [("ing", 3), ("ed", 3), ("es", 3), ("s", 3)];

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "of", "to", "in", "on", "at", "for", "by", "with", "from",
    "is", "are", "was", "were", "be", "been", "being", "it", "its", "this", "that", "as", "than",
    "if", "when", "any", "has", "have", "had", "will", "would", "could", "should", "about",
    "after", "before", "into", "over", "new", "turn", "turns", "become", "becomes", "goes", "get",
    "gets", "more", "less", "per", "year", "years", "quarter", "quarters", "company", "firm",
];

const BUILTIN: &[(&str, &[&str])] = &[
    ("chief executive", &["ceo", "chief executive", "chief executive officer"]),
    ("chief financial officer", &["cfo", "chief financial officer", "finance chief"]),
    ("leadership", &["executive", "executives", "management", "leadership", "founder", "chairman", "board"]),
    (
        "departure",
        &[
            "resign", "resignation", "departure", "depart", "step down", "steps down",
            "stepping down", "stepped down", "exit", "quit", "leave", "leaves", "leaving",
            "ousted", "fired", "retire", "retirement", "replaced",
        ],
    ),
    ("revenue", &["revenue", "sales", "top line", "turnover"]),
    ("earnings", &["earnings", "profit", "profits", "eps", "net income"]),
    ("growth", &["growth", "grow", "grew", "growing", "expansion"]),
    (
        "decline",
        &[
            "decline", "fall", "fell", "drop", "slow", "slowdown", "slowing", "below", "miss",
            "missed", "shrink", "shrinking", "contraction", "decrease", "cut", "weaker", "weak",
            "plunge", "slump",
        ],
    ),
    ("margin", &["margin", "margins", "profitability", "margin compression"]),
    ("debt", &["debt", "leverage", "borrowing", "indebtedness", "debt to equity"]),
    (
        "regulatory action",
        &[
            "lawsuit", "litigation", "probe", "investigation", "regulator", "regulators",
            "regulatory", "antitrust", "sued", "fine", "penalty",
        ],
    ),
    ("recall", &["recall", "defect", "safety issue"]),
    ("competition", &["competition", "competitor", "competitive", "rival", "rivals", "market share"]),
    ("guidance", &["guidance", "outlook", "forecast"]),
    ("layoffs", &["layoff", "layoffs", "job cuts", "restructuring", "headcount reduction"]),
    ("dividend", &["dividend", "payout", "distribution"]),
    ("downgrade", &["downgrade", "downgraded", "cut to sell", "underperform"]),
    ("acquisition", &["acquisition", "merger", "acquire", "takeover", "buyout"]),
    ("insolvency", &["bankruptcy", "bankrupt", "insolvency", "chapter 11", "default"]),
    ("bearish", &["bearish", "negative", "pessimistic", "sell off", "selloff"]),
    ("bullish", &["bullish", "positive", "optimistic", "rally"]),
    ("sentiment", &["sentiment", "mood", "tone"]),
];

/// Phrase to concept table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptLexicon {
    phrases: BTreeMap<String, String>,
}

impl Default for ConceptLexicon {
    fn default() -> Self {
        let mut lexicon = Self {
            phrases: BTreeMap::new(),
        };
        for (concept, synonyms) in BUILTIN {
            lexicon = lexicon.with_synonyms(concept, synonyms.iter().copied());
        }
        lexicon
    }
}

impl ConceptLexicon {
    /// Empty lexicon: every word stands for itself
    pub fn empty() -> Self {
        Self {
            phrases: BTreeMap::new(),
        }
    }

    /// Map more phrases onto a concept
    pub fn with_synonyms<'a>(mut self, concept: &str, synonyms: impl IntoIterator<Item = &'a str>) -> Self {
        for phrase in synonyms {
            let key = tokens(phrase).join(" ");
            if !key.is_empty() {
                self.phrases.insert(key, concept.to_string());
            }
        }
        self
    }

    /// Concepts mentioned in a piece of text
    pub fn concepts(&self, text: &str) -> BTreeSet<String> {
        let words = tokens(text);
        let mut found = BTreeSet::new();
        let mut i = 0;
        while i < words.len() {
            let longest = MAX_PHRASE_WORDS.min(words.len() - i);
            let matched = (1..=longest).rev().find_map(|len| {
                let phrase = words[i..i + len].join(" ");
                self.lookup(&phrase).map(|concept| (len, concept))
            });
            match matched {
                Some((len, concept)) => {
                    found.insert(concept.to_string());
                    i += len;
                }
                None => {
                    let word = &words[i];
                    if is_content(word) {
                        found.insert(stem(word).to_string());
                    }
                    i += 1;
                }
            }
        }
        found
    }

    fn lookup(&self, phrase: &str) -> Option<&str> {
        if let Some(concept) = self.phrases.get(phrase) {
            return Some(concept);
        }
        if phrase.contains(' ') {
            return None;
        }
        // single words also match through any inflection stripped
        SUFFIXES
            .iter()
            .filter_map(|(suffix, min_stem)| {
                phrase
                    .strip_suffix(suffix)
                    .filter(|stem| stem.len() >= *min_stem)
            })
            .find_map(|stem| self.phrases.get(stem))
            .map(String::as_str)
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn is_content(word: &str) -> bool {
    word.len() > 1 && !word.chars().all(|c| c.is_ascii_digit()) && !STOPWORDS.contains(&word)
}

/// "resigns" -> "resign", "announced" -> "announc", "leaving" -> "leav"
fn stem(word: &str) -> &str {
    for (suffix, min_stem) in SUFFIXES {
        if let Some(stem) = word.strip_suffix(suffix) {
            if stem.len() >= min_stem && !stem.ends_with('s') {
                return stem;
            }
        }
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_synonyms_share_a_concept() {
        let lexicon = ConceptLexicon::default();
        assert_eq!(lexicon.concepts("CEO resigns"), set(&["chief executive", "departure"]));
        assert_eq!(
            lexicon.concepts("Chief Executive steps down"),
            set(&["chief executive", "departure"])
        );
        assert!(lexicon.concepts("CEO departure announced").contains("departure"));
        assert!(lexicon.concepts("Founder retires").contains("departure"));
    }

    #[test]
    fn test_numbers_and_fillers_are_ignored() {
        let lexicon = ConceptLexicon::default();
        assert_eq!(
            lexicon.concepts("Revenue growth falls below 10%"),
            set(&["revenue", "growth", "decline"])
        );
    }

    #[test]
    fn test_unknown_words_stand_for_themselves() {
        let concepts = ConceptLexicon::empty().concepts("Patents expiring");
        assert_eq!(concepts, set(&["patent", "expir"]));
    }

    #[test]
    fn test_custom_synonyms() {
        let lexicon = ConceptLexicon::default().with_synonyms("china", ["china", "chinese", "prc"]);
        assert!(lexicon.concepts("PRC demand weakens").contains("china"));
    }
}
