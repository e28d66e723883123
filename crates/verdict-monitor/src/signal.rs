//! Statements pulled out of an analysis for matching

use serde::{Deserialize, Serialize};
use verdict_core::AnalysisDigest;

/// Part of the analysis a signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Summary,
    Sentiment,
    Theme,
    Risk,
    Highlight,
}

impl SignalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Sentiment => "sentiment",
            Self::Theme => "theme",
            Self::Risk => "risk",
            Self::Highlight => "highlight",
        }
    }
}

/// One matchable statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub text: String,
    pub source: SignalSource,
}

impl Signal {
    pub fn new(text: impl Into<String>, source: SignalSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

/// Signals in a stable order: summary sentences, sentiment, themes, risks, highlights
pub fn extract_signals(digest: &AnalysisDigest) -> Vec<Signal> {
    let mut signals: Vec<Signal> = sentences(&digest.summary)
        .map(|s| Signal::new(s, SignalSource::Summary))
        .collect();

    if let Some(label) = digest.sentiment {
        signals.push(Signal::new(
            format!("Overall sentiment {label}"),
            SignalSource::Sentiment,
        ));
    }

    let lists = [
        (&digest.themes, SignalSource::Theme),
        (&digest.risks, SignalSource::Risk),
        (&digest.highlights, SignalSource::Highlight),
    ];
    for (items, source) in lists {
        signals.extend(
            items
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(|t| Signal::new(t, source)),
        );
    }
    signals
}

/// Split on sentence-ending punctuation followed by whitespace
///
/// "Growth of 6.1 percent." stays whole.
fn sentences(text: &str) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let at_boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + c.len_utf8();
            parts.push(&text[start..end]);
            start = end;
        }
    }
    parts.push(&text[start..]);
    parts.into_iter().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::SentimentLabel;

    #[test]
    fn test_summary_is_split_into_sentences() {
        let parts: Vec<_> = sentences("Revenue grew 6.1 percent. CEO departure announced!  Shares fell")
            .collect();
        assert_eq!(
            parts,
            vec!["Revenue grew 6.1 percent.", "CEO departure announced!", "Shares fell"]
        );
    }

    #[test]
    fn test_signals_cover_every_section() {
        let digest = AnalysisDigest::new("AAPL", "Solid quarter.")
            .with_sentiment(SentimentLabel::Bearish)
            .with_themes(["Services growth".to_string()])
            .with_risks(["China demand".to_string(), "  ".to_string()])
            .with_highlights(["Apple beats estimates".to_string()]);

        let signals = extract_signals(&digest);
        let sources: Vec<_> = signals.iter().map(|s| s.source).collect();
        assert_eq!(
            sources,
            vec![
                SignalSource::Summary,
                SignalSource::Sentiment,
                SignalSource::Theme,
                SignalSource::Risk,
                SignalSource::Highlight,
            ]
        );
        assert_eq!(signals[1].text, "Overall sentiment Bearish");
    }

    #[test]
    fn test_empty_digest_has_no_signals() {
        assert!(extract_signals(&AnalysisDigest::default()).is_empty());
    }
}
