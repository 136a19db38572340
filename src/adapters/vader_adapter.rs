//! VADER lexicon polarity scorer.

use crate::ports::polarity_port::PolarityPort;
use vader_sentiment::SentimentIntensityAnalyzer;

pub struct VaderAdapter {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderAdapter {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PolarityPort for VaderAdapter {
    fn compound(&self, text: &str) -> f64 {
        self.analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_is_bounded() {
        let vader = VaderAdapter::new();
        for text in ["", "great amazing wonderful", "terrible awful disaster", "the"] {
            let score = vader.compound(text);
            assert!((-1.0..=1.0).contains(&score), "{text}: {score}");
        }
    }

    #[test]
    fn polarity_direction() {
        let vader = VaderAdapter::new();
        assert!(vader.compound("Record profits and excellent growth, great news") > 0.35);
        assert!(vader.compound("Terrible losses, fraud and a horrible collapse") < -0.35);
    }
}
