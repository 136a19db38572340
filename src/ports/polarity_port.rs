//! Lexicon polarity scoring port.

pub trait PolarityPort {
    /// Normalized compound polarity of `text` in `[-1, 1]`.
    fn compound(&self, text: &str) -> f64;
}
