//! News article records as fetched and persisted.

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsArticle {
    pub timestamp: String,
    pub ticker: String,
    pub title: String,
    pub description: String,
}

impl NewsArticle {
    /// Text fed to both sentiment strategies, or `None` when either field is empty.
    pub fn classifiable_text(&self) -> Option<String> {
        if self.title.is_empty() || self.description.is_empty() {
            None
        } else {
            Some(format!("{} {}", self.title, self.description))
        }
    }
}

/// Texts of all articles that carry both a title and a description, in store order.
pub fn classifiable_texts(articles: &[NewsArticle]) -> Vec<String> {
    articles
        .iter()
        .filter_map(NewsArticle::classifiable_text)
        .collect()
}
