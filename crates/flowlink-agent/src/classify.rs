//! Routing of queries between workflow tools and plain conversation.

use std::fmt;

/// What kind of answer a query wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Automation request; the model sees the tool list.
    Workflow,
    /// Anything else; answered conversationally.
    General,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workflow => f.write_str("workflow"),
            Self::General => f.write_str("general"),
        }
    }
}

/// Classify `text` by case-insensitive keyword containment.
///
/// Keywords match anywhere, so `run` also matches `running`.
pub fn classify_query<S: AsRef<str>>(text: &str, keywords: &[S]) -> QueryKind {
    let lower = text.to_lowercase();
    let hit = keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .find(|k| !k.is_empty() && lower.contains(k.as_str()));

    match hit {
        Some(keyword) => {
            tracing::debug!(keyword = %keyword, "query classified as workflow");
            QueryKind::Workflow
        }
        None => QueryKind::General,
    }
}
