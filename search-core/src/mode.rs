use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Fans out to every source.
    #[default]
    FreeText,
    /// Leading sigil: account directory only, viewer must be signed in.
    Directory,
}

/// Result of classifying raw search-box text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeDecision {
    pub mode: QueryMode,
    /// Free-text: the trimmed input. Directory: text after the sigil,
    /// lowercased and trimmed (may be empty).
    pub term: String,
}

impl ModeDecision {
    /// Length of the term in chars.
    pub fn term_len(&self) -> usize {
        self.term.chars().count()
    }
}

pub fn detect_mode(raw: &str, sigil: char) -> ModeDecision {
    let trimmed = raw.trim();
    match trimmed.strip_prefix(sigil) {
        Some(rest) => ModeDecision {
            mode: QueryMode::Directory,
            term: rest.trim().to_lowercase(),
        },
        None => ModeDecision {
            mode: QueryMode::FreeText,
            term: trimmed.to_string(),
        },
    }
}
