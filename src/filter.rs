//! Blocklist for upstream model identifiers.
//!
//! Upstream `/models` listings include families that make no sense behind a
//! chat endpoint (image generation, embeddings, speech) as well as dated
//! snapshot aliases of models that are already listed under their bare name.
//! A model ID is blocked if any rule matches.

use regex::Regex;

const BLOCK_PATTERNS: &[&str] = &[
    "^dall-e-",         // image generation
    "^text-embedding-", // embeddings
    "^tts-",            // speech synthesis
    "^whisper-",        // speech recognition
    r"-\d{4}-\d{2}-\d{2}$",    // dated snapshot
    r"-\d{4}-\d{2}-\d{2}-ca$", // dated snapshot, azure variant
    r"-\d{4}$",                // bare year suffix
];

#[derive(Debug)]
pub struct ModelFilter {
    rules: Vec<Regex>,
}

impl ModelFilter {
    /// The standard rule set applied to every backend listing.
    #[must_use]
    pub fn standard() -> Self {
        let rules = BLOCK_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("block pattern must compile"))
            .collect();
        Self { rules }
    }

    #[must_use]
    pub fn blocked(&self, model_id: &str) -> bool {
        self.rules.iter().any(|r| r.is_match(model_id))
    }
}

impl Default for ModelFilter {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_chat_families_are_blocked() {
        let filter = ModelFilter::standard();
        assert!(filter.blocked("dall-e-3"));
        assert!(filter.blocked("text-embedding-3-large"));
        assert!(filter.blocked("tts-1-hd"));
        assert!(filter.blocked("whisper-1"));
    }

    #[test]
    fn test_dated_snapshots_are_blocked() {
        let filter = ModelFilter::standard();
        assert!(filter.blocked("gpt-4o-2024-05-13"));
        assert!(filter.blocked("gpt-4o-2024-05-13-ca"));
        assert!(filter.blocked("gpt-4-0613"));
    }

    #[test]
    fn test_chat_models_pass() {
        let filter = ModelFilter::standard();
        assert!(!filter.blocked("gpt-4o"));
        assert!(!filter.blocked("gpt-4o-mini"));
        assert!(!filter.blocked("o3-mini"));
        assert!(!filter.blocked("llama-3.3-70b-instruct"));
    }

    #[test]
    fn test_date_must_be_a_suffix() {
        let filter = ModelFilter::standard();
        assert!(!filter.blocked("gpt-4o-2024-05-13-preview"));
    }
}
