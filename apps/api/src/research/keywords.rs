//! Keyword Expander: turns a topic into the lowercase term set used for scoring.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::llm_client::prompts::fill_template;
use crate::llm_client::{parse_comma_list, TextCompletion};
use crate::research::prompts::KEYWORD_EXPANSION_PROMPT_TEMPLATE;

/// Lowercase search terms. Always contains the topic's own words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeywordSet(BTreeSet<String>);

impl KeywordSet {
    /// The fallback set: the topic's whitespace-separated words, lowercased.
    pub fn from_topic(topic: &str) -> Self {
        Self(topic.split_whitespace().map(str::to_lowercase).collect())
    }

    pub fn extend<I, S>(&mut self, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0.extend(
            terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty()),
        );
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total substring occurrences of every keyword in `text`, lowercased first.
    ///
    /// Matching is plain substring counting, not word-boundary aware:
    /// "rust" also matches inside "trust".
    pub fn occurrences(&self, text: &str) -> i64 {
        let text = text.to_lowercase();
        self.iter().map(|kw| text.matches(kw).count() as i64).sum()
    }
}

impl<S: AsRef<str>> FromIterator<S> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = KeywordSet::default();
        set.extend(iter);
        set
    }
}

/// Expands a topic into keywords via the completion capability.
///
/// Completion failure falls back to the topic's own words; the topic words
/// are unioned in either way, so the set is empty only for an empty topic.
pub async fn expand(llm: &dyn TextCompletion, topic: &str) -> KeywordSet {
    let mut keywords = KeywordSet::from_topic(topic);
    let prompt = fill_template(KEYWORD_EXPANSION_PROMPT_TEMPLATE, &[("topic", topic)]);

    match llm.complete(&prompt).await {
        Ok(response) => {
            keywords.extend(parse_comma_list(&response));
            info!(
                "Expanded topic '{}' into {} keywords",
                topic,
                keywords.len()
            );
        }
        Err(e) => {
            warn!("Keyword expansion failed: {e}. Falling back to topic words only.");
        }
    }

    if keywords.is_empty() {
        warn!("Topic '{topic}' produced no keywords; every item will score zero");
    }

    keywords
}
