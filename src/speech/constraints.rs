//! Vocabulary constraints for the two recognition stages

use std::collections::HashSet;

use crate::{Error, Result};

/// The closed roster of speaker names plus the topic hint for item capture
///
/// Roster order is significant: the first entry is the administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechConstraintSet {
    roster: Vec<String>,
    item_topic: String,
}

impl SpeechConstraintSet {
    /// Build a constraint set from an ordered roster and an item topic
    ///
    /// # Errors
    ///
    /// Returns error if the roster is empty, contains blank or duplicate
    /// names, or the topic is blank
    pub fn new(roster: Vec<String>, item_topic: impl Into<String>) -> Result<Self> {
        let item_topic = item_topic.into();
        validate_roster(&roster)?;
        if item_topic.trim().is_empty() {
            return Err(Error::Config("item topic must not be blank".to_string()));
        }

        Ok(Self { roster, item_topic })
    }

    /// Names accepted by the name recognizer, in roster order
    #[must_use]
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// Topic hint for open-vocabulary item capture
    #[must_use]
    pub fn item_topic(&self) -> &str {
        &self.item_topic
    }

    /// The administrator identity (always the first roster entry)
    #[must_use]
    pub fn administrator(&self) -> &str {
        // validate_roster guarantees at least one entry
        &self.roster[0]
    }

    /// Exact, case-sensitive roster membership
    #[must_use]
    pub fn matches_known_speaker(&self, text: &str) -> bool {
        self.roster.iter().any(|name| name == text)
    }

    /// True iff `text` is exactly the first roster entry
    #[must_use]
    pub fn is_administrator(&self, text: &str) -> bool {
        self.administrator() == text
    }

    /// Map a raw transcript onto the canonical roster spelling
    ///
    /// Ignores case, punctuation and surrounding whitespace. Used by
    /// closed-vocabulary recognizers so that everything downstream can
    /// compare names exactly.
    #[must_use]
    pub fn resolve_speaker(&self, transcript: &str) -> Option<&str> {
        let heard = normalize(transcript);
        if heard.is_empty() {
            return None;
        }

        self.roster
            .iter()
            .find(|name| normalize(name) == heard)
            .map(String::as_str)
    }
}

/// Reject rosters a recognizer could not compile
///
/// # Errors
///
/// Returns error on an empty roster, a blank name, or a duplicate name
pub fn validate_roster(roster: &[String]) -> Result<()> {
    if roster.is_empty() {
        return Err(Error::Config("roster must contain at least one name".to_string()));
    }

    let mut seen = HashSet::new();
    for name in roster {
        if name.trim().is_empty() {
            return Err(Error::Config("roster contains a blank name".to_string()));
        }
        if !seen.insert(normalize(name)) {
            return Err(Error::Config(format!("duplicate roster name: {name}")));
        }
    }

    Ok(())
}

/// Lowercase, keep alphanumerics, collapse whitespace
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
