//! Message reactions.
//!
//! Stored as rows in `message_reactions (message_id, user_id, emoji)`; the
//! domain view is a map from emoji to the set of users who reacted with it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Maximum emoji identifier length in bytes (matches VARCHAR(100)).
pub const MAX_EMOJI_LENGTH: usize = 100;

/// Emoji -> users map.
///
/// A key is present only while its user set is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reactions(BTreeMap<String, BTreeSet<i64>>);

impl Reactions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `user_id` under `emoji`. Returns `false` if the pair was already present.
    pub fn add(&mut self, emoji: &str, user_id: i64) -> bool {
        self.0.entry(emoji.to_string()).or_default().insert(user_id)
    }

    /// Remove `user_id` from `emoji`, dropping the key once its set is empty.
    /// Returns `false` if the pair was absent.
    pub fn remove(&mut self, emoji: &str, user_id: i64) -> bool {
        let Some(users) = self.0.get_mut(emoji) else {
            return false;
        };
        let removed = users.remove(&user_id);
        if users.is_empty() {
            self.0.remove(emoji);
        }
        removed
    }

    pub fn users(&self, emoji: &str) -> Option<&BTreeSet<i64>> {
        self.0.get(emoji)
    }

    pub fn contains(&self, emoji: &str) -> bool {
        self.0.contains_key(emoji)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<i64>)> {
        self.0.iter()
    }
}

impl FromIterator<(String, i64)> for Reactions {
    fn from_iter<T: IntoIterator<Item = (String, i64)>>(iter: T) -> Self {
        let mut reactions = Reactions::new();
        for (emoji, user_id) in iter {
            reactions.add(&emoji, user_id);
        }
        reactions
    }
}
