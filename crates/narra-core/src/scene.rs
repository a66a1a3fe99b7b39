//! Scene identity.
//!
//! A scene is the smallest addressable unit of narrative for which a prompt
//! can be built, identified by `(episode, sequence?, chapter?, phase?)`.
//! Episode ids come in several equivalent spellings (`"010"`, `"ep010"`,
//! `"EP-010"`, `"10"`); [`normalize_episode_number`] reduces them all to the
//! same number so relevance decisions do not depend on spelling.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches an episode id: optional `ep`/`episode` prefix, optional separator,
/// then digits. Case-insensitive.
static EPISODE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(ep|episode)?[-_]?(\d+)$").expect("episode id regex is valid")
});

/// Identifies a scene in the narrative.
///
/// Equality covers all fields; the `(episode_id, sequence_id)` pair forms the
/// cache key used by the builder caches.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneIdentifier {
    /// Episode identifier, e.g. `ep010`. Never empty.
    pub episode_id: String,
    /// Optional sequence within the episode.
    pub sequence_id: Option<String>,
    /// Optional chapter the episode belongs to.
    pub chapter_id: Option<String>,
    /// Optional current narrative phase; `None` disables phase filtering.
    pub current_phase: Option<String>,
}

impl SceneIdentifier {
    /// Create a scene identifier for an episode.
    pub fn new(episode_id: impl Into<String>) -> Self {
        let episode_id = episode_id.into();
        debug_assert!(!episode_id.is_empty(), "episode_id must be non-empty");
        Self {
            episode_id,
            sequence_id: None,
            chapter_id: None,
            current_phase: None,
        }
    }

    /// Set the sequence id.
    #[must_use]
    pub fn with_sequence(mut self, sequence_id: impl Into<String>) -> Self {
        self.sequence_id = Some(sequence_id.into());
        self
    }

    /// Set the chapter id.
    #[must_use]
    pub fn with_chapter(mut self, chapter_id: impl Into<String>) -> Self {
        self.chapter_id = Some(chapter_id.into());
        self
    }

    /// Set the current narrative phase.
    #[must_use]
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.current_phase = Some(phase.into());
        self
    }

    /// Cache key for the builder caches: `episode_id + ":" + sequence_id`.
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{}",
            self.episode_id,
            self.sequence_id.as_deref().unwrap_or("")
        )
    }

    /// The episode number, if the episode id is a recognizable spelling.
    pub fn episode_number(&self) -> Option<u32> {
        normalize_episode_number(&self.episode_id)
    }
}

/// Normalize an episode id to its number.
///
/// Strips an optional `ep`/`episode` prefix (any case, optional `-`/`_`
/// separator) and leading zeros. Returns `None` for unrecognizable ids.
pub fn normalize_episode_number(id: &str) -> Option<u32> {
    let caps = EPISODE_ID_RE.captures(id.trim())?;
    caps.get(2)?.as_str().parse().ok()
}

/// Derive the previous episode's id from an episode id.
///
/// Keeps the original prefix and rewrites the number zero-padded to three
/// digits (`ep010` → `ep009`). The first episode has no previous.
pub fn previous_episode_id(id: &str) -> Option<String> {
    let caps = EPISODE_ID_RE.captures(id.trim())?;
    let number: u32 = caps.get(2)?.as_str().parse().ok()?;
    if number <= 1 {
        return None;
    }
    let prefix = caps.get(1).map_or("", |m| m.as_str());
    Some(format!("{prefix}{:03}", number - 1))
}
