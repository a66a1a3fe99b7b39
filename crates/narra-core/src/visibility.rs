//! AI visibility levels and hints.
//!
//! Each section of a vault document can carry an `ai_visibility` directive
//! (0..3) governing whether its content and/or existence is exposed to the
//! prompt. Levels are a closed enumeration; raw digits only exist at the
//! parsing boundary.

use serde::{Deserialize, Serialize};

use crate::context::FilteredContext;

/// How visible a section is to AI consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityLevel {
    /// Level 0: content excluded, no hint.
    Hidden,
    /// Level 1: content excluded, an existence hint is emitted.
    Aware,
    /// Level 2: content included.
    Know,
    /// Level 3: content included (default for unmarked sections).
    Use,
}

impl VisibilityLevel {
    /// Parse a directive digit. Returns `None` outside 0..=3.
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(Self::Hidden),
            1 => Some(Self::Aware),
            2 => Some(Self::Know),
            3 => Some(Self::Use),
            _ => None,
        }
    }

    /// The directive digit for this level.
    pub fn as_digit(self) -> u8 {
        match self {
            Self::Hidden => 0,
            Self::Aware => 1,
            Self::Know => 2,
            Self::Use => 3,
        }
    }

    /// Whether section content is included in output.
    pub fn includes_content(self) -> bool {
        matches!(self, Self::Know | Self::Use)
    }

    /// Whether a withheld-content hint is emitted for the section.
    pub fn emits_hint(self) -> bool {
        matches!(self, Self::Aware)
    }
}

impl Default for VisibilityLevel {
    fn default() -> Self {
        Self::Use
    }
}

/// A hint that some content exists but is withheld.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityHint {
    /// Entity category, e.g. `character` or `world`.
    pub category: String,
    /// Entity the hint belongs to.
    pub entity_id: String,
    /// Prose nudge to include in the prompt.
    pub hint_text: String,
    /// Level that produced the hint.
    pub level: VisibilityLevel,
}

impl VisibilityHint {
    /// Legacy section label: `category + "." + entity_id`.
    pub fn source_section(&self) -> String {
        format!("{}.{}", self.category, self.entity_id)
    }
}

/// A [`FilteredContext`] with visibility filtering applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityAwareContext {
    /// The filtered base context (section content already removed).
    pub base: FilteredContext,
    /// Hints for AWARE sections.
    pub hints: Vec<VisibilityHint>,
    /// `category.entity` labels that had sections removed.
    pub excluded_sections: Vec<String>,
    /// The visibility level this filtering targeted.
    pub applied_level: VisibilityLevel,
    /// Sorted, deduplicated forbidden keywords from the visibility config.
    pub forbidden_keywords: Vec<String>,
}

impl VisibilityAwareContext {
    /// Wrap a base context with no hints or exclusions.
    pub fn new(base: FilteredContext, applied_level: VisibilityLevel) -> Self {
        Self {
            base,
            hints: Vec::new(),
            excluded_sections: Vec::new(),
            applied_level,
            forbidden_keywords: Vec::new(),
        }
    }

    /// Merge keywords into the forbidden set, keeping it sorted and unique.
    pub fn add_forbidden_keywords(&mut self, keywords: impl IntoIterator<Item = String>) {
        self.forbidden_keywords.extend(keywords);
        self.forbidden_keywords.sort();
        self.forbidden_keywords.dedup();
    }
}
