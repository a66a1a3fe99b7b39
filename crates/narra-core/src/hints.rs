//! Collected prompt hints.
//!
//! Hints from visibility filtering and foreshadowing instructions are merged
//! into one prioritized bag. Priority is `source weight × strength`; the
//! weight table is a module-level constant per source.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Where a hint came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintSource {
    /// Foreshadowing HINT instruction.
    Foreshadowing,
    /// AWARE section from visibility filtering.
    Visibility,
    /// Character-derived hint.
    Character,
    /// World-setting-derived hint.
    World,
}

impl HintSource {
    /// Priority weight of the source.
    pub const fn weight(self) -> f64 {
        match self {
            Self::Foreshadowing => 1.0,
            Self::Visibility => 0.8,
            Self::Character => 0.6,
            Self::World => 0.5,
        }
    }
}

/// A single prompt hint with its provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectedHint {
    /// Source the hint came from.
    pub source: HintSource,
    /// Category label, e.g. `character` or `foreshadowing`.
    pub category: String,
    /// Entity the hint is about.
    pub entity_id: String,
    /// The hint text.
    pub text: String,
    /// How strongly the hint should influence the prompt (0..=1).
    pub strength: f64,
}

impl CollectedHint {
    /// Computed priority: source weight × strength.
    pub fn priority(&self) -> f64 {
        self.source.weight() * self.strength
    }

    /// Tier word for prompt rendering, keyed on strength.
    fn strength_tier(&self) -> &'static str {
        if self.strength >= 0.7 {
            "重要"
        } else if self.strength >= 0.4 {
            "中程度"
        } else {
            "控えめ"
        }
    }
}

/// A priority-sorted bag of hints with category and entity indices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HintCollection {
    hints: Vec<CollectedHint>,
    by_category: HashMap<String, Vec<usize>>,
    by_entity: HashMap<String, Vec<usize>>,
}

impl HintCollection {
    /// Build a collection from hints, sorting by descending priority.
    ///
    /// The sort is stable: hints with equal priority keep insertion order.
    pub fn from_hints(mut hints: Vec<CollectedHint>) -> Self {
        hints.sort_by(|a, b| {
            b.priority()
                .partial_cmp(&a.priority())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut by_category: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_entity: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, hint) in hints.iter().enumerate() {
            by_category.entry(hint.category.clone()).or_default().push(idx);
            by_entity.entry(hint.entity_id.clone()).or_default().push(idx);
        }

        Self {
            hints,
            by_category,
            by_entity,
        }
    }

    /// All hints, highest priority first.
    pub fn hints(&self) -> &[CollectedHint] {
        &self.hints
    }

    /// Hints for a category, in priority order.
    pub fn for_category(&self, category: &str) -> Vec<&CollectedHint> {
        self.by_category
            .get(category)
            .map(|indices| indices.iter().map(|&i| &self.hints[i]).collect())
            .unwrap_or_default()
    }

    /// Hints for an entity, in priority order.
    pub fn for_entity(&self, entity_id: &str) -> Vec<&CollectedHint> {
        self.by_entity
            .get(entity_id)
            .map(|indices| indices.iter().map(|&i| &self.hints[i]).collect())
            .unwrap_or_default()
    }

    /// Number of hints.
    pub fn len(&self) -> usize {
        self.hints.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    /// Render the top `n` hints as prompt bullets with strength tier words.
    pub fn format_for_prompt(&self, n: usize) -> String {
        self.hints
            .iter()
            .take(n)
            .map(|hint| format!("- 【{}】{}", hint.strength_tier(), hint.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
