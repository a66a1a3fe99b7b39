//! Hint collection.
//!
//! Merges hints from the visibility context (strength 0.5) and HINT-action
//! foreshadowing instructions (strength 0.3) into one priority-sorted
//! [`HintCollection`].

use narra_core::{
    CollectedHint, ForeshadowAction, ForeshadowInstructions, HintCollection, HintSource,
    VisibilityAwareContext,
};

/// Strength assigned to visibility-derived hints.
const VISIBILITY_HINT_STRENGTH: f64 = 0.5;

/// Strength assigned to foreshadowing-derived hints.
const FORESHADOW_HINT_STRENGTH: f64 = 0.3;

/// Merges hints from visibility and foreshadowing sources.
#[derive(Clone, Copy, Debug, Default)]
pub struct HintCollector;

impl HintCollector {
    /// Create a collector.
    pub fn new() -> Self {
        Self
    }

    /// Collect hints from whichever sources exist.
    pub fn collect(
        &self,
        visibility: Option<&VisibilityAwareContext>,
        instructions: Option<&ForeshadowInstructions>,
    ) -> HintCollection {
        let mut hints = Vec::new();

        if let Some(visibility) = visibility {
            for hint in &visibility.hints {
                hints.push(CollectedHint {
                    source: HintSource::Visibility,
                    category: hint.category.clone(),
                    entity_id: hint.entity_id.clone(),
                    text: hint.hint_text.clone(),
                    strength: VISIBILITY_HINT_STRENGTH,
                });
            }
        }

        if let Some(instructions) = instructions {
            for instruction in &instructions.instructions {
                if instruction.action != ForeshadowAction::Hint {
                    continue;
                }
                let text = instruction.note.clone().unwrap_or_else(|| {
                    format!(
                        "伏線 {} をさりげなく想起させる描写を入れる",
                        instruction.foreshadowing_id
                    )
                });
                hints.push(CollectedHint {
                    source: HintSource::Foreshadowing,
                    category: "foreshadowing".to_owned(),
                    entity_id: instruction.foreshadowing_id.clone(),
                    text,
                    strength: FORESHADOW_HINT_STRENGTH,
                });
            }
        }

        HintCollection::from_hints(hints)
    }
}
