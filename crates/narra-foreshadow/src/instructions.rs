//! Instruction generation.
//!
//! Turns relevance decisions into per-item instructions. The subtlety target
//! starts from the action's base (plant 4, reinforce 6, hint 8) and moves in
//! integer half-steps of the record's distance from the neutral level 5, so
//! high-subtlety foreshadowings push the target upward. Targets clamp to
//! 1..=10.

use tracing::warn;

use narra_core::{
    ForeshadowAction, ForeshadowInstruction, ForeshadowInstructions, Foreshadowing,
};

use crate::identifier::IdentifiedForeshadowing;

/// Generates scene instructions from relevance decisions.
#[derive(Clone, Debug, Default)]
pub struct InstructionGenerator {
    global_forbidden: Vec<String>,
}

impl InstructionGenerator {
    /// Create a generator with no global forbidden keywords.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the globally configured forbidden keywords carried on every
    /// instruction aggregate.
    #[must_use]
    pub fn with_global_forbidden(mut self, keywords: Vec<String>) -> Self {
        self.global_forbidden = keywords;
        self
    }

    /// Build instructions for the identified items, preserving their order.
    ///
    /// Decisions whose record is missing from `records` are skipped with a
    /// warning; that indicates registry drift between identification and
    /// generation.
    pub fn generate(
        &self,
        records: &[Foreshadowing],
        identified: &[IdentifiedForeshadowing],
    ) -> ForeshadowInstructions {
        let mut instructions = Vec::with_capacity(identified.len());

        for decision in identified {
            let Some(record) = records.iter().find(|r| r.id == decision.id) else {
                warn!(id = %decision.id, "identified foreshadowing missing from registry");
                continue;
            };

            let target = subtlety_target(decision.suggested_action, record.subtlety_level);
            let Ok(mut instruction) =
                ForeshadowInstruction::new(&decision.id, decision.suggested_action, target)
            else {
                // Unreachable after clamping; skip rather than abort the scene.
                warn!(id = %decision.id, target, "subtlety target out of range");
                continue;
            };

            instruction.allowed_expressions = record.ai_visibility.allowed_expressions.clone();
            instruction.forbidden_expressions = record.ai_visibility.forbidden_keywords.clone();
            if decision.suggested_action == ForeshadowAction::Plant {
                instruction.note = record.seed.description.clone();
            }

            instructions.push(instruction);
        }

        ForeshadowInstructions {
            instructions,
            global_forbidden: self.global_forbidden.clone(),
        }
    }

    /// Sorted, deduplicated union of global keywords and every instruction's
    /// forbidden expressions.
    pub fn collect_forbidden_keywords(&self, instructions: &ForeshadowInstructions) -> Vec<String> {
        instructions.get_all_forbidden()
    }
}

/// `clamp(base_by_action + (level - 5) / 2, 1, 10)`.
fn subtlety_target(action: ForeshadowAction, subtlety_level: u8) -> u8 {
    let adjustment = (i32::from(subtlety_level) - 5) / 2;
    let target = (action.base_subtlety() + adjustment).clamp(1, 10);
    u8::try_from(target).unwrap_or(1)
}
