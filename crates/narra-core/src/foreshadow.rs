//! Foreshadowing entities and instructions.
//!
//! The registry entities are read-only inputs here; their lifecycle (status
//! transitions) is driven by the separate write facade. This module carries
//! the serde model of `registry.yaml` records, the per-scene instruction
//! values the generator produces, and the legal status-transition table for
//! validation elsewhere.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `FS-NNN-slug` id shape; the numeric portion is the plant episode.
static FORESHADOW_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^FS-(\d+)-[a-z0-9-]+$").expect("foreshadow id regex is valid"));

// ─────────────────────────────────────────────────────────────────────────────
// Status and action enums
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle status of a foreshadowing, as recorded in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForeshadowStatus {
    /// Registered but not yet planted in any episode.
    Registered,
    /// Planted in its plant episode.
    Planted,
    /// Reinforced at least once after planting.
    Reinforced,
    /// Paid off; no further touches.
    Revealed,
    /// Dropped from the narrative.
    Abandoned,
}

/// The action a scene should take for a foreshadowing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForeshadowAction {
    /// First appearance of the seed.
    Plant,
    /// Re-touch an already planted seed.
    Reinforce,
    /// A character-driven passing allusion.
    Hint,
    /// Nothing to do in this scene.
    None,
}

impl ForeshadowAction {
    /// Base subtlety target for the action, before the level adjustment.
    pub fn base_subtlety(self) -> i32 {
        match self {
            Self::Plant => 4,
            Self::Reinforce => 6,
            Self::Hint => 8,
            Self::None => 0,
        }
    }
}

/// Legal status transitions (`Registered → Planted → Reinforced* → Revealed`).
///
/// Abandonment is handled separately: any status may move to
/// [`ForeshadowStatus::Abandoned`].
pub const STATUS_TRANSITIONS: &[(ForeshadowStatus, ForeshadowStatus)] = &[
    (ForeshadowStatus::Registered, ForeshadowStatus::Planted),
    (ForeshadowStatus::Planted, ForeshadowStatus::Reinforced),
    (ForeshadowStatus::Reinforced, ForeshadowStatus::Reinforced),
    (ForeshadowStatus::Planted, ForeshadowStatus::Revealed),
    (ForeshadowStatus::Reinforced, ForeshadowStatus::Revealed),
];

/// Whether a status transition is legal for the write facade.
pub fn can_transition(from: ForeshadowStatus, to: ForeshadowStatus) -> bool {
    to == ForeshadowStatus::Abandoned || STATUS_TRANSITIONS.contains(&(from, to))
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry entity
// ─────────────────────────────────────────────────────────────────────────────

/// The seed side of a foreshadowing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeshadowSeed {
    /// What is planted.
    #[serde(default)]
    pub content: String,
    /// Author note on how to plant it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The payoff side of a foreshadowing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeshadowPayoff {
    /// What the payoff reveals.
    #[serde(default)]
    pub content: String,
    /// Episode the payoff is planned for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_episode: Option<String>,
    /// Author note on the payoff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Kind of a timeline event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineEventKind {
    /// The seed was planted.
    Planted,
    /// The seed was reinforced.
    Reinforced,
    /// The payoff happened.
    Revealed,
    /// Unrecognized event kind (forward compatibility).
    #[serde(other)]
    Other,
}

/// One recorded touch of a foreshadowing in an episode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Episode the event happened in.
    pub episode: String,
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: TimelineEventKind,
    /// Date the event was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// The expression used in prose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    /// Subtlety the touch was written at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtlety: Option<u8>,
}

/// Ordered event history of a foreshadowing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeshadowTimeline {
    /// Registration date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<String>,
    /// Ordered list of touches.
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
}

/// Entities related to a foreshadowing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeshadowRelated {
    /// Characters who carry the seed.
    #[serde(default)]
    pub characters: Vec<String>,
    /// Related plot threads.
    #[serde(default)]
    pub plot_threads: Vec<String>,
    /// Related locations.
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Per-foreshadowing AI visibility configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeshadowAiVisibility {
    /// Visibility level (0..3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// Keywords that must not appear in prose while the seed is live.
    #[serde(default)]
    pub forbidden_keywords: Vec<String>,
    /// Expressions the LLM may use to touch the seed.
    #[serde(default)]
    pub allowed_expressions: Vec<String>,
}

/// A foreshadowing record from the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Foreshadowing {
    /// Id matching `FS-NNN-slug`; `NNN` is the plant episode.
    pub id: String,
    /// Current lifecycle status.
    pub status: ForeshadowStatus,
    /// How subtle the seed is meant to be (1..=10).
    #[serde(default = "default_subtlety")]
    pub subtlety_level: u8,
    /// The seed.
    #[serde(default)]
    pub seed: ForeshadowSeed,
    /// The payoff.
    #[serde(default)]
    pub payoff: ForeshadowPayoff,
    /// Event history.
    #[serde(default)]
    pub timeline: ForeshadowTimeline,
    /// Related entities.
    #[serde(default)]
    pub related: ForeshadowRelated,
    /// AI visibility configuration.
    #[serde(default)]
    pub ai_visibility: ForeshadowAiVisibility,
}

fn default_subtlety() -> u8 {
    5
}

impl Foreshadowing {
    /// Whether the id matches the required `FS-NNN-slug` shape.
    pub fn has_valid_id(&self) -> bool {
        FORESHADOW_ID_RE.is_match(&self.id)
    }

    /// The plant episode number embedded in the id.
    pub fn plant_episode(&self) -> Option<u32> {
        let caps = FORESHADOW_ID_RE.captures(&self.id)?;
        caps.get(1)?.as_str().parse().ok()
    }

    /// The episode of the most recent timeline event, if any.
    pub fn last_event_episode(&self) -> Option<&str> {
        self.timeline.events.last().map(|e| e.episode.as_str())
    }

    /// Number of reinforcement events recorded so far.
    pub fn reinforcement_count(&self) -> usize {
        self.timeline
            .events
            .iter()
            .filter(|e| e.kind == TimelineEventKind::Reinforced)
            .count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instructions
// ─────────────────────────────────────────────────────────────────────────────

/// The subtlety target is outside 1..=10.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("subtlety target out of range: {0} (expected 1..=10)")]
pub struct SubtletyRangeError(pub i32);

/// A per-scene instruction for one foreshadowing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeshadowInstruction {
    /// Which foreshadowing this instruction is for.
    pub foreshadowing_id: String,
    /// What to do with it in this scene.
    pub action: ForeshadowAction,
    /// Expressions the LLM may use.
    pub allowed_expressions: Vec<String>,
    /// Expressions the LLM must not use.
    pub forbidden_expressions: Vec<String>,
    /// Free-form note for the LLM (seed description for plants).
    pub note: Option<String>,
    /// How obvious to make the touch: 1 (blatant) ..= 10 (barely perceptible).
    pub subtlety_target: u8,
}

impl ForeshadowInstruction {
    /// Create an instruction, validating the subtlety target range.
    pub fn new(
        foreshadowing_id: impl Into<String>,
        action: ForeshadowAction,
        subtlety_target: u8,
    ) -> Result<Self, SubtletyRangeError> {
        if !(1..=10).contains(&subtlety_target) {
            return Err(SubtletyRangeError(i32::from(subtlety_target)));
        }
        Ok(Self {
            foreshadowing_id: foreshadowing_id.into(),
            action,
            allowed_expressions: Vec::new(),
            forbidden_expressions: Vec::new(),
            note: None,
            subtlety_target,
        })
    }

    /// Whether the scene should actually touch this foreshadowing.
    pub fn should_act(&self) -> bool {
        self.action != ForeshadowAction::None
    }
}

/// Ordered instructions for one scene plus the global forbidden keywords.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeshadowInstructions {
    /// Instructions in identification order.
    pub instructions: Vec<ForeshadowInstruction>,
    /// Globally configured forbidden keywords.
    pub global_forbidden: Vec<String>,
}

impl ForeshadowInstructions {
    /// Sorted, deduplicated union of global keywords and every instruction's
    /// forbidden expressions.
    pub fn get_all_forbidden(&self) -> Vec<String> {
        let mut all = self.global_forbidden.clone();
        for instruction in &self.instructions {
            all.extend(instruction.forbidden_expressions.iter().cloned());
        }
        all.sort();
        all.dedup();
        all
    }

    /// Instruction count per action.
    pub fn count_by_action(&self) -> BTreeMap<ForeshadowAction, usize> {
        let mut counts = BTreeMap::new();
        for instruction in &self.instructions {
            *counts.entry(instruction.action).or_insert(0) += 1;
        }
        counts
    }

    /// Instructions whose action is not [`ForeshadowAction::None`].
    pub fn get_active_instructions(&self) -> Vec<&ForeshadowInstruction> {
        self.instructions.iter().filter(|i| i.should_act()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn instruction(id: &str, action: ForeshadowAction, forbidden: &[&str]) -> ForeshadowInstruction {
        let mut i = ForeshadowInstruction::new(id, action, 5).unwrap();
        i.forbidden_expressions = forbidden.iter().map(|s| (*s).to_owned()).collect();
        i
    }

    #[test]
    fn test_plant_episode_from_id() {
        let fs = Foreshadowing {
            id: "FS-010-secret".into(),
            status: ForeshadowStatus::Registered,
            subtlety_level: 7,
            seed: ForeshadowSeed::default(),
            payoff: ForeshadowPayoff::default(),
            timeline: ForeshadowTimeline::default(),
            related: ForeshadowRelated::default(),
            ai_visibility: ForeshadowAiVisibility::default(),
        };
        assert!(fs.has_valid_id());
        assert_eq!(fs.plant_episode(), Some(10));
    }

    #[test]
    fn test_invalid_id_shapes() {
        let mut fs = Foreshadowing {
            id: "FS-10".into(),
            status: ForeshadowStatus::Registered,
            subtlety_level: 5,
            seed: ForeshadowSeed::default(),
            payoff: ForeshadowPayoff::default(),
            timeline: ForeshadowTimeline::default(),
            related: ForeshadowRelated::default(),
            ai_visibility: ForeshadowAiVisibility::default(),
        };
        assert!(!fs.has_valid_id());
        fs.id = "fs-010-secret".into();
        assert!(!fs.has_valid_id());
        fs.id = "FS-010-Secret".into();
        assert!(!fs.has_valid_id());
    }

    #[test]
    fn test_transition_table() {
        use ForeshadowStatus::{Abandoned, Planted, Registered, Reinforced, Revealed};
        assert!(can_transition(Registered, Planted));
        assert!(can_transition(Planted, Reinforced));
        assert!(can_transition(Reinforced, Reinforced));
        assert!(can_transition(Planted, Revealed));
        assert!(can_transition(Reinforced, Revealed));
        assert!(can_transition(Registered, Abandoned));
        assert!(can_transition(Revealed, Abandoned));
        assert!(!can_transition(Registered, Reinforced));
        assert!(!can_transition(Revealed, Planted));
        assert!(!can_transition(Abandoned, Planted));
    }

    #[test]
    fn test_instruction_validates_subtlety() {
        assert_matches!(
            ForeshadowInstruction::new("FS-001-a", ForeshadowAction::Plant, 0),
            Err(SubtletyRangeError(0))
        );
        assert_matches!(
            ForeshadowInstruction::new("FS-001-a", ForeshadowAction::Plant, 11),
            Err(SubtletyRangeError(11))
        );
        assert!(ForeshadowInstruction::new("FS-001-a", ForeshadowAction::Plant, 10).is_ok());
    }

    #[test]
    fn test_should_act() {
        let active = instruction("FS-001-a", ForeshadowAction::Hint, &[]);
        let inactive = instruction("FS-001-b", ForeshadowAction::None, &[]);
        assert!(active.should_act());
        assert!(!inactive.should_act());
    }

    #[test]
    fn test_get_all_forbidden_sorted_dedup() {
        let instructions = ForeshadowInstructions {
            instructions: vec![
                instruction("FS-001-a", ForeshadowAction::Plant, &["王族", "秘密"]),
                instruction("FS-002-b", ForeshadowAction::Hint, &["秘密"]),
            ],
            global_forbidden: vec!["真の名前".into()],
        };
        assert_eq!(
            instructions.get_all_forbidden(),
            vec!["王族", "真の名前", "秘密"]
        );
    }

    #[test]
    fn test_count_by_action() {
        let instructions = ForeshadowInstructions {
            instructions: vec![
                instruction("FS-001-a", ForeshadowAction::Plant, &[]),
                instruction("FS-002-b", ForeshadowAction::Plant, &[]),
                instruction("FS-003-c", ForeshadowAction::Hint, &[]),
            ],
            global_forbidden: Vec::new(),
        };
        let counts = instructions.count_by_action();
        assert_eq!(counts[&ForeshadowAction::Plant], 2);
        assert_eq!(counts[&ForeshadowAction::Hint], 1);
        assert!(!counts.contains_key(&ForeshadowAction::Reinforce));
    }

    #[test]
    fn test_active_instructions_excludes_none() {
        let instructions = ForeshadowInstructions {
            instructions: vec![
                instruction("FS-001-a", ForeshadowAction::Plant, &[]),
                instruction("FS-002-b", ForeshadowAction::None, &[]),
            ],
            global_forbidden: Vec::new(),
        };
        let active = instructions.get_active_instructions();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].foreshadowing_id, "FS-001-a");
    }

    #[test]
    fn test_reinforcement_count() {
        let fs = Foreshadowing {
            id: "FS-003-ring".into(),
            status: ForeshadowStatus::Reinforced,
            subtlety_level: 5,
            seed: ForeshadowSeed::default(),
            payoff: ForeshadowPayoff::default(),
            timeline: ForeshadowTimeline {
                registered_at: None,
                events: vec![
                    TimelineEvent {
                        episode: "ep003".into(),
                        kind: TimelineEventKind::Planted,
                        date: None,
                        expression: None,
                        subtlety: None,
                    },
                    TimelineEvent {
                        episode: "ep005".into(),
                        kind: TimelineEventKind::Reinforced,
                        date: None,
                        expression: None,
                        subtlety: None,
                    },
                ],
            },
            related: ForeshadowRelated::default(),
            ai_visibility: ForeshadowAiVisibility::default(),
        };
        assert_eq!(fs.reinforcement_count(), 1);
        assert_eq!(fs.last_event_episode(), Some("ep005"));
    }
}
