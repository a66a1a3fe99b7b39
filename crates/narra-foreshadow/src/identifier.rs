//! Foreshadowing relevance.
//!
//! For each registry record the rules below are tested in order and the
//! first match wins, so every foreshadowing id appears at most once:
//!
//! 1. **Plant** — registered, and the plant episode embedded in the id is
//!    this scene's episode.
//! 2. **Reinforce (timeline)** — planted/reinforced, and a `reinforced`
//!    timeline event references this scene's episode.
//! 3. **Hint** — planted, and a related character appears in the scene.
//! 4. **Reinforce (reveal approach)** — not yet revealed, and the payoff is
//!    planned for this scene's episode.
//!
//! Episode comparisons go through id normalization, so `ep010`, `EP-010`,
//! and `10` are the same episode.

use serde::{Deserialize, Serialize};
use tracing::debug;

use narra_core::foreshadow::TimelineEventKind;
use narra_core::scene::normalize_episode_number;
use narra_core::{ForeshadowAction, ForeshadowStatus, Foreshadowing, SceneIdentifier};

/// One relevance decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedForeshadowing {
    /// The foreshadowing id.
    pub id: String,
    /// The action this scene should take.
    pub suggested_action: ForeshadowAction,
    /// Status at decision time.
    pub status: ForeshadowStatus,
    /// Human-readable reason for the decision.
    pub relevance_reason: String,
}

/// Decides which foreshadowing records are relevant to a scene.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForeshadowingIdentifier;

impl ForeshadowingIdentifier {
    /// Create an identifier.
    pub fn new() -> Self {
        Self
    }

    /// Run the relevance rules over the registry records.
    ///
    /// `appearing_characters` drives the hint rule; decisions keep registry
    /// order.
    pub fn identify(
        &self,
        records: &[Foreshadowing],
        scene: &SceneIdentifier,
        appearing_characters: &[String],
    ) -> Vec<IdentifiedForeshadowing> {
        let scene_episode = scene.episode_number();
        let mut identified = Vec::new();

        for record in records {
            if let Some(decision) = self.identify_one(record, scene_episode, appearing_characters) {
                debug!(id = %decision.id, action = ?decision.suggested_action, "foreshadowing relevant");
                identified.push(decision);
            }
        }

        identified
    }

    fn identify_one(
        &self,
        record: &Foreshadowing,
        scene_episode: Option<u32>,
        appearing_characters: &[String],
    ) -> Option<IdentifiedForeshadowing> {
        // Rule 1: plant in the episode embedded in the id.
        if record.status == ForeshadowStatus::Registered
            && scene_episode.is_some()
            && record.plant_episode() == scene_episode
        {
            return Some(decision(
                record,
                ForeshadowAction::Plant,
                "registered and this is its plant episode",
            ));
        }

        // Rule 2: a reinforcement event scheduled for this episode.
        if matches!(
            record.status,
            ForeshadowStatus::Planted | ForeshadowStatus::Reinforced
        ) && record.timeline.events.iter().any(|e| {
            e.kind == TimelineEventKind::Reinforced
                && scene_episode.is_some()
                && normalize_episode_number(&e.episode) == scene_episode
        }) {
            return Some(decision(
                record,
                ForeshadowAction::Reinforce,
                "timeline schedules a reinforcement in this episode",
            ));
        }

        // Rule 3: a related character appears in the scene.
        if record.status == ForeshadowStatus::Planted
            && record
                .related
                .characters
                .iter()
                .any(|c| appearing_characters.contains(c))
        {
            return Some(decision(
                record,
                ForeshadowAction::Hint,
                "a related character appears in this scene",
            ));
        }

        // Rule 4: the payoff is planned for this episode; prepare the reveal.
        if record.status != ForeshadowStatus::Revealed
            && record
                .payoff
                .planned_episode
                .as_deref()
                .and_then(normalize_episode_number)
                .is_some_and(|planned| Some(planned) == scene_episode)
        {
            return Some(decision(
                record,
                ForeshadowAction::Reinforce,
                "payoff is planned for this episode",
            ));
        }

        None
    }
}

fn decision(
    record: &Foreshadowing,
    action: ForeshadowAction,
    reason: &str,
) -> IdentifiedForeshadowing {
    IdentifiedForeshadowing {
        id: record.id.clone(),
        suggested_action: action,
        status: record.status,
        relevance_reason: reason.to_owned(),
    }
}
