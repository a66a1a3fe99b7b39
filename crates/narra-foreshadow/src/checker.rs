//! Scene foreshadowing check.
//!
//! Auxiliary report for a scene: what should be planted or reinforced, which
//! payoffs are approaching, and alerts for seeds that have gone silent too
//! long. The scene check surfaces `LongSilence`; the other alert types are
//! part of the shared vocabulary for report producers elsewhere.

use serde::{Deserialize, Serialize};

use narra_core::scene::normalize_episode_number;
use narra_core::{
    ForeshadowAction, ForeshadowInstruction, ForeshadowStatus, Foreshadowing, SceneIdentifier,
};

use crate::identifier::ForeshadowingIdentifier;
use crate::instructions::InstructionGenerator;

/// Episodes of silence after which a live seed triggers an alert.
pub const DEFAULT_SILENCE_THRESHOLD: u32 = 5;

/// Episodes ahead within which a planned payoff counts as approaching.
pub const DEFAULT_PAYOFF_THRESHOLD: u32 = 3;

/// Severity of a foreshadowing alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Needs immediate author attention.
    Critical,
    /// Should be looked at soon.
    Warning,
    /// Informational.
    Info,
}

/// Kind of a foreshadowing alert.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// A planned payoff is due.
    PayoffReminder,
    /// A live seed has not been touched for too long.
    LongSilence,
    /// A seed was never paid off.
    UnclosedForeshadowing,
    /// Prose looks like an unregistered seed.
    UnintentionalForeshadowing,
    /// A good episode for a payoff.
    PayoffTimingSuggestion,
}

/// One alert in the scene report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeshadowAlert {
    /// Alert kind.
    pub alert_type: AlertType,
    /// Alert severity.
    pub severity: AlertSeverity,
    /// The foreshadowing the alert is about.
    pub foreshadowing_id: String,
    /// Human-readable message.
    pub message: String,
}

/// A plant or reinforce suggestion with authoring context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeshadowSuggestion {
    /// The foreshadowing id.
    pub id: String,
    /// Seed content as title.
    pub title: String,
    /// Episode of the last recorded touch.
    pub last_mentioned_episode: Option<String>,
    /// Episodes between the last touch and this scene.
    pub episodes_since: Option<u32>,
    /// The record's subtlety level.
    pub current_subtlety: u8,
    /// Author note on the seed.
    pub seed_description: Option<String>,
}

/// A payoff approaching within the payoff threshold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffApproach {
    /// The foreshadowing id.
    pub id: String,
    /// Seed content as title.
    pub title: String,
    /// The planned payoff episode.
    pub planned_episode: String,
    /// Episodes until the payoff.
    pub episodes_until: u32,
    /// Reinforcements recorded so far.
    pub reinforcement_count: usize,
}

/// The full per-scene foreshadowing report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneForeshadowingCheck {
    /// The scene's episode id.
    pub episode_id: String,
    /// Seeds to plant in this scene.
    pub should_plant: Vec<ForeshadowSuggestion>,
    /// Seeds to reinforce in this scene.
    pub should_reinforce: Vec<ForeshadowSuggestion>,
    /// Payoffs approaching within the threshold.
    pub approaching_payoff: Vec<PayoffApproach>,
    /// Generated instructions with an action.
    pub active_instructions: Vec<ForeshadowInstruction>,
    /// Alerts (`LongSilence` from this check).
    pub alerts: Vec<ForeshadowAlert>,
    /// One-line human summary.
    pub summary: String,
}

/// Produces [`SceneForeshadowingCheck`] reports.
#[derive(Clone, Debug)]
pub struct SceneForeshadowingChecker {
    identifier: ForeshadowingIdentifier,
    generator: InstructionGenerator,
    silence_threshold: u32,
    payoff_threshold: u32,
}

impl Default for SceneForeshadowingChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneForeshadowingChecker {
    /// Create a checker with default thresholds.
    pub fn new() -> Self {
        Self {
            identifier: ForeshadowingIdentifier::new(),
            generator: InstructionGenerator::new(),
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            payoff_threshold: DEFAULT_PAYOFF_THRESHOLD,
        }
    }

    /// Override the silence threshold.
    #[must_use]
    pub fn with_silence_threshold(mut self, episodes: u32) -> Self {
        self.silence_threshold = episodes;
        self
    }

    /// Override the payoff threshold.
    #[must_use]
    pub fn with_payoff_threshold(mut self, episodes: u32) -> Self {
        self.payoff_threshold = episodes;
        self
    }

    /// Build the report for a scene.
    pub fn check(
        &self,
        records: &[Foreshadowing],
        scene: &SceneIdentifier,
        appearing_characters: &[String],
    ) -> SceneForeshadowingCheck {
        let scene_episode = scene.episode_number();
        let identified = self.identifier.identify(records, scene, appearing_characters);
        let instructions = self.generator.generate(records, &identified);

        let mut should_plant = Vec::new();
        let mut should_reinforce = Vec::new();
        for decision in &identified {
            let Some(record) = records.iter().find(|r| r.id == decision.id) else {
                continue;
            };
            match decision.suggested_action {
                ForeshadowAction::Plant => {
                    should_plant.push(suggestion(record, scene_episode));
                }
                ForeshadowAction::Reinforce => {
                    should_reinforce.push(suggestion(record, scene_episode));
                }
                ForeshadowAction::Hint | ForeshadowAction::None => {}
            }
        }

        let approaching_payoff = self.approaching_payoffs(records, scene_episode);
        let alerts = self.silence_alerts(records, scene_episode);

        let summary = format!(
            "plant: {}, reinforce: {}, approaching payoff: {}, alerts: {}",
            should_plant.len(),
            should_reinforce.len(),
            approaching_payoff.len(),
            alerts.len()
        );

        SceneForeshadowingCheck {
            episode_id: scene.episode_id.clone(),
            should_plant,
            should_reinforce,
            approaching_payoff,
            active_instructions: instructions
                .get_active_instructions()
                .into_iter()
                .cloned()
                .collect(),
            alerts,
            summary,
        }
    }

    fn approaching_payoffs(
        &self,
        records: &[Foreshadowing],
        scene_episode: Option<u32>,
    ) -> Vec<PayoffApproach> {
        let Some(current) = scene_episode else {
            return Vec::new();
        };
        records
            .iter()
            .filter(|r| r.status != ForeshadowStatus::Revealed)
            .filter_map(|record| {
                let planned = record.payoff.planned_episode.as_deref()?;
                let planned_number = normalize_episode_number(planned)?;
                let episodes_until = planned_number.checked_sub(current)?;
                (episodes_until <= self.payoff_threshold).then(|| PayoffApproach {
                    id: record.id.clone(),
                    title: record.seed.content.clone(),
                    planned_episode: planned.to_owned(),
                    episodes_until,
                    reinforcement_count: record.reinforcement_count(),
                })
            })
            .collect()
    }

    fn silence_alerts(
        &self,
        records: &[Foreshadowing],
        scene_episode: Option<u32>,
    ) -> Vec<ForeshadowAlert> {
        let Some(current) = scene_episode else {
            return Vec::new();
        };
        records
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    ForeshadowStatus::Planted | ForeshadowStatus::Reinforced
                )
            })
            .filter_map(|record| {
                let last = record.last_event_episode()?;
                let last_number = normalize_episode_number(last)?;
                let silent_for = current.checked_sub(last_number)?;
                (silent_for >= self.silence_threshold).then(|| ForeshadowAlert {
                    alert_type: AlertType::LongSilence,
                    severity: AlertSeverity::Warning,
                    foreshadowing_id: record.id.clone(),
                    message: format!(
                        "{} has not been touched for {silent_for} episodes (last: {last})",
                        record.id
                    ),
                })
            })
            .collect()
    }
}

fn suggestion(record: &Foreshadowing, scene_episode: Option<u32>) -> ForeshadowSuggestion {
    let last = record.last_event_episode().map(str::to_owned);
    let episodes_since = match (&last, scene_episode) {
        (Some(last), Some(current)) => {
            normalize_episode_number(last).and_then(|n| current.checked_sub(n))
        }
        _ => None,
    };
    ForeshadowSuggestion {
        id: record.id.clone(),
        title: record.seed.content.clone(),
        last_mentioned_episode: last,
        episodes_since,
        current_subtlety: record.subtlety_level,
        seed_description: record.seed.description.clone(),
    }
}
