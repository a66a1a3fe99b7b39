//! Unified filtered context.
//!
//! [`FilteredContext`] holds everything the collectors gathered for one scene,
//! already phase-filtered. It is the `base` of a build result and the input
//! to visibility filtering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scene::SceneIdentifier;

/// The unified, phase-filtered prompt material for one scene.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredContext {
    /// Overall theme plot (L1).
    pub plot_l1: Option<String>,
    /// Chapter plot (L2).
    pub plot_l2: Option<String>,
    /// Episode plot (L3).
    pub plot_l3: Option<String>,
    /// Overall summary (L1).
    pub summary_l1: Option<String>,
    /// Chapter summary (L2).
    pub summary_l2: Option<String>,
    /// Previous-episode summary (L3).
    pub summary_l3: Option<String>,
    /// Character name → phase-filtered sheet markdown.
    pub characters: BTreeMap<String, String>,
    /// World-setting name → phase-filtered sheet markdown.
    pub world_settings: BTreeMap<String, String>,
    /// Style guide text.
    pub style_guide: Option<String>,
    /// The scene this context was built for.
    pub scene: SceneIdentifier,
    /// Warnings accumulated while collecting.
    pub warnings: Vec<String>,
}

impl FilteredContext {
    /// Create an empty context for a scene.
    pub fn new(scene: SceneIdentifier) -> Self {
        Self {
            plot_l1: None,
            plot_l2: None,
            plot_l3: None,
            summary_l1: None,
            summary_l2: None,
            summary_l3: None,
            characters: BTreeMap::new(),
            world_settings: BTreeMap::new(),
            style_guide: None,
            scene,
            warnings: Vec::new(),
        }
    }

    /// The current narrative phase of the originating scene.
    pub fn phase(&self) -> Option<&str> {
        self.scene.current_phase.as_deref()
    }

    /// Merge `other` into `self`.
    ///
    /// Self's non-null scalars win; mappings are unioned with
    /// self-precedence; warning lists concatenate in order.
    #[must_use]
    pub fn merge(mut self, other: FilteredContext) -> FilteredContext {
        self.plot_l1 = self.plot_l1.or(other.plot_l1);
        self.plot_l2 = self.plot_l2.or(other.plot_l2);
        self.plot_l3 = self.plot_l3.or(other.plot_l3);
        self.summary_l1 = self.summary_l1.or(other.summary_l1);
        self.summary_l2 = self.summary_l2.or(other.summary_l2);
        self.summary_l3 = self.summary_l3.or(other.summary_l3);
        self.style_guide = self.style_guide.or(other.style_guide);
        for (name, sheet) in other.characters {
            let _ = self.characters.entry(name).or_insert(sheet);
        }
        for (name, sheet) in other.world_settings {
            let _ = self.world_settings.entry(name).or_insert(sheet);
        }
        self.warnings.extend(other.warnings);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> FilteredContext {
        FilteredContext::new(SceneIdentifier::new("ep001"))
    }

    #[test]
    fn test_new_is_empty() {
        let c = ctx();
        assert!(c.plot_l1.is_none());
        assert!(c.characters.is_empty());
        assert!(c.warnings.is_empty());
    }

    #[test]
    fn test_merge_scalar_self_wins() {
        let mut a = ctx();
        a.plot_l1 = Some("theme A".into());
        let mut b = ctx();
        b.plot_l1 = Some("theme B".into());
        b.plot_l3 = Some("scene B".into());

        let merged = a.merge(b);
        assert_eq!(merged.plot_l1.as_deref(), Some("theme A"));
        assert_eq!(merged.plot_l3.as_deref(), Some("scene B"));
    }

    #[test]
    fn test_merge_maps_self_precedence() {
        let mut a = ctx();
        let _ = a.characters.insert("Alice".into(), "A sheet".into());
        let mut b = ctx();
        let _ = b.characters.insert("Alice".into(), "B sheet".into());
        let _ = b.characters.insert("Bob".into(), "Bob sheet".into());

        let merged = a.merge(b);
        assert_eq!(merged.characters["Alice"], "A sheet");
        assert_eq!(merged.characters["Bob"], "Bob sheet");
    }

    #[test]
    fn test_merge_concatenates_warnings() {
        let mut a = ctx();
        a.warnings.push("first".into());
        let mut b = ctx();
        b.warnings.push("second".into());

        let merged = a.merge(b);
        assert_eq!(merged.warnings, vec!["first", "second"]);
    }

    #[test]
    fn test_phase_comes_from_scene() {
        let c = FilteredContext::new(SceneIdentifier::new("ep001").with_phase("climax"));
        assert_eq!(c.phase(), Some("climax"));
    }
}
