//! Foreshadowing registry.
//!
//! `_foreshadowing/registry.yaml` is the read-only source of foreshadowing
//! records. The write facade owns mutations; here the registry only loads
//! and serializes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use narra_core::Foreshadowing;

use crate::errors::Result;

/// The registry file (`_foreshadowing/registry.yaml`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeshadowingRegistry {
    /// Format version.
    #[serde(default)]
    pub version: String,
    /// Last update date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// The foreshadowing records.
    #[serde(default)]
    pub foreshadowing: Vec<Foreshadowing>,
}

impl ForeshadowingRegistry {
    /// Parse registry YAML.
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load the registry from a file. A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no foreshadowing registry, starting empty");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Serialize back to YAML (round-trip with [`ForeshadowingRegistry::parse`]).
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narra_core::foreshadow::ForeshadowStatus;

    const REGISTRY: &str = r#"
version: "1.0"
last_updated: 2026-08-01
foreshadowing:
  - id: FS-010-secret
    status: registered
    subtlety_level: 7
    seed:
      content: 王家の紋章
      description: hint naturally
    payoff:
      content: 正体の開示
      planned_episode: ep024
    timeline:
      registered_at: 2026-07-01
      events:
        - episode: ep003
          type: planted
          date: 2026-07-02
          expression: ペンダントが光る
          subtlety: 8
    related:
      characters: [Alice]
      plot_threads: []
      locations: []
    ai_visibility:
      level: 1
      forbidden_keywords: [王族]
      allowed_expressions: [古いペンダント]
"#;

    #[test]
    fn test_parse_registry() {
        let registry = ForeshadowingRegistry::parse(REGISTRY).unwrap();
        assert_eq!(registry.version, "1.0");
        assert_eq!(registry.foreshadowing.len(), 1);

        let fs = &registry.foreshadowing[0];
        assert_eq!(fs.id, "FS-010-secret");
        assert_eq!(fs.status, ForeshadowStatus::Registered);
        assert_eq!(fs.subtlety_level, 7);
        assert_eq!(fs.seed.description.as_deref(), Some("hint naturally"));
        assert_eq!(fs.payoff.planned_episode.as_deref(), Some("ep024"));
        assert_eq!(fs.timeline.events.len(), 1);
        assert_eq!(fs.related.characters, vec!["Alice"]);
        assert_eq!(fs.ai_visibility.forbidden_keywords, vec!["王族"]);
        assert_eq!(fs.plant_episode(), Some(10));
    }

    #[test]
    fn test_empty_content_is_empty_registry() {
        let registry = ForeshadowingRegistry::parse("").unwrap();
        assert!(registry.foreshadowing.is_empty());
    }

    #[test]
    fn test_missing_file_is_empty_registry() {
        let registry = ForeshadowingRegistry::load(Path::new("/nonexistent/registry.yaml")).unwrap();
        assert!(registry.foreshadowing.is_empty());
    }

    #[test]
    fn test_roundtrip() {
        let registry = ForeshadowingRegistry::parse(REGISTRY).unwrap();
        let yaml = registry.to_yaml().unwrap();
        let reparsed = ForeshadowingRegistry::parse(&yaml).unwrap();
        assert_eq!(reparsed, registry);
    }
}
