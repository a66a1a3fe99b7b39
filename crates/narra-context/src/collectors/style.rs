//! Style guide collector.

use std::sync::Arc;

use narra_core::SceneIdentifier;
use narra_vault::{LazyFileLoader, LoadPriority, layout};

use super::Collector;
use crate::errors::Result;

/// Heading inserted between the default guide and a scene override.
const OVERRIDE_HEADING: &str = "## シーン固有スタイル";

/// The merged style guide for a scene.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleContext {
    /// Merged guide text, if any guide exists.
    pub style_guide: Option<String>,
    /// Non-fatal notes.
    pub warnings: Vec<String>,
}

/// Collects the default style guide plus per-episode / per-chapter overrides.
pub struct StyleGuideCollector {
    loader: Arc<LazyFileLoader>,
}

impl StyleGuideCollector {
    /// Create a style guide collector.
    pub fn new(loader: Arc<LazyFileLoader>) -> Self {
        Self { loader }
    }

    /// The first existing override: episode first, then chapter.
    fn load_override(&self, scene: &SceneIdentifier, warnings: &mut Vec<String>) -> Option<String> {
        let episode = self
            .loader
            .load(&layout::style_episode(&scene.episode_id), LoadPriority::Optional);
        warnings.extend(episode.warnings.iter().cloned());
        if let Some(text) = episode.text() {
            return Some(text.to_owned());
        }

        let chapter = scene.chapter_id.as_deref()?;
        let result = self
            .loader
            .load(&layout::style_chapter(chapter), LoadPriority::Optional);
        warnings.extend(result.warnings.iter().cloned());
        result.text().map(str::to_owned)
    }
}

impl Collector for StyleGuideCollector {
    type Output = StyleContext;

    fn name(&self) -> &'static str {
        "style"
    }

    fn collect(&self, scene: &SceneIdentifier) -> Result<StyleContext> {
        let mut warnings = Vec::new();

        let result = self
            .loader
            .load(layout::STYLE_DEFAULT_FILE, LoadPriority::Required);
        let default = if result.success {
            result.text().map(str::to_owned)
        } else {
            if let Some(error) = result.error {
                warnings.push(error);
            }
            None
        };

        let scene_override = self.load_override(scene, &mut warnings);

        let style_guide = match (default, scene_override) {
            (Some(default), Some(over)) => {
                Some(format!("{default}\n\n---\n\n{OVERRIDE_HEADING}\n{over}"))
            }
            (Some(default), None) => Some(default),
            (None, Some(over)) => Some(over),
            (None, None) => None,
        };

        Ok(StyleContext {
            style_guide,
            warnings,
        })
    }

    fn collect_as_string(&self, scene: &SceneIdentifier) -> Result<Option<String>> {
        Ok(self.collect(scene)?.style_guide)
    }
}
