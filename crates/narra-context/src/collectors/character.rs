//! Character collector.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use narra_core::SceneIdentifier;
use narra_vault::resolver::ExtractedRefs;
use narra_vault::{LazyFileLoader, LoadPriority, SceneResolver, Sheet, layout};

use super::Collector;
use crate::errors::Result;
use crate::phase_filter::PhaseFilter;

/// Phase-filtered character sheets for a scene.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharacterContext {
    /// Character name to rendered sheet markdown.
    pub characters: BTreeMap<String, String>,
    /// Non-fatal notes (missing sheets, parse failures).
    pub warnings: Vec<String>,
}

/// Collects the characters referenced by a scene.
pub struct CharacterCollector {
    loader: Arc<LazyFileLoader>,
    resolver: Arc<SceneResolver>,
    phase_filter: PhaseFilter,
}

impl CharacterCollector {
    /// Create a character collector.
    pub fn new(
        loader: Arc<LazyFileLoader>,
        resolver: Arc<SceneResolver>,
        phase_filter: PhaseFilter,
    ) -> Self {
        Self {
            loader,
            resolver,
            phase_filter,
        }
    }

    /// References from the episode file and the episode plot, unioned.
    fn scene_references(&self, scene: &SceneIdentifier) -> ExtractedRefs {
        let mut refs = ExtractedRefs::default();
        if let Some(path) = self.resolver.episode_path(scene) {
            if let Some(text) = self.loader.load(&path, LoadPriority::Optional).text() {
                refs.extend(self.resolver.extract_references(text));
            }
        }
        if let Some(text) = self
            .loader
            .load(&layout::plot_l3(&scene.episode_id), LoadPriority::Optional)
            .text()
        {
            refs.extend(self.resolver.extract_references(text));
        }
        refs
    }
}

impl Collector for CharacterCollector {
    type Output = CharacterContext;

    fn name(&self) -> &'static str {
        "character"
    }

    fn collect(&self, scene: &SceneIdentifier) -> Result<CharacterContext> {
        let mut ctx = CharacterContext::default();
        let refs = self.scene_references(scene);
        debug!(count = refs.characters.len(), "character references extracted");

        for name in &refs.characters {
            let path = layout::character(name);
            let result = self.loader.load(&path, LoadPriority::Required);
            let Some(content) = result.data.as_deref() else {
                ctx.warnings
                    .push(result.error.unwrap_or_else(|| format!("failed to load {path}")));
                continue;
            };

            let sheet = match Sheet::parse(&path, name, content) {
                Ok(sheet) => sheet,
                Err(e) => {
                    ctx.warnings.push(format!("failed to parse {path}: {e}"));
                    continue;
                }
            };

            let sheet = match scene.current_phase.as_deref() {
                Some(phase) => self.phase_filter.filter_sheet(sheet, phase)?,
                None => sheet,
            };

            let _ = ctx.characters.insert(name.clone(), sheet.render_markdown());
        }

        Ok(ctx)
    }

    fn collect_as_string(&self, scene: &SceneIdentifier) -> Result<Option<String>> {
        let ctx = self.collect(scene)?;
        if ctx.characters.is_empty() {
            return Ok(None);
        }
        let rendered: Vec<&str> = ctx.characters.values().map(String::as_str).collect();
        Ok(Some(rendered.join("\n\n")))
    }
}
