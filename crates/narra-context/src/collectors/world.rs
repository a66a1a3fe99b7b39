//! World-setting collector.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use narra_core::SceneIdentifier;
use narra_vault::resolver::ExtractedRefs;
use narra_vault::{LazyFileLoader, LoadPriority, SceneResolver, Sheet, layout};

use super::Collector;
use crate::errors::Result;
use crate::phase_filter::PhaseFilter;

/// Phase-filtered world-setting sheets for a scene.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldContext {
    /// Setting name (may contain `/`) to rendered sheet markdown.
    pub world_settings: BTreeMap<String, String>,
    /// Non-fatal notes.
    pub warnings: Vec<String>,
}

/// Collects the world settings referenced by a scene.
pub struct WorldSettingCollector {
    loader: Arc<LazyFileLoader>,
    resolver: Arc<SceneResolver>,
    phase_filter: PhaseFilter,
}

impl WorldSettingCollector {
    /// Create a world-setting collector.
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

impl Collector for WorldSettingCollector {
    type Output = WorldContext;

    fn name(&self) -> &'static str {
        "world"
    }

    fn collect(&self, scene: &SceneIdentifier) -> Result<WorldContext> {
        let mut ctx = WorldContext::default();
        let refs = self.scene_references(scene);
        debug!(count = refs.world_settings.len(), "world references extracted");

        for name in &refs.world_settings {
            let path = layout::world(name);
            let result = self.loader.load(&path, LoadPriority::Required);
            let Some(content) = result.data.as_deref() else {
                ctx.warnings
                    .push(result.error.unwrap_or_else(|| format!("failed to load {path}")));
                continue;
            };

            // The display name is the final path segment.
            let fallback = name.rsplit('/').next().unwrap_or(name);
            let sheet = match Sheet::parse(&path, fallback, content) {
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

            let _ = ctx
                .world_settings
                .insert(name.clone(), sheet.render_markdown());
        }

        Ok(ctx)
    }

    fn collect_as_string(&self, scene: &SceneIdentifier) -> Result<Option<String>> {
        let ctx = self.collect(scene)?;
        if ctx.world_settings.is_empty() {
            return Ok(None);
        }
        let rendered: Vec<&str> = ctx.world_settings.values().map(String::as_str).collect();
        Ok(Some(rendered.join("\n\n")))
    }
}
