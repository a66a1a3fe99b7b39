//! Summary collector.

use std::sync::Arc;

use narra_core::SceneIdentifier;
use narra_core::scene::previous_episode_id;
use narra_vault::{LazyFileLoader, LoadPriority, layout};

use super::Collector;
use crate::errors::Result;

/// The three summary levels for a scene.
///
/// L3 is the *previous* episode's summary; the current episode has not been
/// written yet when its context is built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SummaryContext {
    /// Overall summary (L1).
    pub l1: Option<String>,
    /// Chapter summary (L2).
    pub l2: Option<String>,
    /// Previous-episode summary (L3).
    pub l3: Option<String>,
    /// Non-fatal notes.
    pub warnings: Vec<String>,
}

/// Collects L1/L2/previous-L3 summary text.
pub struct SummaryCollector {
    loader: Arc<LazyFileLoader>,
}

impl SummaryCollector {
    /// Create a summary collector.
    pub fn new(loader: Arc<LazyFileLoader>) -> Self {
        Self { loader }
    }

    fn load_optional(&self, path: &str, warnings: &mut Vec<String>) -> Option<String> {
        let result = self.loader.load(path, LoadPriority::Optional);
        warnings.extend(result.warnings.iter().cloned());
        result.text().map(str::to_owned)
    }
}

impl Collector for SummaryCollector {
    type Output = SummaryContext;

    fn name(&self) -> &'static str {
        "summary"
    }

    fn collect(&self, scene: &SceneIdentifier) -> Result<SummaryContext> {
        let mut warnings = Vec::new();

        let l1 = self.load_optional(layout::SUMMARY_L1_FILE, &mut warnings);

        let l2 = scene
            .chapter_id
            .as_deref()
            .and_then(|chapter| self.load_optional(&layout::summary_l2(chapter), &mut warnings));

        let l3 = previous_episode_id(&scene.episode_id)
            .and_then(|previous| self.load_optional(&layout::summary_l3(&previous), &mut warnings));

        Ok(SummaryContext { l1, l2, l3, warnings })
    }

    fn collect_as_string(&self, scene: &SceneIdentifier) -> Result<Option<String>> {
        let ctx = self.collect(scene)?;
        let mut parts = Vec::new();
        if let Some(l1) = &ctx.l1 {
            parts.push(format!("## 全体あらすじ\n\n{l1}"));
        }
        if let Some(l2) = &ctx.l2 {
            parts.push(format!("## 章あらすじ\n\n{l2}"));
        }
        if let Some(l3) = &ctx.l3 {
            parts.push(format!("## 前話あらすじ\n\n{l3}"));
        }
        Ok((!parts.is_empty()).then(|| parts.join("\n\n")))
    }
}
