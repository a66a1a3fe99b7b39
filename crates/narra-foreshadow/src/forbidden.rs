//! Forbidden keyword aggregation.
//!
//! Three sources feed the forbidden set: the global keyword file, the
//! visibility config, and the active foreshadowing instructions. Per-source
//! order is preserved for reporting; the flat list is sorted and
//! deduplicated. Missing source files are optional and only warn.

use serde::{Deserialize, Serialize};

use narra_core::ForeshadowInstructions;
use narra_vault::ai_control::{VisibilityConfig, parse_keyword_file};
use narra_vault::{LazyFileLoader, LoadPriority, layout};

/// Forbidden keywords grouped by their source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenKeywordSources {
    /// From `_ai_control/forbidden_keywords.txt`.
    pub global: Vec<String>,
    /// From `_ai_control/visibility.yaml`.
    pub visibility: Vec<String>,
    /// From active foreshadowing instructions.
    pub foreshadowing: Vec<String>,
}

impl ForbiddenKeywordSources {
    /// Flat, sorted, deduplicated union of all sources.
    pub fn flatten_sorted(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .global
            .iter()
            .chain(&self.visibility)
            .chain(&self.foreshadowing)
            .cloned()
            .collect();
        all.sort();
        all.dedup();
        all
    }
}

/// Aggregates forbidden keywords from all configured sources.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForbiddenKeywordCollector;

impl ForbiddenKeywordCollector {
    /// Create a collector.
    pub fn new() -> Self {
        Self
    }

    /// Collect the source-tagged keyword sets.
    ///
    /// Returns the sources plus warnings for missing/invalid inputs.
    pub fn collect(
        &self,
        loader: &LazyFileLoader,
        instructions: &ForeshadowInstructions,
    ) -> (ForbiddenKeywordSources, Vec<String>) {
        let mut sources = ForbiddenKeywordSources::default();
        let mut warnings = Vec::new();

        let keywords = loader.load(layout::FORBIDDEN_KEYWORDS_FILE, LoadPriority::Optional);
        warnings.extend(keywords.warnings.iter().cloned());
        if let Some(content) = keywords.data.as_deref() {
            sources.global = parse_keyword_file(content);
        }

        let config = loader.load(layout::VISIBILITY_CONFIG_FILE, LoadPriority::Optional);
        warnings.extend(config.warnings.iter().cloned());
        if let Some(content) = config.data.as_deref() {
            match VisibilityConfig::parse(content) {
                Ok(config) => sources.visibility = config.global_forbidden_keywords,
                Err(e) => warnings.push(format!("invalid visibility.yaml: {e}")),
            }
        }

        for instruction in instructions.get_active_instructions() {
            for keyword in &instruction.forbidden_expressions {
                if !sources.foreshadowing.contains(keyword) {
                    sources.foreshadowing.push(keyword.clone());
                }
            }
        }

        (sources, warnings)
    }
}
