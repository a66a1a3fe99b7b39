//! Build result.

use serde::{Deserialize, Serialize};

use crate::context::FilteredContext;
use crate::foreshadow::ForeshadowInstructions;
use crate::hints::HintCollection;
use crate::visibility::VisibilityAwareContext;

/// Everything a `build(scene)` call produced.
///
/// `success` reflects only `errors`; warnings never flip it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextBuildResult {
    /// The unified base context.
    pub context: FilteredContext,
    /// Visibility-filtered view, when a controller is configured.
    pub visibility_context: Option<VisibilityAwareContext>,
    /// Foreshadowing instructions for the scene.
    pub foreshadow_instructions: ForeshadowInstructions,
    /// Sorted, deduplicated forbidden keywords from all sources.
    pub forbidden_keywords: Vec<String>,
    /// Prioritized hints.
    pub hints: HintCollection,
    /// Whether the build completed without fatal errors.
    pub success: bool,
    /// Fatal errors, stage-prefixed.
    pub errors: Vec<String>,
    /// Non-fatal warnings, stage-prefixed.
    pub warnings: Vec<String>,
}

impl ContextBuildResult {
    /// Create an empty result for a base context with `success` derived
    /// from the (empty) error list.
    pub fn new(context: FilteredContext) -> Self {
        Self {
            context,
            visibility_context: None,
            foreshadow_instructions: ForeshadowInstructions::default(),
            forbidden_keywords: Vec::new(),
            hints: HintCollection::default(),
            success: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record a fatal error and flip `success`.
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.success = false;
    }
}
