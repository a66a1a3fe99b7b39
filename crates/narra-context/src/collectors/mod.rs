//! Context collectors.
//!
//! Five collectors gather one kind of prompt material each: plot, summary,
//! character sheets, world settings, and style guides. All implement the
//! [`Collector`] contract; the integrator fans them out and merges the
//! [`narra_core::FilteredContext`] fragments in a fixed order.

use narra_core::SceneIdentifier;

use crate::errors::Result;

mod character;
mod plot;
mod style;
mod summary;
mod world;

pub use character::{CharacterCollector, CharacterContext};
pub use plot::{PlotCollector, PlotContext, PlotRepository};
pub use style::{StyleContext, StyleGuideCollector};
pub use summary::{SummaryCollector, SummaryContext};
pub use world::{WorldContext, WorldSettingCollector};

/// The common collector contract.
///
/// `collect` returns the collector's typed structure; `collect_as_string`
/// renders it for direct prompt injection. Implementations absorb data
/// problems into their typed output's warnings; only the phase error and
/// structural failures surface as `Err`.
pub trait Collector {
    /// The domain-specific structure this collector produces.
    type Output;

    /// Collector name, used to prefix warnings.
    fn name(&self) -> &'static str;

    /// Gather the typed context for a scene.
    fn collect(&self, scene: &SceneIdentifier) -> Result<Self::Output>;

    /// Gather and render for prompt injection. `None` when the collector
    /// found nothing.
    fn collect_as_string(&self, scene: &SceneIdentifier) -> Result<Option<String>>;
}
