//! # narra-context
//!
//! Context construction for the Narra novel-writing pipeline.
//!
//! Given a scene identifier and a knowledge vault on disk, this crate
//! assembles the prompt material a writing LLM needs while keeping spoilers
//! out:
//!
//! - **Phase filter**: strips future-arc material from entity sheets
//! - **Collectors**: plot, summary, character, world-setting, style guide
//! - **Integrator**: bounded fan-out and deterministic merge
//! - **Visibility**: section-level `ai_visibility` directive filtering
//! - **Caches**: bounded LRU caches for per-scene products
//! - **Builder**: the [`ContextBuilder`] facade tying it all together

#![deny(unsafe_code)]

pub mod builder;
pub mod cache;
pub mod collectors;
pub mod errors;
pub mod integrator;
pub mod phase_filter;
pub mod visibility;

pub use builder::ContextBuilder;
pub use cache::LruCache;
pub use collectors::{
    CharacterCollector, Collector, PlotCollector, PlotRepository, StyleGuideCollector,
    SummaryCollector, WorldSettingCollector,
};
pub use errors::{ContextError, Result};
pub use integrator::ContextIntegrator;
pub use phase_filter::PhaseFilter;
pub use visibility::{FilteredText, VisibilityController, VisibilityFilteringService};
