//! # narra-core
//!
//! Foundation types for the Narra context construction engine.
//!
//! This crate provides the shared vocabulary the other Narra crates depend on:
//!
//! - **Scene identity**: [`SceneIdentifier`] plus episode-id normalization
//! - **Narrative phases**: [`PhaseOrder`] and the fail-fast [`InvalidPhaseError`]
//! - **Context values**: [`FilteredContext`] and [`ContextBuildResult`]
//! - **Visibility**: [`VisibilityLevel`], [`VisibilityHint`], [`VisibilityAwareContext`]
//! - **Foreshadowing**: registry entities, [`ForeshadowInstruction`] aggregates,
//!   and the status-transition table
//! - **Hints**: [`CollectedHint`] and the priority-sorted [`HintCollection`]

#![deny(unsafe_code)]

pub mod context;
pub mod foreshadow;
pub mod hints;
pub mod phase;
pub mod result;
pub mod scene;
pub mod visibility;

pub use context::FilteredContext;
pub use foreshadow::{
    ForeshadowAction, ForeshadowInstruction, ForeshadowInstructions, ForeshadowStatus,
    Foreshadowing,
};
pub use hints::{CollectedHint, HintCollection, HintSource};
pub use phase::{InvalidPhaseError, PhaseOrder};
pub use result::ContextBuildResult;
pub use scene::SceneIdentifier;
pub use visibility::{VisibilityAwareContext, VisibilityHint, VisibilityLevel};
