//! # narra-foreshadow
//!
//! Foreshadowing planning for the Narra context builder.
//!
//! - **Identifier**: decides which registry records are relevant to a scene
//!   and what action each needs (plant / reinforce / hint / reveal-approach)
//! - **Instruction generator**: turns relevance decisions into per-item
//!   [`narra_core::ForeshadowInstruction`]s with subtlety targets
//! - **Forbidden keywords**: aggregates the global file, visibility config,
//!   and active instructions into a source-tagged set
//! - **Hint collector**: merges visibility and foreshadowing hints into one
//!   prioritized bag
//! - **Scene checker**: auxiliary plant/reinforce/payoff report with alerts

#![deny(unsafe_code)]

pub mod checker;
pub mod forbidden;
pub mod hints;
pub mod identifier;
pub mod instructions;

pub use checker::{SceneForeshadowingCheck, SceneForeshadowingChecker};
pub use forbidden::{ForbiddenKeywordCollector, ForbiddenKeywordSources};
pub use hints::HintCollector;
pub use identifier::{ForeshadowingIdentifier, IdentifiedForeshadowing};
pub use instructions::InstructionGenerator;
