//! # narra-vault
//!
//! Read side of the file-based knowledge vault.
//!
//! The vault is a notebook of Markdown documents with YAML front matter,
//! laid out under a single root (`_plot/`, `_summary/`, `_style_guides/`,
//! `_ai_control/`, `_foreshadowing/`, `_settings/`, `characters/`, `world/`,
//! `episodes/`). This crate provides:
//!
//! - **Layout**: relative-path builders for every vault location
//! - **Loader**: [`LazyFileLoader`] — cached reads with priority-tagged results
//! - **Front matter**: `---`-fenced YAML split and serialization
//! - **Sheets**: character / world-setting document model and rendering
//! - **Resolver**: [`SceneResolver`] — scene paths and cross-reference extraction
//! - **Registry**: the foreshadowing registry file
//! - **AI control**: forbidden-keyword file and visibility config

#![deny(unsafe_code)]

pub mod ai_control;
pub mod errors;
pub mod frontmatter;
pub mod layout;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod sheet;

pub use errors::{Result, VaultError};
pub use loader::{LazyFileLoader, LoadPriority, LoadResult};
pub use registry::ForeshadowingRegistry;
pub use resolver::SceneResolver;
pub use sheet::Sheet;
