//! Lazy cached file loader.
//!
//! Reads vault files as UTF-8 text, caching contents by relative path. The
//! loader never panics or propagates for missing files; every read returns a
//! [`LoadResult`] record. Required misses fail the record, optional misses
//! succeed with empty content and a warning.
//!
//! The cache sits behind a mutex so the integrator's bounded fan-out can
//! share one loader across collector threads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

/// How important a file is to the requesting collector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadPriority {
    /// Missing file fails the load with an error.
    Required,
    /// Missing file succeeds with empty content and a warning.
    Optional,
}

/// Outcome of a single load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadResult {
    /// Whether the load satisfied its priority.
    pub success: bool,
    /// File content. Empty for optional misses, `None` on failure.
    pub data: Option<String>,
    /// Error description on failure.
    pub error: Option<String>,
    /// Non-fatal notes (e.g. optional file missing).
    pub warnings: Vec<String>,
}

impl LoadResult {
    fn ok(data: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            warnings: Vec::new(),
        }
    }

    fn missing_optional(relative: &str) -> Self {
        Self {
            success: true,
            data: Some(String::new()),
            error: None,
            warnings: vec![format!("optional file not found: {relative}")],
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            warnings: Vec::new(),
        }
    }

    /// The content, if present and not blank.
    pub fn text(&self) -> Option<&str> {
        self.data.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Loader cache statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Number of cached files.
    pub size: usize,
    /// Reads served from the cache.
    pub hits: u64,
    /// Reads that went to disk.
    pub misses: u64,
}

#[derive(Default)]
struct LoaderState {
    cache: HashMap<String, String>,
    hits: u64,
    misses: u64,
}

/// Cached disk reader rooted at the vault directory.
pub struct LazyFileLoader {
    root: PathBuf,
    state: Mutex<LoaderState>,
}

impl LazyFileLoader {
    /// Create a loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: Mutex::new(LoaderState::default()),
        }
    }

    /// The vault root this loader reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a file by vault-relative path.
    ///
    /// Cached content is returned without touching the disk. Missing files
    /// are never cached, so a file created between calls is picked up.
    pub fn load(&self, relative: &str, priority: LoadPriority) -> LoadResult {
        {
            let mut state = self.state.lock();
            if let Some(content) = state.cache.get(relative) {
                let content = content.clone();
                state.hits += 1;
                return LoadResult::ok(content);
            }
            state.misses += 1;
        }

        let path = self.root.join(relative);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                debug!(path = %relative, bytes = content.len(), "loaded vault file");
                let _ = self
                    .state
                    .lock()
                    .cache
                    .insert(relative.to_owned(), content.clone());
                LoadResult::ok(content)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => match priority {
                LoadPriority::Required => {
                    LoadResult::failed(format!("required file not found: {relative}"))
                }
                LoadPriority::Optional => LoadResult::missing_optional(relative),
            },
            Err(e) => {
                warn!(path = %relative, error = %e, "vault file read failed");
                match priority {
                    LoadPriority::Required => {
                        LoadResult::failed(format!("failed to read {relative}: {e}"))
                    }
                    LoadPriority::Optional => {
                        let mut result = LoadResult::missing_optional(relative);
                        result.warnings = vec![format!("failed to read {relative}: {e}")];
                        result
                    }
                }
            }
        }
    }

    /// Whether a relative path is currently cached.
    pub fn is_cached(&self, relative: &str) -> bool {
        self.state.lock().cache.contains_key(relative)
    }

    /// Drop all cached content and reset stats.
    pub fn clear_cache(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        state.hits = 0;
        state.misses = 0;
    }

    /// Current cache statistics.
    pub fn stats(&self) -> LoaderStats {
        let state = self.state.lock();
        LoaderStats {
            size: state.cache.len(),
            hits: state.hits,
            misses: state.misses,
        }
    }
}
