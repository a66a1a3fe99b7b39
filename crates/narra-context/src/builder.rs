//! Context builder facade.
//!
//! One `ContextBuilder` per vault. `build(scene)` runs the full pipeline:
//! integrate, generate foreshadowing instructions, aggregate forbidden
//! keywords, apply visibility filtering, collect hints. The three product
//! caches (instructions, flat forbidden list, source-tagged forbidden set)
//! are LRU-bounded and keyed by the scene cache key; the builder itself is
//! not thread-safe, callers serialize or use per-request instances.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use narra_core::{
    ContextBuildResult, FilteredContext, ForeshadowAction, ForeshadowInstructions,
    InvalidPhaseError, PhaseOrder, SceneIdentifier,
};
use narra_foreshadow::{
    ForbiddenKeywordCollector, ForbiddenKeywordSources, ForeshadowingIdentifier, HintCollector,
    InstructionGenerator,
};
use narra_vault::ai_control::{VisibilityConfig, parse_keyword_file};
use narra_vault::resolver::{ExtractedRefs, ReferencePatterns};
use narra_vault::{ForeshadowingRegistry, LazyFileLoader, LoadPriority, SceneResolver, layout};

use crate::cache::LruCache;
use crate::collectors::{
    CharacterCollector, PlotCollector, PlotRepository, StyleGuideCollector, SummaryCollector,
    WorldSettingCollector,
};
use crate::errors::ContextError;
use crate::integrator::{ContextIntegrator, DEFAULT_MAX_WORKERS};
use crate::phase_filter::PhaseFilter;
use crate::visibility::{VisibilityController, VisibilityFilteringService};

/// Builds scene contexts over one knowledge vault.
pub struct ContextBuilder {
    loader: Arc<LazyFileLoader>,
    resolver: Arc<SceneResolver>,
    registry: ForeshadowingRegistry,
    identifier: ForeshadowingIdentifier,
    forbidden_collector: ForbiddenKeywordCollector,
    hint_collector: HintCollector,
    phase_order: PhaseOrder,
    max_workers: usize,
    plot_repository: Option<Arc<dyn PlotRepository>>,
    visibility: Option<VisibilityFilteringService>,
    instruction_cache: LruCache<ForeshadowInstructions>,
    forbidden_cache: LruCache<Vec<String>>,
    // Warnings are cached with the sources so repeated builds are identical.
    forbidden_sources_cache: LruCache<(ForbiddenKeywordSources, Vec<String>)>,
    startup_warnings: Vec<String>,
}

impl ContextBuilder {
    /// Create a builder over a vault root.
    ///
    /// Reads the reference-pattern overrides and the foreshadowing registry
    /// up front; failures leave warnings on every subsequent build rather
    /// than failing construction.
    pub fn new(vault_root: impl Into<PathBuf>) -> Self {
        let root = vault_root.into();
        let loader = Arc::new(LazyFileLoader::new(&root));
        let mut startup_warnings = Vec::new();

        let patterns = loader
            .load(layout::REFERENCE_PATTERNS_FILE, LoadPriority::Optional)
            .text()
            .map(ReferencePatterns::parse_or_default)
            .unwrap_or_default();
        let resolver = Arc::new(SceneResolver::new(&root).with_patterns(patterns));

        let registry = match ForeshadowingRegistry::load(&root.join(layout::REGISTRY_FILE)) {
            Ok(registry) => registry,
            Err(e) => {
                warn!(error = %e, "foreshadowing registry failed to load");
                startup_warnings.push(format!("registry: {e}"));
                ForeshadowingRegistry::default()
            }
        };

        Self {
            loader,
            resolver,
            registry,
            identifier: ForeshadowingIdentifier::new(),
            forbidden_collector: ForbiddenKeywordCollector::new(),
            hint_collector: HintCollector::new(),
            phase_order: PhaseOrder::default(),
            max_workers: DEFAULT_MAX_WORKERS,
            plot_repository: None,
            visibility: None,
            instruction_cache: LruCache::default(),
            forbidden_cache: LruCache::default(),
            forbidden_sources_cache: LruCache::default(),
            startup_warnings,
        }
    }

    /// Replace the default phase order.
    #[must_use]
    pub fn with_phase_order(mut self, order: PhaseOrder) -> Self {
        self.phase_order = order;
        self
    }

    /// Bound the collector fan-out.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Consult a structured plot repository for the L1 theme.
    #[must_use]
    pub fn with_plot_repository(mut self, repository: Arc<dyn PlotRepository>) -> Self {
        self.plot_repository = Some(repository);
        self
    }

    /// Enable visibility filtering, seeding the controller's global
    /// forbidden keywords from `_ai_control/visibility.yaml`.
    #[must_use]
    pub fn with_visibility_filtering(mut self) -> Self {
        let mut controller = VisibilityController::new();
        if let Some(text) = self
            .loader
            .load(layout::VISIBILITY_CONFIG_FILE, LoadPriority::Optional)
            .text()
        {
            match VisibilityConfig::parse(text) {
                Ok(config) => {
                    controller = controller.with_global_forbidden(config.global_forbidden_keywords);
                }
                Err(e) => self.startup_warnings.push(format!("visibility.yaml: {e}")),
            }
        }
        self.visibility = Some(VisibilityFilteringService::new(controller));
        self
    }

    /// The shared file loader (exposed for cache inspection).
    pub fn loader(&self) -> &LazyFileLoader {
        &self.loader
    }

    // ─────────────────────────────────────────────────────────────────────
    // Build
    // ─────────────────────────────────────────────────────────────────────

    /// Build the full context for a scene.
    ///
    /// Only an unknown current phase escapes as an error; every other
    /// failure lands in the result's errors or warnings.
    pub fn build(
        &mut self,
        scene: &SceneIdentifier,
    ) -> Result<ContextBuildResult, InvalidPhaseError> {
        debug!(episode = %scene.episode_id, "building context");

        let context = match self.integrator().integrate(scene) {
            Ok(context) => context,
            Err(ContextError::InvalidPhase(e)) => return Err(e),
            Err(e) => {
                let mut result = ContextBuildResult::new(FilteredContext::new(scene.clone()));
                result.warnings.extend(self.startup_warnings.iter().cloned());
                result.push_error(format!("integrator: {e}"));
                return Ok(result);
            }
        };

        let mut result = ContextBuildResult::new(context);
        result.warnings.extend(self.startup_warnings.iter().cloned());
        result.warnings.extend(result.context.warnings.iter().cloned());

        result.foreshadow_instructions = self.get_foreshadow_instructions(scene);

        let (sources, forbidden_warnings) = self.forbidden_sources(scene);
        result.forbidden_keywords = sources.flatten_sorted();
        result.warnings.extend(forbidden_warnings);

        if let Some(service) = &self.visibility {
            let filtered = service.filter_context(result.context.clone());
            result.context = filtered.base.clone();
            result.visibility_context = Some(filtered);
        }

        result.hints = self.hint_collector.collect(
            result.visibility_context.as_ref(),
            Some(&result.foreshadow_instructions),
        );

        Ok(result)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Foreshadowing operations
    // ─────────────────────────────────────────────────────────────────────

    /// The scene's foreshadowing instructions, cache-mediated.
    pub fn get_foreshadow_instructions(&mut self, scene: &SceneIdentifier) -> ForeshadowInstructions {
        let key = scene.cache_key();
        if let Some(instructions) = self.instruction_cache.get(&key) {
            return instructions.clone();
        }
        let instructions = self.compute_instructions(scene);
        self.instruction_cache.insert(key, instructions.clone());
        instructions
    }

    /// Render the scene's active instructions as a Japanese prompt section.
    /// Empty string when nothing is active.
    pub fn get_foreshadow_instructions_as_prompt(&mut self, scene: &SceneIdentifier) -> String {
        let instructions = self.get_foreshadow_instructions(scene);
        let active = instructions.get_active_instructions();
        if active.is_empty() {
            return String::new();
        }

        let mut out = String::from("## 伏線指示\n");
        for instruction in active {
            out.push_str(&format!(
                "\n- 【{}】{}（さりげなさ: {}/10）",
                action_label(instruction.action),
                instruction.foreshadowing_id,
                instruction.subtlety_target
            ));
            if let Some(note) = &instruction.note {
                out.push_str(&format!("\n  - 指示: {note}"));
            }
            if !instruction.allowed_expressions.is_empty() {
                out.push_str(&format!(
                    "\n  - 使用可: {}",
                    instruction.allowed_expressions.join("、")
                ));
            }
            if !instruction.forbidden_expressions.is_empty() {
                out.push_str(&format!(
                    "\n  - 使用禁止: {}",
                    instruction.forbidden_expressions.join("、")
                ));
            }
        }
        out.push('\n');
        out
    }

    /// Ids of the scene's active foreshadowings.
    pub fn get_active_foreshadowings(&mut self, scene: &SceneIdentifier) -> Vec<String> {
        self.get_foreshadow_instructions(scene)
            .get_active_instructions()
            .into_iter()
            .map(|i| i.foreshadowing_id.clone())
            .collect()
    }

    /// Instruction count per action for the scene.
    pub fn get_foreshadowing_summary(
        &mut self,
        scene: &SceneIdentifier,
    ) -> BTreeMap<ForeshadowAction, usize> {
        self.get_foreshadow_instructions(scene).count_by_action()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Forbidden keyword operations
    // ─────────────────────────────────────────────────────────────────────

    /// The scene's flat forbidden keyword list (sorted, unique).
    pub fn get_forbidden_keywords(&mut self, scene: &SceneIdentifier) -> Vec<String> {
        let key = scene.cache_key();
        if let Some(flat) = self.forbidden_cache.get(&key) {
            return flat.clone();
        }
        self.forbidden_sources(scene).0.flatten_sorted()
    }

    /// The scene's forbidden keywords grouped by source.
    pub fn get_forbidden_by_source(&mut self, scene: &SceneIdentifier) -> ForbiddenKeywordSources {
        self.forbidden_sources(scene).0
    }

    /// Render the scene's forbidden keywords as a Japanese prompt section.
    /// Empty string when nothing is forbidden.
    pub fn get_forbidden_keywords_as_prompt(&mut self, scene: &SceneIdentifier) -> String {
        let keywords = self.get_forbidden_keywords(scene);
        if keywords.is_empty() {
            return String::new();
        }
        let mut out = String::from("## 使用禁止キーワード\n");
        for keyword in keywords {
            out.push_str(&format!("- {keyword}\n"));
        }
        out
    }

    /// Forbidden keywords from the scene's list that occur in `text`,
    /// in list (sorted) order.
    pub fn check_text_for_forbidden(
        &mut self,
        scene: &SceneIdentifier,
        text: &str,
    ) -> Vec<String> {
        self.get_forbidden_keywords(scene)
            .into_iter()
            .filter(|keyword| text.contains(keyword.as_str()))
            .collect()
    }

    /// Whether `text` is free of the scene's forbidden keywords.
    pub fn is_text_clean(&mut self, scene: &SceneIdentifier, text: &str) -> bool {
        self.check_text_for_forbidden(scene, text).is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cache management
    // ─────────────────────────────────────────────────────────────────────

    /// Drop cached instructions.
    pub fn clear_instruction_cache(&mut self) {
        self.instruction_cache.clear();
    }

    /// Drop cached forbidden keyword products.
    pub fn clear_forbidden_cache(&mut self) {
        self.forbidden_cache.clear();
        self.forbidden_sources_cache.clear();
    }

    /// Drop all builder caches.
    pub fn clear_all_caches(&mut self) {
        self.clear_instruction_cache();
        self.clear_forbidden_cache();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn integrator(&self) -> ContextIntegrator {
        let filter = PhaseFilter::new(self.phase_order.clone());
        let mut plot = PlotCollector::new(Arc::clone(&self.loader), Arc::clone(&self.resolver));
        if let Some(repository) = &self.plot_repository {
            plot = plot.with_repository(Arc::clone(repository));
        }
        ContextIntegrator::new(
            plot,
            SummaryCollector::new(Arc::clone(&self.loader)),
            CharacterCollector::new(
                Arc::clone(&self.loader),
                Arc::clone(&self.resolver),
                filter.clone(),
            ),
            WorldSettingCollector::new(
                Arc::clone(&self.loader),
                Arc::clone(&self.resolver),
                filter,
            ),
            StyleGuideCollector::new(Arc::clone(&self.loader)),
        )
        .with_max_workers(self.max_workers)
    }

    fn compute_instructions(&self, scene: &SceneIdentifier) -> ForeshadowInstructions {
        let appearing = self.appearing_characters(scene);
        let identified = self
            .identifier
            .identify(&self.registry.foreshadowing, scene, &appearing);
        InstructionGenerator::new()
            .with_global_forbidden(self.global_forbidden_from_files())
            .generate(&self.registry.foreshadowing, &identified)
    }

    /// Characters referenced by the episode file and the episode plot.
    fn appearing_characters(&self, scene: &SceneIdentifier) -> Vec<String> {
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
        refs.characters
    }

    fn global_forbidden_from_files(&self) -> Vec<String> {
        let mut global = Vec::new();
        if let Some(text) = self
            .loader
            .load(layout::FORBIDDEN_KEYWORDS_FILE, LoadPriority::Optional)
            .text()
        {
            global.extend(parse_keyword_file(text));
        }
        if let Some(text) = self
            .loader
            .load(layout::VISIBILITY_CONFIG_FILE, LoadPriority::Optional)
            .text()
        {
            if let Ok(config) = VisibilityConfig::parse(text) {
                global.extend(config.global_forbidden_keywords);
            }
        }
        global.sort();
        global.dedup();
        global
    }

    /// Source-tagged forbidden keywords plus collection warnings,
    /// cache-mediated.
    fn forbidden_sources(
        &mut self,
        scene: &SceneIdentifier,
    ) -> (ForbiddenKeywordSources, Vec<String>) {
        let key = scene.cache_key();
        if let Some(cached) = self.forbidden_sources_cache.get(&key) {
            return cached.clone();
        }

        let instructions = self.get_foreshadow_instructions(scene);
        let (sources, warnings) = self
            .forbidden_collector
            .collect(&self.loader, &instructions);
        self.forbidden_sources_cache
            .insert(key.clone(), (sources.clone(), warnings.clone()));
        self.forbidden_cache.insert(key, sources.flatten_sorted());
        (sources, warnings)
    }
}

fn action_label(action: ForeshadowAction) -> &'static str {
    match action {
        ForeshadowAction::Plant => "設置",
        ForeshadowAction::Reinforce => "強化",
        ForeshadowAction::Hint => "示唆",
        ForeshadowAction::None => "なし",
    }
}
