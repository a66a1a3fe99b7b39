//! Context integration.
//!
//! Fans the five collectors out over a bounded pool of scoped threads and
//! merges their fragments into one [`FilteredContext`]. Merge order is fixed
//! (plot, summary, character, world, style) regardless of completion order,
//! so warnings and precedence are deterministic. Collector failures become
//! stage-prefixed warnings; only the phase error aborts.

use tracing::warn;

use narra_core::{FilteredContext, SceneIdentifier};

use crate::collectors::{
    CharacterCollector, Collector, PlotCollector, StyleGuideCollector, SummaryCollector,
    WorldSettingCollector,
};
use crate::errors::{ContextError, Result};

/// Default fan-out bound.
pub const DEFAULT_MAX_WORKERS: usize = 5;

type Job<'a> = Box<dyn FnOnce() -> Result<FilteredContext> + Send + 'a>;

/// Runs the collectors and assembles the unified context.
pub struct ContextIntegrator {
    plot: PlotCollector,
    summary: SummaryCollector,
    character: CharacterCollector,
    world: WorldSettingCollector,
    style: StyleGuideCollector,
    max_workers: usize,
}

impl ContextIntegrator {
    /// Create an integrator over the five collectors.
    pub fn new(
        plot: PlotCollector,
        summary: SummaryCollector,
        character: CharacterCollector,
        world: WorldSettingCollector,
        style: StyleGuideCollector,
    ) -> Self {
        Self {
            plot,
            summary,
            character,
            world,
            style,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    /// Bound the collector fan-out. `1` runs the collectors sequentially.
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Run all collectors for a scene and merge their output.
    pub fn integrate(&self, scene: &SceneIdentifier) -> Result<FilteredContext> {
        let jobs: Vec<(&'static str, Job<'_>)> = vec![
            (self.plot.name(), Box::new(|| self.plot_fragment(scene))),
            (self.summary.name(), Box::new(|| self.summary_fragment(scene))),
            (self.character.name(), Box::new(|| self.character_fragment(scene))),
            (self.world.name(), Box::new(|| self.world_fragment(scene))),
            (self.style.name(), Box::new(|| self.style_fragment(scene))),
        ];

        let outcomes = self.run(jobs);

        let mut context = FilteredContext::new(scene.clone());
        for (name, outcome) in outcomes {
            match outcome {
                Ok(fragment) => context = context.merge(fragment),
                Err(ContextError::InvalidPhase(e)) => return Err(e.into()),
                Err(e) => {
                    warn!(collector = name, error = %e, "collector failed");
                    context.warnings.push(format!("{name} collector: {e}"));
                }
            }
        }
        Ok(context)
    }

    /// Execute jobs in waves of `max_workers`, preserving job order in the
    /// returned outcomes. A panicking collector yields an error outcome.
    fn run<'a>(
        &self,
        jobs: Vec<(&'static str, Job<'a>)>,
    ) -> Vec<(&'static str, Result<FilteredContext>)> {
        let mut outcomes = Vec::with_capacity(jobs.len());

        if self.max_workers <= 1 {
            for (name, job) in jobs {
                outcomes.push((name, job()));
            }
            return outcomes;
        }

        let mut queue = jobs.into_iter();
        loop {
            let wave: Vec<_> = queue.by_ref().take(self.max_workers).collect();
            if wave.is_empty() {
                break;
            }
            let wave_outcomes = std::thread::scope(|s| {
                let handles: Vec<_> = wave
                    .into_iter()
                    .map(|(name, job)| (name, s.spawn(job)))
                    .collect();
                handles
                    .into_iter()
                    .map(|(name, handle)| {
                        let outcome = handle
                            .join()
                            .unwrap_or_else(|_| Err(ContextError::CollectorPanic { collector: name }));
                        (name, outcome)
                    })
                    .collect::<Vec<_>>()
            });
            outcomes.extend(wave_outcomes);
        }
        outcomes
    }

    fn plot_fragment(&self, scene: &SceneIdentifier) -> Result<FilteredContext> {
        let typed = self.plot.collect(scene)?;
        let mut fragment = FilteredContext::new(scene.clone());
        fragment.plot_l1 = typed.l1;
        fragment.plot_l2 = typed.l2;
        fragment.plot_l3 = typed.l3;
        fragment.warnings = prefixed(self.plot.name(), typed.warnings);
        Ok(fragment)
    }

    fn summary_fragment(&self, scene: &SceneIdentifier) -> Result<FilteredContext> {
        let typed = self.summary.collect(scene)?;
        let mut fragment = FilteredContext::new(scene.clone());
        fragment.summary_l1 = typed.l1;
        fragment.summary_l2 = typed.l2;
        fragment.summary_l3 = typed.l3;
        fragment.warnings = prefixed(self.summary.name(), typed.warnings);
        Ok(fragment)
    }

    fn character_fragment(&self, scene: &SceneIdentifier) -> Result<FilteredContext> {
        let typed = self.character.collect(scene)?;
        let mut fragment = FilteredContext::new(scene.clone());
        fragment.characters = typed.characters;
        fragment.warnings = prefixed(self.character.name(), typed.warnings);
        Ok(fragment)
    }

    fn world_fragment(&self, scene: &SceneIdentifier) -> Result<FilteredContext> {
        let typed = self.world.collect(scene)?;
        let mut fragment = FilteredContext::new(scene.clone());
        fragment.world_settings = typed.world_settings;
        fragment.warnings = prefixed(self.world.name(), typed.warnings);
        Ok(fragment)
    }

    fn style_fragment(&self, scene: &SceneIdentifier) -> Result<FilteredContext> {
        let typed = self.style.collect(scene)?;
        let mut fragment = FilteredContext::new(scene.clone());
        fragment.style_guide = typed.style_guide;
        fragment.warnings = prefixed(self.style.name(), typed.warnings);
        Ok(fragment)
    }
}

/// Stage-prefix collector warnings so consumers can tell them apart.
fn prefixed(name: &str, warnings: Vec<String>) -> Vec<String> {
    warnings
        .into_iter()
        .map(|w| format!("{name}: {w}"))
        .collect()
}
