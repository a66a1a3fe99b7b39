//! Plot collector.

use std::sync::Arc;

use narra_core::SceneIdentifier;
use narra_vault::{LazyFileLoader, LoadPriority, SceneResolver, layout};

use super::Collector;
use crate::errors::Result;

/// Structured plot storage consulted before the file-based L1 theme.
///
/// The file vault remains the source for L2/L3; a chapter-number to
/// chapter-name mapping is an implementor concern.
pub trait PlotRepository: Send + Sync {
    /// The overall theme, if the repository has one.
    fn theme(&self) -> Option<String>;
}

/// The three plot levels for a scene.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlotContext {
    /// Overall theme (L1).
    pub l1: Option<String>,
    /// Chapter plot (L2).
    pub l2: Option<String>,
    /// Episode plot (L3).
    pub l3: Option<String>,
    /// Non-fatal notes.
    pub warnings: Vec<String>,
}

/// Collects L1/L2/L3 plot text.
pub struct PlotCollector {
    loader: Arc<LazyFileLoader>,
    resolver: Arc<SceneResolver>,
    repository: Option<Arc<dyn PlotRepository>>,
}

impl PlotCollector {
    /// Create a file-backed plot collector.
    pub fn new(loader: Arc<LazyFileLoader>, resolver: Arc<SceneResolver>) -> Self {
        Self {
            loader,
            resolver,
            repository: None,
        }
    }

    /// Consult a structured repository for the L1 theme before the file.
    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn PlotRepository>) -> Self {
        self.repository = Some(repository);
        self
    }
}

impl Collector for PlotCollector {
    type Output = PlotContext;

    fn name(&self) -> &'static str {
        "plot"
    }

    fn collect(&self, scene: &SceneIdentifier) -> Result<PlotContext> {
        let mut warnings = Vec::new();

        let mut l1 = self
            .repository
            .as_ref()
            .and_then(|repo| repo.theme())
            .filter(|s| !s.trim().is_empty());
        if l1.is_none() {
            let result = self.loader.load(layout::PLOT_L1_FILE, LoadPriority::Optional);
            warnings.extend(result.warnings.iter().cloned());
            l1 = result.text().map(str::to_owned);
        }

        let mut l2 = None;
        if let Some(path) = self.resolver.plot_l2_path(scene) {
            let result = self.loader.load(&path, LoadPriority::Optional);
            warnings.extend(result.warnings.iter().cloned());
            l2 = result.text().map(str::to_owned);
        }

        // The episode plot is required but its absence must not kill a build.
        let mut l3 = None;
        let result = self
            .loader
            .load(&layout::plot_l3(&scene.episode_id), LoadPriority::Required);
        if result.success {
            l3 = result.text().map(str::to_owned);
        } else if let Some(error) = result.error {
            warnings.push(error);
        }

        Ok(PlotContext { l1, l2, l3, warnings })
    }

    fn collect_as_string(&self, scene: &SceneIdentifier) -> Result<Option<String>> {
        let ctx = self.collect(scene)?;
        let mut parts = Vec::new();
        if let Some(l1) = &ctx.l1 {
            parts.push(format!("## 全体テーマ\n\n{l1}"));
        }
        if let Some(l2) = &ctx.l2 {
            parts.push(format!("## 章プロット\n\n{l2}"));
        }
        if let Some(l3) = &ctx.l3 {
            parts.push(format!("## 話プロット\n\n{l3}"));
        }
        Ok((!parts.is_empty()).then(|| parts.join("\n\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct FixedTheme(&'static str);

    impl PlotRepository for FixedTheme {
        fn theme(&self) -> Option<String> {
            Some(self.0.to_owned())
        }
    }

    fn vault_with(files: &[(&str, &str)]) -> (TempDir, Arc<LazyFileLoader>, Arc<SceneResolver>) {
        let tmp = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = tmp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let loader = Arc::new(LazyFileLoader::new(tmp.path()));
        let resolver = Arc::new(SceneResolver::new(tmp.path()));
        (tmp, loader, resolver)
    }

    #[test]
    fn test_collect_all_levels() {
        let (_tmp, loader, resolver) = vault_with(&[
            ("_plot/l1_theme.md", "Theme: Redemption"),
            ("_plot/l2_ch2.md", "Chapter arc"),
            ("_plot/l3_ep010.md", "Scene structure"),
        ]);
        let collector = PlotCollector::new(loader, resolver);
        let scene = SceneIdentifier::new("ep010").with_chapter("ch2");
        let ctx = collector.collect(&scene).unwrap();
        assert_eq!(ctx.l1.as_deref(), Some("Theme: Redemption"));
        assert_eq!(ctx.l2.as_deref(), Some("Chapter arc"));
        assert_eq!(ctx.l3.as_deref(), Some("Scene structure"));
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn test_missing_l3_is_warning_not_error() {
        let (_tmp, loader, resolver) = vault_with(&[("_plot/l1_theme.md", "Theme")]);
        let collector = PlotCollector::new(loader, resolver);
        let ctx = collector.collect(&SceneIdentifier::new("ep010")).unwrap();
        assert!(ctx.l3.is_none());
        assert!(ctx.warnings.iter().any(|w| w.contains("l3_ep010")));
    }

    #[test]
    fn test_repository_wins_over_file() {
        let (_tmp, loader, resolver) = vault_with(&[("_plot/l1_theme.md", "File theme")]);
        let collector =
            PlotCollector::new(loader, resolver).with_repository(Arc::new(FixedTheme("Repo theme")));
        let ctx = collector.collect(&SceneIdentifier::new("ep010")).unwrap();
        assert_eq!(ctx.l1.as_deref(), Some("Repo theme"));
    }

    #[test]
    fn test_no_chapter_skips_l2() {
        let (_tmp, loader, resolver) = vault_with(&[("_plot/l2_ch2.md", "Chapter arc")]);
        let collector = PlotCollector::new(loader, resolver);
        let ctx = collector.collect(&SceneIdentifier::new("ep010")).unwrap();
        assert!(ctx.l2.is_none());
    }

    #[test]
    fn test_string_rendering() {
        let (_tmp, loader, resolver) = vault_with(&[
            ("_plot/l1_theme.md", "Theme"),
            ("_plot/l3_ep010.md", "Structure"),
        ]);
        let collector = PlotCollector::new(loader, resolver);
        let text = collector
            .collect_as_string(&SceneIdentifier::new("ep010"))
            .unwrap()
            .unwrap();
        assert!(text.contains("## 全体テーマ"));
        assert!(text.contains("## 話プロット"));
        assert!(!text.contains("## 章プロット"));
    }
}
