//! Vault layout.
//!
//! Relative-path builders for the vault directory contract. All paths are
//! relative to the vault root and forward-slash separated; the loader joins
//! them onto its root.

/// Global forbidden keywords file.
pub const FORBIDDEN_KEYWORDS_FILE: &str = "_ai_control/forbidden_keywords.txt";

/// Visibility controller config.
pub const VISIBILITY_CONFIG_FILE: &str = "_ai_control/visibility.yaml";

/// Foreshadowing registry.
pub const REGISTRY_FILE: &str = "_foreshadowing/registry.yaml";

/// Optional reference-pattern overrides.
pub const REFERENCE_PATTERNS_FILE: &str = "_settings/reference_patterns.yaml";

/// L1 theme plot.
pub const PLOT_L1_FILE: &str = "_plot/l1_theme.md";

/// L1 overall summary.
pub const SUMMARY_L1_FILE: &str = "_summary/l1_overall.md";

/// Default style guide.
pub const STYLE_DEFAULT_FILE: &str = "_style_guides/default.md";

/// Chapter plot (L2).
pub fn plot_l2(chapter_id: &str) -> String {
    format!("_plot/l2_{chapter_id}.md")
}

/// Episode plot (L3).
pub fn plot_l3(episode_id: &str) -> String {
    format!("_plot/l3_{episode_id}.md")
}

/// Chapter summary (L2).
pub fn summary_l2(chapter_id: &str) -> String {
    format!("_summary/l2_{chapter_id}.md")
}

/// Episode summary (L3).
pub fn summary_l3(episode_id: &str) -> String {
    format!("_summary/l3_{episode_id}.md")
}

/// Per-episode style override.
pub fn style_episode(episode_id: &str) -> String {
    format!("_style_guides/episodes/{episode_id}.md")
}

/// Per-chapter style override.
pub fn style_chapter(chapter_id: &str) -> String {
    format!("_style_guides/chapters/{chapter_id}.md")
}

/// Character sheet.
pub fn character(name: &str) -> String {
    format!("characters/{name}.md")
}

/// World-setting sheet. The name may contain `/` to select a subdirectory.
pub fn world(name: &str) -> String {
    format!("world/{name}.md")
}

/// Episode file, chapter-nested when the chapter is known.
pub fn episode(episode_id: &str, chapter_id: Option<&str>) -> String {
    match chapter_id {
        Some(chapter) => format!("episodes/{chapter}/{episode_id}.md"),
        None => format!("episodes/{episode_id}.md"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leveled_paths() {
        assert_eq!(plot_l2("ch2"), "_plot/l2_ch2.md");
        assert_eq!(plot_l3("ep010"), "_plot/l3_ep010.md");
        assert_eq!(summary_l3("ep009"), "_summary/l3_ep009.md");
    }

    #[test]
    fn test_world_subdirectory() {
        assert_eq!(world("Geography/Capital"), "world/Geography/Capital.md");
    }

    #[test]
    fn test_episode_nesting() {
        assert_eq!(episode("ep010", None), "episodes/ep010.md");
        assert_eq!(episode("ep010", Some("ch2")), "episodes/ch2/ep010.md");
    }
}
