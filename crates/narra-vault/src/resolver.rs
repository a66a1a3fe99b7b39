//! Scene resolution and cross-reference extraction.
//!
//! Maps a scene identifier to candidate vault paths (best-effort: missing
//! paths resolve to `None`) and extracts character / world-setting references
//! from Markdown prose. Reference syntaxes are configurable via
//! `_settings/reference_patterns.yaml`; compiled defaults cover wiki links,
//! front-matter lists, and Japanese header-style lists. The resolver never
//! fails on malformed prose; unresolvable references are silently dropped.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use narra_core::SceneIdentifier;

use crate::layout;

/// `[[target]]` / `[[target|alias]]` wiki links.
static WIKI_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]\|]+)(?:\|[^\]]*)?\]\]").expect("wiki link regex is valid")
});

/// Default header labels introducing character lists.
const DEFAULT_CHARACTER_HEADERS: &[&str] = &["登場人物", "登場キャラクター"];

/// Default header labels introducing world-setting lists.
const DEFAULT_WORLD_HEADERS: &[&str] = &["関連設定", "世界観設定"];

/// Directory prefixes a bare wiki link must not start with to count as a
/// character reference.
const DEFAULT_RESERVED_PREFIXES: &[&str] = &["world", "_", "episodes"];

/// Configurable reference-extraction patterns
/// (`_settings/reference_patterns.yaml`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencePatterns {
    /// Regex replacing the wiki-link syntax; capture group 1 must yield the
    /// link target. `None` keeps the default `[[target]]` form.
    pub wiki_link_pattern: Option<String>,
    /// Header labels introducing character bullet lists.
    pub character_headers: Vec<String>,
    /// Header labels introducing world-setting bullet lists.
    pub world_headers: Vec<String>,
    /// Bare wiki-link prefixes that are not character names.
    pub reserved_prefixes: Vec<String>,
}

impl Default for ReferencePatterns {
    fn default() -> Self {
        Self {
            wiki_link_pattern: None,
            character_headers: DEFAULT_CHARACTER_HEADERS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            world_headers: DEFAULT_WORLD_HEADERS.iter().map(|s| (*s).to_owned()).collect(),
            reserved_prefixes: DEFAULT_RESERVED_PREFIXES
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

impl ReferencePatterns {
    /// Parse pattern overrides, falling back to defaults on bad YAML.
    /// An override regex that does not compile is dropped with a warning.
    pub fn parse_or_default(yaml: &str) -> Self {
        if yaml.trim().is_empty() {
            return Self::default();
        }
        let mut patterns: Self = match serde_yaml::from_str(yaml) {
            Ok(patterns) => patterns,
            Err(e) => {
                warn!(error = %e, "invalid reference_patterns.yaml, using defaults");
                return Self::default();
            }
        };
        if let Some(pattern) = patterns.wiki_link_pattern.as_deref() {
            if let Err(e) = Regex::new(pattern) {
                warn!(error = %e, "invalid wiki_link_pattern, using default");
                patterns.wiki_link_pattern = None;
            }
        }
        patterns
    }

    /// Compile the wiki-link override, or clone the default on a missing or
    /// invalid pattern.
    fn compile_wiki_link(&self) -> Regex {
        let Some(pattern) = self.wiki_link_pattern.as_deref() else {
            return WIKI_LINK_RE.clone();
        };
        match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                warn!(error = %e, "invalid wiki_link_pattern, using default");
                WIKI_LINK_RE.clone()
            }
        }
    }
}

/// Character and world-setting references extracted from prose.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedRefs {
    /// Character names, first-seen order, deduplicated.
    pub characters: Vec<String>,
    /// World-setting names (may contain `/`), first-seen order, deduplicated.
    pub world_settings: Vec<String>,
}

impl ExtractedRefs {
    fn push_character(&mut self, name: String) {
        if is_safe_reference(&name) && !self.characters.contains(&name) {
            self.characters.push(name);
        }
    }

    fn push_world(&mut self, name: String) {
        if is_safe_reference(&name) && !self.world_settings.contains(&name) {
            self.world_settings.push(name);
        }
    }

    /// Union with another extraction, preserving first-seen order.
    pub fn extend(&mut self, other: ExtractedRefs) {
        for name in other.characters {
            self.push_character(name);
        }
        for name in other.world_settings {
            self.push_world(name);
        }
    }
}

/// Front-matter reference lists (`characters:`, `world_settings:`).
#[derive(Debug, Default, Deserialize)]
struct FrontmatterRefs {
    #[serde(default)]
    characters: Vec<String>,
    #[serde(default)]
    world_settings: Vec<String>,
}

/// Resolves scene paths and extracts cross-references.
pub struct SceneResolver {
    root: PathBuf,
    patterns: ReferencePatterns,
    wiki_link: Regex,
}

impl SceneResolver {
    /// Create a resolver over the vault root with default patterns.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            patterns: ReferencePatterns::default(),
            wiki_link: WIKI_LINK_RE.clone(),
        }
    }

    /// Replace the reference patterns (from `_settings/reference_patterns.yaml`).
    #[must_use]
    pub fn with_patterns(mut self, patterns: ReferencePatterns) -> Self {
        self.wiki_link = patterns.compile_wiki_link();
        self.patterns = patterns;
        self
    }

    fn existing(&self, relative: String) -> Option<String> {
        self.root.join(&relative).is_file().then_some(relative)
    }

    /// The episode file for a scene, chapter-nested when the chapter is known.
    pub fn episode_path(&self, scene: &SceneIdentifier) -> Option<String> {
        if let Some(chapter) = scene.chapter_id.as_deref() {
            if let Some(path) = self.existing(layout::episode(&scene.episode_id, Some(chapter))) {
                return Some(path);
            }
        }
        self.existing(layout::episode(&scene.episode_id, None))
    }

    /// The L1 theme plot, if present.
    pub fn plot_l1_path(&self) -> Option<String> {
        self.existing(layout::PLOT_L1_FILE.to_owned())
    }

    /// The chapter plot, only when the scene knows its chapter.
    pub fn plot_l2_path(&self, scene: &SceneIdentifier) -> Option<String> {
        let chapter = scene.chapter_id.as_deref()?;
        self.existing(layout::plot_l2(chapter))
    }

    /// The episode plot, if present.
    pub fn plot_l3_path(&self, scene: &SceneIdentifier) -> Option<String> {
        self.existing(layout::plot_l3(&scene.episode_id))
    }

    /// The overall summary, if present.
    pub fn summary_l1_path(&self) -> Option<String> {
        self.existing(layout::SUMMARY_L1_FILE.to_owned())
    }

    /// The chapter summary, only when the scene knows its chapter.
    pub fn summary_l2_path(&self, scene: &SceneIdentifier) -> Option<String> {
        let chapter = scene.chapter_id.as_deref()?;
        self.existing(layout::summary_l2(chapter))
    }

    /// The episode summary for an episode id, if present.
    pub fn summary_l3_path(&self, episode_id: &str) -> Option<String> {
        self.existing(layout::summary_l3(episode_id))
    }

    /// The default style guide, if present.
    pub fn style_guide_path(&self) -> Option<String> {
        self.existing(layout::STYLE_DEFAULT_FILE.to_owned())
    }

    /// Extract character and world-setting references from Markdown prose.
    ///
    /// Applies wiki-link, front-matter-list, and header-list syntaxes; the
    /// union preserves first-seen order and drops duplicates.
    pub fn extract_references(&self, text: &str) -> ExtractedRefs {
        let mut refs = ExtractedRefs::default();
        self.extract_frontmatter_lists(text, &mut refs);
        self.extract_wiki_links(text, &mut refs);
        self.extract_header_lists(text, &mut refs);
        refs
    }

    fn extract_wiki_links(&self, text: &str, refs: &mut ExtractedRefs) {
        for caps in self.wiki_link.captures_iter(text) {
            let Some(target) = caps.get(1) else { continue };
            let target = target.as_str().trim();
            if let Some(name) = target.strip_prefix("characters/") {
                refs.push_character(name.trim().to_owned());
            } else if let Some(name) = target.strip_prefix("world/") {
                refs.push_world(name.trim().to_owned());
            } else if !self.is_reserved(target) {
                refs.push_character(target.to_owned());
            }
        }
    }

    fn is_reserved(&self, target: &str) -> bool {
        self.patterns.reserved_prefixes.iter().any(|p| {
            if p == "_" {
                target.starts_with('_')
            } else {
                target == p.as_str() || target.starts_with(&format!("{p}/"))
            }
        })
    }

    fn extract_frontmatter_lists(&self, text: &str, refs: &mut ExtractedRefs) {
        let (yaml, _) = crate::frontmatter::split_frontmatter(text);
        let Some(yaml) = yaml else { return };
        // Malformed front matter is not the resolver's problem; skip quietly.
        let Ok(lists) = serde_yaml::from_str::<FrontmatterRefs>(yaml) else {
            return;
        };
        for name in lists.characters {
            refs.push_character(strip_wiki_brackets(&name));
        }
        for name in lists.world_settings {
            refs.push_world(strip_wiki_brackets(&name));
        }
    }

    fn extract_header_lists(&self, text: &str, refs: &mut ExtractedRefs) {
        let lines: Vec<&str> = text.lines().collect();
        let mut i = 0;
        while i < lines.len() {
            let line = lines[i];
            i += 1;
            let Some(kind) = self.header_kind(line) else {
                continue;
            };
            // Consume the bullet list following the header (one blank line
            // between header and bullets is tolerated).
            while i < lines.len() {
                let item_line = lines[i].trim();
                if item_line.is_empty() && lines.get(i + 1).is_some_and(|l| is_bullet(l)) {
                    i += 1;
                    continue;
                }
                let Some(item) = bullet_item(item_line) else {
                    break;
                };
                i += 1;
                let name = strip_wiki_brackets(item);
                match kind {
                    HeaderKind::Character => refs.push_character(name),
                    HeaderKind::World => refs.push_world(name),
                }
            }
        }
    }

    fn header_kind(&self, line: &str) -> Option<HeaderKind> {
        let stripped = line.trim().trim_start_matches('#').trim();
        let label = stripped
            .strip_suffix(':')
            .or_else(|| stripped.strip_suffix('：'))
            .unwrap_or(stripped);
        if self.patterns.character_headers.iter().any(|h| h == label) {
            Some(HeaderKind::Character)
        } else if self.patterns.world_headers.iter().any(|h| h == label) {
            Some(HeaderKind::World)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy)]
enum HeaderKind {
    Character,
    World,
}

/// A reference name must stay inside its category directory once joined
/// onto `characters/` or `world/`.
fn is_safe_reference(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && name
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..")
}

fn is_bullet(line: &str) -> bool {
    bullet_item(line.trim()).is_some()
}

fn bullet_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Strip surrounding `[[ ]]`, a leading directory, and an `|alias` suffix.
fn strip_wiki_brackets(item: &str) -> String {
    let inner = item
        .trim()
        .strip_prefix("[[")
        .and_then(|s| s.strip_suffix("]]"))
        .unwrap_or(item.trim());
    let inner = inner.split('|').next().unwrap_or(inner).trim();
    let inner = inner
        .strip_prefix("characters/")
        .or_else(|| inner.strip_prefix("world/"))
        .unwrap_or(inner);
    inner.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolver() -> SceneResolver {
        SceneResolver::new("/nonexistent")
    }

    #[test]
    fn test_wiki_link_with_directory() {
        let refs = resolver().extract_references("She met [[characters/Alice]] at dusk.");
        assert_eq!(refs.characters, vec!["Alice"]);
    }

    #[test]
    fn test_wiki_link_with_alias() {
        let refs = resolver().extract_references("[[characters/Alice|the girl]] smiled.");
        assert_eq!(refs.characters, vec!["Alice"]);
    }

    #[test]
    fn test_bare_wiki_link_is_character() {
        let refs = resolver().extract_references("[[Alice]] waved to [[Bob]].");
        assert_eq!(refs.characters, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_reserved_prefixes_skipped() {
        let refs = resolver()
            .extract_references("[[world/Capital]] then [[episodes/ep001]] and [[_plot/l1_theme]].");
        assert!(refs.characters.is_empty());
        assert_eq!(refs.world_settings, vec!["Capital"]);
    }

    #[test]
    fn test_world_subdirectory_name() {
        let refs = resolver().extract_references("See [[world/Geography/Capital]].");
        assert_eq!(refs.world_settings, vec!["Geography/Capital"]);
    }

    #[test]
    fn test_frontmatter_lists() {
        let doc = "---\ncharacters: [Alice, Bob]\nworld_settings:\n  - Geography/Capital\n---\nBody.";
        let refs = resolver().extract_references(doc);
        assert_eq!(refs.characters, vec!["Alice", "Bob"]);
        assert_eq!(refs.world_settings, vec!["Geography/Capital"]);
    }

    #[test]
    fn test_japanese_header_lists() {
        let doc = "## 登場人物\n- [[Alice]]\n- Bob\n\n## 関連設定:\n- [[world/Capital]]\n";
        let refs = resolver().extract_references(doc);
        assert_eq!(refs.characters, vec!["Alice", "Bob"]);
        assert_eq!(refs.world_settings, vec!["Capital"]);
    }

    #[test]
    fn test_header_list_stops_at_prose() {
        let doc = "登場キャラクター:\n- Alice\nSome prose.\n- NotARef\n";
        let refs = resolver().extract_references(doc);
        assert_eq!(refs.characters, vec!["Alice"]);
    }

    #[test]
    fn test_dedup_first_seen_order() {
        let doc = "[[Bob]] then [[Alice]] then [[Bob]] again.";
        let refs = resolver().extract_references(doc);
        assert_eq!(refs.characters, vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_malformed_frontmatter_ignored() {
        let doc = "---\ncharacters: [unclosed\n---\n[[Alice]]";
        let refs = resolver().extract_references(doc);
        assert_eq!(refs.characters, vec!["Alice"]);
    }

    #[test]
    fn test_patterns_parse_or_default() {
        let custom = ReferencePatterns::parse_or_default("character_headers: [Cast]\n");
        assert_eq!(custom.character_headers, vec!["Cast"]);
        // Untouched fields keep defaults.
        assert_eq!(custom.world_headers, DEFAULT_WORLD_HEADERS);

        let fallback = ReferencePatterns::parse_or_default("::: not yaml [");
        assert_eq!(fallback, ReferencePatterns::default());
    }

    #[test]
    fn test_custom_wiki_link_pattern() {
        let patterns = ReferencePatterns::parse_or_default(
            "wiki_link_pattern: '\\{\\{([^}|]+)(?:\\|[^}]*)?\\}\\}'\n",
        );
        assert!(patterns.wiki_link_pattern.is_some());

        let resolver = resolver().with_patterns(patterns);
        let refs = resolver.extract_references("{{Alice}} waved to {{characters/Bob|him}}.");
        assert_eq!(refs.characters, vec!["Alice", "Bob"]);

        // The default [[...]] form is no longer matched.
        let refs = resolver.extract_references("[[Carol]] stayed home.");
        assert!(refs.characters.is_empty());
    }

    #[test]
    fn test_invalid_wiki_link_pattern_falls_back() {
        let patterns = ReferencePatterns::parse_or_default("wiki_link_pattern: '([unclosed'\n");
        assert!(patterns.wiki_link_pattern.is_none());

        let refs = resolver()
            .with_patterns(patterns)
            .extract_references("[[Alice]] waved.");
        assert_eq!(refs.characters, vec!["Alice"]);
    }

    #[test]
    fn test_traversal_references_dropped() {
        let doc = "[[../outside]] and [[world/../../etc/passwd]] and [[/etc/passwd]].";
        let refs = resolver().extract_references(doc);
        assert!(refs.characters.is_empty());
        assert!(refs.world_settings.is_empty());

        // Plain subdirectory names still pass.
        let refs = resolver().extract_references("[[world/Geography/Capital]]");
        assert_eq!(refs.world_settings, vec!["Geography/Capital"]);
    }

    #[test]
    fn test_path_resolution_best_effort() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("episodes/ch2")).unwrap();
        fs::create_dir_all(tmp.path().join("_plot")).unwrap();
        fs::write(tmp.path().join("episodes/ch2/ep010.md"), "x").unwrap();
        fs::write(tmp.path().join("episodes/ep011.md"), "x").unwrap();
        fs::write(tmp.path().join("_plot/l1_theme.md"), "x").unwrap();

        let resolver = SceneResolver::new(tmp.path());
        let nested = SceneIdentifier::new("ep010").with_chapter("ch2");
        assert_eq!(
            resolver.episode_path(&nested).as_deref(),
            Some("episodes/ch2/ep010.md")
        );

        // Chapter known but only the flat file exists.
        let flat = SceneIdentifier::new("ep011").with_chapter("ch2");
        assert_eq!(
            resolver.episode_path(&flat).as_deref(),
            Some("episodes/ep011.md")
        );

        assert_eq!(resolver.plot_l1_path().as_deref(), Some("_plot/l1_theme.md"));
        assert!(resolver.plot_l3_path(&nested).is_none());
        assert!(resolver.plot_l2_path(&SceneIdentifier::new("ep010")).is_none());
    }
}
