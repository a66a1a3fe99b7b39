//! Visibility filtering.
//!
//! Entity bodies may carry `<!-- ai_visibility: N -->` directives scoped to
//! the section heading above them. The controller does a streaming line scan
//! (no Markdown tree): sections at HIDDEN/AWARE lose heading and body, AWARE
//! additionally synthesizes one existence hint, and directive lines never
//! reach output. The filtering service applies the controller to every
//! character and world-setting value in a context.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use narra_core::{FilteredContext, VisibilityAwareContext, VisibilityHint, VisibilityLevel};

/// ATX heading of any level.
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("heading regex is valid"));

/// Section visibility directive.
static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*ai_visibility:\s*([0-3])\s*-->").expect("directive regex is valid")
});

/// Output of filtering one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilteredText {
    /// The document with suppressed sections and directives removed.
    pub text: String,
    /// Section names whose AWARE level asks for an existence hint.
    pub hints: Vec<String>,
    /// Section names removed from output (HIDDEN and AWARE).
    pub excluded_sections: Vec<String>,
}

/// Applies visibility directives to one document at a time.
#[derive(Clone, Debug, Default)]
pub struct VisibilityController {
    global_forbidden: Vec<String>,
}

impl VisibilityController {
    /// Create a controller with no global forbidden keywords.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the controller-scope forbidden keywords (`visibility.yaml`).
    #[must_use]
    pub fn with_global_forbidden(mut self, keywords: Vec<String>) -> Self {
        self.global_forbidden = keywords;
        self
    }

    /// The controller-scope forbidden keywords.
    pub fn global_forbidden(&self) -> &[String] {
        &self.global_forbidden
    }

    /// Filter a document, removing suppressed sections and all directives.
    pub fn filter_text(&self, text: &str) -> FilteredText {
        let mut out = FilteredText::default();
        // (heading line, section name, explicit level, body lines)
        let mut section: Option<(String, String, Option<VisibilityLevel>, Vec<String>)> = None;

        for line in text.lines() {
            if let Some(caps) = DIRECTIVE_RE.captures(line) {
                // Directive lines are stripped regardless of placement; the
                // first directive in a section decides its level.
                if let Some((_, _, level @ None, _)) = section.as_mut() {
                    let digit = caps[1].parse().unwrap_or(3);
                    *level = VisibilityLevel::from_digit(digit);
                }
                continue;
            }

            if let Some(caps) = HEADING_RE.captures(line) {
                flush(section.take(), &mut out);
                section = Some((
                    line.to_owned(),
                    caps[2].trim().to_owned(),
                    None,
                    Vec::new(),
                ));
                continue;
            }

            match section.as_mut() {
                Some((_, _, _, body)) => body.push(line.to_owned()),
                None => {
                    out.text.push_str(line);
                    out.text.push('\n');
                }
            }
        }
        flush(section.take(), &mut out);

        out
    }
}

fn flush(
    section: Option<(String, String, Option<VisibilityLevel>, Vec<String>)>,
    out: &mut FilteredText,
) {
    let Some((heading, name, level, body)) = section else {
        return;
    };
    let level = level.unwrap_or_default();

    if level.includes_content() {
        out.text.push_str(&heading);
        out.text.push('\n');
        for line in body {
            out.text.push_str(&line);
            out.text.push('\n');
        }
        return;
    }

    debug!(section = %name, level = level.as_digit(), "section suppressed");
    out.excluded_sections.push(name.clone());
    if level.emits_hint() {
        out.hints.push(name);
    }
}

/// Applies the controller across a whole context.
#[derive(Clone, Debug)]
pub struct VisibilityFilteringService {
    controller: VisibilityController,
    target_level: VisibilityLevel,
}

impl VisibilityFilteringService {
    /// Wrap a controller with the default KNOW reporting level.
    pub fn new(controller: VisibilityController) -> Self {
        Self {
            controller,
            target_level: VisibilityLevel::Know,
        }
    }

    /// Override the reported target level.
    #[must_use]
    pub fn with_target_level(mut self, level: VisibilityLevel) -> Self {
        self.target_level = level;
        self
    }

    /// Filter every character and world-setting value in `base`.
    pub fn filter_context(&self, mut base: FilteredContext) -> VisibilityAwareContext {
        let mut hints = Vec::new();
        let mut excluded = Vec::new();

        self.filter_category("character", &mut base.characters, &mut hints, &mut excluded);
        self.filter_category("world", &mut base.world_settings, &mut hints, &mut excluded);

        let mut ctx = VisibilityAwareContext::new(base, self.target_level);
        ctx.hints = hints;
        ctx.excluded_sections = excluded;
        ctx.add_forbidden_keywords(self.controller.global_forbidden().to_vec());
        ctx
    }

    fn filter_category(
        &self,
        category: &str,
        entries: &mut BTreeMap<String, String>,
        hints: &mut Vec<VisibilityHint>,
        excluded: &mut Vec<String>,
    ) {
        for (name, text) in entries.iter_mut() {
            let outcome = self.controller.filter_text(text);

            if !outcome.excluded_sections.is_empty() {
                let label = format!("{category}.{name}");
                if !excluded.contains(&label) {
                    excluded.push(label);
                }
            }

            for section in outcome.hints {
                hints.push(VisibilityHint {
                    category: category.to_owned(),
                    entity_id: name.clone(),
                    hint_text: format!("{section}には非公開の情報があります"),
                    level: VisibilityLevel::Aware,
                });
            }

            *text = outcome.text;
        }
    }
}
