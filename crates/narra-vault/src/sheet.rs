//! Character and world-setting sheets.
//!
//! Both entity kinds share one document shape: front matter with a `name`,
//! phase records, and named sections, followed by a free Markdown body. The
//! phase records and phase-named sections are what phase filtering operates
//! on; the body is free prose and passes through verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::frontmatter::{parse_document, serialize_document};

/// One phase record on a sheet: a phase name and its episode range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    /// Phase name, matched against the configured phase order.
    pub name: String,
    /// Episode range label, e.g. `1-10`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes: Option<String>,
}

/// Sheet front matter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetFrontmatter {
    /// Display name; falls back to the file stem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Phase records in narrative order.
    #[serde(default)]
    pub phases: Vec<PhaseRecord>,
    /// Named sections. Sections keyed by a phase name are phase-scoped.
    #[serde(default)]
    pub sections: BTreeMap<String, String>,
}

/// A parsed character or world-setting sheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    /// Entity name.
    pub name: String,
    /// Phase records.
    pub phases: Vec<PhaseRecord>,
    /// Named sections.
    pub sections: BTreeMap<String, String>,
    /// Free Markdown body.
    pub body: String,
}

impl Sheet {
    /// Parse a sheet document.
    ///
    /// `fallback_name` (usually the file stem) is used when the front matter
    /// has no `name`.
    pub fn parse(path: &str, fallback_name: &str, content: &str) -> Result<Self> {
        let (frontmatter, body): (Option<SheetFrontmatter>, String) =
            parse_document(path, content)?;
        let frontmatter = frontmatter.unwrap_or_default();
        Ok(Self {
            name: frontmatter.name.unwrap_or_else(|| fallback_name.to_owned()),
            phases: frontmatter.phases,
            sections: frontmatter.sections,
            body,
        })
    }

    /// Serialize back into document form (round-trip with [`Sheet::parse`]).
    pub fn to_document(&self) -> Result<String> {
        let frontmatter = SheetFrontmatter {
            name: Some(self.name.clone()),
            phases: self.phases.clone(),
            sections: self.sections.clone(),
        };
        serialize_document(&frontmatter, &self.body)
    }

    /// Render the sheet as a Markdown block.
    ///
    /// Entity name as H1, surviving phases as a bulleted list, each section
    /// as H2 with its content, then the body verbatim.
    pub fn render_markdown(&self) -> String {
        let mut out = format!("# {}\n", self.name);

        if !self.phases.is_empty() {
            out.push('\n');
            for phase in &self.phases {
                match &phase.episodes {
                    Some(episodes) => out.push_str(&format!("- {} ({episodes})\n", phase.name)),
                    None => out.push_str(&format!("- {}\n", phase.name)),
                }
            }
        }

        for (heading, content) in &self.sections {
            out.push_str(&format!("\n## {heading}\n\n{content}\n"));
        }

        let body = self.body.trim();
        if !body.is_empty() {
            out.push('\n');
            out.push_str(body);
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "---\nname: Alice\nphases:\n  - name: initial\n    episodes: 1-10\nsections:\n  基本情報: Protagonist\n---\nAlice grew up in a village.\n";

    #[test]
    fn test_parse_full_sheet() {
        let sheet = Sheet::parse("characters/Alice.md", "Alice", ALICE).unwrap();
        assert_eq!(sheet.name, "Alice");
        assert_eq!(sheet.phases.len(), 1);
        assert_eq!(sheet.phases[0].name, "initial");
        assert_eq!(sheet.sections["基本情報"], "Protagonist");
        assert!(sheet.body.contains("village"));
    }

    #[test]
    fn test_parse_name_fallback() {
        let sheet = Sheet::parse("characters/Bob.md", "Bob", "Just a body.").unwrap();
        assert_eq!(sheet.name, "Bob");
        assert!(sheet.phases.is_empty());
        assert_eq!(sheet.body, "Just a body.");
    }

    #[test]
    fn test_render_markdown_shape() {
        let sheet = Sheet::parse("characters/Alice.md", "Alice", ALICE).unwrap();
        let md = sheet.render_markdown();
        assert!(md.starts_with("# Alice\n"));
        assert!(md.contains("- initial (1-10)"));
        assert!(md.contains("## 基本情報"));
        assert!(md.contains("Protagonist"));
        assert!(md.contains("Alice grew up in a village."));
    }

    #[test]
    fn test_render_without_phases_or_sections() {
        let sheet = Sheet {
            name: "Capital".into(),
            phases: Vec::new(),
            sections: BTreeMap::new(),
            body: "A city.\n".into(),
        };
        assert_eq!(sheet.render_markdown(), "# Capital\n\nA city.\n");
    }

    #[test]
    fn test_roundtrip() {
        let sheet = Sheet::parse("characters/Alice.md", "Alice", ALICE).unwrap();
        let doc = sheet.to_document().unwrap();
        let reparsed = Sheet::parse("characters/Alice.md", "Alice", &doc).unwrap();
        assert_eq!(reparsed, sheet);
    }
}
