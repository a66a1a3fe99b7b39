//! AI control files.
//!
//! `_ai_control/forbidden_keywords.txt` holds one keyword per line with `#`
//! line comments; `_ai_control/visibility.yaml` carries the visibility
//! controller's global forbidden keywords.

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Parse the keyword file format: one keyword per line, `#` to end-of-line
/// is a comment, blank lines ignored. Order is preserved.
pub fn parse_keyword_file(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or("").trim();
            (!line.is_empty()).then(|| line.to_owned())
        })
        .collect()
}

/// `_ai_control/visibility.yaml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Keywords forbidden in all scenes.
    pub global_forbidden_keywords: Vec<String>,
}

impl VisibilityConfig {
    /// Parse the config; empty content is an empty config.
    pub fn parse(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_file_comments_and_blanks() {
        let content = "竜王の秘密\n# comment\n封印の鍵\n\n  \n真実 # trailing comment\n";
        assert_eq!(
            parse_keyword_file(content),
            vec!["竜王の秘密", "封印の鍵", "真実"]
        );
    }

    #[test]
    fn test_keyword_file_empty() {
        assert!(parse_keyword_file("").is_empty());
        assert!(parse_keyword_file("# only comments\n").is_empty());
    }

    #[test]
    fn test_visibility_config_parse() {
        let config = VisibilityConfig::parse("global_forbidden_keywords: [真の名前]\n").unwrap();
        assert_eq!(config.global_forbidden_keywords, vec!["真の名前"]);
    }

    #[test]
    fn test_visibility_config_empty() {
        let config = VisibilityConfig::parse("").unwrap();
        assert!(config.global_forbidden_keywords.is_empty());
    }
}
