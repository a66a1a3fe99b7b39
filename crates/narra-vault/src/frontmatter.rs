//! YAML front matter handling.
//!
//! Vault documents open with an optional `---`-fenced YAML block followed by
//! a Markdown body. The split is a plain text scan; the YAML payload itself
//! goes through `serde_yaml`.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::{Result, VaultError};

/// Split a document into its raw YAML front matter and body.
///
/// Returns `(yaml, body)`. A document without an opening `---`, or without a
/// closing fence, has no front matter and is all body.
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let trimmed = content.trim_start();
    let Some(after_first) = trimmed.strip_prefix("---") else {
        return (None, content);
    };
    let after_first = after_first.strip_prefix('\n').unwrap_or(after_first);

    let Some(end_idx) = after_first.find("\n---") else {
        return (None, content);
    };

    let yaml = &after_first[..end_idx];
    let rest = &after_first[end_idx + 4..];
    let body = rest.strip_prefix('\n').unwrap_or(rest);
    (Some(yaml), body)
}

/// Parse a document into typed front matter and body.
///
/// A document without front matter yields `(None, body)`. Malformed YAML is a
/// [`VaultError::Parse`] carrying `path` for the warning message.
pub fn parse_document<T: DeserializeOwned>(path: &str, content: &str) -> Result<(Option<T>, String)> {
    let (yaml, body) = split_frontmatter(content);
    let frontmatter = match yaml {
        Some(yaml) => Some(serde_yaml::from_str(yaml).map_err(|e| VaultError::Parse {
            path: path.to_owned(),
            message: e.to_string(),
        })?),
        None => None,
    };
    Ok((frontmatter, body.to_owned()))
}

/// Serialize front matter and body back into document form.
///
/// Inverse of [`parse_document`] up to YAML formatting.
pub fn serialize_document<T: Serialize>(frontmatter: &T, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("---\n{yaml}---\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Meta {
        name: String,
    }

    #[test]
    fn test_split_with_frontmatter() {
        let doc = "---\nname: Alice\n---\n# Body\ntext";
        let (yaml, body) = split_frontmatter(doc);
        assert_eq!(yaml, Some("name: Alice"));
        assert_eq!(body, "# Body\ntext");
    }

    #[test]
    fn test_split_without_frontmatter() {
        let doc = "# Just a body";
        let (yaml, body) = split_frontmatter(doc);
        assert!(yaml.is_none());
        assert_eq!(body, doc);
    }

    #[test]
    fn test_split_unclosed_fence_is_body() {
        let doc = "---\nname: Alice\nno closing fence";
        let (yaml, body) = split_frontmatter(doc);
        assert!(yaml.is_none());
        assert_eq!(body, doc);
    }

    #[test]
    fn test_parse_document_typed() {
        let doc = "---\nname: Alice\n---\nbody";
        let (meta, body): (Option<Meta>, String) = parse_document("characters/Alice.md", doc).unwrap();
        assert_eq!(meta.unwrap().name, "Alice");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_parse_document_bad_yaml_names_path() {
        let doc = "---\nname: [unclosed\n---\nbody";
        let err = parse_document::<Meta>("characters/Bad.md", doc).unwrap_err();
        assert!(err.to_string().contains("characters/Bad.md"));
    }

    #[test]
    fn test_roundtrip() {
        let meta = Meta {
            name: "Alice".into(),
        };
        let doc = serialize_document(&meta, "body text\n").unwrap();
        let (parsed, body): (Option<Meta>, String) = parse_document("x.md", &doc).unwrap();
        assert_eq!(parsed.unwrap(), meta);
        assert_eq!(body, "body text\n");
    }
}
