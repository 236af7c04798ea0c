//! Splits a content file into its YAML front matter and its Markdown body.
//!
//! Front matter is optional. When present, the file's first line is `---`
//! and the block runs until the next line that is exactly `---`:
//!
//! ```md
//! ---
//! title: Hello, world!
//! date: 2024-04-16
//! description: The first post.
//! ---
//! # Hello
//!
//! World
//! ```

use crate::value::Value;
use std::collections::BTreeMap;

/// The parsed front matter of a content file. Which keys mean something is up
/// to the consumer.
pub type Frontmatter = BTreeMap<String, Value>;

const FENCE: &str = "---";
const BOM: char = '\u{feff}';

/// Parses `input` into its front matter and body. A file without an opening
/// fence has empty front matter and the whole text as its body.
pub fn parse(input: &str) -> Result<(Frontmatter, &str)> {
    let input = input.strip_prefix(BOM).unwrap_or(input);
    let (yaml_start, yaml_stop, body_start) = match fence_indices(input)? {
        Some(indices) => indices,
        None => return Ok((Frontmatter::new(), input)),
    };

    let yaml = &input[yaml_start..yaml_stop];
    let body = &input[body_start..];
    if yaml.trim().is_empty() {
        return Ok((Frontmatter::new(), body));
    }

    match serde_yaml::from_str::<serde_yaml::Value>(yaml)? {
        serde_yaml::Value::Null => Ok((Frontmatter::new(), body)),
        serde_yaml::Value::Mapping(mapping) => {
            let mut frontmatter = Frontmatter::new();
            for (key, value) in mapping {
                if let Some(key) = key_to_string(key) {
                    frontmatter.insert(key, Value::from(value));
                }
            }
            Ok((frontmatter, body))
        }
        _ => Err(ParseError::NotAMapping),
    }
}

// Returns (yaml_start, yaml_stop, body_start), or `None` if the input doesn't
// open with a fence line.
fn fence_indices(input: &str) -> Result<Option<(usize, usize, usize)>> {
    let first_line_end = line_end(input, 0);
    if input[..first_line_end].trim_end() != FENCE {
        return Ok(None);
    }

    let mut offset = first_line_end;
    while offset < input.len() {
        let end = line_end(input, offset);
        if input[offset..end].trim_end() == FENCE {
            return Ok(Some((first_line_end, offset, end)));
        }
        offset = end;
    }
    Err(ParseError::Unterminated)
}

// The index just past the newline ending the line that starts at `start`.
fn line_end(input: &str, start: usize) -> usize {
    match input[start..].find('\n') {
        Some(i) => start + i + 1,
        None => input.len(),
    }
}

fn key_to_string(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// A structurally malformed front matter block.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("front matter is missing its closing `---`")]
    Unterminated,

    #[error("front matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse() -> Result<()> {
        let (frontmatter, body) = parse(
            "---\ntitle: Simple\ndate: 2024-01-01\ntags: [a, b]\n---\nToday is the first day.\n",
        )?;
        assert_eq!(frontmatter.get("title"), Some(&Value::from("Simple")));
        assert_eq!(frontmatter.get("date"), Some(&Value::from("2024-01-01")));
        assert_eq!(frontmatter.get("tags"), Some(&Value::from(vec!["a", "b"])));
        assert_eq!(body, "Today is the first day.\n");
        Ok(())
    }

    #[test]
    fn test_no_frontmatter() -> Result<()> {
        let (frontmatter, body) = parse("# Just Markdown\n\n---\n")?;
        assert!(frontmatter.is_empty());
        assert_eq!(body, "# Just Markdown\n\n---\n");
        Ok(())
    }

    #[test]
    fn test_empty_block() -> Result<()> {
        let (frontmatter, body) = parse("---\n---\nbody")?;
        assert!(frontmatter.is_empty());
        assert_eq!(body, "body");
        Ok(())
    }

    #[test]
    fn test_crlf_and_bom() -> Result<()> {
        let (frontmatter, body) = parse("\u{feff}---\r\ntitle: Windows\r\n---\r\nbody\r\n")?;
        assert_eq!(frontmatter.get("title"), Some(&Value::from("Windows")));
        assert_eq!(body, "body\r\n");
        Ok(())
    }

    #[test]
    fn test_dashes_inside_values_are_not_fences() -> Result<()> {
        let (frontmatter, body) = parse("---\ntitle: a---b\n---\nbody")?;
        assert_eq!(frontmatter.get("title"), Some(&Value::from("a---b")));
        assert_eq!(body, "body");
        Ok(())
    }

    #[test]
    fn test_unterminated() {
        assert!(matches!(
            parse("---\ntitle: Oops\n\nbody"),
            Err(ParseError::Unterminated)
        ));
        assert!(matches!(parse("---"), Err(ParseError::Unterminated)));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            parse("---\ntitle: [unclosed\n---\nbody"),
            Err(ParseError::Yaml(_))
        ));
    }

    #[test]
    fn test_not_a_mapping() {
        assert!(matches!(
            parse("---\n- one\n- two\n---\nbody"),
            Err(ParseError::NotAMapping)
        ));
    }
}
