//! Tag extraction from a descriptor's `---` front-matter block.

use serde::Deserialize;

#[derive(Deserialize, Default)]
struct FrontMatter {
    #[serde(default)]
    tags: Option<TagList>,
    #[serde(default)]
    metadata: Option<NestedTags>,
}

#[derive(Deserialize, Default)]
struct NestedTags {
    #[serde(default)]
    tags: Option<TagList>,
}

/// `tags: [a, b]`, an indented dash list, or `tags: a, b`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagList {
    List(Vec<serde_yaml::Value>),
    Inline(String),
}

impl TagList {
    fn into_tags(self) -> Vec<String> {
        match self {
            Self::List(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    serde_yaml::Value::String(s) => Some(s),
                    serde_yaml::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Self::Inline(s) => split_inline(&s),
        }
    }
}

/// Text between the opening `---` and the next `---` line.
pub fn split_frontmatter(content: &str) -> Option<&str> {
    let trimmed = content.trim_start();
    let after_open = trimmed.strip_prefix("---")?;
    let close = after_open.find("\n---")?;
    Some(after_open[..close].trim())
}

/// Tags declared in the front matter, trimmed and without empties.
///
/// Descriptors are hand-written and often not valid YAML, so a line scan
/// takes over when the YAML parse fails.
pub fn frontmatter_tags(content: &str) -> Vec<String> {
    let Some(block) = split_frontmatter(content) else {
        return Vec::new();
    };

    let tags = match serde_yaml::from_str::<FrontMatter>(block) {
        Ok(fm) => fm
            .tags
            .or(fm.metadata.and_then(|m| m.tags))
            .map(TagList::into_tags)
            .unwrap_or_default(),
        Err(_) => scan_tags(block),
    };

    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn scan_tags(block: &str) -> Vec<String> {
    let mut lines = block.lines();
    while let Some(line) = lines.next() {
        let Some(rest) = line.trim_start().strip_prefix("tags:") else {
            continue;
        };
        let rest = rest.trim();
        if !rest.is_empty() {
            return split_inline(rest);
        }
        return lines
            .map(str::trim)
            .take_while(|l| l.starts_with('-'))
            .map(|l| unquote(l.trim_start_matches('-').trim()).to_string())
            .collect();
    }
    Vec::new()
}

fn split_inline(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|t| unquote(t.trim()).to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn unquote(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'')
}
