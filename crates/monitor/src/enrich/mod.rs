//! Enrichment of newly discovered skills for the report.
//!
//! Only the top few new skills by downloads are inspected, one at a time,
//! with a fixed pause after each to stay under catalog rate limits. A
//! failed inspection only affects its own entry.

pub mod frontmatter;
pub mod rules;

use std::{collections::HashSet, sync::LazyLock, time::Duration};

use {
    regex::Regex,
    serde_json::Value,
    skillwatch_config::EnrichConfig,
    tracing::{info, warn},
};

use crate::{
    catalog::CatalogClient,
    parse::static_regex,
    types::{EnrichedSkill, SkillRecord},
};

pub const MAX_TAGS: usize = 4;
pub const OPPORTUNITY_COUNT: usize = 3;
const MAX_ENV_IN_DEPS: usize = 4;
const FAILED_PLACEHOLDER: &str = "(inspection failed)";

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\b[A-Z][A-Z0-9_]{2,}\b"));

pub struct Enricher<'a, C: CatalogClient + ?Sized> {
    client: &'a C,
    config: &'a EnrichConfig,
}

impl<'a, C: CatalogClient + ?Sized> Enricher<'a, C> {
    pub fn new(client: &'a C, config: &'a EnrichConfig) -> Self {
        Self { client, config }
    }

    /// Enrich the top-N of `new_skills` by downloads, highest first.
    pub async fn enrich_top(&self, new_skills: &[SkillRecord]) -> Vec<EnrichedSkill> {
        let candidates = top_by_downloads(new_skills, self.config.top_n);
        let throttle = Duration::from_millis(self.config.throttle_ms);

        let mut enriched = Vec::with_capacity(candidates.len());
        for (i, record) in candidates.iter().enumerate() {
            info!(
                "Enriching {}/{}: {}",
                i + 1,
                candidates.len(),
                record.name
            );
            enriched.push(self.enrich_one(record).await);
            tokio::time::sleep(throttle).await;
        }
        enriched
    }

    pub async fn enrich_one(&self, record: &SkillRecord) -> EnrichedSkill {
        let slug = record.name.as_str();
        let meta = match self
            .client
            .inspect_json(slug, Duration::from_secs(self.config.inspect_timeout_secs))
            .await
        {
            Ok(meta) => meta,
            Err(e) => {
                warn!("inspect failed for {slug}: {e}");
                return failed_entry(record, e.to_string());
            },
        };

        let skill = object_at(&meta, "skill");
        let owner = object_at(&meta, "owner");
        let stats = meta
            .get("stats")
            .or_else(|| skill.get("stats"))
            .unwrap_or(&Value::Null);

        let slug = str_field(skill, &["slug"]).unwrap_or_else(|| slug.to_string());
        let display_name = str_field(skill, &["displayName", "display_name", "name"])
            .unwrap_or_else(|| slug.clone());
        let raw_summary = str_field(skill, &["summary", "description"]).unwrap_or_default();
        let owner_handle = str_field(owner, &["handle", "username", "name"]).unwrap_or_default();
        let link = if owner_handle.is_empty() {
            String::new()
        } else {
            format!(
                "{}/{owner_handle}/{slug}",
                self.config.link_base.trim_end_matches('/')
            )
        };
        let downloads = match u64_field(stats, "downloads") {
            0 => record.downloads,
            n => n,
        };

        let descriptor = self.fetch_descriptor(&slug).await;

        let type_tags = derive_tags(&descriptor, &slug, &raw_summary);
        let env_vars = detect_env_vars(&descriptor);
        let opportunities = derive_opportunities(&type_tags);
        let deps = deps_line(
            &env_vars,
            &detect_stack(&descriptor),
            mentions_no_key(&descriptor, &raw_summary),
            &self.config.descriptor_file,
        );

        EnrichedSkill {
            link,
            display_name,
            summary: truncate_summary(&raw_summary, self.config.summary_max_chars),
            type_tags,
            opportunities,
            deps,
            owner: owner_handle,
            downloads,
            stars: u64_field(stats, "stars"),
            error: None,
            slug,
        }
    }

    /// Descriptor text, or empty when it cannot be fetched.
    async fn fetch_descriptor(&self, slug: &str) -> String {
        match self
            .client
            .inspect_file(
                slug,
                &self.config.descriptor_file,
                Duration::from_secs(self.config.file_timeout_secs),
            )
            .await
        {
            Ok(text) => text
                .chars()
                .take(self.config.max_descriptor_chars)
                .collect(),
            Err(e) => {
                info!("descriptor unavailable for {slug}: {e}");
                String::new()
            },
        }
    }
}

/// Stable top-N by downloads, descending.
pub fn top_by_downloads(records: &[SkillRecord], n: usize) -> Vec<&SkillRecord> {
    let mut sorted: Vec<&SkillRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.downloads.cmp(&a.downloads));
    sorted.truncate(n);
    sorted
}

fn failed_entry(record: &SkillRecord, error: String) -> EnrichedSkill {
    EnrichedSkill {
        slug: record.name.clone(),
        link: String::new(),
        display_name: record.name.clone(),
        summary: FAILED_PLACEHOLDER.to_string(),
        type_tags: Vec::new(),
        opportunities: derive_opportunities(&[]),
        deps: FAILED_PLACEHOLDER.to_string(),
        owner: String::new(),
        downloads: record.downloads,
        stars: 0,
        error: Some(error),
    }
}

fn object_at<'v>(value: &'v Value, key: &str) -> &'v Value {
    value
        .get(key)
        .filter(|v| v.is_object())
        .unwrap_or(&Value::Null)
}

fn str_field(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k)?.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn u64_field(obj: &Value, key: &str) -> u64 {
    match obj.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Front-matter tags first, then keyword tags from slug and summary.
pub fn derive_tags(descriptor: &str, slug: &str, summary: &str) -> Vec<String> {
    let text = format!("{} {summary}", slug.replace(['-', '_'], " ")).to_lowercase();
    let text_words: Vec<String> = rules::words(&text).collect();
    let heuristic = rules::TAG_RULES
        .iter()
        .filter(|(keywords, _)| {
            keywords
                .iter()
                .any(|k| rules::mentions(&text, &text_words, k))
        })
        .map(|(_, tag)| (*tag).to_string());

    let mut seen = HashSet::new();
    frontmatter::frontmatter_tags(descriptor)
        .into_iter()
        .map(|t| t.to_lowercase())
        .chain(heuristic)
        .filter(|t| seen.insert(t.clone()))
        .take(MAX_TAGS)
        .collect()
}

/// Env-var-looking tokens of the descriptor, sorted and deduplicated.
pub fn detect_env_vars(descriptor: &str) -> Vec<String> {
    let mut vars: Vec<String> = ENV_VAR
        .find_iter(descriptor)
        .map(|m| m.as_str())
        .filter(|v| !rules::ENV_EXCLUDE.contains(v))
        .map(str::to_string)
        .collect();
    vars.sort();
    vars.dedup();
    vars
}

/// Stack labels in order of first mention.
pub fn detect_stack(descriptor: &str) -> Vec<&'static str> {
    let mut stack = Vec::new();
    for word in rules::words(descriptor) {
        if let Some((_, label)) = rules::STACK_KEYWORDS.iter().find(|(k, _)| *k == word)
            && !stack.contains(label)
        {
            stack.push(*label);
        }
    }
    stack
}

fn mentions_no_key(descriptor: &str, summary: &str) -> bool {
    [descriptor, summary]
        .iter()
        .any(|t| t.to_lowercase().contains(rules::NO_KEY_PHRASE))
}

/// Exactly [`OPPORTUNITY_COUNT`] suggestions for the given tags.
pub fn derive_opportunities(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(OPPORTUNITY_COUNT);
    for tag in tags {
        if let Some((_, hint)) = rules::OPPORTUNITY_RULES.iter().find(|(t, _)| *t == tag.as_str())
            && !out.iter().any(|o| o == hint)
        {
            out.push((*hint).to_string());
        }
    }
    for filler in rules::FILLER_OPPORTUNITIES {
        if out.len() >= OPPORTUNITY_COUNT {
            break;
        }
        if !out.iter().any(|o| o == filler) {
            out.push((*filler).to_string());
        }
    }
    out.truncate(OPPORTUNITY_COUNT);
    out
}

/// One line summarizing what a skill needs to run.
pub fn deps_line(env_vars: &[String], stack: &[&str], no_key: bool, descriptor_file: &str) -> String {
    let mut parts = Vec::new();
    if !env_vars.is_empty() {
        let shown = env_vars
            .iter()
            .take(MAX_ENV_IN_DEPS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let more = if env_vars.len() > MAX_ENV_IN_DEPS { "…" } else { "" };
        parts.push(format!("env: {shown}{more}"));
    }
    if !stack.is_empty() {
        parts.push(format!("stack: {}", stack.join(", ")));
    }
    if no_key {
        parts.push("no API key required".to_string());
    }
    if parts.is_empty() {
        return format!("none (see {descriptor_file})");
    }
    parts.join("; ")
}

/// Collapse whitespace and cut to `max_chars`, marking cuts with `…`.
pub fn truncate_summary(summary: &str, max_chars: usize) -> String {
    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let kept: String = collapsed.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
