//! Markdown status report in one of three shapes.

use std::path::Path;

use {
    chrono::{DateTime, Local, Utc},
    skillwatch_config::MonitorConfig,
};

use crate::{
    Result,
    fsutil::atomic_write,
    types::{EnrichedSkill, RunStatus},
};

/// Status-specific content of a report.
#[derive(Debug, Clone, Copy)]
pub enum ReportBody<'a> {
    /// No usable records; `reason` is shown verbatim.
    FetchFailed { reason: &'a str },
    NoNew { parsed: usize },
    WithNew {
        new_count: usize,
        entries: &'a [EnrichedSkill],
    },
}

impl ReportBody<'_> {
    pub fn status(&self) -> RunStatus {
        match self {
            Self::FetchFailed { .. } => RunStatus::FetchFailed,
            Self::NoNew { .. } => RunStatus::SuccessNoNew,
            Self::WithNew { .. } => RunStatus::SuccessWithNew,
        }
    }
}

pub struct ReportGenerator<'a> {
    config: &'a MonitorConfig,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(config: &'a MonitorConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, body: &ReportBody<'_>, source: &str, now: DateTime<Utc>) -> String {
        let (date, stamp) = self.local_times(now);
        let mut lines = vec![
            format!("# 📦 ClawHub Skill Monitor Report - {date}"),
            String::new(),
            format!("⏰ Generated: {stamp}"),
            format!("🌏 Timezone: {}", self.config.report.timezone),
            format!("📡 Source: {source}"),
            format!("🏷️ State: {}", body.status()),
            String::new(),
        ];

        match body {
            ReportBody::FetchFailed { reason } => self.fetch_failed(&mut lines, reason),
            ReportBody::NoNew { parsed } => {
                lines.push("## 📝 Status: No New Skills".into());
                lines.push(String::new());
                lines.push(format!(
                    "Fetch succeeded ({parsed} skills checked), but no new skills were found today."
                ));
            },
            ReportBody::WithNew { new_count, entries } => {
                lines.push("## 🆕 New Skills Discovered".into());
                lines.push(String::new());
                lines.push(format!(
                    "Found **{new_count}** new skill(s) today; top {} by downloads:",
                    entries.len()
                ));
                lines.push(String::new());
                for (i, entry) in entries.iter().enumerate() {
                    lines.push(entry_line(i + 1, entry));
                }
                if *new_count > entries.len() {
                    lines.push(String::new());
                    lines.push(format!("_…and {} more_", new_count - entries.len()));
                }
            },
        }

        lines.push(String::new());
        self.footer(&mut lines);
        lines.join("\n")
    }

    /// Overwrite the report file with `report`.
    pub fn write(&self, path: &Path, report: &str) -> Result<()> {
        atomic_write(path, report.as_bytes(), false)
    }

    fn fetch_failed(&self, lines: &mut Vec<String>, reason: &str) {
        let reason = if reason.trim().is_empty() {
            "unknown"
        } else {
            reason
        };
        let fallback_name = self
            .config
            .paths
            .fallback_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        lines.extend([
            "## ⚠️ Status: Fetch Failed".to_string(),
            String::new(),
            "No usable skill list was fetched this run (this is not the same as \"no new skills today\").".into(),
            String::new(),
            "**Possible reasons:**".into(),
            "- Network connectivity issues".into(),
            "- ClawHub service temporarily unavailable".into(),
            "- API response timeout (service may be slow)".into(),
            String::new(),
            format!("**Reason:** `{reason}`"),
            String::new(),
            "**Recommendation:**".into(),
            "- Retry in a low-traffic window (07:00-09:00)".into(),
            format!("- Keep `{fallback_name}` ready as a backup source"),
        ]);
    }

    fn footer(&self, lines: &mut Vec<String>) {
        let timeouts = self
            .config
            .fetch
            .retry_timeouts_secs
            .iter()
            .map(|s| format!("{s}s"))
            .collect::<Vec<_>>()
            .join("/");
        lines.extend([
            "---".to_string(),
            String::new(),
            "📊 Monitor Configuration:".into(),
            format!("- Check frequency: {}", self.config.report.check_cadence),
            format!("- Max skills per report: {}", self.config.enrich.top_n),
            format!(
                "- Retry strategy: {} attempts ({timeouts}), exponential backoff + jitter",
                self.config.fetch.retry_timeouts_secs.len()
            ),
            "- Single-instance lock: enabled".into(),
            format!(
                "- Tracked skills file: `{}`",
                self.config.paths.state_file_name()
            ),
            String::new(),
            "_This is an automated report from ClawHub Skill Monitor_".into(),
        ]);
    }

    /// Report date and timestamp in the configured timezone.
    fn local_times(&self, now: DateTime<Utc>) -> (String, String) {
        const DATE: &str = "%Y-%m-%d";
        const STAMP: &str = "%Y-%m-%d %H:%M:%S";
        let tz = self.config.report.timezone.as_str();
        match tz.parse::<chrono_tz::Tz>() {
            Ok(tz) => {
                let t = now.with_timezone(&tz);
                (t.format(DATE).to_string(), t.format(STAMP).to_string())
            },
            Err(_) => {
                let t = now.with_timezone(&Local);
                (t.format(DATE).to_string(), t.format(STAMP).to_string())
            },
        }
    }
}

/// One report line per enriched skill.
pub fn entry_line(rank: usize, skill: &EnrichedSkill) -> String {
    let name = if skill.link.is_empty() {
        format!("**{}** (`{}`)", skill.display_name, skill.slug)
    } else {
        format!("**[{}]({})**", skill.display_name, skill.link)
    };
    let tags = if skill.type_tags.is_empty() {
        "-".to_string()
    } else {
        skill.type_tags.join(", ")
    };
    let ideas: String = skill
        .opportunities
        .iter()
        .map(|o| format!(" • {o}"))
        .collect();
    let owner = if skill.owner.is_empty() {
        "unknown"
    } else {
        skill.owner.as_str()
    };

    let mut line = format!(
        "{rank}. {name} — {} | tags: {tags} | ideas:{ideas} | deps: {} | owner: {owner} · downloads: {} · stars: {}",
        skill.summary, skill.deps, skill.downloads, skill.stars
    );
    if let Some(err) = &skill.error {
        line.push_str(&format!(" | ⚠️ inspect failed: {err}"));
    }
    line
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap()
    }

    fn entry(slug: &str) -> EnrichedSkill {
        EnrichedSkill {
            slug: slug.into(),
            link: format!("https://clawhub.ai/alice/{slug}"),
            display_name: slug.to_uppercase(),
            summary: "Does things".into(),
            type_tags: vec!["web".into()],
            opportunities: vec!["one".into(), "two".into(), "three".into()],
            deps: "stack: node".into(),
            owner: "alice".into(),
            downloads: 10,
            stars: 2,
            error: None,
        }
    }

    #[test]
    fn header_uses_configured_timezone() {
        let config = MonitorConfig::default();
        let report = ReportGenerator::new(&config).render(
            &ReportBody::NoNew { parsed: 4 },
            "primary",
            now(),
        );
        assert!(report.starts_with("# 📦 ClawHub Skill Monitor Report - 2026-03-02"));
        assert!(report.contains("⏰ Generated: 2026-03-02 07:30:00"));
        assert!(report.contains("🏷️ State: success_no_new"));
        assert!(report.contains("4 skills checked"));
    }

    #[test]
    fn fetch_failed_shows_reason_and_footer() {
        let config = MonitorConfig::default();
        let report = ReportGenerator::new(&config).render(
            &ReportBody::FetchFailed {
                reason: "all primary retries failed; fallback file not found",
            },
            "primary+fallback",
            now(),
        );
        assert!(report.contains("## ⚠️ Status: Fetch Failed"));
        assert!(report.contains("`all primary retries failed; fallback file not found`"));
        assert!(report.contains("📡 Source: primary+fallback"));
        assert!(report.contains("- Retry strategy: 3 attempts (60s/120s/240s)"));
        assert!(report.contains("- Tracked skills file: `known_skills.json`"));
        assert!(report.contains("`fallback_skills.json`"));
    }

    #[test]
    fn empty_reason_renders_unknown() {
        let config = MonitorConfig::default();
        let report = ReportGenerator::new(&config).render(
            &ReportBody::FetchFailed { reason: "" },
            "primary",
            now(),
        );
        assert!(report.contains("**Reason:** `unknown`"));
    }

    #[test]
    fn with_new_lists_one_line_per_entry() {
        let config = MonitorConfig::default();
        let entries = vec![entry("weather"), entry("pdf-tools")];
        let report = ReportGenerator::new(&config).render(
            &ReportBody::WithNew {
                new_count: 7,
                entries: &entries,
            },
            "fallback",
            now(),
        );
        let lines: Vec<&str> = report
            .lines()
            .filter(|l| l.starts_with("1. ") || l.starts_with("2. "))
            .collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            assert_eq!(line.matches(" • ").count(), 3);
            assert!(line.contains("owner: alice · downloads: 10 · stars: 2"));
        }
        assert!(report.contains("Found **7** new skill(s) today; top 2 by downloads:"));
        assert!(report.contains("_…and 5 more_"));
    }

    #[test]
    fn entry_line_without_link_shows_slug_and_error() {
        let mut skill = entry("ghost");
        skill.link.clear();
        skill.owner.clear();
        skill.error = Some("timed out after 45s".into());
        let line = entry_line(3, &skill);
        assert!(line.starts_with("3. **GHOST** (`ghost`) — "));
        assert!(line.contains("owner: unknown"));
        assert!(line.ends_with("⚠️ inspect failed: timed out after 45s"));
    }

    #[test]
    fn write_overwrites_previous_report() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("daily_report.md");
        let config = MonitorConfig::default();
        let generator = ReportGenerator::new(&config);
        generator.write(&path, "old report\nwith more lines").unwrap();
        generator.write(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }
}
