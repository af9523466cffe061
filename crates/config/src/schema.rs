/// Config schema types (paths, fetch policy, enrichment, report rendering).
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub paths: PathsConfig,
    pub fetch: FetchConfig,
    pub enrich: EnrichConfig,
    pub report: ReportConfig,
}

/// Where the monitor keeps its files.
///
/// File entries are joined onto `work_dir` unless they are absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub work_dir: PathBuf,
    pub state_file: PathBuf,
    pub report_file: PathBuf,
    pub log_file: PathBuf,
    pub lock_file: PathBuf,
    pub fallback_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            state_file: "known_skills.json".into(),
            report_file: "daily_report.md".into(),
            log_file: "monitor.log".into(),
            lock_file: "monitor.lock".into(),
            fallback_file: "fallback_skills.json".into(),
        }
    }
}

impl PathsConfig {
    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.work_dir.join(file)
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.resolve(&self.state_file)
    }

    pub fn report_path(&self) -> PathBuf {
        self.resolve(&self.report_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.resolve(&self.log_file)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.resolve(&self.lock_file)
    }

    pub fn fallback_path(&self) -> PathBuf {
        self.resolve(&self.fallback_file)
    }

    /// File name of the tracked-state file, as shown in report footers.
    pub fn state_file_name(&self) -> String {
        self.state_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.state_file.display().to_string())
    }
}

/// `~/.openclaw/workspace/memory/clawhub-monitor`, or `./clawhub-monitor`
/// when no home directory can be determined.
fn default_work_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".openclaw/workspace/memory/clawhub-monitor"))
        .unwrap_or_else(|| PathBuf::from("clawhub-monitor"))
}

/// Primary listing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Catalog CLI program followed by its fixed leading arguments.
    pub command: Vec<String>,
    /// Value passed to `explore --limit`.
    pub explore_limit: u32,
    /// One entry per attempt. Must be non-empty and non-decreasing.
    pub retry_timeouts_secs: Vec<u64>,
    /// Backoff unit; the gap after attempt `i` is `base * 2^(i-1) * jitter`.
    pub backoff_base_ms: u64,
    pub warmup_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            command: vec!["npx".into(), "clawhub".into()],
            explore_limit: 80,
            retry_timeouts_secs: vec![60, 120, 240],
            backoff_base_ms: 1_000,
            warmup_timeout_secs: 20,
        }
    }
}

/// Enrichment of newly discovered skills.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// How many new skills (highest downloads first) get inspected.
    pub top_n: usize,
    pub inspect_timeout_secs: u64,
    pub file_timeout_secs: u64,
    /// Pause after every inspected skill.
    pub throttle_ms: u64,
    pub summary_max_chars: usize,
    /// Descriptor fetched with `inspect <slug> --file <descriptor_file>`.
    pub descriptor_file: String,
    pub max_descriptor_chars: usize,
    /// Skill pages live at `<link_base>/<owner>/<slug>`.
    pub link_base: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            inspect_timeout_secs: 45,
            file_timeout_secs: 30,
            throttle_ms: 1_500,
            summary_max_chars: 140,
            descriptor_file: "SKILL.md".into(),
            max_descriptor_chars: 12_000,
            link_base: "https://clawhub.ai".into(),
        }
    }
}

/// Report rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// IANA timezone used for report timestamps, or "local".
    pub timezone: String,
    /// Free-form schedule description shown in the footer.
    pub check_cadence: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Shanghai".into(),
            check_cadence: "Daily at 8:00 AM".into(),
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_files_resolve_under_work_dir() {
        let paths = PathsConfig {
            work_dir: PathBuf::from("/srv/monitor"),
            ..Default::default()
        };
        assert_eq!(
            paths.state_path(),
            PathBuf::from("/srv/monitor/known_skills.json")
        );
        assert_eq!(paths.lock_path(), PathBuf::from("/srv/monitor/monitor.lock"));
    }

    #[test]
    fn absolute_files_are_kept() {
        let paths = PathsConfig {
            work_dir: PathBuf::from("/srv/monitor"),
            report_file: PathBuf::from("/tmp/report.md"),
            ..Default::default()
        };
        assert_eq!(paths.report_path(), PathBuf::from("/tmp/report.md"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: MonitorConfig = toml::from_str("[fetch]\nexplore_limit = 20\n").unwrap();
        assert_eq!(cfg.fetch.explore_limit, 20);
        assert_eq!(cfg.fetch.retry_timeouts_secs, vec![60, 120, 240]);
        assert_eq!(cfg.enrich.top_n, 5);
        assert_eq!(cfg.paths.state_file_name(), "known_skills.json");
    }
}
