//! Configuration validation.
//!
//! Checks that a config file parses and that its values describe a usable
//! monitor policy (attempt timeouts, limits, timezone).

use std::path::{Path, PathBuf};

use crate::schema::MonitorConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "fetch.retry_timeouts_secs"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, path: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Validate the config file at `path`, or the discovered one.
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(crate::loader::find_config_file);

    let Some(actual_path) = config_path else {
        let mut diagnostics = vec![Diagnostic::new(
            Severity::Info,
            "",
            "no config file found; using defaults",
        )];
        diagnostics.extend(validate_config(&MonitorConfig::default()));
        return ValidationResult {
            diagnostics,
            config_path: None,
        };
    };

    let diagnostics = match crate::loader::load_config(&actual_path) {
        Ok(config) => validate_config(&config),
        Err(e) => vec![Diagnostic::new(Severity::Error, "", e.to_string())],
    };

    ValidationResult {
        diagnostics,
        config_path: Some(actual_path),
    }
}

/// Semantic checks on an already-parsed config.
pub fn validate_config(config: &MonitorConfig) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    if config.fetch.command.is_empty() {
        out.push(Diagnostic::new(
            Severity::Error,
            "fetch.command",
            "catalog command must name a program",
        ));
    }

    let timeouts = &config.fetch.retry_timeouts_secs;
    if timeouts.is_empty() {
        out.push(Diagnostic::new(
            Severity::Error,
            "fetch.retry_timeouts_secs",
            "at least one attempt is required",
        ));
    } else if timeouts.windows(2).any(|w| w[1] < w[0]) {
        out.push(Diagnostic::new(
            Severity::Error,
            "fetch.retry_timeouts_secs",
            "attempt timeouts must be non-decreasing",
        ));
    }
    if timeouts.contains(&0) {
        out.push(Diagnostic::new(
            Severity::Error,
            "fetch.retry_timeouts_secs",
            "attempt timeouts must be greater than zero",
        ));
    }

    if config.fetch.explore_limit == 0 {
        out.push(Diagnostic::new(
            Severity::Error,
            "fetch.explore_limit",
            "explore limit must be greater than zero",
        ));
    }

    if config.enrich.top_n == 0 {
        out.push(Diagnostic::new(
            Severity::Warning,
            "enrich.top_n",
            "no new skill will be enriched",
        ));
    } else if config.enrich.top_n > 20 {
        out.push(Diagnostic::new(
            Severity::Warning,
            "enrich.top_n",
            "large enrichment batches are likely to hit catalog rate limits",
        ));
    }

    if config.enrich.throttle_ms == 0 {
        out.push(Diagnostic::new(
            Severity::Warning,
            "enrich.throttle_ms",
            "inspection calls will not be spaced out",
        ));
    }

    if config.enrich.summary_max_chars == 0 {
        out.push(Diagnostic::new(
            Severity::Error,
            "enrich.summary_max_chars",
            "summary length must be greater than zero",
        ));
    }

    let tz = config.report.timezone.as_str();
    if tz != "local" && tz.parse::<chrono_tz::Tz>().is_err() {
        out.push(Diagnostic::new(
            Severity::Error,
            "report.timezone",
            format!("unknown timezone '{tz}'"),
        ));
    }

    out
}
