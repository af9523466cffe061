use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use skillwatch_config::{
    MonitorConfig,
    validate::{self, Diagnostic, Severity, ValidationResult},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the effective configuration as TOML.
    Show,
}

pub fn handle_config(
    action: ConfigAction,
    explicit: Option<&Path>,
    effective: &MonitorConfig,
) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(explicit, verbose),
        ConfigAction::Show => {
            print!("{}", skillwatch_config::to_toml_string(effective)?);
            Ok(())
        },
    }
}

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(explicit: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(explicit);

    match &result.config_path {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    let lines: Vec<String> = result
        .diagnostics
        .iter()
        .filter(|d| verbose || d.severity != Severity::Info)
        .map(diagnostic_line)
        .collect();
    for line in &lines {
        eprintln!("  {line}");
    }
    if !lines.is_empty() {
        eprintln!();
    }
    eprintln!("{}", summary_line(&result));

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn diagnostic_line(d: &Diagnostic) -> String {
    let color = match d.severity {
        Severity::Error => RED,
        Severity::Warning => YELLOW,
        Severity::Info => CYAN,
    };
    let label = format!("{BOLD}{color}{}{RESET}", d.severity);
    if d.path.is_empty() {
        format!("{label} {}", d.message)
    } else {
        format!("{label} {}: {}", d.path, d.message)
    }
}

fn summary_line(result: &ValidationResult) -> String {
    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        "No issues found.".to_string()
    } else {
        format!("{errors} error(s), {warnings} warning(s)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_line_includes_path_when_present() {
        let d = Diagnostic::new(Severity::Warning, "enrich.top_n", "large values slow runs");
        let line = diagnostic_line(&d);
        assert!(line.contains("warning"));
        assert!(line.ends_with("enrich.top_n: large values slow runs"));

        let bare = Diagnostic::new(Severity::Error, "", "bad file");
        assert!(diagnostic_line(&bare).ends_with("error\x1b[0m bad file"));
    }

    #[test]
    fn summary_counts_errors_and_warnings() {
        let clean = ValidationResult {
            diagnostics: vec![Diagnostic::new(Severity::Info, "", "no config file found")],
            config_path: None,
        };
        assert_eq!(summary_line(&clean), "No issues found.");

        let noisy = ValidationResult {
            diagnostics: vec![
                Diagnostic::new(Severity::Error, "fetch.command", "must not be empty"),
                Diagnostic::new(Severity::Warning, "enrich.throttle_ms", "0 disables throttling"),
            ],
            config_path: None,
        };
        assert_eq!(summary_line(&noisy), "1 error(s), 1 warning(s)");
    }
}
