//! Catalog CLI access.
//!
//! Every call is a subprocess with a hard wall-clock timeout. A timed out
//! child is killed when its future is dropped.

use std::{path::PathBuf, process::Stdio, time::Duration};

use {
    async_trait::async_trait,
    skillwatch_config::FetchConfig,
    thiserror::Error,
    tokio::{process::Command, time::timeout},
    tracing::debug,
};

/// Maximum length of the error detail kept from a failed invocation.
pub const ERROR_DETAIL_CHARS: usize = 260;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("{detail}")]
    Failed { detail: String },

    #[error("invalid JSON output: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Operations the monitor needs from the catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Best-effort call that primes caches before real attempts.
    async fn warmup(&self, limit: Duration) -> Result<(), CatalogError>;

    /// Raw text listing of the newest skills.
    async fn explore(&self, limit: u32, deadline: Duration) -> Result<String, CatalogError>;

    /// Structured metadata for one skill.
    async fn inspect_json(
        &self,
        slug: &str,
        deadline: Duration,
    ) -> Result<serde_json::Value, CatalogError>;

    /// Text of one file published with a skill.
    async fn inspect_file(
        &self,
        slug: &str,
        file: &str,
        deadline: Duration,
    ) -> Result<String, CatalogError>;
}

/// [`CatalogClient`] backed by the catalog CLI (`npx clawhub ...` by default).
pub struct CliCatalog {
    program: String,
    leading_args: Vec<String>,
    work_dir: PathBuf,
}

struct CommandOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

impl CliCatalog {
    /// `command` is the program followed by its fixed leading arguments;
    /// an empty one means the default `npx clawhub`.
    pub fn new(command: &[String], work_dir: PathBuf) -> Self {
        let command = if command.is_empty() {
            FetchConfig::default().command
        } else {
            command.to_vec()
        };
        let mut parts = command.into_iter();
        let program = parts.next().unwrap_or_default();
        let leading_args = parts.collect();
        Self {
            program,
            leading_args,
            work_dir,
        }
    }

    async fn run(&self, args: &[&str], deadline: Duration) -> Result<CommandOutput, CatalogError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if self.work_dir.is_dir() {
            cmd.current_dir(&self.work_dir);
        }

        debug!(program = %self.program, ?args, timeout_secs = deadline.as_secs(), "running catalog command");

        let output = match timeout(deadline, cmd.output()).await {
            Ok(result) => result.map_err(|source| CatalogError::Spawn {
                program: self.program.clone(),
                source,
            })?,
            Err(_) => {
                return Err(CatalogError::Timeout {
                    secs: deadline.as_secs(),
                });
            },
        };

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run and require exit status 0 with non-empty stdout.
    async fn run_checked(&self, args: &[&str], deadline: Duration) -> Result<String, CatalogError> {
        let output = self.run(args, deadline).await?;
        if output.success && !output.stdout.trim().is_empty() {
            return Ok(output.stdout);
        }
        Err(CatalogError::Failed {
            detail: error_detail(&output.stderr, &output.stdout),
        })
    }
}

#[async_trait]
impl CatalogClient for CliCatalog {
    async fn warmup(&self, limit: Duration) -> Result<(), CatalogError> {
        self.run(&["--help"], limit).await.map(|_| ())
    }

    async fn explore(&self, limit: u32, deadline: Duration) -> Result<String, CatalogError> {
        let limit = limit.to_string();
        self.run_checked(&["explore", "--limit", &limit], deadline)
            .await
    }

    async fn inspect_json(
        &self,
        slug: &str,
        deadline: Duration,
    ) -> Result<serde_json::Value, CatalogError> {
        let stdout = self
            .run_checked(&["inspect", slug, "--json"], deadline)
            .await?;
        Ok(serde_json::from_str(&strip_banners(&stdout))?)
    }

    async fn inspect_file(
        &self,
        slug: &str,
        file: &str,
        deadline: Duration,
    ) -> Result<String, CatalogError> {
        let stdout = self
            .run_checked(&["inspect", slug, "--file", file], deadline)
            .await?;
        Ok(strip_leading_banners(&stdout).to_string())
    }
}

/// First [`ERROR_DETAIL_CHARS`] of stderr, else stdout, else "unknown error".
pub fn error_detail(stderr: &str, stdout: &str) -> String {
    let text = [stderr.trim(), stdout.trim()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or("unknown error");
    text.chars().take(ERROR_DETAIL_CHARS).collect()
}

/// Drop the progress lines the CLI prints around its real output.
pub fn strip_banners(output: &str) -> String {
    output
        .lines()
        .filter(|line| !is_banner(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop the progress lines printed before a file's content.
///
/// File content may itself contain bullets or the word "fetching", so only
/// the leading run of banner lines is removed.
pub fn strip_leading_banners(output: &str) -> &str {
    let mut rest = output;
    while let Some(line) = rest.lines().next() {
        if !is_banner(line) && !line.trim().is_empty() {
            break;
        }
        rest = rest.get(line.len()..).unwrap_or_default();
        rest = rest
            .strip_prefix("\r\n")
            .or_else(|| rest.strip_prefix('\n'))
            .unwrap_or(rest);
    }
    rest
}

fn is_banner(line: &str) -> bool {
    let trimmed = line.trim_start();
    let lower = trimmed.to_lowercase();
    trimmed.starts_with("- ")
        || trimmed.starts_with('✔')
        || trimmed.starts_with('✖')
        || lower.starts_with("fetching")
        || lower.contains("rate limit")
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detail_prefers_stderr() {
        assert_eq!(error_detail("  boom \n", "out"), "boom");
        assert_eq!(error_detail("", " out "), "out");
        assert_eq!(error_detail("", ""), "unknown error");
    }

    #[test]
    fn error_detail_is_bounded() {
        let long = "é".repeat(400);
        assert_eq!(error_detail(&long, "").chars().count(), ERROR_DETAIL_CHARS);
    }

    #[test]
    fn strip_banners_keeps_json() {
        let raw = "- Fetching skill\n✔ OK\n{\n  \"skill\": {\"slug\": \"x\"}\n}\n";
        let value: serde_json::Value = serde_json::from_str(&strip_banners(raw)).unwrap();
        assert_eq!(value["skill"]["slug"], "x");
    }

    #[test]
    fn empty_command_uses_default_cli() {
        let catalog = CliCatalog::new(&[], PathBuf::from("."));
        assert_eq!(catalog.program, "npx");
        assert_eq!(catalog.leading_args, vec!["clawhub"]);

        let custom = CliCatalog::new(&["clawhub".to_string()], PathBuf::from("."));
        assert_eq!(custom.program, "clawhub");
        assert!(custom.leading_args.is_empty());
    }

    #[test]
    fn leading_banners_are_stripped_from_file_content() {
        let raw = "- Fetching skill\n\u{2714} OK\n\n---\ntags:\n  - docs\n---\n- Fetching data is easy\n";
        assert_eq!(
            strip_leading_banners(raw),
            "---\ntags:\n  - docs\n---\n- Fetching data is easy\n"
        );
        assert_eq!(strip_leading_banners("- Fetching skill\n"), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn inspect_file_keeps_dash_lists() {
        let script = "printf '%s\\n' '- Fetching skill' '---' 'name: pdf' 'tags:' '  - documents' '  - pdf' '---' '## Setup' '- Install node'";
        let catalog = CliCatalog::new(
            &["sh".to_string(), "-c".to_string(), script.to_string()],
            PathBuf::from("."),
        );
        let text = catalog
            .inspect_file("pdf", "SKILL.md", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(
            text,
            "---\nname: pdf\ntags:\n  - documents\n  - pdf\n---\n## Setup\n- Install node\n"
        );
        assert_eq!(
            crate::enrich::frontmatter::frontmatter_tags(&text),
            vec!["documents", "pdf"]
        );
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let catalog = CliCatalog::new(
            &["skillwatch-nonexistent-cli-12345".to_string()],
            PathBuf::from("."),
        );
        let err = catalog
            .explore(5, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_captures_stderr() {
        let catalog = CliCatalog::new(
            &["sh".to_string(), "-c".to_string(), "echo nope >&2; exit 3".to_string()],
            PathBuf::from("."),
        );
        let err = catalog
            .explore(5, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_times_out() {
        let catalog = CliCatalog::new(
            &["sh".to_string(), "-c".to_string(), "sleep 5".to_string()],
            PathBuf::from("."),
        );
        let err = catalog
            .explore(5, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Timeout { .. }));
    }
}
