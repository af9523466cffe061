use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{Error, Result, env_subst::substitute_env, schema::MonitorConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "skillwatch.toml",
    "skillwatch.yaml",
    "skillwatch.yml",
    "skillwatch.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<MonitorConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Load config from an explicit path, or discover it in standard locations.
///
/// Search order without an explicit path:
/// 1. `./skillwatch.{toml,yaml,yml,json}`
/// 2. `~/.config/skillwatch/skillwatch.{toml,yaml,yml,json}`
///
/// Falls back to `MonitorConfig::default()` when nothing is found or the file
/// cannot be loaded; the monitor must still run on a broken config.
pub fn discover_and_load(explicit: Option<&Path>) -> MonitorConfig {
    let path = explicit.map(Path::to_path_buf).or_else(find_config_file);
    if let Some(path) = path {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    MonitorConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .or_else(|| {
            let dir = config_dir()?;
            CONFIG_FILENAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|p| p.exists())
        })
}

/// Returns the user-global config directory (`~/.config/skillwatch/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "skillwatch").map(|d| d.config_dir().to_path_buf())
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> Result<MonitorConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillwatch.yaml");
        std::fs::write(&path, "enrich:\n  top_n: 3\nreport:\n  timezone: UTC\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.enrich.top_n, 3);
        assert_eq!(cfg.report.timezone, "UTC");
    }

    #[test]
    fn loads_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillwatch.json");
        std::fs::write(&path, r#"{"fetch":{"command":["clawhub"]}}"#).unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.fetch.command, vec!["clawhub"]);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = parse_config("", Path::new("skillwatch.ini")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn broken_explicit_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skillwatch.toml");
        std::fs::write(&path, "[fetch\nexplore_limit = ").unwrap();

        let cfg = discover_and_load(Some(&path));
        assert_eq!(cfg.fetch.explore_limit, 80);
    }
}
