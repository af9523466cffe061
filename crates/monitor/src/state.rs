//! Known-skills state and new-skill detection.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use {
    serde_json::{Map, Value},
    tracing::{debug, warn},
};

use crate::{Result, fsutil::atomic_write, parse::coerce_count, types::SkillRecord};

/// Every skill ever observed, keyed by name. Only grows.
pub type KnownSkills = BTreeMap<String, SkillRecord>;

/// JSON file holding [`KnownSkills`], written via temp file + rename.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the mapping; a missing or unreadable file yields an empty one.
    ///
    /// Entries are read leniently: the key stands in for a missing `name`,
    /// counts are coerced, and entries that are not objects are skipped.
    pub fn load(&self) -> KnownSkills {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no state file yet");
            return KnownSkills::new();
        }
        let parsed = std::fs::read_to_string(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|data| {
                serde_json::from_str::<Map<String, Value>>(&data).map_err(|e| e.to_string())
            });
        let entries = match parsed {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Warning: could not load state, starting empty");
                return KnownSkills::new();
            },
        };

        let mut known = KnownSkills::new();
        for (key, value) in &entries {
            match record_from_entry(key, value) {
                Some(record) => {
                    known.insert(record.name.clone(), record);
                },
                None => warn!(key = %key, "skipping unreadable state entry"),
            }
        }
        known
    }

    /// Replace the state file with `known`, keeping the previous one as `.bak`.
    pub fn save(&self, known: &KnownSkills) -> Result<()> {
        let data = serde_json::to_string_pretty(known)?;
        atomic_write(&self.path, data.as_bytes(), true)
    }
}

fn record_from_entry(key: &str, value: &Value) -> Option<SkillRecord> {
    let obj = value.as_object()?;
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(key.trim());
    if name.is_empty() {
        return None;
    }
    let text = |field: &str| {
        obj.get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default()
    };
    Some(SkillRecord {
        name: name.to_string(),
        downloads: obj.get("downloads").map(coerce_count).unwrap_or(0),
        raw: text("raw"),
        discovered_at: text("discovered_at"),
    })
}

/// Overwrite the entry of every fetched record, new or not.
pub fn merge(known: &mut KnownSkills, fetched: &[SkillRecord]) {
    for record in fetched.iter().filter(|r| !r.name.is_empty()) {
        known.insert(record.name.clone(), record.clone());
    }
}

/// Records whose name is not in `known`, in fetch order.
///
/// Nameless records are never new, and a name repeated within one fetch is
/// reported once.
pub fn find_new<V>(current: &[SkillRecord], known: &BTreeMap<String, V>) -> Vec<SkillRecord> {
    let mut seen = HashSet::new();
    current
        .iter()
        .filter(|r| !r.name.is_empty() && !known.contains_key(&r.name))
        .filter(|r| seen.insert(r.name.clone()))
        .cloned()
        .collect()
}
