use serde::{Deserialize, Serialize};

// ── Catalog records ─────────────────────────────────────────────────────────

/// One catalog entry as seen by a single fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    /// Catalog slug. Join key across runs; never empty once stored.
    pub name: String,
    #[serde(default)]
    pub downloads: u64,
    /// Source listing line, or a synthesized description for fallback records.
    #[serde(default)]
    pub raw: String,
    /// Local ISO-8601 time of the fetch that produced this record.
    #[serde(default)]
    pub discovered_at: String,
}

impl SkillRecord {
    pub fn new(name: impl Into<String>, downloads: u64, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            downloads,
            raw: raw.into(),
            discovered_at: now_iso(),
        }
    }
}

/// Flat entry of the fallback snapshot file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub name: String,
    pub downloads: u64,
    pub raw: String,
}

impl From<&SkillRecord> for SnapshotEntry {
    fn from(record: &SkillRecord) -> Self {
        Self {
            name: record.name.clone(),
            downloads: record.downloads,
            raw: record.raw.clone(),
        }
    }
}

pub(crate) fn now_iso() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

// ── Enrichment ──────────────────────────────────────────────────────────────

/// Report view of a newly discovered skill. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichedSkill {
    pub slug: String,
    pub link: String,
    pub display_name: String,
    pub summary: String,
    /// At most four entries.
    pub type_tags: Vec<String>,
    /// Always exactly three entries.
    pub opportunities: Vec<String>,
    pub deps: String,
    pub owner: String,
    pub downloads: u64,
    pub stars: u64,
    /// Set when the metadata inspection failed.
    pub error: Option<String>,
}

// ── Run results ─────────────────────────────────────────────────────────────

/// The three report shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    FetchFailed,
    SuccessNoNew,
    SuccessWithNew,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchFailed => "fetch_failed",
            Self::SuccessNoNew => "success_no_new",
            Self::SuccessWithNew => "success_with_new",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a monitor invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run holds the lock; nothing was touched.
    Skipped,
    Completed(RunSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub status: RunStatus,
    pub source: String,
    pub parsed: usize,
    pub new: usize,
    pub known: usize,
    pub reason: Option<String>,
}

impl RunOutcome {
    /// Process exit code: 1 only when no usable records were fetched.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(RunSummary {
                status: RunStatus::FetchFailed,
                ..
            }) => 1,
            _ => 0,
        }
    }
}
