//! One monitor run: lock, fetch, diff, persist, enrich, report.

use {
    chrono::Utc,
    skillwatch_config::{
        MonitorConfig,
        validate::{Severity, validate_config},
    },
    tracing::{error, info, warn},
};

use crate::{
    Error, Result,
    catalog::CatalogClient,
    enrich::Enricher,
    fetch::{FetchSource, Payload, RetryingFetcher, fetch_fallback, write_snapshot},
    lock::ProcessLock,
    parse::{normalize_records, parse_listing},
    report::{ReportBody, ReportGenerator},
    state::{StateStore, find_new, merge},
    types::{RunOutcome, RunStatus, RunSummary, SkillRecord},
};

const FALLBACK_USED: &str = "primary failed, fallback used";

/// Records of one fetch with where they came from.
struct Fetched {
    source: FetchSource,
    records: Vec<SkillRecord>,
    reason: Option<String>,
}

pub struct Monitor<'a, C: CatalogClient + ?Sized> {
    config: &'a MonitorConfig,
    client: &'a C,
}

impl<'a, C: CatalogClient + ?Sized> Monitor<'a, C> {
    pub fn new(config: &'a MonitorConfig, client: &'a C) -> Self {
        Self { config, client }
    }

    /// Run once under the single-instance lock.
    ///
    /// Errors are limited to an invalid config and lock, state, and report
    /// I/O; every catalog failure is folded into the returned [`RunSummary`].
    pub async fn run(&self) -> Result<RunOutcome> {
        check_config(self.config)?;
        let mut lock = ProcessLock::open(&self.config.paths.lock_path())?;
        let Some(_guard) = lock.try_acquire()? else {
            info!("Another monitor process is running. Skip this run.");
            return Ok(RunOutcome::Skipped);
        };

        info!("=== ClawHub Monitor Started ===");
        let summary = self.run_locked().await?;
        info!("=== Monitor Completed ===");
        Ok(RunOutcome::Completed(summary))
    }

    async fn run_locked(&self) -> Result<RunSummary> {
        let paths = &self.config.paths;
        let reports = ReportGenerator::new(self.config);
        let Fetched {
            source,
            records,
            reason,
        } = self.fetch().await;

        if records.is_empty() {
            let reason_text = reason.clone().unwrap_or_default();
            let report = reports.render(
                &ReportBody::FetchFailed {
                    reason: &reason_text,
                },
                &source.to_string(),
                Utc::now(),
            );
            reports.write(&paths.report_path(), &report)?;
            info!("Report generated with failure notice");
            return Ok(RunSummary {
                status: RunStatus::FetchFailed,
                source: source.to_string(),
                parsed: 0,
                new: 0,
                known: 0,
                reason,
            });
        }
        info!("Parsed {} skills from source={source}", records.len());

        let store = StateStore::new(paths.state_path());
        let mut known = store.load();
        info!("Loaded {} known skills from state", known.len());

        let new_skills = find_new(&records, &known);
        info!("Found {} new skills", new_skills.len());

        merge(&mut known, &records);
        store.save(&known)?;
        info!("Updated state with {} total skills", known.len());

        if source == FetchSource::Primary
            && let Err(e) = write_snapshot(&paths.fallback_path(), &records)
        {
            warn!("could not refresh fallback snapshot: {e}");
        }

        let entries = Enricher::new(self.client, &self.config.enrich)
            .enrich_top(&new_skills)
            .await;
        let body = if new_skills.is_empty() {
            ReportBody::NoNew {
                parsed: records.len(),
            }
        } else {
            ReportBody::WithNew {
                new_count: new_skills.len(),
                entries: &entries,
            }
        };
        let report = reports.render(&body, &source.to_string(), Utc::now());
        reports.write(&paths.report_path(), &report)?;
        info!("Report saved to: {}", paths.report_path().display());

        Ok(RunSummary {
            status: body.status(),
            source: source.to_string(),
            parsed: records.len(),
            new: new_skills.len(),
            known: known.len(),
            reason,
        })
    }

    /// Primary listing, else the fallback snapshot.
    async fn fetch(&self) -> Fetched {
        let primary = RetryingFetcher::new(self.client, &self.config.fetch)
            .fetch_primary()
            .await;
        let primary_err = match primary.result {
            Ok(payload) => {
                return Fetched {
                    source: FetchSource::Primary,
                    records: into_records(payload),
                    reason: None,
                };
            },
            Err(e) => e,
        };

        warn!("primary fetch failed, trying fallback snapshot");
        match fetch_fallback(&self.config.paths.fallback_path()).result {
            Ok(payload) => Fetched {
                source: FetchSource::Fallback,
                records: into_records(payload),
                reason: Some(FALLBACK_USED.to_string()),
            },
            Err(fallback_err) => {
                warn!("fallback unavailable: {fallback_err}");
                Fetched {
                    source: FetchSource::PrimaryAndFallback,
                    records: Vec::new(),
                    reason: Some(format!("{primary_err}; {fallback_err}")),
                }
            },
        }
    }
}

/// Reject configs that validation marks as errors before touching any file.
fn check_config(config: &MonitorConfig) -> Result<()> {
    let errors: Vec<String> = validate_config(config)
        .into_iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| format!("{}: {}", d.path, d.message))
        .collect();
    if errors.is_empty() {
        return Ok(());
    }
    for e in &errors {
        error!("config error: {e}");
    }
    Err(Error::InvalidConfig(errors))
}

fn into_records(payload: Payload) -> Vec<SkillRecord> {
    match payload {
        Payload::Listing(text) => parse_listing(&text),
        Payload::Records(items) => normalize_records(&items),
    }
}
