//! Primary listing with retries, and the local snapshot fallback.

use std::{path::Path, time::Duration};

use {
    rand::Rng,
    serde_json::Value,
    skillwatch_config::FetchConfig,
    thiserror::Error,
    tracing::{info, warn},
};

use crate::{
    Result,
    catalog::CatalogClient,
    fsutil::atomic_write,
    types::{SkillRecord, SnapshotEntry},
};

/// Multiplicative jitter range applied to every backoff gap.
const JITTER: std::ops::Range<f64> = 0.6..1.4;

/// Where a run's records came from, as shown in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Primary,
    Fallback,
    /// Both sources were tried and neither produced records.
    PrimaryAndFallback,
}

impl std::fmt::Display for FetchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
            Self::PrimaryAndFallback => "primary+fallback",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("all primary retries failed")]
    RetriesExhausted,

    #[error("fallback file not found")]
    FallbackMissing,

    #[error("fallback json must be a list")]
    FallbackNotList,

    #[error("fallback file is empty")]
    FallbackEmpty,

    #[error("fallback parse error: {0}")]
    FallbackParse(String),
}

/// Successful fetch payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw `explore` text.
    Listing(String),
    /// Items of the fallback snapshot.
    Records(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub source: FetchSource,
    pub result: std::result::Result<Payload, FetchError>,
}

/// Runs the listing command under the configured attempt policy.
pub struct RetryingFetcher<'a, C: CatalogClient + ?Sized> {
    client: &'a C,
    config: &'a FetchConfig,
}

impl<'a, C: CatalogClient + ?Sized> RetryingFetcher<'a, C> {
    pub fn new(client: &'a C, config: &'a FetchConfig) -> Self {
        Self { client, config }
    }

    pub async fn fetch_primary(&self) -> FetchOutcome {
        info!("Fetching skills from clawhub explore...");
        self.warmup().await;

        let attempts = self.config.retry_timeouts_secs.len();
        for (idx, &timeout_secs) in self.config.retry_timeouts_secs.iter().enumerate() {
            let attempt = idx + 1;
            info!("Attempt {attempt}/{attempts} with {timeout_secs}s timeout...");

            match self
                .client
                .explore(self.config.explore_limit, Duration::from_secs(timeout_secs))
                .await
            {
                Ok(output) => {
                    info!("Successfully fetched skills from primary source");
                    return FetchOutcome {
                        source: FetchSource::Primary,
                        result: Ok(Payload::Listing(output)),
                    };
                },
                Err(e) => warn!("clawhub error (attempt {attempt}): {e}"),
            }

            if attempt < attempts {
                let delay = backoff_delay(
                    Duration::from_millis(self.config.backoff_base_ms),
                    attempt,
                    rand::rng().random_range(JITTER),
                );
                info!("Backoff sleeping {:.2}s before retry", delay.as_secs_f64());
                tokio::time::sleep(delay).await;
            }
        }

        FetchOutcome {
            source: FetchSource::Primary,
            result: Err(FetchError::RetriesExhausted),
        }
    }

    async fn warmup(&self) {
        let limit = Duration::from_secs(self.config.warmup_timeout_secs);
        match self.client.warmup(limit).await {
            Ok(()) => info!("catalog warmup completed"),
            Err(e) => info!("catalog warmup skipped: {e}"),
        }
    }
}

/// Gap after the 1-based `attempt`: `base * 2^(attempt-1) * jitter`.
pub fn backoff_delay(base: Duration, attempt: usize, jitter: f64) -> Duration {
    let exp = attempt.saturating_sub(1).min(16) as u32;
    base.mul_f64(f64::from(2u32.pow(exp)) * jitter)
}

/// Read the local snapshot. Never fails; problems become [`FetchError`]s.
pub fn fetch_fallback(path: &Path) -> FetchOutcome {
    let result = read_fallback(path);
    if let Ok(Payload::Records(items)) = &result {
        info!("Loaded fallback skills: {} records", items.len());
    }
    FetchOutcome {
        source: FetchSource::Fallback,
        result,
    }
}

fn read_fallback(path: &Path) -> std::result::Result<Payload, FetchError> {
    if !path.exists() {
        return Err(FetchError::FallbackMissing);
    }
    let data =
        std::fs::read_to_string(path).map_err(|e| FetchError::FallbackParse(e.to_string()))?;
    match serde_json::from_str::<Value>(&data) {
        Ok(Value::Array(items)) if items.is_empty() => Err(FetchError::FallbackEmpty),
        Ok(Value::Array(items)) => Ok(Payload::Records(items)),
        Ok(_) => Err(FetchError::FallbackNotList),
        Err(e) => Err(FetchError::FallbackParse(e.to_string())),
    }
}

/// Persist freshly fetched records as the next run's fallback.
pub fn write_snapshot(path: &Path, records: &[SkillRecord]) -> Result<()> {
    let entries: Vec<SnapshotEntry> = records.iter().map(SnapshotEntry::from).collect();
    let data = serde_json::to_string_pretty(&entries)?;
    atomic_write(path, data.as_bytes(), false)
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::catalog::CatalogError,
        async_trait::async_trait,
        std::sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        tokio::time::Instant,
    };

    /// Fails `failures` explore calls, then succeeds; records timeouts seen.
    struct FlakyCatalog {
        failures: usize,
        calls: AtomicUsize,
        timeouts: Mutex<Vec<u64>>,
        called_at: Mutex<Vec<Instant>>,
    }

    impl FlakyCatalog {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
                timeouts: Mutex::new(Vec::new()),
                called_at: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CatalogClient for FlakyCatalog {
        async fn warmup(&self, _limit: Duration) -> std::result::Result<(), CatalogError> {
            Err(CatalogError::Timeout { secs: 20 })
        }

        async fn explore(
            &self,
            _limit: u32,
            deadline: Duration,
        ) -> std::result::Result<String, CatalogError> {
            self.timeouts.lock().unwrap().push(deadline.as_secs());
            self.called_at.lock().unwrap().push(Instant::now());
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(CatalogError::Failed {
                    detail: "503".into(),
                });
            }
            Ok("weather 10 downloads\n".into())
        }

        async fn inspect_json(
            &self,
            _slug: &str,
            _deadline: Duration,
        ) -> std::result::Result<Value, CatalogError> {
            unreachable!()
        }

        async fn inspect_file(
            &self,
            _slug: &str,
            _file: &str,
            _deadline: Duration,
        ) -> std::result::Result<String, CatalogError> {
            unreachable!()
        }
    }

    fn fast_config() -> FetchConfig {
        FetchConfig {
            backoff_base_ms: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn succeeds_after_retries() {
        let catalog = FlakyCatalog::new(2);
        let config = fast_config();
        let outcome = RetryingFetcher::new(&catalog, &config).fetch_primary().await;

        assert_eq!(outcome.source, FetchSource::Primary);
        assert!(matches!(outcome.result, Ok(Payload::Listing(_))));
        assert_eq!(*catalog.timeouts.lock().unwrap(), vec![60, 120, 240]);
    }

    #[tokio::test]
    async fn gives_up_after_last_attempt() {
        let catalog = FlakyCatalog::new(usize::MAX);
        let config = fast_config();
        let outcome = RetryingFetcher::new(&catalog, &config).fetch_primary().await;

        assert_eq!(outcome.result, Err(FetchError::RetriesExhausted));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_only_between_attempts() {
        let catalog = FlakyCatalog::new(usize::MAX);
        let config = FetchConfig::default();
        let start = Instant::now();
        let outcome = RetryingFetcher::new(&catalog, &config).fetch_primary().await;
        let finished = Instant::now();

        assert_eq!(outcome.result, Err(FetchError::RetriesExhausted));
        let called_at = catalog.called_at.lock().unwrap().clone();
        assert_eq!(called_at.len(), 3);
        assert_eq!(called_at[0], start);

        // base 1s: gap i is 2^(i-1) seconds scaled by a jitter in [0.6, 1.4)
        let first = called_at[1] - called_at[0];
        let second = called_at[2] - called_at[1];
        assert!(first >= Duration::from_millis(600) && first <= Duration::from_millis(1410));
        assert!(second >= Duration::from_millis(1200) && second <= Duration::from_millis(2810));
        assert_eq!(finished, called_at[2]);
    }

    #[test]
    fn backoff_grows_exponentially_with_jitter() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 1, 1.0), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 2, 1.0), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 3, 0.5), Duration::from_secs(2));
        let jittered = backoff_delay(base, 2, 1.4);
        assert!(jittered > Duration::from_millis(2700) && jittered <= Duration::from_millis(2800));
        assert_eq!(backoff_delay(Duration::ZERO, 3, 1.3), Duration::ZERO);
    }

    #[test]
    fn fallback_errors_are_distinct() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fallback_skills.json");

        assert_eq!(fetch_fallback(&path).result, Err(FetchError::FallbackMissing));

        std::fs::write(&path, "[]").unwrap();
        assert_eq!(fetch_fallback(&path).result, Err(FetchError::FallbackEmpty));

        std::fs::write(&path, r#"{"name": "weather"}"#).unwrap();
        assert_eq!(fetch_fallback(&path).result, Err(FetchError::FallbackNotList));

        std::fs::write(&path, "[{").unwrap();
        assert!(matches!(
            fetch_fallback(&path).result,
            Err(FetchError::FallbackParse(_))
        ));
    }

    #[test]
    fn snapshot_feeds_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fallback_skills.json");
        let records = vec![
            SkillRecord::new("weather", 10, "weather 10 downloads"),
            SkillRecord::new("pdf-tools", 3, "pdf-tools 3 downloads"),
        ];
        write_snapshot(&path, &records).unwrap();

        let outcome = fetch_fallback(&path);
        assert_eq!(outcome.source, FetchSource::Fallback);
        let Ok(Payload::Records(items)) = outcome.result else {
            panic!("expected records");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "weather");
        assert!(items[0].get("discovered_at").is_none());
    }
}
