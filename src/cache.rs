//! Process-lifetime memoization of finished analyses.
//!
//! Entries expire lazily: a stale entry is reported as a miss and stays in the
//! map until the next `put` for the same repository overwrites it.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::CacheConfig;
use crate::identifier::RepositoryIdentifier;
use crate::types::AnalysisResult;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += ChronoDuration::milliseconds(by.as_millis() as i64);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    analysis: Arc<AnalysisResult>,
    created_at: DateTime<Utc>,
}

pub struct AnalysisCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    version: String,
    clock: Arc<dyn Clock>,
}

impl AnalysisCache {
    pub fn new(ttl: Duration, version: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            version: version.into(),
            clock,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.version.clone(), Arc::new(SystemClock))
    }

    pub fn key(&self, repo: &RepositoryIdentifier) -> String {
        format!("analysis_{}_{}", self.version, repo)
    }

    /// The stored analysis, if it is younger than the TTL.
    pub fn get(&self, repo: &RepositoryIdentifier) -> Option<Arc<AnalysisResult>> {
        let key = self.key(repo);
        let entry = self.entries.get(&key)?;
        let age = self.clock.now().signed_duration_since(entry.created_at);

        let fresh = age
            .to_std()
            .map(|age| age < self.ttl)
            // created_at in the future only happens with a clock that went backwards
            .unwrap_or(true);

        if fresh {
            debug!(key = %key, "Analysis cache hit");
            Some(Arc::clone(&entry.analysis))
        } else {
            debug!(key = %key, "Analysis cache entry expired");
            None
        }
    }

    pub fn put(&self, repo: &RepositoryIdentifier, analysis: Arc<AnalysisResult>) {
        let entry = CacheEntry {
            analysis,
            created_at: self.clock.now(),
        };
        self.entries.insert(self.key(repo), entry);
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TechStack;
    use crate::insights::Insights;
    use crate::package_manager::PackageManagerInfo;
    use crate::types::{CriticalFiles, RepositoryMetadata};

    fn sample_analysis(name: &str) -> Arc<AnalysisResult> {
        Arc::new(AnalysisResult {
            repo_data: RepositoryMetadata {
                full_name: format!("octo/{}", name),
                name: name.to_string(),
                description: None,
                language: Some("Rust".to_string()),
                stargazers_count: 1,
                forks_count: 0,
                topics: vec![],
                default_branch: "main".to_string(),
            },
            tech_stack: TechStack::default(),
            insights: Insights::default(),
            package_manager: PackageManagerInfo::unknown(),
            file_tree: "/\n".to_string(),
            key_file_contents: CriticalFiles::new(),
            tree_truncated: false,
            soft_failures: vec![],
        })
    }

    fn cache_with_clock(ttl_secs: u64) -> (AnalysisCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = AnalysisCache::new(Duration::from_secs(ttl_secs), "v8", clock.clone());
        (cache, clock)
    }

    fn repo(raw: &str) -> RepositoryIdentifier {
        RepositoryIdentifier::parse(raw).unwrap()
    }

    #[test]
    fn test_get_after_put_within_ttl() {
        let (cache, clock) = cache_with_clock(600);
        let analysis = sample_analysis("widgets");
        cache.put(&repo("octo/widgets"), analysis.clone());

        clock.advance(Duration::from_secs(599));
        let hit = cache.get(&repo("octo/widgets")).unwrap();
        assert!(Arc::ptr_eq(&hit, &analysis));
    }

    #[test]
    fn test_get_after_ttl_is_a_miss() {
        let (cache, clock) = cache_with_clock(600);
        cache.put(&repo("octo/widgets"), sample_analysis("widgets"));

        clock.advance(Duration::from_secs(600));
        assert!(cache.get(&repo("octo/widgets")).is_none());
        // expired entries linger until overwritten
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_overwrites_and_refreshes_timestamp() {
        let (cache, clock) = cache_with_clock(10);
        cache.put(&repo("octo/widgets"), sample_analysis("old"));
        clock.advance(Duration::from_secs(11));
        assert!(cache.get(&repo("octo/widgets")).is_none());

        cache.put(&repo("octo/widgets"), sample_analysis("new"));
        let hit = cache.get(&repo("octo/widgets")).unwrap();
        assert_eq!(hit.repo_data.name, "new");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_miss_for_unknown_repository() {
        let (cache, _clock) = cache_with_clock(600);
        assert!(cache.get(&repo("octo/unknown")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_are_version_namespaced() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
        let v8 = AnalysisCache::new(Duration::from_secs(60), "v8", clock.clone());
        let v9 = AnalysisCache::new(Duration::from_secs(60), "v9", clock);

        assert_eq!(v8.key(&repo("octo/widgets")), "analysis_v8_octo/widgets");
        assert_ne!(v8.key(&repo("octo/widgets")), v9.key(&repo("octo/widgets")));
    }
}
