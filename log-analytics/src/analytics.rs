use std::{
    collections::{BTreeSet, HashMap},
    hash::Hash,
    num::NonZero,
    sync::LazyLock,
};

use derive_getters::Getters;

use crate::{
    error::{OptionsError, PartitionError},
    ingest::IngestStats,
    invariants::{ClientAddr, Endpoint, TimeBucket, UserAgent},
    models::LogRecord,
    partition::{PartitionIndex, PartitionPolicy},
    report::{AnalysisReport, Section},
};

pub const DEFAULT_PAGE_LIMIT: usize = 3;
pub const DEFAULT_FAILURE_THRESHOLD: usize = 3;
pub const DEFAULT_FAILURE_STATUSES: [i32; 2] = [404, 500];

pub static DEFAULT_BUCKET_MINUTES: LazyLock<NonZero<u32>> =
    LazyLock::new(|| NonZero::new(1).expect("nonzero const"));

/// Per-key hit counts. Shard-local tables combine with [`CountTable::merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountTable<K: Eq + Hash> {
    counts: HashMap<K, usize>,
}

impl<K: Eq + Hash> Default for CountTable<K> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> CountTable<K> {
    pub fn record(&mut self, key: K) {
        *self.counts.entry(key).or_default() += 1;
    }

    pub fn merge(&mut self, other: Self) {
        for (key, count) in other.counts {
            *self.counts.entry(key).or_default() += count;
        }
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl<K: Eq + Hash + Ord> CountTable<K> {
    /// Count descending, ties by key ascending.
    pub fn ranked(self) -> Vec<(K, usize)> {
        let mut entries: Vec<_> = self.counts.into_iter().collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    pub fn by_key(self) -> Vec<(K, usize)> {
        let mut entries: Vec<_> = self.counts.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl<K: Eq + Hash> FromIterator<K> for CountTable<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut table = Self::default();
        for key in iter {
            table.record(key);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct AnalysisOptions {
    page_limit: usize,
    failure_statuses: BTreeSet<i32>,
    failure_threshold: usize,
    bucket_minutes: NonZero<u32>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            failure_statuses: DEFAULT_FAILURE_STATUSES.into_iter().collect(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            bucket_minutes: *DEFAULT_BUCKET_MINUTES,
        }
    }
}

impl AnalysisOptions {
    /// Validates caller-supplied knobs before any records are touched.
    pub fn new(
        page_limit: i64,
        failure_statuses: impl IntoIterator<Item = i32>,
        failure_threshold: i64,
        bucket_minutes: u32,
    ) -> Result<Self, OptionsError> {
        let page_limit = usize::try_from(page_limit).map_err(|_| {
            OptionsError::invalid("limit", format!("must be non-negative, got {page_limit}"))
        })?;
        let failure_threshold = usize::try_from(failure_threshold).map_err(|_| {
            OptionsError::invalid(
                "threshold",
                format!("must be non-negative, got {failure_threshold}"),
            )
        })?;
        let failure_statuses: BTreeSet<i32> = failure_statuses.into_iter().collect();
        if failure_statuses.is_empty() {
            return Err(OptionsError::invalid(
                "failure-status",
                "at least one status code is required",
            ));
        }
        let bucket_minutes = NonZero::new(bucket_minutes)
            .ok_or_else(|| OptionsError::invalid("bucket-minutes", "must be at least 1"))?;
        Ok(Self {
            page_limit,
            failure_statuses,
            failure_threshold,
            bucket_minutes,
        })
    }
}

/// Read-only analyses over one snapshot of ingested records.
#[derive(Debug, Clone, Copy)]
pub struct LogAnalyticsPipeline<'a> {
    records: &'a [LogRecord],
    stats: IngestStats,
}

impl<'a> LogAnalyticsPipeline<'a> {
    pub fn new(records: &'a [LogRecord]) -> Self {
        Self {
            records,
            stats: IngestStats {
                accepted: records.len(),
                skipped: 0,
            },
        }
    }

    pub fn with_stats(mut self, stats: IngestStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn total_requests(&self) -> usize {
        self.records.len()
    }

    pub fn status_code_analysis(&self) -> Vec<(i32, usize)> {
        self.records
            .iter()
            .map(|r| r.status)
            .collect::<CountTable<_>>()
            .ranked()
    }

    pub fn most_visited_pages(&self, limit: usize) -> Vec<(Endpoint, usize)> {
        let mut entries = self
            .records
            .iter()
            .map(|r| &r.url)
            .collect::<CountTable<_>>()
            .ranked();
        entries.truncate(limit);
        entries
            .into_iter()
            .map(|(url, count)| (url.clone(), count))
            .collect()
    }

    pub fn traffic_source_analysis(&self) -> Vec<(UserAgent, usize)> {
        self.records
            .iter()
            .map(|r| &r.user_agent)
            .collect::<CountTable<_>>()
            .ranked()
            .into_iter()
            .map(|(agent, count)| (agent.clone(), count))
            .collect()
    }

    /// Clients with strictly more than `threshold` responses in `statuses`,
    /// ordered by address.
    pub fn suspicious_ips(
        &self,
        statuses: &BTreeSet<i32>,
        threshold: usize,
    ) -> Vec<(ClientAddr, usize)> {
        self.records
            .iter()
            .filter(|r| statuses.contains(&r.status))
            .map(|r| &r.ip)
            .collect::<CountTable<_>>()
            .by_key()
            .into_iter()
            .filter(|(_, failed)| *failed > threshold)
            .map(|(ip, failed)| (ip.clone(), failed))
            .collect()
    }

    pub fn traffic_trend(&self, bucket_minutes: NonZero<u32>) -> Vec<(TimeBucket, usize)> {
        self.records
            .iter()
            .map(|r| r.timestamp.bucket(bucket_minutes.get()))
            .collect::<CountTable<_>>()
            .by_key()
    }

    pub fn build_partition_index(
        &self,
        policy: &PartitionPolicy,
    ) -> Result<PartitionIndex<'a>, PartitionError> {
        PartitionIndex::build(self.records, policy)
    }

    /// Runs the requested sections; an empty `sections` slice runs all of them.
    pub fn report(&self, options: &AnalysisOptions, sections: &[Section]) -> AnalysisReport {
        let wanted = |s: Section| sections.is_empty() || sections.contains(&s);
        AnalysisReport {
            ingest: self.stats,
            total_requests: wanted(Section::Total).then(|| self.total_requests()),
            status_codes: wanted(Section::Status).then(|| self.status_code_analysis()),
            top_pages: wanted(Section::Pages).then(|| self.most_visited_pages(options.page_limit)),
            traffic_sources: wanted(Section::Agents).then(|| self.traffic_source_analysis()),
            suspicious_ips: wanted(Section::Suspicious).then(|| {
                self.suspicious_ips(&options.failure_statuses, options.failure_threshold)
            }),
            traffic_trend: wanted(Section::Trend)
                .then(|| self.traffic_trend(options.bucket_minutes)),
        }
    }
}
