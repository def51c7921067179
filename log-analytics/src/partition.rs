use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::{error::PartitionError, models::LogRecord};

pub const DEFAULT_MAX_PARTITIONS: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PartitionMode {
    /// Every observed status gets its own partition.
    #[default]
    NonStrict,
    /// Only the declared statuses may appear; anything else fails the build.
    Strict { declared: BTreeSet<i32> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPolicy {
    pub mode: PartitionMode,
    pub max_partitions: usize,
}

impl Default for PartitionPolicy {
    fn default() -> Self {
        Self {
            mode: PartitionMode::default(),
            max_partitions: DEFAULT_MAX_PARTITIONS,
        }
    }
}

impl PartitionPolicy {
    pub fn strict(declared: impl IntoIterator<Item = i32>) -> Self {
        Self {
            mode: PartitionMode::Strict {
                declared: declared.into_iter().collect(),
            },
            ..Self::default()
        }
    }
}

/// Records grouped by status code, in input order within each partition.
/// Rebuild it whenever the source records change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionIndex<'a> {
    partitions: BTreeMap<i32, Vec<&'a LogRecord>>,
}

impl<'a> PartitionIndex<'a> {
    pub fn build(
        records: &'a [LogRecord],
        policy: &PartitionPolicy,
    ) -> Result<Self, PartitionError> {
        if let PartitionMode::Strict { declared } = &policy.mode {
            if declared.is_empty() && !records.is_empty() {
                return Err(PartitionError::MissingStaticPartition);
            }
            if let Some(r) = records.iter().find(|r| !declared.contains(&r.status)) {
                return Err(PartitionError::UndeclaredPartition { status: r.status });
            }
        }

        let mut partitions: BTreeMap<i32, Vec<&'a LogRecord>> = BTreeMap::new();
        for record in records {
            partitions.entry(record.status).or_default().push(record);
        }
        if partitions.len() > policy.max_partitions {
            return Err(PartitionError::TooManyPartitions {
                found: partitions.len(),
                limit: policy.max_partitions,
            });
        }
        debug!(partitions = partitions.len(), records = records.len(), "built partition index");
        Ok(Self { partitions })
    }

    /// Distinct status codes present, ascending.
    pub fn keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.partitions.keys().copied()
    }

    pub fn get(&self, status: i32) -> &[&'a LogRecord] {
        self.partitions.get(&status).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &[&'a LogRecord])> + '_ {
        self.partitions.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Total records across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

pub fn partition_name(status: i32) -> String {
    format!("status={status}")
}
