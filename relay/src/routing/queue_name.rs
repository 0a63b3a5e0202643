use std::fmt;

use tracing::warn;

/// Delimiter between a channel name and its worker-partition suffix in a queue name.
pub const PARTITION_DELIMITER: &str = "#";

/// A parsed queue name, optionally decomposed into a base channel name plus a numeric
/// worker-partition suffix.
///
/// Queue identification must never block routing: a suffix after the delimiter that does
/// not parse as an integer degrades the whole raw string to an unpartitioned base name,
/// with a logged warning instead of an error.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueName {
    base: String,
    partition: Option<u32>,
}

impl QueueName {
    /// Parses a raw queue name into a base name and an optional partition id.
    ///
    /// The first occurrence of [`PARTITION_DELIMITER`] splits base from suffix. A raw
    /// name without the delimiter is an unpartitioned queue.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(PARTITION_DELIMITER) {
            None => Self {
                base: raw.to_string(),
                partition: None,
            },
            Some((base, suffix)) => match suffix.parse::<u32>() {
                Ok(partition) => Self {
                    base: base.to_string(),
                    partition: Some(partition),
                },
                Err(_) => {
                    warn!(
                        queue = %raw,
                        "queue name has a non-numeric partition suffix, treating it as unpartitioned"
                    );

                    Self {
                        base: raw.to_string(),
                        partition: None,
                    }
                }
            },
        }
    }

    /// Builds the queue name of a specific worker partition of a channel.
    pub fn partitioned(base: impl Into<String>, partition: u32) -> Self {
        Self {
            base: base.into(),
            partition: Some(partition),
        }
    }

    /// Returns the base channel name.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the worker-partition id, if the queue is partitioned.
    pub fn partition(&self) -> Option<u32> {
        self.partition
    }

    /// Returns only the base name of a raw queue string.
    ///
    /// Applies the same delimiter rule as [`QueueName::parse`] but performs no integer
    /// validation, for callers that only need grouping, not partition routing.
    pub fn base_name(raw: &str) -> &str {
        raw.split_once(PARTITION_DELIMITER)
            .map(|(base, _)| base)
            .unwrap_or(raw)
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.partition {
            Some(partition) => write!(f, "{}{}{}", self.base, PARTITION_DELIMITER, partition),
            None => f.write_str(&self.base),
        }
    }
}
