use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Ready-queue cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Time, in milliseconds, a ready-queue snapshot stays fresh before the next read
    /// triggers a refresh.
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,
    /// Whether a failed refresh still advances the freshness timestamp.
    ///
    /// When `true`, a broken readiness source is retried once per TTL window instead of
    /// on every read. When `false`, every read keeps retrying until a refresh succeeds.
    #[serde(default = "default_advance_ttl_on_failure")]
    pub advance_ttl_on_failure: bool,
}

impl CacheConfig {
    /// Default snapshot time-to-live in milliseconds.
    pub const DEFAULT_TTL_MS: u64 = 5000;

    /// Validates cache configuration settings.
    ///
    /// Ensures ttl_ms is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_ms == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "cache.ttl_ms".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_cache_ttl_ms(),
            advance_ttl_on_failure: default_advance_ttl_on_failure(),
        }
    }
}

fn default_cache_ttl_ms() -> u64 {
    CacheConfig::DEFAULT_TTL_MS
}

fn default_advance_ttl_on_failure() -> bool {
    true
}
