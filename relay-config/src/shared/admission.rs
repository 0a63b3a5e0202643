use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Admission control configuration for pull-serving resources.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdmissionConfig {
    /// Maximum number of in-flight admissions per resource key.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Number of re-check attempts after the first before a caller is rejected.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Time, in milliseconds, slept between re-check attempts.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl AdmissionConfig {
    /// Default maximum number of in-flight admissions per resource key.
    pub const DEFAULT_MAX_CONCURRENT: usize = 20;

    /// Default number of re-check attempts before rejection.
    pub const DEFAULT_MAX_RETRIES: u32 = 5;

    /// Default backoff between re-check attempts in milliseconds.
    pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;

    /// Validates admission configuration settings.
    ///
    /// Ensures max_concurrent is non-zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrent == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "admission.max_concurrent".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_max_concurrent() -> usize {
    AdmissionConfig::DEFAULT_MAX_CONCURRENT
}

fn default_max_retries() -> u32 {
    AdmissionConfig::DEFAULT_MAX_RETRIES
}

fn default_retry_backoff_ms() -> u64 {
    AdmissionConfig::DEFAULT_RETRY_BACKOFF_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config: AdmissionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(
            config.max_concurrent,
            AdmissionConfig::DEFAULT_MAX_CONCURRENT
        );
        assert_eq!(config.max_retries, AdmissionConfig::DEFAULT_MAX_RETRIES);
        assert_eq!(
            config.retry_backoff_ms,
            AdmissionConfig::DEFAULT_RETRY_BACKOFF_MS
        );
    }

    #[test]
    fn rejects_zero_max_concurrent() {
        let config = AdmissionConfig {
            max_concurrent: 0,
            ..AdmissionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
