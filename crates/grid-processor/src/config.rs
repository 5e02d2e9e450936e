//! Configuration for run caching and query resolution.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use wind_common::{WindError, WindResult};

/// What the working set does when a new run arrives at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Drop the least recently used run.
    #[default]
    Lru,
    /// Drop every cached run, then insert the new one.
    ClearAll,
}

impl FromStr for EvictionPolicy {
    type Err = WindError;

    /// Parse a policy name (`lru`, `clear_all`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            "clear_all" | "clearall" => Ok(EvictionPolicy::ClearAll),
            _ => Err(WindError::ConfigError(format!(
                "unknown eviction policy '{}', expected lru or clear_all",
                s
            ))),
        }
    }
}

/// Working-set memory cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingSetConfig {
    /// Maximum number of parsed runs held in memory.
    pub capacity: usize,

    /// Eviction policy once `capacity` is reached.
    pub policy: EvictionPolicy,
}

impl Default for WorkingSetConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            policy: EvictionPolicy::Lru,
        }
    }
}

/// Upper bounds on query fan-out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLimits {
    /// Maximum number of generated samples in a range query.
    pub max_range_samples: usize,

    /// Maximum number of days in a series query.
    pub max_series_days: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_range_samples: 250_000,
            max_series_days: 366,
        }
    }
}

impl WorkingSetConfig {
    pub fn validate(&self) -> WindResult<()> {
        if self.capacity == 0 {
            return Err(WindError::ConfigError(
                "working set capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl QueryLimits {
    pub fn validate(&self) -> WindResult<()> {
        if self.max_range_samples == 0 || self.max_series_days == 0 {
            return Err(WindError::ConfigError(
                "query limits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_str() {
        assert_eq!("LRU".parse::<EvictionPolicy>().unwrap(), EvictionPolicy::Lru);
        assert_eq!(
            " clear-all".parse::<EvictionPolicy>().unwrap(),
            EvictionPolicy::ClearAll
        );
        assert!(matches!(
            "fifo".parse::<EvictionPolicy>(),
            Err(WindError::ConfigError(_))
        ));
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(WorkingSetConfig::default().validate().is_ok());
        assert!(QueryLimits::default().validate().is_ok());
        assert!(WorkingSetConfig {
            capacity: 0,
            ..Default::default()
        }
        .validate()
        .is_err());
    }
}
