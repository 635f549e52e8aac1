use crate::SortedIdsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BLOOM_BITS: usize = 1 << 16;
pub const DEFAULT_BLOOM_CAPACITY: usize = 1024;
pub const DEFAULT_REMOVE_SEARCH_RATIO: usize = 6400;

/// Tuning knobs for [`crate::SortedIdSet`].
///
/// None of these affect the observable contents of the set; they only decide
/// how much work is deferred and which resolve strategy runs.
///
/// - `bloom_bits`: bits per direction in the mixed-batch bloom filters
/// - `bloom_capacity`: accepted edits per direction before a mixed batch is forced to resolve
/// - `remove_search_ratio`: when the affected range of ids is more than this many times
///   larger than the pending removes, removes are applied by binary search and erase
///   instead of one linear set-difference pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortedIdsConfig {
    pub bloom_bits: usize,
    pub bloom_capacity: usize,
    pub remove_search_ratio: usize,
}

impl Default for SortedIdsConfig {
    fn default() -> Self {
        Self {
            bloom_bits: DEFAULT_BLOOM_BITS,
            bloom_capacity: DEFAULT_BLOOM_CAPACITY,
            remove_search_ratio: DEFAULT_REMOVE_SEARCH_RATIO,
        }
    }
}

impl SortedIdsConfig {
    pub fn validate(&self) -> Result<(), SortedIdsError> {
        if self.bloom_bits < 64 {
            return Err(SortedIdsError::Config(format!(
                "bloom_bits must be at least 64, got {}",
                self.bloom_bits
            )));
        }
        if self.bloom_capacity == 0 {
            return Err(SortedIdsError::Config(
                "bloom_capacity must be at least 1".to_string(),
            ));
        }
        if self.remove_search_ratio == 0 {
            return Err(SortedIdsError::Config(
                "remove_search_ratio must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, SortedIdsError> {
        let config: SortedIdsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SortedIdsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = SortedIdsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bloom_bits, 65_536);
        assert_eq!(config.bloom_capacity, 1024);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = SortedIdsConfig::from_json_str(r#"{"bloom_capacity": 8}"#).unwrap();
        assert_eq!(config.bloom_capacity, 8);
        assert_eq!(config.bloom_bits, DEFAULT_BLOOM_BITS);
        assert_eq!(config.remove_search_ratio, DEFAULT_REMOVE_SEARCH_RATIO);
    }

    #[test]
    fn test_rejects_tiny_bloom() {
        let err = SortedIdsConfig::from_json_str(r#"{"bloom_bits": 8}"#).unwrap_err();
        assert!(matches!(err, SortedIdsError::Config(_)));
    }

    #[test]
    fn test_rejects_zero_ratio() {
        let config = SortedIdsConfig {
            remove_search_ratio: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let err = SortedIdsConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, SortedIdsError::Json(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"bloom_bits": 4096, "bloom_capacity": 64}}"#).unwrap();
        let config = SortedIdsConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.bloom_bits, 4096);
        assert_eq!(config.bloom_capacity, 64);
    }

    #[test]
    fn test_missing_file() {
        let err = SortedIdsConfig::from_json_file("/nonexistent/sorted_ids.json").unwrap_err();
        assert!(matches!(err, SortedIdsError::Io(_)));
    }
}
