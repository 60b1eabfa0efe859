use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, SearchError};
use crate::sort::SortKey;

pub const SEARCH_CONFIG_FILENAME: &str = "search.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page size used when a request does not name one.
    pub default_page_size: usize,
    /// Requests asking for larger pages are clamped to this size.
    pub max_page_size: usize,
    /// Corpus size at which evaluation switches to parallel filtering.
    pub parallel_threshold: usize,
    pub default_sort: SortKey,
    /// Where store snapshots are written; snapshots are disabled when unset.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: 100,
            max_page_size: 1000,
            parallel_threshold: 4096,
            default_sort: SortKey::UpdateDesc,
            snapshot_path: None,
        }
    }
}

impl SearchConfig {
    /// Loads the config from a JSON file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no search config, using defaults");
                return Ok(Self::default());
            }
            Err(error) => return Err(error.into()),
        };
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `search.json` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join(SEARCH_CONFIG_FILENAME))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(SearchError::InvalidInput(
                "page sizes must be positive".to_string(),
            ));
        }
        if self.default_page_size > self.max_page_size {
            return Err(SearchError::InvalidInput(format!(
                "default_page_size {} exceeds max_page_size {}",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let config = SearchConfig::load_from_dir(dir.path()).expect("load");
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join(SEARCH_CONFIG_FILENAME);
        fs::write(&path, r#"{"default_page_size": 25, "default_sort": "url-asc"}"#)
            .expect("write");

        let config = SearchConfig::load(&path).expect("load");
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.default_sort, SortKey::UrlAsc);
        assert_eq!(config.max_page_size, 1000);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join(SEARCH_CONFIG_FILENAME);
        let config = SearchConfig {
            parallel_threshold: 10,
            snapshot_path: Some(dir.path().join("records.bin.zst")),
            ..SearchConfig::default()
        };
        config.save(&path).expect("save");
        assert_eq!(SearchConfig::load(&path).expect("load"), config);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join(SEARCH_CONFIG_FILENAME);

        fs::write(&path, r#"{"default_page_size": 0}"#).expect("write");
        assert!(matches!(SearchConfig::load(&path), Err(SearchError::InvalidInput(_))));

        fs::write(&path, r#"{"default_page_size": 50, "max_page_size": 10}"#).expect("write");
        assert!(matches!(SearchConfig::load(&path), Err(SearchError::InvalidInput(_))));

        fs::write(&path, r#"{"default_sort": "size-asc"}"#).expect("write");
        assert!(matches!(SearchConfig::load(&path), Err(SearchError::Serialization(_))));
    }
}
