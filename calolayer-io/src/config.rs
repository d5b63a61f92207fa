//! Directory configuration.
//!
//! A small JSON file names where datasets are read from and where output
//! products are written:
//!
//! ```json
//! { "data_dir": "/data/hgcal", "figures_dir": "figures" }
//! ```

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";
/// Default dataset file name inside `data_dir`.
pub const DEFAULT_DATA_FILE: &str = "hgcal_electron_data_0001.h5";

/// Input and output directories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the HDF5 datasets.
    pub data_dir: PathBuf,
    /// Directory receiving exported tables and histograms.
    pub figures_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            figures_dir: PathBuf::from("figures"),
        }
    }
}

impl PathsConfig {
    /// Reads a config file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or is not valid JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        log::debug!("loaded paths config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Reads a config file, falling back to defaults when it does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            log::warn!(
                "config {} not found, using default directories",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    /// Parses a config from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolves a dataset file name against `data_dir`.
    ///
    /// Absolute paths are returned unchanged.
    #[must_use]
    pub fn data_file<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Resolves an output file name inside `figures_dir`, creating the
    /// directory if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn figures_file<P: AsRef<Path>>(&self, name: P) -> Result<PathBuf> {
        fs::create_dir_all(&self.figures_dir)?;
        Ok(self.figures_dir.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_config() {
        let config = PathsConfig::from_json_str(
            r#"{"data_dir": "/data/hgcal", "figures_dir": "out/figs", "extra": 1}"#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data/hgcal"));
        assert_eq!(config.figures_dir, PathBuf::from("out/figs"));
        assert_eq!(
            config.data_file(DEFAULT_DATA_FILE),
            PathBuf::from("/data/hgcal/hgcal_electron_data_0001.h5")
        );
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(PathsConfig::from_json_str(r#"{"data_dir": "x"}"#).is_err());
    }

    #[test]
    fn test_absolute_data_file_kept() {
        let config = PathsConfig::default();
        assert_eq!(
            config.data_file("/abs/file.h5"),
            PathBuf::from("/abs/file.h5")
        );
    }

    #[test]
    fn test_load_and_figures_dir_created() {
        let dir = tempdir().unwrap();
        let figures = dir.path().join("figs");
        let config_path = dir.path().join(DEFAULT_CONFIG_FILE);
        let json = serde_json::json!({
            "data_dir": dir.path(),
            "figures_dir": figures,
        });
        fs::write(&config_path, json.to_string()).unwrap();

        let config = PathsConfig::load(&config_path).unwrap();
        assert!(!figures.exists());
        let out = config.figures_file("hits_per_event.csv").unwrap();
        assert!(figures.is_dir());
        assert_eq!(out, figures.join("hits_per_event.csv"));
    }

    #[test]
    fn test_load_or_default_missing() {
        let dir = tempdir().unwrap();
        let config = PathsConfig::load_or_default(dir.path().join("nope.json")).unwrap();
        assert_eq!(config, PathsConfig::default());
    }
}
