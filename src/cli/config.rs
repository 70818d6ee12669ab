//! TOML configuration file support.
//!
//! Settings that stay the same across runs can live in a config file:
//!
//! ```toml
//! # affyconv.toml
//! [conversion]
//! models = "AxiomGT1.snp-posteriors.txt"
//! adjust_clusters = true
//! output = "genotypes.tsv"
//! progress_interval = 50000
//! ```
//!
//! Command-line flags take precedence over file values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure for affyconv.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Conversion-specific settings.
    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Configuration for the convert command.
#[derive(Debug, Default, Deserialize)]
pub struct ConversionConfig {
    /// SNP posterior (cluster model) table.
    pub models: Option<PathBuf>,

    /// Re-centre clusters on the cohort's calls.
    pub adjust_clusters: Option<bool>,

    /// Output TSV path.
    pub output: Option<PathBuf>,

    /// Log progress every N markers.
    pub progress_interval: Option<u64>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [conversion]
            models = "AxiomGT1.snp-posteriors.txt"
            adjust_clusters = true
            output = "out.tsv"
            progress_interval = 5000
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(
            config.conversion.models,
            Some(PathBuf::from("AxiomGT1.snp-posteriors.txt"))
        );
        assert_eq!(config.conversion.adjust_clusters, Some(true));
        assert_eq!(config.conversion.output, Some(PathBuf::from("out.tsv")));
        assert_eq!(config.conversion.progress_interval, Some(5000));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [conversion]
            adjust_clusters = false
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.conversion.adjust_clusters, Some(false));
        assert_eq!(config.conversion.models, None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.conversion.adjust_clusters, None);
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_str("[conversion]\nadjust_clusters = \"yes\"").is_err());
    }
}
