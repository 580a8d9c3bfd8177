//! Configuration loading for stagebench.
//!
//! Supports loading configuration from TOML files, with sensible defaults
//! for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stagebench_core::stats::{ConfidenceLevel, OutlierMode, Threshold};
use stagebench_core::AnalysisSettings;
use stagebench_harness::EngineConfig;
use std::path::Path;

/// Top-level configuration for stagebench.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How logs are folded into reports and diagnosed.
    pub analysis: AnalysisConfig,
    /// Settings for baseline/candidate comparison.
    pub hypothesis: HypothesisConfig,
    /// Engine knobs, resolved by `stagebench settings`.
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Which outliers are dropped from the Result stage.
    pub outlier_mode: OutlierMode,
    /// Confidence level of the reported error interval.
    pub confidence_level: ConfidenceLevel,
    /// Known CPU frequency, enables the one-sample zero-measurement check.
    pub cpu_frequency_ghz: Option<f64>,
    /// Smallest sample the modality analyser looks at.
    pub modality_min_sample: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HypothesisConfig {
    /// Equivalence margin of the two one-sided tests.
    pub threshold: Threshold,
    /// Significance level of every test.
    pub alpha: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let analysis = AnalysisSettings::default();
        Self {
            outlier_mode: OutlierMode::default(),
            confidence_level: ConfidenceLevel::default(),
            cpu_frequency_ghz: analysis.cpu_frequency_ghz,
            modality_min_sample: analysis.modality_min_sample,
        }
    }
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            alpha: 0.05,
        }
    }
}

/// Default configuration file name.
const DEFAULT_CONFIG_FILE: &str = ".stagebench.toml";

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load `.stagebench.toml` from the current directory, or use defaults
    /// when it does not exist.
    pub fn load_or_default() -> Result<Config> {
        let path = Path::new(DEFAULT_CONFIG_FILE);

        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from the specified path, or try the default location.
    pub fn load_from(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Self::load(p),
            None => Self::load_or_default(),
        }
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            cpu_frequency_ghz: self.analysis.cpu_frequency_ghz,
            modality_min_sample: self.analysis.modality_min_sample,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagebench_harness::RunStrategy;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn load_str(content: &str) -> Result<Config> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        Config::load(file.path())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.analysis.outlier_mode, OutlierMode::RemoveUpper);
        assert_eq!(config.analysis.confidence_level, ConfidenceLevel::L999);
        assert_eq!(config.analysis.cpu_frequency_ghz, None);
        assert_eq!(config.analysis.modality_min_sample, 15);
        assert_eq!(config.hypothesis.threshold, Threshold::Relative(0.02));
        assert_eq!(config.hypothesis.alpha, 0.05);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_load_partial_config() {
        let config = load_str(
            r#"
[analysis]
outlier_mode = "remove_all"

[hypothesis]
alpha = 0.01
"#,
        )
        .unwrap();

        assert_eq!(config.analysis.outlier_mode, OutlierMode::RemoveAll);
        assert_eq!(config.hypothesis.alpha, 0.01);

        assert_eq!(config.analysis.confidence_level, ConfidenceLevel::L999);
        assert_eq!(config.hypothesis.threshold, Threshold::Relative(0.02));
    }

    #[test]
    fn test_load_full_config() {
        let config = load_str(
            r#"
[analysis]
outlier_mode = "none"
confidence_level = 0.99
cpu_frequency_ghz = 3.2
modality_min_sample = 30

[hypothesis]
threshold = { kind = "absolute", value = 5.0 }
alpha = 0.1

[engine]
strategy = "monitoring"
launch_count = 3
iteration_count = 25
iteration_time = 250.0
min_overhead_warmup_count = 4
max_overhead_warmup_count = 8
min_overhead_iteration_count = 10
max_overhead_iteration_count = 30
"#,
        )
        .unwrap();

        assert_eq!(config.analysis.outlier_mode, OutlierMode::DontRemove);
        assert_eq!(config.analysis.confidence_level, ConfidenceLevel::L99);
        assert_eq!(config.analysis.cpu_frequency_ghz, Some(3.2));
        assert_eq!(config.analysis.modality_min_sample, 30);
        assert_eq!(config.hypothesis.threshold, Threshold::Absolute(5.0));
        assert_eq!(config.hypothesis.alpha, 0.1);
        assert_eq!(config.engine.strategy, Some(RunStrategy::Monitoring));
        assert_eq!(config.engine.launch_count, Some(3));
        assert_eq!(config.engine.iteration_count, Some(25));
        assert_eq!(config.engine.iteration_time, Some(Duration::from_millis(250)));
        assert_eq!(config.engine.min_overhead_warmup_count, Some(4));
        assert_eq!(config.engine.max_overhead_warmup_count, Some(8));
        assert_eq!(config.engine.min_overhead_iteration_count, Some(10));
        assert_eq!(config.engine.max_overhead_iteration_count, Some(30));

        let settings = config.analysis_settings();
        assert_eq!(settings.cpu_frequency_ghz, Some(3.2));
        assert_eq!(settings.modality_min_sample, 30);
    }

    #[test]
    fn test_invalid_confidence_level_rejected() {
        assert!(load_str("[analysis]\nconfidence_level = 1.5\n").is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        assert!(load_str("this is not valid toml {{{{").is_err());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = Config::default();
        config.analysis.cpu_frequency_ghz = Some(2.5);
        config.hypothesis.threshold = Threshold::Relative(0.05);

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.analysis.cpu_frequency_ghz, Some(2.5));
        assert_eq!(parsed.hypothesis.threshold, Threshold::Relative(0.05));
        assert_eq!(parsed.analysis.outlier_mode, config.analysis.outlier_mode);
    }
}
