//! TOML configuration file.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZero;
use std::path::Path;

/// Struct for the TOML configuration file, the values are not validated here.
///
/// ```toml
/// alpha = 0.01
/// tests = ["frequency", "serial", "overlapping-template-matching"]
/// serial = 8
/// overlapping_template = 9
/// overlapping_probabilities = "hamano-kaneko"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub alpha: Option<f64>,
    /// Test names, as accepted by `--tests`.
    pub tests: Option<Vec<String>>,
    pub block_frequency: Option<NonZero<usize>>,
    pub approximate_entropy: Option<NonZero<usize>>,
    pub serial: Option<NonZero<usize>>,
    pub linear_complexity: Option<NonZero<usize>>,
    /// The template length of the non-overlapping template matching test.
    pub non_overlapping_template: Option<NonZero<usize>>,
    /// The template length of the overlapping template matching test.
    pub overlapping_template: Option<NonZero<usize>>,
    pub universal: Option<NonZero<usize>>,
    /// `mixed-radix` or `rust-fft`
    pub fft_backend: Option<String>,
    /// Search every aperiodic template instead of only `0...01`.
    pub all_templates: Option<bool>,
    /// `nist` or `hamano-kaneko`
    pub overlapping_probabilities: Option<String>,
}

impl TomlConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let toml = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file \"{}\"", path.display()))?;
        toml::from_str(&toml).context("Failed to parse the config file")
    }
}
