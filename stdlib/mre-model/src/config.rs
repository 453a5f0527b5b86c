//! Engine configuration
//!
//! Numerical tolerances and the default PRNG seed, loadable from a TOML file:
//!
//! ```toml
//! pivot_tolerance = 2.220446049250313e-16
//! rank_tolerance = 1e-10
//! symmetry_tolerance = 0.0
//! svd_max_sweeps = 60
//! default_seed = ["0x0123456789abcdef", "0xfedcba9876543210", "0x0f1e2d3c4b5a6978", "0x8796a5b4c3d2e1f0"]
//! ```
//!
//! Every field is optional. Seed words are hexadecimal strings because TOML
//! integers stop at `i64::MAX`.

use std::path::Path;

use mre_linalg::PureRustProvider;
use mre_random::Seed;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

static CONFIG: RwLock<EngineConfig> = RwLock::new(EngineConfig::DEFAULT);

/// Tunables of the numerical engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Relative factor below which a PLU pivot counts as zero: the threshold
    /// is `pivot_tolerance * max(m, n) * max|a_ij|`.
    pub pivot_tolerance: f64,
    /// Default tolerance for `rank`; `None` derives it from the largest
    /// singular value.
    pub rank_tolerance: Option<f64>,
    /// Absolute tolerance of the symmetry predicates.
    pub symmetry_tolerance: f64,
    /// Bound on Jacobi sweeps in the SVD.
    pub svd_max_sweeps: usize,
    /// Seed of the per-thread generator streams.
    #[serde(with = "seed_words")]
    pub default_seed: [u64; 4],
}

impl EngineConfig {
    /// Built-in defaults.
    pub const DEFAULT: Self = Self {
        pivot_tolerance: f64::EPSILON,
        rank_tolerance: None,
        symmetry_tolerance: 0.0,
        svd_max_sweeps: PureRustProvider::DEFAULT_SVD_SWEEPS,
        default_seed: Seed::DEFAULT.words(),
    };

    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse a configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or a field is out of
    /// range.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = |field: &'static str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidField {
                    field,
                    reason: format!("{v} is not a finite non-negative number"),
                })
            }
        };
        non_negative("pivot_tolerance", self.pivot_tolerance)?;
        non_negative("symmetry_tolerance", self.symmetry_tolerance)?;
        if let Some(tol) = self.rank_tolerance {
            non_negative("rank_tolerance", tol)?;
        }
        if self.svd_max_sweeps == 0 {
            return Err(ConfigError::InvalidField {
                field: "svd_max_sweeps",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Dense provider configured with these settings.
    #[must_use]
    pub fn provider(&self) -> PureRustProvider {
        PureRustProvider::new().with_svd_max_sweeps(self.svd_max_sweeps)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Snapshot of the process-wide configuration.
#[must_use]
pub fn config() -> EngineConfig {
    CONFIG.read().clone()
}

/// Replace the process-wide configuration.
///
/// The seed registry of the per-thread generators is updated as well; streams
/// created afterwards derive from the new seed.
pub fn set_config(config: EngineConfig) {
    debug!(
        pivot_tolerance = config.pivot_tolerance,
        svd_max_sweeps = config.svd_max_sweeps,
        "engine configuration replaced"
    );
    mre_random::set_registry_seed(Seed::new(config.default_seed));
    *CONFIG.write() = config;
}

mod seed_words {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(words: &[u64; 4], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(words.iter().map(|w| format!("{w:#018x}")))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u64; 4], D::Error> {
        let raw: Vec<String> = Vec::deserialize(d)?;
        if raw.len() != 4 {
            return Err(D::Error::invalid_length(raw.len(), &"four seed words"));
        }
        let mut words = [0u64; 4];
        for (slot, text) in words.iter_mut().zip(&raw) {
            let digits = text
                .strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .unwrap_or(text)
                .replace('_', "");
            *slot = u64::from_str_radix(&digits, 16)
                .map_err(|e| D::Error::custom(format!("bad seed word `{text}`: {e}")))?;
        }
        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(EngineConfig::parse("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_parse_fields() {
        let config = EngineConfig::parse(
            r#"
            pivot_tolerance = 1e-12
            rank_tolerance = 1e-9
            svd_max_sweeps = 10
            default_seed = ["0x1", "0x2", "0xffff_ffff_ffff_ffff", "4"]
            "#,
        )
        .unwrap();
        assert_eq!(config.pivot_tolerance, 1e-12);
        assert_eq!(config.rank_tolerance, Some(1e-9));
        assert_eq!(config.symmetry_tolerance, 0.0);
        assert_eq!(config.svd_max_sweeps, 10);
        assert_eq!(config.default_seed, [1, 2, u64::MAX, 4]);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::parse("pivot_tolerance = -1.0"),
            Err(ConfigError::InvalidField { field: "pivot_tolerance", .. })
        ));
        assert!(matches!(
            EngineConfig::parse("svd_max_sweeps = 0"),
            Err(ConfigError::InvalidField { .. })
        ));
        assert!(matches!(
            EngineConfig::parse("default_seed = [\"1\"]"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(EngineConfig::parse("unknown = 1"), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_seed_serializes_as_hex() {
        let text = toml::to_string(&EngineConfig::default()).unwrap();
        assert!(text.contains("0x0123456789abcdef"));
        assert_eq!(EngineConfig::parse(&text).unwrap(), EngineConfig::default());
    }
}
