//! TOML configuration for the command-line adapter.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use arbor_core::{GenerationParameters, MAX_ITERATIONS};
use arbor_rendering::{Color, DEFAULT_LEAF_PALETTE};
use arbor_system_generation::{Config, DEFAULT_POLL_INTERVAL, DEFAULT_SEED};
use serde::Deserialize;
use thiserror::Error;

/// Settings read from a configuration file.
///
/// Parameter keys sit at the top level next to the controller tuning keys.
/// Missing keys fall back to their defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct FileConfig {
    #[serde(flatten)]
    pub parameters: GenerationParameters,
    pub seed: Option<u64>,
    pub leaf_palette: Option<Vec<[u8; 3]>>,
    pub poll_interval_ms: Option<u64>,
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file could not be read.
    #[error("could not read configuration file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or a value has the wrong type.
    #[error("could not parse configuration file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// The leaf palette was present but empty.
    #[error("leaf_palette must list at least one colour")]
    EmptyPalette,
    /// The poll interval was zero.
    #[error("poll_interval_ms must be positive")]
    ZeroPollInterval,
    /// More rewrite passes were requested than a tree can hold.
    #[error("iterations must be at most {max}, got {0}", max = MAX_ITERATIONS)]
    TooManyIterations(u32),
}

impl FileConfig {
    /// Reads and validates the configuration stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::parse(&contents).map_err(|error| match error {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_owned(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Parses configuration text.
    pub(crate) fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        if config.leaf_palette.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::EmptyPalette);
        }
        if config.poll_interval_ms == Some(0) {
            return Err(ConfigError::ZeroPollInterval);
        }
        if config.parameters.iterations > MAX_ITERATIONS {
            return Err(ConfigError::TooManyIterations(config.parameters.iterations));
        }
        Ok(config)
    }

    /// Leaf colours selectable by random leaf colouring.
    pub(crate) fn palette(&self) -> Vec<Color> {
        match &self.leaf_palette {
            Some(colours) => colours
                .iter()
                .map(|[red, green, blue]| Color::from_rgb_u8(*red, *green, *blue))
                .collect(),
            None => DEFAULT_LEAF_PALETTE.to_vec(),
        }
    }

    /// Controller tuning, with `seed` taking precedence over the file.
    pub(crate) fn controller_config(&self, seed: Option<u64>) -> Config {
        let poll_interval = self
            .poll_interval_ms
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis);
        Config::new(seed.or(self.seed).unwrap_or(DEFAULT_SEED))
            .with_poll_interval(poll_interval)
            .with_leaf_palette(self.palette().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::RuleSetId;

    #[test]
    fn empty_file_uses_defaults() {
        let config = FileConfig::parse("").expect("empty config is valid");
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.palette().len(), DEFAULT_LEAF_PALETTE.len());
    }

    #[test]
    fn parameters_and_tuning_share_the_top_level() {
        let config = FileConfig::parse(
            r#"
            rule_set = 7
            iterations = 3
            angle = 22.5
            random_mode = true
            seed = 42
            poll_interval_ms = 50
            leaf_palette = [[255, 0, 0], [0, 255, 0]]
            "#,
        )
        .expect("valid config");

        assert_eq!(config.parameters.rule_set, RuleSetId::new(7));
        assert_eq!(config.parameters.iterations, 3);
        assert_eq!(config.parameters.angle, 22.5);
        assert!(config.parameters.random_mode);
        assert_eq!(config.parameters.branch_length, 3.0);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.palette()[0], Color::from_rgb_u8(255, 0, 0));

        let controller = config.controller_config(None);
        assert_eq!(controller.seed(), 42);
        assert_eq!(controller.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn command_line_seed_wins() {
        let config = FileConfig::parse("seed = 1").expect("valid config");
        assert_eq!(config.controller_config(Some(9)).seed(), 9);
    }

    #[test]
    fn mistyped_values_are_rejected() {
        let error = FileConfig::parse("iterations = \"many\"").expect_err("mistyped value");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn empty_palette_is_rejected() {
        let error = FileConfig::parse("leaf_palette = []").expect_err("empty palette");
        assert!(matches!(error, ConfigError::EmptyPalette));
    }

    #[test]
    fn excessive_iterations_are_rejected() {
        let error = FileConfig::parse("iterations = 12").expect_err("too many passes");
        assert!(matches!(error, ConfigError::TooManyIterations(12)));
        assert!(FileConfig::parse("iterations = 7").is_ok());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let error = FileConfig::parse("poll_interval_ms = 0").expect_err("zero interval");
        assert!(matches!(error, ConfigError::ZeroPollInterval));
    }
}
