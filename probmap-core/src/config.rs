// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constant;
use crate::error::ProbmapError;
use crate::im::Palette;

/// Thresholding settings stored as JSON
///
/// Colors are kept as untyped integers until `into_palette` so that a
/// malformed file reports which color is invalid rather than a parse error.
///
/// # Examples
///
/// ```
/// use probmap_core::config::PaletteConfig;
///
/// let config: PaletteConfig = serde_json::from_str(r#"{
///     "threshold": 0.5,
///     "below_threshold_color": [0, 0, 0],
///     "channel_colors": [[255, 0, 0], [0, 255, 0]]
/// }"#).unwrap();
///
/// assert_eq!(config.threshold, Some(0.5));
/// assert_eq!(config.into_palette().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaletteConfig {
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub below_threshold_color: Vec<i64>,
    #[serde(default)]
    pub channel_colors: Vec<Vec<i64>>,
}

impl PaletteConfig {
    /// Read a palette configuration from a JSON file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a .json file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<PaletteConfig, ProbmapError> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path)
            .map_err(|err| ProbmapError::ConfigError(format!("{} ({})", path.display(), err)))?;

        serde_json::from_str(&contents)
            .map_err(|err| ProbmapError::ConfigError(format!("{} ({})", path.display(), err)))
    }

    /// Validate the colors of the configuration
    pub fn into_palette(self) -> Result<Palette, ProbmapError> {
        Palette::from_components(&self.below_threshold_color, &self.channel_colors)
    }
}

/// Number of worker threads, from an explicit value or the environment
///
/// Falls back to the available parallelism, then to a single thread.
pub fn resolve_threads(threads: Option<usize>) -> Result<usize, ProbmapError> {
    threads_from(threads, std::env::var(constant::THREADS_ENV).ok())
}

fn threads_from(threads: Option<usize>, env: Option<String>) -> Result<usize, ProbmapError> {
    if let Some(threads) = threads {
        if threads < 1 {
            return Err(ProbmapError::ConfigError(
                "Threads must be set to a positive integer if provided".to_string(),
            ));
        }

        return Ok(threads);
    }

    if let Some(threads) = env.filter(|threads| !threads.is_empty()) {
        return match threads.trim().parse::<usize>() {
            Ok(threads) if threads > 0 => Ok(threads),
            _ => Err(ProbmapError::ConfigError(format!(
                "{} must be a positive integer, got '{}'",
                constant::THREADS_ENV,
                threads
            ))),
        };
    }

    Ok(std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1))
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_open_config() {
        const TEST_JSON: &str = "TEST_PALETTE_CONFIG.json";

        std::fs::write(
            TEST_JSON,
            r#"{"below_threshold_color": [1, 2, 3], "channel_colors": [[4, 5, 6]]}"#,
        )
        .unwrap();

        let config = PaletteConfig::open(TEST_JSON).unwrap();
        assert_eq!(config.threshold, None);

        let palette = config.into_palette().unwrap();
        assert_eq!(palette.below_threshold().0, [1, 2, 3]);
        assert_eq!(palette.channels()[0].0, [4, 5, 6]);

        std::fs::remove_file(TEST_JSON).unwrap();
    }

    #[test]
    fn test_invalid_colors_are_palette_errors() {
        let config: PaletteConfig = serde_json::from_str(
            r#"{"below_threshold_color": [0, 0, 0], "channel_colors": [[255, 0]]}"#,
        )
        .unwrap();

        assert!(matches!(
            config.into_palette(),
            Err(ProbmapError::InvalidPalette(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        const TEST_JSON: &str = "TEST_PALETTE_CONFIG_MALFORMED.json";

        std::fs::write(TEST_JSON, "{ not json").unwrap();

        assert!(matches!(
            PaletteConfig::open(TEST_JSON),
            Err(ProbmapError::ConfigError(_))
        ));
        assert!(matches!(
            PaletteConfig::open("TEST_PALETTE_CONFIG_MISSING.json"),
            Err(ProbmapError::ConfigError(_))
        ));

        std::fs::remove_file(TEST_JSON).unwrap();
    }

    #[test]
    fn test_resolve_explicit_threads() {
        assert_eq!(resolve_threads(Some(3)).unwrap(), 3);
        assert!(resolve_threads(Some(0)).is_err());
    }

    #[test]
    fn test_threads_from_environment() {
        assert_eq!(threads_from(None, Some("4".to_string())).unwrap(), 4);
        assert_eq!(threads_from(Some(2), Some("4".to_string())).unwrap(), 2);
        assert!(threads_from(None, None).unwrap() >= 1);
        assert!(threads_from(None, Some(String::new())).unwrap() >= 1);

        for invalid in ["0", "-1", "many"] {
            let err = threads_from(None, Some(invalid.to_string())).unwrap_err();
            assert!(matches!(err, ProbmapError::ConfigError(_)));
            assert!(err.to_string().contains(constant::THREADS_ENV));
        }
    }
}
