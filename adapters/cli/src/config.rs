//! World configuration loaded from a TOML file.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use isocity_world::WorldConfig;
use log::info;

/// Loads the world configuration, falling back to defaults when the file is absent.
pub(crate) fn load(path: &Path) -> Result<WorldConfig> {
    if !path.exists() {
        info!(
            "no configuration at {}, using defaults",
            path.display()
        );
        return Ok(WorldConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    parse(&contents)
        .with_context(|| format!("failed to parse configuration at {}", path.display()))
}

fn parse(contents: &str) -> Result<WorldConfig> {
    let config: WorldConfig =
        toml::from_str(contents).context("failed to parse configuration toml contents")?;
    if config.grid_size == 0 {
        bail!("grid_size must be positive");
    }
    if !(config.min_zoom > 0.0 && config.min_zoom <= config.max_zoom) {
        bail!(
            "zoom range {}..={} is invalid",
            config.min_zoom,
            config.max_zoom
        );
    }
    if config.message_seconds < 0.0 {
        bail!("message_seconds must not be negative");
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(config, WorldConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("isocity.toml");
        fs::write(&path, "grid_size = 64\nstarting_funds = 500\n").expect("write config");

        let config = load(&path).expect("config parses");

        assert_eq!(config.grid_size, 64);
        assert_eq!(config.starting_funds, 500);
        assert_eq!(config.max_zoom, WorldConfig::default().max_zoom);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for contents in [
            "grid_size = 0",
            "min_zoom = 2.0\nmax_zoom = 1.0",
            "message_seconds = -1.0",
            "grid_size = \"large\"",
        ] {
            assert!(parse(contents).is_err(), "{contents:?} should be rejected");
        }
    }
}
