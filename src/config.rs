// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2021 Profian, Inc.

use crate::api::DEFAULT_DOMAIN;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Where the base virtual disk lives on hosts with the block device driver
pub const DEFAULT_BASE_LAYER: &str = "/opt/overlaybd/baselayers/.commit";

/// Host-wide settings for descriptor builds
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// The base artifact placed first in every lower stack
    pub base_layer: PathBuf,

    /// The registry used when no image reference is recorded
    pub default_domain: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_layer: DEFAULT_BASE_LAYER.into(),
            default_domain: DEFAULT_DOMAIN.into(),
        }
    }
}

impl Config {
    /// Loads a JSON config; absent keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading {:?}", path))?;
        let config = serde_json::from_slice(&bytes).with_context(|| format!("parsing {:?}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"defaultDomain": "mirror.example"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_domain, "mirror.example");
        assert_eq!(config.base_layer, PathBuf::from(DEFAULT_BASE_LAYER));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"baseLayers": "/x"}"#).unwrap();

        assert!(Config::load(&path).is_err());
        assert!(Config::load(&dir.path().join("absent.json")).is_err());
    }
}
