// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel configuration

use crate::overlay::Shading;
use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file looked up by [`KernelConfig::load`]
pub const CONFIG_FILE: &str = "hemesh.toml";

/// Tolerances and export defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Distance under which positions are welded on import and output
    /// vertices are merged on export
    pub weld_epsilon: f64,
    /// Minimum distance between fit targets for them to count as distinct
    pub fit_epsilon: f64,
    /// Reverse the winding of exported triangles
    pub flip_faces: bool,
    /// Export both sides of every face
    pub two_sided: bool,
    /// Shading applied to every face at export
    pub shading_override: Option<Shading>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            weld_epsilon: 1e-5,
            fit_epsilon: 1e-9,
            flip_faces: false,
            two_sided: false,
            shading_override: None,
        }
    }
}

impl KernelConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: KernelConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load `hemesh.toml` from the working directory when present, then apply
    /// environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply `HEMESH_WELD_EPSILON` and `HEMESH_TWO_SIDED` from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("HEMESH_WELD_EPSILON") {
            match value.parse() {
                Ok(epsilon) => self.weld_epsilon = epsilon,
                Err(_) => warn!("Ignoring HEMESH_WELD_EPSILON={value:?}: not a number"),
            }
        }

        if let Some(value) = lookup("HEMESH_TWO_SIDED") {
            match value.parse() {
                Ok(two_sided) => self.two_sided = two_sided,
                Err(_) => warn!("Ignoring HEMESH_TWO_SIDED={value:?}: expected true or false"),
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }
}
