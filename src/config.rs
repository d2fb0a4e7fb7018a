//! # Dispatch Configuration
//!
//! Settings that decide how request paths map onto controllers.
//!
//! ## Sources
//!
//! Configuration can be built in code, read from a YAML file with
//! [`DispatchConfig::from_yaml_file`], or loaded from environment variables
//! with [`DispatchConfig::from_env`]:
//!
//! ### `ENDPOINTS_CONTROLLER_PREFIX`
//!
//! Dotted namespace root holding the controller modules (`controllers`,
//! `api.handlers`). Required; an empty prefix fails validation.
//!
//! ### `ENDPOINTS_CONTENT_TYPE`
//!
//! Content type used for namespace versioning. Default: `application/json`.
//!
//! ### `ENDPOINTS_DEFAULT_VERSION`
//!
//! Version assumed when the `Accept` header names none. Unset means the
//! version is mandatory and a request without one gets 406.
//!
//! ### `ENDPOINTS_VERSIONING`
//!
//! `disabled` (default) or `namespace`. In namespace mode the negotiated
//! version becomes a segment of the root: prefix `controllers` with version
//! `v1` resolves under `controllers.v1`.
//!
//! ### `ENDPOINTS_RESOLVE_MODE`
//!
//! `advanced` (default) walks the namespace tree for the longest module
//! match. `simple` reads the path strictly as `/module/class/args`.
//!
//! ## Example
//!
//! ```yaml
//! controller_prefix: api
//! versioning: namespace
//! default_version: v1
//! ```

use std::env;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::controller::DEFAULT_CONTENT_TYPE;
use crate::error::ConfigError;

/// Where the request version is taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionMode {
    /// The prefix is used as is
    #[default]
    Disabled,
    /// The negotiated version is appended to the prefix
    Namespace,
}

/// How path segments are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Longest module prefix, then an optional class segment
    #[default]
    Advanced,
    /// Exactly `/module/class/args`
    Simple,
}

fn default_content_type() -> Option<String> {
    Some(DEFAULT_CONTENT_TYPE.to_string())
}

/// Configuration for a [`Resolver`](crate::router::Resolver) and
/// [`Dispatcher`](crate::dispatcher::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Dotted namespace root for controller modules
    pub controller_prefix: String,
    /// Content type negotiated against in namespace versioning mode
    #[serde(default = "default_content_type")]
    pub content_type: Option<String>,
    /// Version used when the request names none
    #[serde(default)]
    pub default_version: Option<String>,
    #[serde(default)]
    pub versioning: VersionMode,
    #[serde(default)]
    pub resolve_mode: ResolveMode,
}

impl DispatchConfig {
    /// Defaults for `controller_prefix`.
    #[must_use]
    pub fn new(controller_prefix: impl Into<String>) -> Self {
        Self {
            controller_prefix: controller_prefix.into(),
            content_type: default_content_type(),
            default_version: None,
            versioning: VersionMode::Disabled,
            resolve_mode: ResolveMode::Advanced,
        }
    }

    /// Turn on namespace versioning.
    #[must_use]
    pub fn with_namespace_versioning(mut self, default_version: Option<&str>) -> Self {
        self.versioning = VersionMode::Namespace;
        self.default_version = default_version.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_resolve_mode(mut self, mode: ResolveMode) -> Self {
        self.resolve_mode = mode;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: Option<&str>) -> Self {
        self.content_type = content_type.map(str::to_string);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Unrecognised mode values are logged and replaced by the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup (environment, test maps).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(lookup("ENDPOINTS_CONTROLLER_PREFIX").unwrap_or_default());
        if let Some(content_type) = lookup("ENDPOINTS_CONTENT_TYPE") {
            config.content_type = Some(content_type).filter(|c| !c.is_empty());
        }
        config.default_version = lookup("ENDPOINTS_DEFAULT_VERSION").filter(|v| !v.is_empty());
        config.versioning = match lookup("ENDPOINTS_VERSIONING").as_deref() {
            None | Some("") | Some("disabled") => VersionMode::Disabled,
            Some("namespace") => VersionMode::Namespace,
            Some(other) => {
                warn!(value = %other, "Unknown ENDPOINTS_VERSIONING, versioning disabled");
                VersionMode::Disabled
            }
        };
        config.resolve_mode = match lookup("ENDPOINTS_RESOLVE_MODE").as_deref() {
            None | Some("") | Some("advanced") => ResolveMode::Advanced,
            Some("simple") => ResolveMode::Simple,
            Some(other) => {
                warn!(value = %other, "Unknown ENDPOINTS_RESOLVE_MODE, using advanced");
                ResolveMode::Advanced
            }
        };
        config
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading dispatch config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing dispatch config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings that can be checked without a namespace source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.controller_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.versioning == VersionMode::Namespace && self.content_type.is_none() {
            return Err(ConfigError::MissingContentType);
        }
        Ok(())
    }
}
