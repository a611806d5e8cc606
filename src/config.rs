//! Provider configuration loaded from the file GARM points us at.
//!
//! The file is a small TOML document:
//!
//! ```toml
//! token = "linode-personal-access-token"
//! region = "us-ord" # optional
//! ```

use std::fmt;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use ortho_config::toml;
use serde::Deserialize;
use thiserror::Error;

/// Region used when the configuration does not name one.
pub const DEFAULT_REGION: &str = "us-ord";

/// Linode credentials and placement settings.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Region where instances are deployed. Empty means [`DEFAULT_REGION`].
    #[serde(default)]
    pub region: String,
    /// Personal access token presented as a bearer token to the Linode API.
    #[serde(default)]
    pub token: String,
}

impl ProviderConfig {
    /// Builds a configuration from a token, leaving the region at its default.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            region: String::new(),
            token: token.into(),
        }
    }

    /// Reads, validates, and normalises the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read,
    /// [`ConfigError::Parse`] when it is not valid TOML, and
    /// [`ConfigError::MissingToken`] when no token is configured.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = read_config(path)?;
        let mut config: Self = toml::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        config.validate()?;
        if config.region.trim().is_empty() {
            DEFAULT_REGION.clone_into(&mut config.region);
        }
        Ok(config)
    }

    /// Checks that the fields required to talk to Linode are present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] when the token is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }

    /// Region to deploy into, falling back to [`DEFAULT_REGION`].
    #[must_use]
    pub fn effective_region(&self) -> &str {
        let region = self.region.trim();
        if region.is_empty() {
            DEFAULT_REGION
        } else {
            region
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("region", &self.region)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// No API token was configured.
    #[error("token needs to be set")]
    MissingToken,
    /// The configuration file could not be read.
    #[error("failed to read {path}: {message}")]
    Read {
        /// Path that could not be read.
        path: String,
        /// Underlying IO error message.
        message: String,
    },
    /// The configuration file is not valid TOML for this provider.
    #[error("decoding config {path}: {message}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Parser error message.
        message: String,
    },
}

fn read_config(path: &Utf8Path) -> Result<String, ConfigError> {
    let read_error = |message: String| ConfigError::Read {
        path: path.to_string(),
        message,
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| read_error(String::from("path has no file name")))?;
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };

    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| read_error(err.to_string()))?;
    dir.read_to_string(file_name)
        .map_err(|err| read_error(err.to_string()))
}
