//! Pool-level `extra_specs` understood by this provider.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use super::UserDataError;
use crate::params::null_as_default;

/// Provider specific settings carried in a pool's `extra_specs` JSON.
///
/// Unknown keys are ignored. `runner_install_template` and `extra_context` are
/// parsed but never rendered; the built-in install script is always used. See
/// [`ExtraSpecs::unsupported_keys`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct ExtraSpecs {
    /// Extra packages installed on first boot.
    #[serde(default, deserialize_with = "null_as_default")]
    pub extra_packages: Vec<String>,
    /// Scripts run before the runner is installed, keyed by file name.
    /// Values are base64 encoded.
    #[serde(default, deserialize_with = "null_as_default")]
    pub pre_install_scripts: BTreeMap<String, String>,
    /// Skips the package upgrade cloud-init performs on first boot.
    #[serde(default, deserialize_with = "null_as_default")]
    pub disable_updates: bool,
    /// Custom runner install template. Not rendered by this provider.
    #[serde(default)]
    pub runner_install_template: Option<serde_json::Value>,
    /// Variables for a custom install template. Not rendered by this provider.
    #[serde(default)]
    pub extra_context: Option<serde_json::Value>,
}

impl ExtraSpecs {
    /// Parses the `extra_specs` value of a bootstrap request.
    ///
    /// A missing or `null` value yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`UserDataError::ExtraSpecs`] when the value does not have the
    /// expected shape or a pre-install script is not valid base64.
    pub fn from_value(value: Option<&serde_json::Value>) -> Result<Self, UserDataError> {
        let specs = match value {
            None | Some(serde_json::Value::Null) => return Ok(Self::default()),
            Some(raw) => Self::deserialize(raw).map_err(|err| UserDataError::ExtraSpecs {
                message: err.to_string(),
            })?,
        };

        for (name, script) in &specs.pre_install_scripts {
            if name.is_empty() || name.contains('/') {
                return Err(UserDataError::ExtraSpecs {
                    message: format!("invalid pre-install script name {name:?}"),
                });
            }
            BASE64
                .decode(script)
                .map_err(|err| UserDataError::ExtraSpecs {
                    message: format!("pre-install script {name}: {err}"),
                })?;
        }

        Ok(specs)
    }

    /// Returns the keys that were supplied but have no effect on the rendered
    /// user data.
    #[must_use]
    pub fn unsupported_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.runner_install_template.as_ref().is_some_and(is_set) {
            keys.push("runner_install_template");
        }
        if self.extra_context.as_ref().is_some_and(is_set) {
            keys.push("extra_context");
        }
        keys
    }
}

fn is_set(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::String(text) => !text.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
        serde_json::Value::Bool(_) | serde_json::Value::Number(_) => true,
    }
}
