//! Error types for the lifecycle client.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::linode::{ApiError, InstanceId};
use crate::user_data::UserDataError;

/// Errors raised by [`LifecycleClient`](super::LifecycleClient) operations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ClientError {
    /// The configuration failed validation.
    #[error("validating configuration: {0}")]
    Config(String),
    /// No runner download matches the requested operating system and
    /// architecture.
    #[error("failed to find tools for OS {os} and arch {arch}")]
    ToolResolution {
        /// Requested operating system.
        os: String,
        /// Requested architecture.
        arch: String,
    },
    /// The pool's extra specs could not be parsed.
    #[error("parsing extra specs: {message}")]
    ExtraSpecs {
        /// Parser message.
        message: String,
    },
    /// The operating system random source failed.
    #[error("generating root password: {message}")]
    RandomSource {
        /// Random source error message.
        message: String,
    },
    /// Boot user data could not be built.
    #[error("building user data: {message}")]
    UserData {
        /// Builder error message.
        message: String,
    },
    /// A Linode API call failed.
    #[error("{operation}: {source}")]
    Provider {
        /// Operation that issued the call.
        operation: &'static str,
        /// Gateway error.
        source: ApiError,
    },
    /// A label lookup matched no instance.
    #[error("getting instance ID by its name: no instances matching this name: {label}")]
    InstanceNotFound {
        /// Label that was looked up.
        label: String,
    },
    /// The identifier is neither a numeric ID nor a usable label.
    #[error("instance identifier must not be empty")]
    InvalidIdentifier,
    /// The new instance did not reach the running state in time.
    #[error("instance {instance_id} did not reach running state within {waited:?}")]
    ProvisioningTimeout {
        /// Instance that was being waited on.
        instance_id: InstanceId,
        /// Wait ceiling that elapsed.
        waited: Duration,
    },
    /// The wait for a new instance was cancelled.
    #[error("cancelled while waiting for instance {instance_id} to start")]
    Cancelled {
        /// Instance that was being waited on.
        instance_id: InstanceId,
    },
    /// Bulk removal stopped at the first failed deletion.
    #[error(
        "deleting instance {instance_id} ({deleted} already deleted): deleting instance from Linode API: {source}"
    )]
    PartialBulkFailure {
        /// Instance whose deletion failed.
        instance_id: InstanceId,
        /// Number of instances deleted before the failure.
        deleted: usize,
        /// Gateway error.
        source: ApiError,
    },
}

impl ClientError {
    pub(crate) const fn provider(operation: &'static str, source: ApiError) -> Self {
        Self::Provider { operation, source }
    }

    /// Returns true when the failure means the instance does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::InstanceNotFound { .. } => true,
            Self::Provider { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<UserDataError> for ClientError {
    fn from(err: UserDataError) -> Self {
        match err {
            UserDataError::ToolResolution { os, arch } => Self::ToolResolution { os, arch },
            UserDataError::ExtraSpecs { message } => Self::ExtraSpecs { message },
            other @ (UserDataError::CaBundle { .. } | UserDataError::Render { .. }) => {
                Self::UserData {
                    message: other.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_covers_label_misses_and_http_404() {
        let miss = ClientError::InstanceNotFound {
            label: String::from("foo"),
        };
        let gone = ClientError::provider(
            "getting instance from Linode API",
            ApiError::Status {
                status: 404,
                message: String::from("Not found"),
            },
        );
        let denied = ClientError::provider(
            "getting instance from Linode API",
            ApiError::Status {
                status: 401,
                message: String::from("Invalid Token"),
            },
        );

        assert!(miss.is_not_found());
        assert!(gone.is_not_found());
        assert!(!denied.is_not_found());
        assert!(!ClientError::InvalidIdentifier.is_not_found());
    }

    #[test]
    fn messages_carry_operation_context() {
        let err = ClientError::provider(
            "deleting instance from Linode API",
            ApiError::Transport {
                message: String::from("connection refused"),
            },
        );
        assert_eq!(
            err.to_string(),
            "deleting instance from Linode API: connection refused"
        );

        let miss = ClientError::InstanceNotFound {
            label: String::from("foo"),
        };
        assert_eq!(
            miss.to_string(),
            "getting instance ID by its name: no instances matching this name: foo"
        );
    }

    #[test]
    fn config_errors_keep_the_validation_message() {
        let err = ClientError::from(ConfigError::MissingToken);
        assert_eq!(
            err.to_string(),
            "validating configuration: token needs to be set"
        );
    }
}
