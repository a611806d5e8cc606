//! Capability seam over the Linode instances API.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use super::types::{Filter, Instance, InstanceCreateOptions, InstanceId};

/// Errors surfaced by an API gateway. Upstream messages are kept verbatim.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// The gateway could not be constructed from its configuration.
    #[error("validating configuration: {0}")]
    Config(String),
    /// The request never produced an HTTP response.
    #[error("{message}")]
    Transport {
        /// Message from the HTTP client.
        message: String,
    },
    /// Linode answered with a non-success status.
    #[error("[{status}] {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error reasons reported by Linode, or the raw body.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("decoding response: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },
}

impl ApiError {
    /// Returns true when Linode reported that the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Future returned by gateway operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// The four primitives the lifecycle client needs from Linode.
///
/// Implementations hold no mutable state and may be shared between tasks.
pub trait LinodeApi: Send + Sync {
    /// Creates an instance and returns Linode's initial view of it.
    fn create_instance<'a>(
        &'a self,
        options: &'a InstanceCreateOptions,
    ) -> ApiFuture<'a, Instance>;

    /// Deletes the instance with the given ID.
    fn delete_instance(&self, id: InstanceId) -> ApiFuture<'_, ()>;

    /// Fetches the instance with the given ID.
    fn get_instance(&self, id: InstanceId) -> ApiFuture<'_, Instance>;

    /// Lists every instance matching `filter`.
    fn list_instances<'a>(&'a self, filter: &'a Filter) -> ApiFuture<'a, Vec<Instance>>;
}
