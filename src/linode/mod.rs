//! Thin, authenticated gateway to the Linode instances API.
//!
//! [`LinodeApi`] is the seam the lifecycle client is written against;
//! [`HttpLinodeApi`] is the only implementation that touches the network.

mod api;
mod http;
mod types;

pub use api::{ApiError, ApiFuture, LinodeApi};
pub use http::{HttpLinodeApi, LINODE_API_BASE};
pub use types::{
    Filter, Instance, InstanceCreateOptions, InstanceId, InstanceMetadata, InstanceStatus,
};
