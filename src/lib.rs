//! GARM external provider for Linode.
//!
//! The crate exposes a thin Linode API gateway, a lifecycle client that turns
//! its four primitives into pool- and controller-scoped operations, and the
//! execution layer GARM drives through environment variables.

pub mod cli;
pub mod client;
pub mod config;
pub mod execution;
pub mod linode;
pub mod params;
pub mod provider;
pub mod test_support;
pub mod user_data;

pub use client::{ClientError, InstanceRef, LifecycleClient};
pub use config::{ConfigError, DEFAULT_REGION, ProviderConfig};
pub use execution::{ExecutionError, Request};
pub use linode::{ApiError, HttpLinodeApi, Instance, InstanceId, InstanceStatus, LinodeApi};
pub use params::{BootstrapInstance, ProviderInstance, ProviderStatus};
pub use provider::{LinodeProvider, VERSION};
