//! Host environment definitions for the `garm-provider-linode` binary.
//!
//! GARM drives external providers through environment variables, so every
//! argument is backed by the variable GARM sets. The parser lives here so the
//! build script can reuse it when generating the manual page.

use clap::{Parser, ValueEnum};

/// Verbs of the GARM external provider protocol.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, ValueEnum)]
pub enum ProviderCommand {
    /// Create a runner instance from bootstrap parameters on stdin.
    #[value(name = "CreateInstance")]
    CreateInstance,
    /// Delete the instance named by `GARM_INSTANCE_ID`.
    #[value(name = "DeleteInstance")]
    DeleteInstance,
    /// Describe the instance named by `GARM_INSTANCE_ID`.
    #[value(name = "GetInstance")]
    GetInstance,
    /// Describe every instance in `GARM_POOL_ID`.
    #[value(name = "ListInstances")]
    ListInstances,
    /// Delete every instance owned by `GARM_CONTROLLER_ID`.
    #[value(name = "RemoveAllInstances")]
    RemoveAllInstances,
    /// Stop an instance (not supported, succeeds without effect).
    #[value(name = "Stop")]
    Stop,
    /// Start an instance (not supported, succeeds without effect).
    #[value(name = "Start")]
    Start,
    /// Print the provider version.
    #[value(name = "GetVersion")]
    GetVersion,
}

/// The execution environment GARM hands to the provider.
#[derive(Clone, Debug, Eq, Parser, PartialEq)]
#[command(
    name = "garm-provider-linode",
    about = "GARM external provider that runs GitHub runners on Linode",
    version
)]
pub struct Cli {
    /// Provider verb to execute.
    #[arg(long, env = "GARM_COMMAND", value_enum)]
    pub command: ProviderCommand,
    /// Identifier of the GARM installation; recorded as the `controller` tag.
    #[arg(long, env = "GARM_CONTROLLER_ID")]
    pub controller_id: Option<String>,
    /// Path to the provider's TOML configuration file.
    #[arg(long, env = "GARM_PROVIDER_CONFIG_FILE", value_name = "PATH")]
    pub provider_config_file: Option<String>,
    /// Pool targeted by `ListInstances`.
    #[arg(long, env = "GARM_POOL_ID")]
    pub pool_id: Option<String>,
    /// Instance targeted by `DeleteInstance`, `GetInstance`, `Stop` and
    /// `Start`; a numeric Linode ID or a label.
    #[arg(long, env = "GARM_INSTANCE_ID")]
    pub instance_id: Option<String>,
    /// Provider interface version GARM speaks.
    #[arg(long, env = "GARM_INTERFACE_VERSION")]
    pub interface_version: Option<String>,
}
