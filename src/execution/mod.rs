//! GARM external provider execution: environment in, one result out.
//!
//! GARM runs the provider once per verb. Inputs arrive through the
//! environment (parsed by [`Cli`]) and, for `CreateInstance`, as bootstrap
//! JSON on stdin. The only stdout payload is the verb's result.

use std::io::Read;

use camino::Utf8Path;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::{Cli, ProviderCommand};
use crate::client::{ClientError, LifecycleClient};
use crate::config::{ConfigError, ProviderConfig};
use crate::linode::{ApiError, HttpLinodeApi, LinodeApi};
use crate::params::BootstrapInstance;
use crate::provider::{LinodeProvider, version};

/// Exit code GARM interprets as "instance not found".
pub const EXIT_CODE_NOT_FOUND: i32 = 30;
/// Exit code for every other failure.
pub const EXIT_CODE_FAILURE: i32 = 1;

/// Interface versions this provider speaks. An unset version means the first.
const SUPPORTED_INTERFACE_VERSIONS: [&str; 2] = ["v0.1.0", "v0.1.1"];

/// Errors raised while executing a provider verb.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ExecutionError {
    /// The configuration file could not be loaded.
    #[error("loading config: {0}")]
    Config(#[from] ConfigError),
    /// The Linode transport could not be built.
    #[error("getting client: {0}")]
    Gateway(#[from] ApiError),
    /// A lifecycle operation failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// A variable the verb needs is not set.
    #[error("missing {variable}")]
    MissingInput {
        /// Environment variable or input stream that was empty.
        variable: &'static str,
    },
    /// GARM asked for an interface version this provider does not speak.
    #[error("unsupported interface version: {version}")]
    UnsupportedInterface {
        /// Requested interface version.
        version: String,
    },
    /// The bootstrap parameters on stdin could not be decoded.
    #[error("decoding bootstrap params: {message}")]
    Bootstrap {
        /// Decoder message.
        message: String,
    },
    /// The result could not be encoded.
    #[error("encoding result: {message}")]
    Serialize {
        /// Encoder message.
        message: String,
    },
    /// The provider received SIGINT or SIGTERM.
    #[error("interrupted")]
    Interrupted,
}

impl ExecutionError {
    /// Returns the process exit code GARM expects for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Client(err) if err.is_not_found() => EXIT_CODE_NOT_FOUND,
            _ => EXIT_CODE_FAILURE,
        }
    }
}

/// A verb together with the inputs it needs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    /// Create a runner instance.
    CreateInstance(Box<BootstrapInstance>),
    /// Delete an instance by ID or label.
    DeleteInstance(String),
    /// Describe an instance by ID or label.
    GetInstance(String),
    /// Describe the instances of a pool.
    ListInstances(String),
    /// Delete every instance owned by the controller.
    RemoveAllInstances,
    /// Stop an instance.
    Stop(String),
    /// Start an instance.
    Start(String),
    /// Report the provider version.
    GetVersion,
}

impl Request {
    /// Returns the GARM name of the verb.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::CreateInstance(_) => "CreateInstance",
            Self::DeleteInstance(_) => "DeleteInstance",
            Self::GetInstance(_) => "GetInstance",
            Self::ListInstances(_) => "ListInstances",
            Self::RemoveAllInstances => "RemoveAllInstances",
            Self::Stop(_) => "Stop",
            Self::Start(_) => "Start",
            Self::GetVersion => "GetVersion",
        }
    }

    /// Collects the inputs for `env.command`, reading bootstrap JSON from
    /// `input` when creating an instance.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::MissingInput`] when a required variable or the
    /// bootstrap document is absent, and [`ExecutionError::Bootstrap`] when
    /// the document is not valid bootstrap JSON.
    pub fn from_environment(env: &Cli, input: impl Read) -> Result<Self, ExecutionError> {
        let instance_id = || require(env.instance_id.as_deref(), "GARM_INSTANCE_ID");
        Ok(match env.command {
            ProviderCommand::CreateInstance => {
                Self::CreateInstance(Box::new(read_bootstrap(input)?))
            }
            ProviderCommand::DeleteInstance => Self::DeleteInstance(instance_id()?),
            ProviderCommand::GetInstance => Self::GetInstance(instance_id()?),
            ProviderCommand::ListInstances => {
                Self::ListInstances(require(env.pool_id.as_deref(), "GARM_POOL_ID")?)
            }
            ProviderCommand::RemoveAllInstances => Self::RemoveAllInstances,
            ProviderCommand::Stop => Self::Stop(instance_id()?),
            ProviderCommand::Start => Self::Start(instance_id()?),
            ProviderCommand::GetVersion => Self::GetVersion,
        })
    }
}

/// Runs the verb described by `env` against Linode.
///
/// `GetVersion` is answered without loading any configuration. Every other
/// verb loads the configuration file, builds the HTTP gateway and dispatches
/// through [`execute`]. `cancel` aborts waits for new instances.
///
/// # Errors
///
/// Returns [`ExecutionError`] when inputs are missing, the configuration is
/// invalid, or the verb fails.
pub async fn run(
    env: &Cli,
    input: impl Read,
    cancel: CancellationToken,
) -> Result<String, ExecutionError> {
    check_interface_version(env.interface_version.as_deref())?;
    if env.command == ProviderCommand::GetVersion {
        return Ok(version().to_owned());
    }

    let request = Request::from_environment(env, input)?;
    let config_file = require(
        env.provider_config_file.as_deref(),
        "GARM_PROVIDER_CONFIG_FILE",
    )?;
    let controller_id = require(env.controller_id.as_deref(), "GARM_CONTROLLER_ID")?;
    let config = ProviderConfig::load(Utf8Path::new(&config_file))?;
    let api = HttpLinodeApi::new(&config)?;
    let client = LifecycleClient::new(config, api, controller_id)?.with_cancellation(cancel);

    execute(&LinodeProvider::new(client), request).await
}

/// Executes `request` on `provider` and renders the stdout payload.
///
/// Instances are emitted as JSON, the version as plain text, and verbs
/// without a result as an empty string.
///
/// # Errors
///
/// Returns [`ExecutionError::Client`] when the operation fails and
/// [`ExecutionError::Serialize`] when the result cannot be encoded.
pub async fn execute<A: LinodeApi>(
    provider: &LinodeProvider<A>,
    request: Request,
) -> Result<String, ExecutionError> {
    debug!(verb = request.verb(), "executing provider verb");
    match request {
        Request::CreateInstance(bootstrap) => {
            encode(&provider.create_instance(&bootstrap).await?)
        }
        Request::DeleteInstance(instance) => {
            provider.delete_instance(&instance).await?;
            Ok(String::new())
        }
        Request::GetInstance(instance) => encode(&provider.get_instance(&instance).await?),
        Request::ListInstances(pool_id) => encode(&provider.list_instances(&pool_id).await?),
        Request::RemoveAllInstances => {
            provider.remove_all_instances().await?;
            Ok(String::new())
        }
        Request::Stop(instance) => {
            provider.stop(&instance, false).await?;
            Ok(String::new())
        }
        Request::Start(instance) => {
            provider.start(&instance).await?;
            Ok(String::new())
        }
        Request::GetVersion => Ok(provider.get_version().to_owned()),
    }
}

fn check_interface_version(requested: Option<&str>) -> Result<(), ExecutionError> {
    match requested.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) if !SUPPORTED_INTERFACE_VERSIONS.contains(&value) => {
            Err(ExecutionError::UnsupportedInterface {
                version: value.to_owned(),
            })
        }
        _ => Ok(()),
    }
}

fn require(value: Option<&str>, variable: &'static str) -> Result<String, ExecutionError> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
        .ok_or(ExecutionError::MissingInput { variable })
}

fn read_bootstrap(mut input: impl Read) -> Result<BootstrapInstance, ExecutionError> {
    let mut raw = String::new();
    input
        .read_to_string(&mut raw)
        .map_err(|err| ExecutionError::Bootstrap {
            message: err.to_string(),
        })?;
    if raw.trim().is_empty() {
        return Err(ExecutionError::MissingInput {
            variable: "bootstrap params on stdin",
        });
    }
    serde_json::from_str(&raw).map_err(|err| ExecutionError::Bootstrap {
        message: err.to_string(),
    })
}

fn encode(value: &impl serde::Serialize) -> Result<String, ExecutionError> {
    serde_json::to_string(value).map_err(|err| ExecutionError::Serialize {
        message: err.to_string(),
    })
}
