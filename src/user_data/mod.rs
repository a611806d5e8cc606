//! Boot user data for new runner instances.
//!
//! The payload is a `#cloud-config` document. It is emitted as JSON, which
//! cloud-init accepts because JSON is a subset of YAML, so no YAML emitter is
//! needed and every string is quoted correctly.

mod extra_specs;
mod script;
mod tools;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::params::BootstrapInstance;

pub use extra_specs::ExtraSpecs;

/// Packages every runner image needs for the install script.
const BASE_PACKAGES: [&str; 2] = ["curl", "tar"];

/// Directory pre-install scripts are written to.
const PRE_INSTALL_DIR: &str = "/usr/local/lib/garm/pre-install";

/// Errors raised while building boot user data.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum UserDataError {
    /// No runner download matches the requested platform.
    #[error("no runner tool found for os {os} and arch {arch}")]
    ToolResolution {
        /// Requested operating system.
        os: String,
        /// Requested architecture.
        arch: String,
    },
    /// The pool's `extra_specs` could not be understood.
    #[error("parsing extra specs: {message}")]
    ExtraSpecs {
        /// Parser message.
        message: String,
    },
    /// The CA bundle is not base64 encoded PEM.
    #[error("decoding CA bundle: {message}")]
    CaBundle {
        /// Decoder message.
        message: String,
    },
    /// The cloud-config document could not be serialized.
    #[error("rendering cloud-config: {message}")]
    Render {
        /// Serializer message.
        message: String,
    },
}

#[derive(Serialize)]
#[serde(untagged)]
enum UserEntry<'a> {
    Default(&'static str),
    Runner(RunnerUser<'a>),
}

#[derive(Serialize)]
struct RunnerUser<'a> {
    name: &'static str,
    groups: &'static str,
    sudo: &'static str,
    shell: &'static str,
    lock_passwd: bool,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    ssh_authorized_keys: &'a [String],
}

#[derive(Serialize)]
struct CaCerts {
    trusted: Vec<String>,
}

#[derive(Serialize)]
struct WriteFile {
    path: String,
    permissions: &'static str,
    owner: &'static str,
    encoding: &'static str,
    content: String,
}

impl WriteFile {
    fn executable(path: String, encoded: String) -> Self {
        Self {
            path,
            permissions: "0755",
            owner: "root:root",
            encoding: "b64",
            content: encoded,
        }
    }
}

#[derive(Serialize)]
struct CloudConfig<'a> {
    package_update: bool,
    package_upgrade: bool,
    packages: Vec<&'a str>,
    users: Vec<UserEntry<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ca_certs: Option<CaCerts>,
    write_files: Vec<WriteFile>,
    runcmd: Vec<String>,
}

/// Builds the cloud-config user data for `bootstrap`.
///
/// The runner tool is resolved first, then the pool's extra specs are parsed,
/// and finally the document is rendered.
///
/// # Errors
///
/// Returns [`UserDataError`] when no runner download matches the requested
/// platform, the extra specs are malformed, or the CA bundle cannot be decoded.
pub fn render_user_data(bootstrap: &BootstrapInstance) -> Result<String, UserDataError> {
    let tool = tools::resolve_tool(&bootstrap.tools, bootstrap.os_type, bootstrap.os_arch)?;
    let specs = ExtraSpecs::from_value(bootstrap.extra_specs.as_ref())?;
    for key in specs.unsupported_keys() {
        warn!(
            key,
            pool_id = %bootstrap.pool_id,
            "extra spec is not supported by this provider and is ignored"
        );
    }
    let ca_certs = decode_ca_bundle(bootstrap.ca_cert_bundle.as_deref())?;

    let mut write_files = Vec::with_capacity(specs.pre_install_scripts.len() + 1);
    let mut runcmd = Vec::with_capacity(specs.pre_install_scripts.len() + 1);
    for (name, encoded) in &specs.pre_install_scripts {
        let path = format!("{PRE_INSTALL_DIR}/{name}");
        runcmd.push(path.clone());
        write_files.push(WriteFile::executable(path, encoded.clone()));
    }

    let install = script::render_install_script(bootstrap, &tool);
    write_files.push(WriteFile::executable(
        script::INSTALL_SCRIPT_PATH.to_owned(),
        BASE64.encode(install),
    ));
    runcmd.push(script::INSTALL_SCRIPT_PATH.to_owned());
    runcmd.push(format!("rm -f {}", script::INSTALL_SCRIPT_PATH));

    let packages = BASE_PACKAGES
        .into_iter()
        .chain(specs.extra_packages.iter().map(String::as_str))
        .fold(Vec::new(), |mut acc, package| {
            if !acc.contains(&package) {
                acc.push(package);
            }
            acc
        });

    let document = CloudConfig {
        package_update: true,
        package_upgrade: !specs.disable_updates,
        packages,
        users: vec![
            UserEntry::Default("default"),
            UserEntry::Runner(RunnerUser {
                name: "runner",
                groups: "sudo",
                sudo: "ALL=(ALL) NOPASSWD:ALL",
                shell: "/bin/bash",
                lock_passwd: true,
                ssh_authorized_keys: &bootstrap.ssh_keys,
            }),
        ],
        ca_certs,
        write_files,
        runcmd,
    };

    let body = serde_json::to_string_pretty(&document).map_err(|err| UserDataError::Render {
        message: err.to_string(),
    })?;
    Ok(format!("#cloud-config\n{body}\n"))
}

fn decode_ca_bundle(bundle: Option<&str>) -> Result<Option<CaCerts>, UserDataError> {
    let Some(encoded) = bundle.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let raw = BASE64.decode(encoded).map_err(|err| UserDataError::CaBundle {
        message: err.to_string(),
    })?;
    let pem = String::from_utf8(raw).map_err(|err| UserDataError::CaBundle {
        message: err.to_string(),
    })?;
    Ok(Some(CaCerts { trusted: vec![pem] }))
}
