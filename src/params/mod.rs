//! Data shapes exchanged with GARM, the host that invokes this provider.
//!
//! Field names follow GARM's JSON contract, which mixes `snake_case` and
//! `kebab-case` keys.

mod translate;

use serde::{Deserialize, Deserializer, Serialize};

pub use translate::to_provider_instance;

/// Reads a field that GARM may encode as `null`, falling back to its default.
///
/// Go writes unset slices and maps as `null` rather than omitting them.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Operating system family requested for a runner.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    /// Linux runners.
    Linux,
    /// Windows runners.
    Windows,
    /// Anything else GARM may send, or nothing at all.
    #[default]
    #[serde(other)]
    Unknown,
}

/// CPU architecture requested for a runner.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsArch {
    /// 32-bit x86.
    I386,
    /// 64-bit x86.
    Amd64,
    /// 32-bit ARM.
    Arm,
    /// 64-bit ARM.
    Arm64,
    /// Anything else GARM may send, or nothing at all.
    #[default]
    #[serde(other)]
    Unknown,
}

/// A runner agent download advertised by the forge.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RunnerApplicationDownload {
    /// Operating system in forge naming (`linux`, `win`, `osx`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Architecture in forge naming (`x64`, `arm64`, `arm`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    /// Archive download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Archive file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Optional bearer token for the download.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_download_token: Option<String>,
    /// Expected SHA-256 of the archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_checksum: Option<String>,
}

/// Everything GARM sends on stdin when asking for a new runner instance.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BootstrapInstance {
    /// Runner name; used as the instance label.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Runner downloads available for this pool.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tools: Vec<RunnerApplicationDownload>,
    /// Repository, organisation, or enterprise URL the runner registers with.
    #[serde(default, deserialize_with = "null_as_default")]
    pub repo_url: String,
    /// URL the instance reports installation progress to.
    #[serde(default, rename = "callback-url", deserialize_with = "null_as_default")]
    pub callback_url: String,
    /// URL the instance fetches its registration data from.
    #[serde(default, rename = "metadata-url", deserialize_with = "null_as_default")]
    pub metadata_url: String,
    /// Token authenticating the instance against GARM.
    #[serde(default, rename = "instance-token", deserialize_with = "null_as_default")]
    pub instance_token: String,
    /// Public keys authorised for the runner user.
    #[serde(default, rename = "ssh-keys", deserialize_with = "null_as_default")]
    pub ssh_keys: Vec<String>,
    /// Provider specific free-form settings for the pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_specs: Option<serde_json::Value>,
    /// Runner group the runner joins.
    #[serde(default, rename = "github-runner-group", deserialize_with = "null_as_default")]
    pub github_runner_group: String,
    /// Base64 encoded PEM bundle of extra trusted CAs.
    #[serde(
        default,
        rename = "ca-cert-bundle",
        skip_serializing_if = "Option::is_none"
    )]
    pub ca_cert_bundle: Option<String>,
    /// Requested operating system.
    #[serde(default, deserialize_with = "null_as_default")]
    pub os_type: OsType,
    /// Requested architecture.
    #[serde(default, rename = "arch", deserialize_with = "null_as_default")]
    pub os_arch: OsArch,
    /// Linode plan, for example `g6-nanode-1`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub flavor: String,
    /// Linode image, for example `linode/ubuntu24.04`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    /// Labels the runner registers with.
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    /// Pool the instance belongs to.
    #[serde(default, deserialize_with = "null_as_default")]
    pub pool_id: String,
    /// Whether GARM serves a just-in-time runner configuration.
    #[serde(default, deserialize_with = "null_as_default")]
    pub jit_config_enabled: bool,
}

/// Provider-agnostic instance status understood by GARM.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Up and running.
    Running,
    /// Powered off.
    Stopped,
    /// Failed.
    Error,
    /// Scheduled for deletion.
    PendingDelete,
    /// Being deleted.
    Deleting,
    /// Accepted but not yet being built.
    PendingCreate,
    /// Being built or booted.
    Creating,
    /// Status could not be mapped.
    Unknown,
}

/// Kind of network address.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    /// Reachable from the internet.
    Public,
    /// Reachable only inside the provider network.
    Private,
}

/// A network address of an instance.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Address {
    /// Address literal.
    pub address: String,
    /// Address kind.
    #[serde(rename = "type")]
    pub kind: AddressType,
}

/// Instance representation returned to GARM.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ProviderInstance {
    /// Provider identifier, the decimal Linode ID.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider_id: String,
    /// Instance name, the Linode label.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Operating system family, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<OsType>,
    /// Operating system name, when known.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_name: String,
    /// Operating system version, when known.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os_version: String,
    /// Architecture, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_arch: Option<OsArch>,
    /// Reachable addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<Address>,
    /// Lifecycle status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProviderStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_instance_reads_garm_field_names() {
        let payload = r#"{
            "name": "garm-abc",
            "tools": [{"os": "linux", "architecture": "x64", "download_url": "http://test.com"}],
            "repo_url": "https://github.com/acme/app",
            "callback-url": "https://garm/api/v1/callbacks",
            "metadata-url": "https://garm/api/v1/metadata",
            "instance-token": "tok",
            "ssh-keys": ["ssh-ed25519 AAAA"],
            "extra_specs": {"extra_packages": ["curl"]},
            "os_type": "linux",
            "arch": "arm64",
            "flavor": "g6-nanode-1",
            "image": "linode/ubuntu24.04",
            "labels": ["linode"],
            "pool_id": "p1"
        }"#;
        let bootstrap: BootstrapInstance = serde_json::from_str(payload).expect("valid payload");
        assert_eq!(bootstrap.callback_url, "https://garm/api/v1/callbacks");
        assert_eq!(bootstrap.os_arch, OsArch::Arm64);
        assert_eq!(bootstrap.ssh_keys.len(), 1);
        assert!(bootstrap.extra_specs.is_some());
        assert_eq!(
            bootstrap
                .tools
                .first()
                .and_then(|tool| tool.architecture.as_deref()),
            Some("x64")
        );
    }

    #[test]
    fn bootstrap_instance_accepts_go_null_fields() {
        let payload = r#"{
            "name": "garm-abc",
            "tools": [{"os": "linux", "architecture": "x64", "download_url": "http://test.com"}],
            "repo_url": "https://github.com/acme/app",
            "callback-url": "https://garm/api/v1/callbacks",
            "metadata-url": "https://garm/api/v1/metadata",
            "instance-token": "tok",
            "ssh-keys": null,
            "extra_specs": null,
            "github-runner-group": "",
            "ca-cert-bundle": null,
            "os_type": "linux",
            "arch": "amd64",
            "flavor": "g6-nanode-1",
            "image": "linode/ubuntu24.04",
            "labels": null,
            "pool_id": "p1",
            "user_data_options": {"disable_updates": false, "extra_packages": null},
            "jit_config_enabled": false
        }"#;
        let bootstrap: BootstrapInstance = serde_json::from_str(payload).expect("valid payload");
        assert!(bootstrap.ssh_keys.is_empty());
        assert!(bootstrap.labels.is_empty());
        assert_eq!(bootstrap.ca_cert_bundle, None);
        assert_eq!(bootstrap.extra_specs, None);
        assert_eq!(bootstrap.tools.len(), 1);
    }

    #[test]
    fn bootstrap_instance_without_platform_is_unknown() {
        let bootstrap: BootstrapInstance =
            serde_json::from_str(r#"{"name": "garm-abc", "tools": null}"#).expect("valid payload");
        assert_eq!(bootstrap.os_type, OsType::Unknown);
        assert_eq!(bootstrap.os_arch, OsArch::Unknown);
        assert!(bootstrap.tools.is_empty());
    }

    #[test]
    fn empty_provider_instance_serializes_to_empty_object() {
        let rendered =
            serde_json::to_string(&ProviderInstance::default()).expect("serializable instance");
        assert_eq!(rendered, "{}");
    }

    #[test]
    fn provider_instance_uses_garm_wire_names() {
        let instance = ProviderInstance {
            provider_id: String::from("42"),
            name: String::from("runner"),
            addresses: vec![Address {
                address: String::from("203.0.113.1"),
                kind: AddressType::Public,
            }],
            status: Some(ProviderStatus::PendingCreate),
            ..ProviderInstance::default()
        };
        let value = serde_json::to_value(&instance).expect("serializable instance");
        assert_eq!(value["status"], "pending_create");
        assert_eq!(value["addresses"][0]["type"], "public");
    }
}
