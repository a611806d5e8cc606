//! Wire types for the subset of the Linode instances API we use.

use std::fmt;
use std::net::Ipv4Addr;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Provider-assigned numeric identifier of a Linode instance.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct InstanceId(i64);

impl InstanceId {
    /// Wraps a raw Linode instance ID.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for InstanceId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for InstanceId {
    type Err = ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.parse().map(Self)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle states reported by Linode.
///
/// Values Linode may add later deserialize to [`InstanceStatus::Unknown`].
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    /// Powered on and booted.
    Running,
    /// Powered off.
    Offline,
    /// Booting after creation or a power-on.
    Booting,
    /// Rebooting.
    Rebooting,
    /// Shutting down.
    ShuttingDown,
    /// Disks and configuration are being provisioned.
    Provisioning,
    /// Being deleted.
    Deleting,
    /// Migrating between hosts.
    Migrating,
    /// Being rebuilt from an image.
    Rebuilding,
    /// Being cloned.
    Cloning,
    /// Restoring from a backup.
    Restoring,
    /// Changing plan.
    Resizing,
    /// Any status this crate does not know about.
    #[default]
    #[serde(other)]
    Unknown,
}

impl InstanceStatus {
    /// Wire representation used by the Linode API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Offline => "offline",
            Self::Booting => "booting",
            Self::Rebooting => "rebooting",
            Self::ShuttingDown => "shutting_down",
            Self::Provisioning => "provisioning",
            Self::Deleting => "deleting",
            Self::Migrating => "migrating",
            Self::Rebuilding => "rebuilding",
            Self::Cloning => "cloning",
            Self::Restoring => "restoring",
            Self::Resizing => "resizing",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Linode compute instance as returned by the API.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Instance {
    /// Immutable numeric identifier.
    pub id: InstanceId,
    /// Human readable name; not guaranteed to be unique.
    #[serde(default)]
    pub label: String,
    /// Current lifecycle status.
    #[serde(default)]
    pub status: InstanceStatus,
    /// IPv4 addresses in provider order. The first one is public.
    #[serde(default)]
    pub ipv4: Vec<Ipv4Addr>,
    /// Free-form tags, used for ownership and pool membership.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Region the instance lives in.
    #[serde(default)]
    pub region: String,
    /// Plan (instance type) identifier.
    #[serde(default, rename = "type")]
    pub instance_type: Option<String>,
    /// Image the instance was deployed from.
    #[serde(default)]
    pub image: Option<String>,
}

/// Metadata service payload attached at creation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct InstanceMetadata {
    /// Base64 encoded user data consumed by cloud-init on first boot.
    pub user_data: String,
}

/// Body of `POST /linode/instances`.
#[derive(Clone, Eq, PartialEq, Serialize)]
pub struct InstanceCreateOptions {
    /// Region to deploy into.
    pub region: String,
    /// Plan identifier, for example `g6-nanode-1`.
    #[serde(rename = "type")]
    pub instance_type: String,
    /// Instance label.
    pub label: String,
    /// Image identifier, for example `linode/ubuntu24.04`.
    pub image: String,
    /// Root password for the deployed disk.
    pub root_pass: String,
    /// Tags attached to the new instance.
    pub tags: Vec<String>,
    /// Whether Linode should boot the instance once it is deployed.
    pub booted: bool,
    /// Metadata service payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<InstanceMetadata>,
}

impl fmt::Debug for InstanceCreateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceCreateOptions")
            .field("region", &self.region)
            .field("instance_type", &self.instance_type)
            .field("label", &self.label)
            .field("image", &self.image)
            .field("root_pass", &"<redacted>")
            .field("tags", &self.tags)
            .field("booted", &self.booted)
            .field("metadata", &self.metadata.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Server-side filter sent in the `X-Filter` header of list calls.
///
/// Each filter is a single-key JSON object whose value must match exactly.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Filter {
    field: FilterField,
    value: String,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum FilterField {
    Tags,
    Label,
}

impl Filter {
    /// Matches instances carrying `tag`.
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            field: FilterField::Tags,
            value: tag.into(),
        }
    }

    /// Matches instances whose label equals `label`.
    #[must_use]
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            field: FilterField::Label,
            value: label.into(),
        }
    }

    /// Renders the filter as compact JSON, for example `{"tags":"pool=1234"}`.
    #[must_use]
    pub fn to_json(&self) -> String {
        let key = match self.field {
            FilterField::Tags => "tags",
            FilterField::Label => "label",
        };
        let mut object = serde_json::Map::with_capacity(1);
        object.insert(
            key.to_owned(),
            serde_json::Value::String(self.value.clone()),
        );
        serde_json::Value::Object(object).to_string()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

/// One page of a paginated list response.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    pub(crate) data: Vec<T>,
    #[serde(default = "first_page")]
    pub(crate) page: u32,
    #[serde(default = "first_page")]
    pub(crate) pages: u32,
}

const fn first_page() -> u32 {
    1
}
