//! Translation from Linode instances to GARM's provider instance shape.

use crate::linode::{Instance, InstanceStatus};

use super::{Address, AddressType, ProviderInstance, ProviderStatus};

const fn provider_status(status: InstanceStatus) -> ProviderStatus {
    match status {
        InstanceStatus::Running => ProviderStatus::Running,
        InstanceStatus::Offline | InstanceStatus::ShuttingDown => ProviderStatus::Stopped,
        InstanceStatus::Deleting => ProviderStatus::Deleting,
        InstanceStatus::Provisioning => ProviderStatus::PendingCreate,
        InstanceStatus::Booting => ProviderStatus::Creating,
        InstanceStatus::Rebooting
        | InstanceStatus::Migrating
        | InstanceStatus::Rebuilding
        | InstanceStatus::Cloning
        | InstanceStatus::Restoring
        | InstanceStatus::Resizing
        | InstanceStatus::Unknown => ProviderStatus::Unknown,
    }
}

/// Converts a Linode instance into the shape GARM expects.
///
/// `None` yields an empty [`ProviderInstance`]. Only the first IPv4 address is
/// reported, as the public address.
#[must_use]
pub fn to_provider_instance(instance: Option<&Instance>) -> ProviderInstance {
    let Some(linode) = instance else {
        return ProviderInstance::default();
    };

    let addresses = linode
        .ipv4
        .first()
        .map(|ip| Address {
            address: ip.to_string(),
            kind: AddressType::Public,
        })
        .into_iter()
        .collect();

    ProviderInstance {
        provider_id: linode.id.to_string(),
        name: linode.label.clone(),
        addresses,
        status: Some(provider_status(linode.status)),
        ..ProviderInstance::default()
    }
}
