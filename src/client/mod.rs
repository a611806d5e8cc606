//! Pool-aware instance lifecycle built on the [`LinodeApi`] primitives.
//!
//! Ownership lives entirely in Linode tags: every instance carries
//! `pool=<pool>` and `controller=<controller>`, and those two tags answer
//! which instances belong to a pool and which belong to this GARM
//! installation. Nothing is cached between calls.

mod create;
mod error;
mod identifier;
mod tags;
mod wait;

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::linode::{Filter, Instance, InstanceId, LinodeApi};

pub use error::ClientError;
pub use identifier::InstanceRef;
pub use tags::{TAG_CONTROLLER, TAG_POOL, controller_tag, pool_tag};

const POLL_INTERVAL: Duration = Duration::from_secs(5);
const WAIT_TIMEOUT: Duration = Duration::from_secs(300);

const OP_CREATE: &str = "creating instance in Linode API";
const OP_DELETE: &str = "deleting instance from Linode API";
const OP_GET: &str = "getting instance from Linode API";
const OP_LIST: &str = "getting instances list from Linode API";
const OP_RESOLVE: &str = "getting instance ID by its name";

/// Drives Linode on behalf of one GARM controller.
#[derive(Debug)]
pub struct LifecycleClient<A> {
    api: A,
    config: ProviderConfig,
    controller_id: String,
    poll_interval: Duration,
    wait_timeout: Duration,
    cancel: CancellationToken,
}

impl<A: LinodeApi> LifecycleClient<A> {
    /// Creates a client for `controller_id` using `api`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when `config` has no token.
    pub fn new(
        config: ProviderConfig,
        api: A,
        controller_id: impl Into<String>,
    ) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self {
            api,
            config,
            controller_id: controller_id.into(),
            poll_interval: POLL_INTERVAL,
            wait_timeout: WAIT_TIMEOUT,
            cancel: CancellationToken::new(),
        })
    }

    /// Overrides the delay between status checks while waiting for a new
    /// instance.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides how long a new instance may take to reach the running state.
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Installs the token that aborts in-progress waits.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the gateway the client drives.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Deletes the instance named by `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidIdentifier`] for a blank identifier,
    /// [`ClientError::InstanceNotFound`] when a label matches nothing, and
    /// [`ClientError::Provider`] when Linode rejects a call.
    pub async fn delete_instance(&self, identifier: &str) -> Result<(), ClientError> {
        let id = self.resolve(identifier).await?;
        debug!(instance_id = %id, "deleting instance");
        self.api
            .delete_instance(id)
            .await
            .map_err(|err| ClientError::provider(OP_DELETE, err))?;
        info!(instance_id = %id, "instance deleted");
        Ok(())
    }

    /// Fetches the instance named by `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidIdentifier`] for a blank identifier,
    /// [`ClientError::InstanceNotFound`] when a label matches nothing, and
    /// [`ClientError::Provider`] when Linode rejects a call.
    pub async fn get_instance(&self, identifier: &str) -> Result<Instance, ClientError> {
        let id = self.resolve(identifier).await?;
        self.api
            .get_instance(id)
            .await
            .map_err(|err| ClientError::provider(OP_GET, err))
    }

    /// Lists the instances tagged with `pool_id`. An empty list is valid.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Provider`] when the listing fails.
    pub async fn list_instances(&self, pool_id: &str) -> Result<Vec<Instance>, ClientError> {
        self.api
            .list_instances(&Filter::tag(pool_tag(pool_id)))
            .await
            .map_err(|err| ClientError::provider(OP_LIST, err))
    }

    /// Deletes every instance owned by this client's controller, one at a
    /// time in listing order.
    ///
    /// The first failed deletion stops the run. Instances deleted before it
    /// stay deleted and later ones are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Provider`] when the listing fails and
    /// [`ClientError::PartialBulkFailure`] when a deletion fails.
    pub async fn remove_all_instances(&self) -> Result<(), ClientError> {
        let filter = Filter::tag(controller_tag(&self.controller_id));
        let instances = self
            .api
            .list_instances(&filter)
            .await
            .map_err(|err| ClientError::provider(OP_LIST, err))?;

        for (deleted, instance) in instances.iter().enumerate() {
            if let Err(source) = self.api.delete_instance(instance.id).await {
                warn!(
                    instance_id = %instance.id,
                    deleted,
                    error = %source,
                    "bulk removal aborted"
                );
                return Err(ClientError::PartialBulkFailure {
                    instance_id: instance.id,
                    deleted,
                    source,
                });
            }
            debug!(instance_id = %instance.id, "instance deleted");
        }

        info!(
            controller_id = %self.controller_id,
            removed = instances.len(),
            "removed controller instances"
        );
        Ok(())
    }

    /// Turns an identifier into a Linode ID, looking labels up by filter.
    ///
    /// Numeric identifiers are trusted without an existence check. When a
    /// label matches several instances the first one wins.
    async fn resolve(&self, identifier: &str) -> Result<InstanceId, ClientError> {
        match InstanceRef::parse(identifier)? {
            InstanceRef::Id(id) => Ok(id),
            InstanceRef::Label(label) => {
                let matches = self
                    .api
                    .list_instances(&Filter::label(label.as_str()))
                    .await
                    .map_err(|err| ClientError::provider(OP_RESOLVE, err))?;
                matches
                    .first()
                    .map(|instance| instance.id)
                    .ok_or_else(|| ClientError::InstanceNotFound { label })
            }
        }
    }
}
