//! Create-then-wait flow for new runner instances.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::TryRngCore as _;
use rand::rngs::OsRng;
use tracing::{debug, info};

use crate::linode::{
    Instance, InstanceCreateOptions, InstanceId, InstanceMetadata, InstanceStatus, LinodeApi,
};
use crate::params::BootstrapInstance;
use crate::user_data::render_user_data;

use super::wait::{WaitError, wait_until_ready};
use super::{ClientError, LifecycleClient, OP_CREATE, OP_GET, controller_tag, pool_tag};

/// Entropy used for the throwaway root password.
const ROOT_PASSWORD_BYTES: usize = 50;

impl<A: LinodeApi> LifecycleClient<A> {
    /// Creates a runner instance for `bootstrap` and waits until it is
    /// running.
    ///
    /// The instance is tagged with its pool and this client's controller. An
    /// instance that never reaches the running state is left in place.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ToolResolution`], [`ClientError::ExtraSpecs`] or
    /// [`ClientError::UserData`] when the boot payload cannot be built,
    /// [`ClientError::RandomSource`] when the root password cannot be
    /// generated, [`ClientError::Provider`] when a Linode call fails,
    /// [`ClientError::ProvisioningTimeout`] when the wait ceiling elapses, and
    /// [`ClientError::Cancelled`] when the client's token fires first.
    pub async fn create_instance(
        &self,
        bootstrap: &BootstrapInstance,
    ) -> Result<Instance, ClientError> {
        let user_data = render_user_data(bootstrap)?;
        let options = InstanceCreateOptions {
            region: self.config.effective_region().to_owned(),
            instance_type: bootstrap.flavor.clone(),
            label: bootstrap.name.clone(),
            image: bootstrap.image.clone(),
            root_pass: generate_root_password()?,
            tags: vec![
                pool_tag(&bootstrap.pool_id),
                controller_tag(&self.controller_id),
            ],
            booted: true,
            metadata: Some(InstanceMetadata {
                user_data: BASE64.encode(user_data),
            }),
        };

        info!(
            label = %options.label,
            region = %options.region,
            instance_type = %options.instance_type,
            pool_id = %bootstrap.pool_id,
            "creating instance"
        );
        let created = self
            .api
            .create_instance(&options)
            .await
            .map_err(|err| ClientError::provider(OP_CREATE, err))?;
        let instance_id = created.id;

        let running = wait_until_ready(self.wait_timeout, self.poll_interval, &self.cancel, || {
            self.poll_running(instance_id)
        })
        .await
        .map_err(|err| match err {
            WaitError::TimedOut => ClientError::ProvisioningTimeout {
                instance_id,
                waited: self.wait_timeout,
            },
            WaitError::Cancelled => ClientError::Cancelled { instance_id },
            WaitError::Check(source) => source,
        })?;

        info!(%instance_id, label = %running.label, "instance running");
        Ok(running)
    }

    async fn poll_running(&self, id: InstanceId) -> Result<Option<Instance>, ClientError> {
        let instance = self
            .api
            .get_instance(id)
            .await
            .map_err(|err| ClientError::provider(OP_GET, err))?;
        debug!(instance_id = %id, status = %instance.status, "polled instance");
        Ok((instance.status == InstanceStatus::Running).then_some(instance))
    }
}

fn generate_root_password() -> Result<String, ClientError> {
    let mut bytes = [0_u8; ROOT_PASSWORD_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| ClientError::RandomSource {
            message: err.to_string(),
        })?;
    Ok(BASE64.encode(bytes))
}
