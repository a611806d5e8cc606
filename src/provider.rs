//! GARM external provider verbs backed by the lifecycle client.

use crate::client::{ClientError, LifecycleClient};
use crate::linode::LinodeApi;
use crate::params::{BootstrapInstance, ProviderInstance, to_provider_instance};

/// Build identifier reported by `GetVersion`.
pub const VERSION: &str = match option_env!("GARM_PROVIDER_VERSION") {
    Some(version) => version,
    None => concat!("v", env!("CARGO_PKG_VERSION")),
};

/// Returns the provider's build identifier.
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}

/// The GARM provider for Linode.
#[derive(Debug)]
pub struct LinodeProvider<A> {
    client: LifecycleClient<A>,
}

impl<A: LinodeApi> LinodeProvider<A> {
    /// Wraps a configured lifecycle client.
    #[must_use]
    pub const fn new(client: LifecycleClient<A>) -> Self {
        Self { client }
    }

    /// Returns the wrapped lifecycle client.
    #[must_use]
    pub const fn client(&self) -> &LifecycleClient<A> {
        &self.client
    }

    /// Creates a runner instance and returns it once it is running.
    ///
    /// # Errors
    ///
    /// Propagates [`LifecycleClient::create_instance`] failures.
    pub async fn create_instance(
        &self,
        bootstrap: &BootstrapInstance,
    ) -> Result<ProviderInstance, ClientError> {
        let created = self.client.create_instance(bootstrap).await?;
        Ok(ProviderInstance {
            os_type: Some(bootstrap.os_type),
            os_arch: Some(bootstrap.os_arch),
            ..to_provider_instance(Some(&created))
        })
    }

    /// Deletes an instance by numeric ID or label.
    ///
    /// # Errors
    ///
    /// Propagates [`LifecycleClient::delete_instance`] failures.
    pub async fn delete_instance(&self, instance: &str) -> Result<(), ClientError> {
        self.client.delete_instance(instance).await
    }

    /// Describes an instance by numeric ID or label.
    ///
    /// # Errors
    ///
    /// Propagates [`LifecycleClient::get_instance`] failures.
    pub async fn get_instance(&self, instance: &str) -> Result<ProviderInstance, ClientError> {
        let found = self.client.get_instance(instance).await?;
        Ok(to_provider_instance(Some(&found)))
    }

    /// Describes every instance in `pool_id`.
    ///
    /// # Errors
    ///
    /// Propagates [`LifecycleClient::list_instances`] failures.
    pub async fn list_instances(
        &self,
        pool_id: &str,
    ) -> Result<Vec<ProviderInstance>, ClientError> {
        let instances = self.client.list_instances(pool_id).await?;
        Ok(instances
            .iter()
            .map(|found| to_provider_instance(Some(found)))
            .collect())
    }

    /// Removes every instance owned by this controller.
    ///
    /// # Errors
    ///
    /// Propagates [`LifecycleClient::remove_all_instances`] failures.
    pub async fn remove_all_instances(&self) -> Result<(), ClientError> {
        self.client.remove_all_instances().await
    }

    /// Stopping runners is not supported; this succeeds without side effects.
    ///
    /// # Errors
    ///
    /// Never fails.
    #[expect(
        clippy::unused_async,
        reason = "GARM verbs share one async calling convention"
    )]
    pub async fn stop(&self, _instance: &str, _force: bool) -> Result<(), ClientError> {
        Ok(())
    }

    /// Starting runners is not supported; this succeeds without side effects.
    ///
    /// # Errors
    ///
    /// Never fails.
    #[expect(
        clippy::unused_async,
        reason = "GARM verbs share one async calling convention"
    )]
    pub async fn start(&self, _instance: &str) -> Result<(), ClientError> {
        Ok(())
    }

    /// Returns the provider's build identifier.
    #[must_use]
    pub const fn get_version(&self) -> &'static str {
        VERSION
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::ProviderConfig;
    use crate::linode::{Filter, InstanceStatus};
    use crate::params::{OsArch, OsType, ProviderStatus, RunnerApplicationDownload};
    use crate::test_support::{RecordingApi, instance};

    fn provider(api: &RecordingApi) -> LinodeProvider<RecordingApi> {
        let client = LifecycleClient::new(ProviderConfig::with_token("foo"), api.clone(), "ctl")
            .expect("valid config")
            .with_poll_interval(Duration::from_millis(1));
        LinodeProvider::new(client)
    }

    #[tokio::test]
    async fn list_translates_every_instance() {
        let api = RecordingApi::new();
        api.serve_listing(
            Filter::tag("pool=p1"),
            vec![
                instance(1234, "a", InstanceStatus::Running),
                instance(5678, "b", InstanceStatus::Offline),
            ],
        );

        let listed = provider(&api)
            .list_instances("p1")
            .await
            .expect("list succeeds");

        let summary: Vec<(&str, Option<ProviderStatus>)> = listed
            .iter()
            .map(|found| (found.provider_id.as_str(), found.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("1234", Some(ProviderStatus::Running)),
                ("5678", Some(ProviderStatus::Stopped)),
            ]
        );
    }

    #[tokio::test]
    async fn create_reports_requested_platform() {
        let api = RecordingApi::new();
        api.push_create(Ok(instance(42, "garm-runner", InstanceStatus::Provisioning)));
        api.push_get(Ok(instance(42, "garm-runner", InstanceStatus::Running)));
        let bootstrap = BootstrapInstance {
            name: String::from("garm-runner"),
            tools: vec![RunnerApplicationDownload {
                os: Some(String::from("linux")),
                architecture: Some(String::from("arm64")),
                download_url: Some(String::from("http://test.com")),
                filename: Some(String::from("runner.tar.gz")),
                ..RunnerApplicationDownload::default()
            }],
            os_type: OsType::Linux,
            os_arch: OsArch::Arm64,
            pool_id: String::from("p1"),
            ..BootstrapInstance::default()
        };

        let created = provider(&api)
            .create_instance(&bootstrap)
            .await
            .expect("create succeeds");

        assert_eq!(created.provider_id, "42");
        assert_eq!(created.os_arch, Some(OsArch::Arm64));
        assert_eq!(created.status, Some(ProviderStatus::Running));
    }

    #[tokio::test]
    async fn stop_and_start_do_not_touch_linode() {
        let api = RecordingApi::new();
        let linode = provider(&api);

        linode.stop("1234", true).await.expect("stop is a no-op");
        linode.start("1234").await.expect("start is a no-op");

        assert!(api.calls().is_empty());
    }

    #[test]
    fn version_is_prefixed() {
        assert!(version().starts_with('v'));
        assert_eq!(provider(&RecordingApi::new()).get_version(), VERSION);
    }
}
