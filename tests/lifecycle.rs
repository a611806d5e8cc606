//! End-to-end lifecycle scenarios against the recording gateway.

use std::time::Duration;

use garm_provider_linode::execution::{self, EXIT_CODE_NOT_FOUND, Request};
use garm_provider_linode::linode::Filter;
use garm_provider_linode::test_support::{ApiCall, RecordingApi, instance};
use garm_provider_linode::{
    InstanceId, InstanceStatus, LifecycleClient, LinodeProvider, ProviderConfig,
};
use rstest::{fixture, rstest};

#[fixture]
fn api() -> RecordingApi {
    RecordingApi::new()
}

fn provider(api: &RecordingApi) -> LinodeProvider<RecordingApi> {
    let client = LifecycleClient::new(ProviderConfig::with_token("foo"), api.clone(), "ctl-1")
        .expect("token is set")
        .with_poll_interval(Duration::from_millis(1))
        .with_wait_timeout(Duration::from_millis(500));
    LinodeProvider::new(client)
}

#[rstest]
#[tokio::test]
async fn pool_listing_returns_only_tagged_instances(api: RecordingApi) {
    api.serve_listing(
        Filter::tag("pool=p1"),
        vec![
            instance(1234, "runner-1", InstanceStatus::Running),
            instance(5678, "runner-2", InstanceStatus::Running),
        ],
    );
    let linode = provider(&api);

    let listed = linode.list_instances("p1").await.expect("list succeeds");
    let ids: Vec<&str> = listed.iter().map(|found| found.provider_id.as_str()).collect();
    assert_eq!(ids, vec!["1234", "5678"]);

    let other = linode.list_instances("p2").await.expect("list succeeds");
    assert!(other.is_empty());
}

#[rstest]
#[tokio::test]
async fn create_get_and_delete_by_label(api: RecordingApi) {
    api.push_create(Ok(instance(4321, "garm-runner", InstanceStatus::Provisioning)));
    api.push_get(Ok(instance(4321, "garm-runner", InstanceStatus::Booting)));
    api.push_get(Ok(instance(4321, "garm-runner", InstanceStatus::Running)));
    let linode = provider(&api);
    let bootstrap = r#"{
        "name": "garm-runner",
        "tools": [{
            "os": "linux",
            "architecture": "x64",
            "download_url": "https://example.com/runner.tar.gz",
            "filename": "runner.tar.gz"
        }],
        "os_type": "linux",
        "arch": "amd64",
        "flavor": "g6-nanode-1",
        "image": "linode/ubuntu24.04",
        "pool_id": "p1",
        "extra_specs": {"extra_packages": ["jq"]}
    }"#;
    let request = Request::CreateInstance(Box::new(
        serde_json::from_str(bootstrap).expect("bootstrap JSON"),
    ));

    let output = execution::execute(&linode, request)
        .await
        .expect("create succeeds");
    let created: serde_json::Value = serde_json::from_str(&output).expect("JSON output");
    assert_eq!(created["provider_id"], "4321");
    assert_eq!(created["status"], "running");
    assert_eq!(created["os_type"], "linux");

    api.serve_listing(
        Filter::label("garm-runner"),
        vec![instance(4321, "garm-runner", InstanceStatus::Running)],
    );
    execution::execute(&linode, Request::DeleteInstance(String::from("garm-runner")))
        .await
        .expect("delete succeeds");

    let calls = api.calls();
    assert!(matches!(calls.first(), Some(ApiCall::Create(_))));
    assert_eq!(
        calls.get(1..),
        Some(
            &[
                ApiCall::Get(InstanceId::new(4321)),
                ApiCall::Get(InstanceId::new(4321)),
                ApiCall::List(Filter::label("garm-runner")),
                ApiCall::Delete(InstanceId::new(4321)),
            ][..]
        )
    );
}

#[rstest]
#[tokio::test]
async fn deleting_an_unknown_label_maps_to_not_found(api: RecordingApi) {
    let linode = provider(&api);

    let err = execution::execute(&linode, Request::DeleteInstance(String::from("ghost")))
        .await
        .expect_err("nothing matches");

    assert_eq!(err.exit_code(), EXIT_CODE_NOT_FOUND);
    assert_eq!(api.calls(), vec![ApiCall::List(Filter::label("ghost"))]);
}

#[rstest]
#[tokio::test]
async fn remove_all_leaves_the_rest_after_a_failure(api: RecordingApi) {
    api.serve_listing(
        Filter::tag("controller=ctl-1"),
        vec![
            instance(1, "a", InstanceStatus::Running),
            instance(2, "b", InstanceStatus::Running),
        ],
    );
    api.push_delete(Err(garm_provider_linode::ApiError::Transport {
        message: String::from("connection reset"),
    }));
    let linode = provider(&api);

    let err = execution::execute(&linode, Request::RemoveAllInstances)
        .await
        .expect_err("first delete fails");

    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("deleting instance 1"), "{err}");
    assert_eq!(
        api.calls(),
        vec![
            ApiCall::List(Filter::tag("controller=ctl-1")),
            ApiCall::Delete(InstanceId::new(1)),
        ]
    );
}
