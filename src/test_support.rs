//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::linode::{
    ApiError, ApiFuture, Filter, Instance, InstanceCreateOptions, InstanceId, InstanceStatus,
    LinodeApi,
};

/// A gateway call recorded by [`RecordingApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ApiCall {
    /// `create_instance` with the submitted options.
    Create(InstanceCreateOptions),
    /// `delete_instance` with the target ID.
    Delete(InstanceId),
    /// `get_instance` with the target ID.
    Get(InstanceId),
    /// `list_instances` with the filter sent.
    List(Filter),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<ApiCall>,
    creates: VecDeque<Result<Instance, ApiError>>,
    gets: VecDeque<Result<Instance, ApiError>>,
    deletes: VecDeque<Result<(), ApiError>>,
    listings: Vec<(Filter, Result<Vec<Instance>, ApiError>)>,
}

/// Scripted in-memory gateway that records every call it receives.
///
/// Create and get responses are served in FIFO order and fail once the queue
/// is empty (get answers with a 404). Deletes succeed unless a failure was
/// queued. Listings are keyed by the exact filter; any other filter returns an
/// empty list. Clones share the same script and call log.
#[derive(Clone, Debug, Default)]
pub struct RecordingApi {
    state: Arc<Mutex<State>>,
}

impl RecordingApi {
    /// Creates a gateway with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    /// Returns the filters of every recorded list call, in order.
    #[must_use]
    pub fn list_filters(&self) -> Vec<Filter> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                ApiCall::List(filter) => Some(filter.clone()),
                _ => None,
            })
            .collect()
    }

    /// Queues the response to the next create call.
    pub fn push_create(&self, response: Result<Instance, ApiError>) {
        self.state().creates.push_back(response);
    }

    /// Queues the response to the next get call.
    pub fn push_get(&self, response: Result<Instance, ApiError>) {
        self.state().gets.push_back(response);
    }

    /// Queues the response to the next delete call.
    pub fn push_delete(&self, response: Result<(), ApiError>) {
        self.state().deletes.push_back(response);
    }

    /// Serves `instances` to list calls that use exactly `filter`.
    pub fn serve_listing(&self, filter: Filter, instances: Vec<Instance>) {
        self.state().listings.push((filter, Ok(instances)));
    }

    /// Fails list calls that use exactly `filter`.
    pub fn fail_listing(&self, filter: Filter, error: ApiError) {
        self.state().listings.push((filter, Err(error)));
    }
}

impl LinodeApi for RecordingApi {
    fn create_instance<'a>(
        &'a self,
        options: &'a InstanceCreateOptions,
    ) -> ApiFuture<'a, Instance> {
        let result = {
            let mut state = self.state();
            state.calls.push(ApiCall::Create(options.clone()));
            state.creates.pop_front().unwrap_or_else(|| {
                Err(ApiError::Transport {
                    message: String::from("no scripted create response"),
                })
            })
        };
        Box::pin(async move { result })
    }

    fn delete_instance(&self, id: InstanceId) -> ApiFuture<'_, ()> {
        let result = {
            let mut state = self.state();
            state.calls.push(ApiCall::Delete(id));
            state.deletes.pop_front().unwrap_or(Ok(()))
        };
        Box::pin(async move { result })
    }

    fn get_instance(&self, id: InstanceId) -> ApiFuture<'_, Instance> {
        let result = {
            let mut state = self.state();
            state.calls.push(ApiCall::Get(id));
            state.gets.pop_front().unwrap_or_else(|| {
                Err(ApiError::Status {
                    status: 404,
                    message: String::from("Not found"),
                })
            })
        };
        Box::pin(async move { result })
    }

    fn list_instances<'a>(&'a self, filter: &'a Filter) -> ApiFuture<'a, Vec<Instance>> {
        let result = {
            let mut state = self.state();
            state.calls.push(ApiCall::List(filter.clone()));
            state
                .listings
                .iter()
                .find(|(served, _)| served == filter)
                .map_or_else(|| Ok(Vec::new()), |(_, response)| response.clone())
        };
        Box::pin(async move { result })
    }
}

/// Builds an instance with the given ID, label and status and one public
/// IPv4 address.
#[must_use]
pub fn instance(id: i64, label: &str, status: InstanceStatus) -> Instance {
    Instance {
        id: InstanceId::new(id),
        label: label.to_owned(),
        status,
        ipv4: vec![Ipv4Addr::new(203, 0, 113, 10)],
        ..Instance::default()
    }
}
