//! reqwest-backed implementation of [`LinodeApi`].

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ProviderConfig;

use super::api::{ApiError, ApiFuture, LinodeApi};
use super::types::{Filter, Instance, InstanceCreateOptions, InstanceId, Page};

/// Public Linode API endpoint.
pub const LINODE_API_BASE: &str = "https://api.linode.com/v4";

const FILTER_HEADER: &str = "X-Filter";
const PAGE_SIZE: u32 = 500;
const USER_AGENT: &str = concat!("garm-provider-linode/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Deserialize)]
struct ErrorReason {
    reason: String,
    #[serde(default)]
    field: Option<String>,
}

/// Gateway that talks to Linode over HTTPS with a static bearer token.
#[derive(Clone, Debug)]
pub struct HttpLinodeApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpLinodeApi {
    /// Builds the authenticated transport for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] when the configuration has no token or
    /// the token cannot be sent as a header, and [`ApiError::Transport`]
    /// when the HTTP client cannot be initialised.
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        config
            .validate()
            .map_err(|err| ApiError::Config(err.to_string()))?;

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))
            .map_err(|err| ApiError::Config(format!("invalid token: {err}")))?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ApiError::Transport {
                message: err.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: LINODE_API_BASE.to_owned(),
        })
    }

    /// Points the gateway at a different API root, for example a local stub.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn instances_url(&self) -> String {
        format!("{}/linode/instances", self.base_url)
    }

    fn instance_url(&self, id: InstanceId) -> String {
        format!("{}/linode/instances/{id}", self.base_url)
    }

    async fn list_all(&self, filter: &Filter) -> Result<Vec<Instance>, ApiError> {
        let filter_json = filter.to_json();
        let mut instances = Vec::new();
        let mut page = 1_u32;
        loop {
            let request = self
                .http
                .get(self.instances_url())
                .header(FILTER_HEADER, filter_json.as_str())
                .query(&[("page", page), ("page_size", PAGE_SIZE)]);
            let body = execute(request).await?;
            let current: Page<Instance> = decode(&body)?;
            instances.extend(current.data);
            if current.page >= current.pages {
                return Ok(instances);
            }
            page = current.page.saturating_add(1);
        }
    }
}

impl LinodeApi for HttpLinodeApi {
    fn create_instance<'a>(
        &'a self,
        options: &'a InstanceCreateOptions,
    ) -> ApiFuture<'a, Instance> {
        Box::pin(async move {
            let request = self.http.post(self.instances_url()).json(options);
            decode(&execute(request).await?)
        })
    }

    fn delete_instance(&self, id: InstanceId) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            execute(self.http.delete(self.instance_url(id))).await?;
            Ok(())
        })
    }

    fn get_instance(&self, id: InstanceId) -> ApiFuture<'_, Instance> {
        Box::pin(async move { decode(&execute(self.http.get(self.instance_url(id))).await?) })
    }

    fn list_instances<'a>(&'a self, filter: &'a Filter) -> ApiFuture<'a, Vec<Instance>> {
        Box::pin(async move { self.list_all(filter).await })
    }
}

async fn execute(request: reqwest::RequestBuilder) -> Result<Vec<u8>, ApiError> {
    let response = request.send().await.map_err(|err| ApiError::Transport {
        message: err.to_string(),
    })?;
    let status = response.status();
    let body = response.bytes().await.map_err(|err| ApiError::Transport {
        message: err.to_string(),
    })?;

    if status.is_success() {
        return Ok(body.to_vec());
    }

    Err(ApiError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::Decode {
        message: err.to_string(),
    })
}

/// Joins Linode's `errors[].reason` entries, falling back to the raw body.
fn error_message(body: &[u8]) -> String {
    let reasons = serde_json::from_slice::<ErrorBody>(body)
        .map(|parsed| {
            parsed
                .errors
                .into_iter()
                .map(|entry| match entry.field {
                    Some(field) => format!("{field}: {}", entry.reason),
                    None => entry.reason,
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    if reasons.is_empty() {
        String::from_utf8_lossy(body).trim().to_owned()
    } else {
        reasons.join("; ")
    }
}
