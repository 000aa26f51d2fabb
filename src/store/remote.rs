// Remote store: hosted table-per-entity backend (PostgREST dialect)
//
// The backend owns ids, creation timestamps, ordering and persistence.
// Nothing is retried; the first failure goes back to the caller.

use super::EntityStore;
use crate::entities::Entity;
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client for every table on one hosted project.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

/// Error body the backend sends on failure.
#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_http(http, base_url, api_key))
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        RestClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Use a signed-in user's token instead of the project key for data calls.
    /// `None` falls back to the project key.
    pub fn set_access_token(&self, token: Option<String>) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn headers(&self) -> Result<HeaderMap> {
        let token = self
            .access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| self.api_key.clone());

        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&self.api_key)?);
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
        Ok(headers)
    }
}

/// Turn a non-success response into `StoreError::Backend`, keeping the
/// backend's own message when it sent one.
pub(crate) async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = backend_message(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.to_string()
        } else {
            body.clone()
        }
    });

    warn!(status = status.as_u16(), %message, "backend request failed");
    Err(StoreError::Backend {
        status: status.as_u16(),
        message,
    })
}

/// The message field of a backend error body, when there is one.
pub(crate) fn backend_message(body: &str) -> Option<String> {
    let parsed: BackendErrorBody = serde_json::from_str(body).ok()?;
    parsed.message.or(parsed.msg).or(parsed.error_description)
}

pub struct RemoteStore<E: Entity> {
    client: RestClient,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> RemoteStore<E> {
    pub fn new(client: RestClient) -> Self {
        RemoteStore {
            client,
            _entity: PhantomData,
        }
    }

    fn url(&self) -> String {
        self.client.table_url(E::TABLE)
    }

    fn id_filter(id: &str) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id))]
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for RemoteStore<E> {
    fn backend_tag(&self) -> &'static str {
        "remote"
    }

    #[instrument(name = "remote_get", skip(self), fields(table = E::TABLE))]
    async fn get(&self) -> Result<Vec<E>> {
        let resp = self
            .client
            .http()
            .get(self.url())
            .headers(self.client.headers()?)
            .query(&[("select", "*".to_string()), ("order", E::ORDER.to_query())])
            .send()
            .await?;

        let rows: Option<Vec<E>> = check_response(resp).await?.json().await?;
        let rows = rows.unwrap_or_default();
        debug!(rows = rows.len(), "fetched");
        Ok(rows)
    }

    #[instrument(name = "remote_add", skip(self, new), fields(table = E::TABLE))]
    async fn add(&self, new: E::New) -> Result<E> {
        let resp = self
            .client
            .http()
            .post(self.url())
            .headers(self.client.headers()?)
            .header("Prefer", "return=representation")
            .json(&new)
            .send()
            .await?;

        let rows: Vec<E> = check_response(resp).await?.json().await?;
        let created = rows
            .into_iter()
            .next()
            .ok_or(StoreError::EmptyInsert(E::TABLE))?;
        debug!(id = created.id(), "inserted");
        Ok(created)
    }

    #[instrument(name = "remote_update", skip(self, patch), fields(table = E::TABLE))]
    async fn update(&self, id: &str, patch: E::Patch) -> Result<()> {
        let body = serde_json::to_value(&patch)?;
        if body.as_object().is_some_and(|fields| fields.is_empty()) {
            debug!("empty patch, nothing to send");
            return Ok(());
        }

        let resp = self
            .client
            .http()
            .patch(self.url())
            .headers(self.client.headers()?)
            .header("Prefer", "return=minimal")
            .query(&Self::id_filter(id))
            .json(&body)
            .send()
            .await?;

        check_response(resp).await?;
        Ok(())
    }

    #[instrument(name = "remote_delete", skip(self), fields(table = E::TABLE))]
    async fn delete(&self, id: &str) -> Result<()> {
        let resp = self
            .client
            .http()
            .delete(self.url())
            .headers(self.client.headers()?)
            .query(&Self::id_filter(id))
            .send()
            .await?;

        check_response(resp).await?;
        Ok(())
    }
}
