//! Shared HTTP client for every resource API.
//!
//! Each request gets the stored bearer token attached just before it is sent.
//! Responses are unwrapped from the backend envelope
//! `{ success, message?, data? }`. A 401 clears the stored token and fires
//! the registered [`UnauthorizedHook`] before the error is returned to the
//! caller. No retry, caching or custom timeout is applied.

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, NO_DETAIL};
use crate::identity::TokenStorage;

/// Called after a 401 once the stored token has been removed.
pub trait UnauthorizedHook: Send + Sync {
    fn on_unauthorized(&self);
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// Percent-encode one caller-supplied path segment.
pub fn seg<D: std::fmt::Display + ?Sized>(v: &D) -> String {
    urlencoding::encode(&v.to_string()).into_owned()
}

pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
    storage: Arc<dyn TokenStorage>,
    on_unauthorized: RwLock<Option<Arc<dyn UnauthorizedHook>>>,
}

impl ApiClient {
    pub fn new(base: Url, storage: Arc<dyn TokenStorage>) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()?;
        Ok(Self { base, http, storage, on_unauthorized: RwLock::new(None) })
    }

    pub fn base_url(&self) -> &Url { &self.base }

    pub fn set_unauthorized_hook(&self, hook: Arc<dyn UnauthorizedHook>) {
        *self.on_unauthorized.write() = Some(hook);
    }

    /// Resolve an endpoint path (leading `/` optional) beneath the base URL.
    pub fn url(&self, path: &str) -> AppResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::config("invalid_path".to_string(), format!("{path}: {e}")))
    }

    fn request(&self, method: Method, path: &str) -> AppResult<RequestBuilder> {
        let url = self.url(path)?;
        debug!(target: "api", %method, %url, "request");
        let mut req = self.http.request(method, url);
        match self.storage.load() {
            Ok(Some(token)) => req = req.bearer_auth(token),
            Ok(None) => {}
            Err(e) => warn!(target: "api", "could not read token for request: {e}"),
        }
        Ok(req)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.execute(self.request(Method::GET, path)?).await
    }

    pub async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> AppResult<T> {
        self.execute(self.request(Method::GET, path)?.query(query)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<T> {
        self.execute(self.request(Method::POST, path)?.json(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.execute(self.request(Method::POST, path)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AppResult<T> {
        self.execute(self.request(Method::PUT, path)?.json(body)).await
    }

    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.execute(self.request(Method::PUT, path)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.execute(self.request(Method::DELETE, path)?).await
    }

    /// Raw body download (report exports). Status handling matches the JSON calls.
    pub async fn get_bytes<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> AppResult<Vec<u8>> {
        let resp = self.request(Method::GET, path)?.query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await?;
            return Err(self.failure(status, &body));
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// Multipart upload; the JSON content type default is replaced by reqwest's boundary header.
    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: reqwest::multipart::Form) -> AppResult<T> {
        self.execute(self.request(Method::POST, path)?.multipart(form)).await
    }

    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> AppResult<T> {
        let resp = req.send().await?;
        self.read_envelope(resp).await
    }

    async fn read_envelope<T: DeserializeOwned>(&self, resp: Response) -> AppResult<T> {
        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(self.failure(status, &body));
        }
        let env: RawEnvelope = if body.iter().all(u8::is_ascii_whitespace) {
            RawEnvelope { success: None, message: None, error: None, data: None }
        } else {
            serde_json::from_slice(&body)?
        };
        if env.success == Some(false) {
            return Err(match env.message.or(env.error) {
                Some(msg) => AppError::request(status.as_u16(), msg),
                None => AppError::request(status.as_u16(), "Request failed").with_code(NO_DETAIL),
            });
        }
        let data = env.data.unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| {
            AppError::transport("unexpected_payload".to_string(), format!("could not decode response data: {e}"))
        })
    }

    fn failure(&self, status: StatusCode, body: &[u8]) -> AppError {
        let detail = serde_json::from_slice::<RawEnvelope>(body).ok().and_then(|e| e.message.or(e.error));
        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
        }
        match detail {
            Some(msg) => AppError::from_status(status.as_u16(), msg),
            None => {
                let reason = status.canonical_reason().unwrap_or("Request failed");
                AppError::from_status(status.as_u16(), reason).with_code(NO_DETAIL)
            }
        }
    }

    fn handle_unauthorized(&self) {
        warn!(target: "api", "backend answered 401; dropping stored token and returning to login");
        if let Err(e) = self.storage.clear() {
            warn!(target: "api", "could not clear stored token: {e}");
        }
        let hook = self.on_unauthorized.read().clone();
        if let Some(h) = hook {
            h.on_unauthorized();
        }
    }
}
