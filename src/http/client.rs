use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde::Serialize;

use super::interceptor::{InterceptorHandle, InterceptorId, ResponseInterceptor};
use super::request::ApiRequest;
use super::transport::{join_url, ReqwestTransport, Transport};
use super::Outcome;
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};

type InterceptorList = Vec<(InterceptorId, Arc<dyn ResponseInterceptor>)>;

/// HTTP client for the Ignite API.
///
/// Owns the default headers applied to every request and the response
/// interceptor chain. Cloning is cheap and clones share all state, so a
/// header set by one clone (for example after a token refresh) is seen by
/// every other.
///
/// # Example
/// ```no_run
/// use ignite::config::ClientConfig;
/// use ignite::http::ApiClient;
///
/// # async fn example() -> ignite::error::Result<()> {
/// let client = ApiClient::new(&ClientConfig::default())?;
/// let groups: Vec<String> = client.get("/groups").await?.json()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    transport: Arc<dyn Transport>,
    default_headers: RwLock<HeaderMap>,
    interceptors: RwLock<InterceptorList>,
    next_interceptor: AtomicU64,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url())
            .field("interceptors", &self.interceptor_count())
            .finish()
    }
}

impl ApiClient {
    /// Build a client over a `reqwest` transport.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.base_url.clone(), config.timeout)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                default_headers: RwLock::new(HeaderMap::new()),
                interceptors: RwLock::new(Vec::new()),
                next_interceptor: AtomicU64::new(1),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ClientInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn base_url(&self) -> &str {
        self.inner.transport.base_url()
    }

    /// Absolute URL of a static asset served next to the API.
    pub fn asset_url(&self, path: &str) -> String {
        join_url(self.base_url(), path)
    }

    // -- default headers ----------------------------------------------------

    pub fn set_default_header(&self, name: HeaderName, value: HeaderValue) {
        self.inner
            .default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, value);
    }

    pub fn remove_default_header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.inner
            .default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn default_header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.inner
            .default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Send `Authorization: Bearer <token>` with every later request.
    pub fn set_authorization(&self, access_token: &str) -> Result<()> {
        let value = HeaderValue::from_str(&crate::auth::token::bearer(access_token))
            .map_err(|e| ApiError::InvalidRequest(format!("access token: {e}")))?;
        self.set_default_header(AUTHORIZATION, value);
        Ok(())
    }

    pub fn clear_authorization(&self) {
        self.remove_default_header(&AUTHORIZATION);
    }

    // -- interceptors -------------------------------------------------------

    /// Append a stage to the response pipeline.
    pub fn intercept(&self, interceptor: Arc<dyn ResponseInterceptor>) -> InterceptorHandle {
        let id = InterceptorId(self.inner.next_interceptor.fetch_add(1, Ordering::Relaxed));
        self.inner
            .interceptors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, interceptor));
        InterceptorHandle::new(id, self.downgrade())
    }

    /// Remove an interceptor. Returns whether it was installed.
    pub fn eject(&self, id: InterceptorId) -> bool {
        let mut interceptors = self
            .inner
            .interceptors
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = interceptors.len();
        interceptors.retain(|(installed, _)| *installed != id);
        interceptors.len() != before
    }

    pub fn interceptor_count(&self) -> usize {
        self.inner
            .interceptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // -- sending ------------------------------------------------------------

    /// Send a request through the transport and the interceptor chain.
    pub async fn send(&self, request: ApiRequest) -> Outcome {
        let request = self.prepare(request);
        tracing::debug!(
            request_id = %request.id(),
            method = %request.method(),
            path = request.path(),
            replay = request.is_replay(),
            "sending request"
        );
        let outcome = self.inner.transport.send(&request).await;
        self.run_interceptors(&request, outcome).await
    }

    /// Owned, boxed form of [`ApiClient::send`] for spawning and for
    /// interceptors that resubmit requests.
    pub fn dispatch(&self, request: ApiRequest) -> BoxFuture<'static, Outcome> {
        let client = self.clone();
        async move { client.send(request).await }.boxed()
    }

    /// Send with default headers applied but without running interceptors.
    pub async fn send_without_interceptors(&self, request: ApiRequest) -> Outcome {
        let request = self.prepare(request);
        tracing::debug!(
            request_id = %request.id(),
            method = %request.method(),
            path = request.path(),
            "sending request without interceptors"
        );
        self.inner.transport.send(&request).await
    }

    pub async fn get(&self, path: &str) -> Outcome {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Outcome {
        self.send(ApiRequest::post(path).with_json(body)?).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Outcome {
        self.send(ApiRequest::put(path).with_json(body)?).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Outcome {
        self.send(ApiRequest::patch(path).with_json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Outcome {
        self.send(ApiRequest::delete(path)).await
    }

    /// Fill in default headers the request does not set itself.
    fn prepare(&self, mut request: ApiRequest) -> ApiRequest {
        let defaults = self
            .inner
            .default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let headers = request.headers_mut();
        for (name, value) in defaults.iter() {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
        request
    }

    async fn run_interceptors(&self, request: &ApiRequest, mut outcome: Outcome) -> Outcome {
        let chain: Vec<Arc<dyn ResponseInterceptor>> = self
            .inner
            .interceptors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, interceptor)| Arc::clone(interceptor))
            .collect();
        for interceptor in chain {
            outcome = interceptor.intercept(self, request, outcome).await;
        }
        outcome
    }
}
