//! Single-flight access token refresh.
//!
//! When the API rejects a request because its access token expired, the
//! [`RefreshCoordinator`] exchanges the stored refresh token for a new pair
//! and resubmits the request. Requests that fail the same way while that
//! exchange is in flight are parked as [`PendingRequest`]s and resubmitted
//! (or rejected) once it settles, so one expiry costs exactly one call to the
//! refresh endpoint.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use strum::{Display, EnumString};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::session::SessionOwner;
use super::store::TokenStore;
use super::token::CredentialPair;
use crate::config::{ClientConfig, DEFAULT_REFRESH_PATH};
use crate::error::{ApiError, RefreshError};
use crate::http::{ApiClient, ApiRequest, InterceptorHandle, Outcome, ResponseInterceptor};

/// `message` values of a 401 body that mean "refresh and try again".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum TokenRejection {
    #[strum(serialize = "token.expired")]
    Expired,
    #[strum(serialize = "token.invalid")]
    Invalid,
}

impl TokenRejection {
    /// Whether `error` is a 401 caused by a stale access token (as opposed
    /// to wrong credentials or any other failure).
    pub fn from_error(error: &ApiError) -> Option<Self> {
        match error {
            ApiError::Http { status, .. } if *status == StatusCode::UNAUTHORIZED.as_u16() => {
                error.server_message()?.parse().ok()
            }
            _ => None,
        }
    }
}

/// A request parked behind an in-flight refresh, with the channel its
/// caller is waiting on.
#[derive(Debug)]
pub struct PendingRequest {
    request: ApiRequest,
    reply: oneshot::Sender<Outcome>,
}

impl PendingRequest {
    /// Resubmit with the new credentials; the replay's outcome, success or
    /// failure, goes to this request's own caller.
    fn resume(self, client: &ApiClient, authorization: &HeaderValue) {
        let Self { request, reply } = self;
        let replay = client.dispatch(request.into_replay(authorization.clone()));
        tokio::spawn(async move {
            let _ = reply.send(replay.await);
        });
    }

    fn reject(self, error: RefreshError) {
        let _ = self.reply.send(Err(ApiError::Refresh(error)));
    }
}

#[derive(Debug, Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<PendingRequest>,
    },
}

/// Owns the refresh state machine (`Idle -> Refreshing -> Idle`) for one
/// API client.
///
/// Construct once at start-up and [`install`](RefreshCoordinator::install)
/// it on the client.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use ignite::auth::{FileTokenStore, RefreshCoordinator};
/// use ignite::config::ClientConfig;
/// use ignite::http::ApiClient;
///
/// # fn example() -> ignite::error::Result<()> {
/// let config = ClientConfig::default();
/// let client = ApiClient::new(&config)?;
/// let coordinator = Arc::new(RefreshCoordinator::new(Arc::new(config.token_store())));
/// let handle = coordinator.install(&client, || eprintln!("session expired"));
/// // ...
/// handle.uninstall();
/// # Ok(())
/// # }
/// ```
pub struct RefreshCoordinator {
    store: Arc<dyn TokenStore>,
    refresh_path: String,
    state: Mutex<RefreshState>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_path", &self.refresh_path)
            .field("state", &*self.lock_state())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            state: Mutex::new(RefreshState::Idle),
        }
    }

    pub fn from_config(store: Arc<dyn TokenStore>, config: &ClientConfig) -> Self {
        Self::new(store).with_refresh_path(config.refresh_path.clone())
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Register the refresh behavior on `client`. `session` is signed out
    /// when a refresh is impossible or fails.
    ///
    /// Replays go through the whole interceptor chain, so stages installed
    /// after this one see a recovered request's outcome twice. Install the
    /// coordinator last.
    pub fn install<S>(self: &Arc<Self>, client: &ApiClient, session: S) -> InterceptorHandle
    where
        S: SessionOwner + 'static,
    {
        client.intercept(Arc::new(TokenRefreshInterceptor {
            coordinator: Arc::clone(self),
            session: Arc::new(session),
        }))
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.lock_state(), RefreshState::Refreshing { .. })
    }

    /// Requests currently parked behind the in-flight refresh.
    pub fn pending(&self) -> usize {
        match &*self.lock_state() {
            RefreshState::Refreshing { waiters } => waiters.len(),
            RefreshState::Idle => 0,
        }
    }

    async fn handle(
        &self,
        client: &ApiClient,
        session: &dyn SessionOwner,
        request: &ApiRequest,
        outcome: Outcome,
    ) -> Outcome {
        let error = match outcome {
            Ok(response) => return Ok(response),
            Err(error) => error,
        };
        let Some(rejection) = TokenRejection::from_error(&error) else {
            return Err(error.into_domain());
        };
        if request.is_replay() {
            warn!(
                request_id = %request.id(),
                path = request.path(),
                reason = %rejection,
                "replayed request rejected again after refresh"
            );
            return Err(error.into_domain());
        }
        debug!(
            request_id = %request.id(),
            path = request.path(),
            reason = %rejection,
            "access token rejected"
        );
        self.recover(client, session, request, error).await
    }

    async fn recover(
        &self,
        client: &ApiClient,
        session: &dyn SessionOwner,
        request: &ApiRequest,
        original: ApiError,
    ) -> Outcome {
        if let Some(authorization) = self.newer_authorization(client, request) {
            debug!(
                request_id = %request.id(),
                "request used superseded credentials, replaying"
            );
            return client.dispatch(request.clone().into_replay(authorization)).await;
        }

        let refresh_token = match self.store.load() {
            Ok(Some(pair)) => pair.refresh_token,
            Ok(None) => {
                warn!("no refresh token stored, signing out");
                session.sign_out();
                return Err(original);
            }
            Err(err) => {
                warn!(error = %err, "could not read stored credentials, signing out");
                session.sign_out();
                return Err(original);
            }
        };

        // Check-and-transition must not suspend.
        let parked = {
            let mut state = self.lock_state();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    let (reply, rx) = oneshot::channel();
                    waiters.push(PendingRequest {
                        request: request.clone(),
                        reply,
                    });
                    debug!(
                        request_id = %request.id(),
                        queued = waiters.len(),
                        "waiting for in-flight token refresh"
                    );
                    Some(rx)
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing {
                        waiters: Vec::new(),
                    };
                    None
                }
            }
        };
        if let Some(rx) = parked {
            return rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Refresh(RefreshError::Abandoned)));
        }

        let episode = Episode::begin(self);
        match self.refresh(client, &refresh_token).await {
            Ok(authorization) => {
                let waiters = episode.finish();
                info!(replaying = waiters.len() + 1, "access token refreshed");
                for waiter in waiters {
                    waiter.resume(client, &authorization);
                }
                client
                    .dispatch(request.clone().into_replay(authorization))
                    .await
            }
            Err(error) => {
                let waiters = episode.finish();
                warn!(
                    error = %error,
                    rejected = waiters.len() + 1,
                    "token refresh failed, signing out"
                );
                for waiter in waiters {
                    waiter.reject(error.clone());
                }
                session.sign_out();
                Err(ApiError::Refresh(error))
            }
        }
    }

    /// Exchange the refresh token, persist the new pair and make it the
    /// client's default credentials. Returns the new `Authorization` value.
    async fn refresh(
        &self,
        client: &ApiClient,
        refresh_token: &str,
    ) -> Result<HeaderValue, RefreshError> {
        let request = ApiRequest::post(&self.refresh_path)
            .with_body(serde_json::json!({ "refresh_token": refresh_token }));
        let response = client
            .send_without_interceptors(request)
            .await
            .map_err(refresh_failure)?;
        let payload: RefreshResponse = response
            .json()
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        let pair = CredentialPair::new(payload.token, payload.refresh_token);
        if !pair.is_complete() {
            return Err(RefreshError::InvalidResponse(
                "refresh response is missing a token".to_string(),
            ));
        }
        let authorization = HeaderValue::from_str(&pair.bearer())
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        self.store.save(&pair)?;
        client.set_default_header(AUTHORIZATION, authorization.clone());
        Ok(authorization)
    }

    /// The client's current credentials, if no refresh is running and they
    /// differ from the ones `request` was sent with. The rejection then
    /// belongs to an episode that already finished.
    fn newer_authorization(
        &self,
        client: &ApiClient,
        request: &ApiRequest,
    ) -> Option<HeaderValue> {
        let current = client.default_header(&AUTHORIZATION)?;
        let state = self.lock_state();
        if matches!(*state, RefreshState::Refreshing { .. }) {
            return None;
        }
        (request.headers().get(AUTHORIZATION) != Some(&current)).then_some(current)
    }

    /// Leave `Refreshing`, handing back everything that queued up.
    fn take_waiters(&self) -> Vec<PendingRequest> {
        match std::mem::take(&mut *self.lock_state()) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One `Refreshing` period. Dropping it unsettled (the leading request was
/// cancelled mid-refresh) still returns the coordinator to `Idle` and
/// rejects everything that queued up.
struct Episode<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl<'a> Episode<'a> {
    fn begin(coordinator: &'a RefreshCoordinator) -> Self {
        Self {
            coordinator,
            settled: false,
        }
    }

    fn finish(mut self) -> Vec<PendingRequest> {
        self.settled = true;
        self.coordinator.take_waiters()
    }
}

impl Drop for Episode<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let waiters = self.coordinator.take_waiters();
        warn!(
            rejected = waiters.len(),
            "token refresh abandoned before it settled"
        );
        for waiter in waiters {
            waiter.reject(RefreshError::Abandoned);
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
    refresh_token: String,
}

fn refresh_failure(error: ApiError) -> RefreshError {
    match error {
        ApiError::Http { status, .. } | ApiError::Domain { status, .. } => {
            RefreshError::Rejected {
                status,
                message: error.server_message().map(String::from),
            }
        }
        ApiError::Network(msg) | ApiError::Timeout(msg) => RefreshError::Network(msg),
        ApiError::Refresh(inner) => inner,
        other => RefreshError::InvalidResponse(other.to_string()),
    }
}

struct TokenRefreshInterceptor {
    coordinator: Arc<RefreshCoordinator>,
    session: Arc<dyn SessionOwner>,
}

#[async_trait]
impl ResponseInterceptor for TokenRefreshInterceptor {
    async fn intercept(
        &self,
        client: &ApiClient,
        request: &ApiRequest,
        outcome: Outcome,
    ) -> Outcome {
        self.coordinator
            .handle(client, self.session.as_ref(), request, outcome)
            .await
    }
}
