//! Typed access to the Ignite API endpoints.

pub mod types;

pub use types::{
    Exercise, HistoryEntry, HistorySection, NewUser, ProfileUpdate, SignInResponse, User,
};

use std::sync::Arc;

use crate::auth::{CredentialPair, RefreshCoordinator, SessionOwner, TokenStore};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{ApiClient, InterceptorHandle};

use types::{Credentials, HistoryRegistration};

/// Session-aware facade over [`ApiClient`].
///
/// Holds the token store and the refresh coordinator that share the
/// client's session. Errors returned by every endpoint method are already
/// translated into [`ApiError::Domain`] when the server sent a message.
///
/// # Example
/// ```no_run
/// use ignite::config::ClientConfig;
/// use ignite::resources::IgniteApi;
///
/// # async fn example() -> ignite::error::Result<()> {
/// let api = IgniteApi::from_config(&ClientConfig::from_env()?)?;
/// let _refresh = api.enable_token_refresh(|| eprintln!("signed out"));
/// api.restore_session()?;
/// for group in api.groups().await? {
///     println!("{group}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct IgniteApi {
    client: ApiClient,
    store: Arc<dyn TokenStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl std::fmt::Debug for IgniteApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgniteApi")
            .field("client", &self.client)
            .field("store", &"..")
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

impl IgniteApi {
    pub fn new(client: ApiClient, store: Arc<dyn TokenStore>, config: &ClientConfig) -> Self {
        let coordinator = Arc::new(RefreshCoordinator::from_config(store.clone(), config));
        Self {
            client,
            store,
            coordinator,
        }
    }

    /// Client over `reqwest` with a file-backed token store.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = ApiClient::new(config)?;
        Ok(Self::new(client, Arc::new(config.token_store()), config))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Install transparent token refresh.
    ///
    /// When the session cannot be recovered the stored credentials and the
    /// client's `Authorization` header are dropped, then `session` is told.
    pub fn enable_token_refresh<S>(&self, session: S) -> InterceptorHandle
    where
        S: SessionOwner + 'static,
    {
        let client = self.client.downgrade();
        let store = Arc::clone(&self.store);
        self.coordinator.install(&self.client, move || {
            if let Some(inner) = client.upgrade() {
                ApiClient::from_inner(inner).clear_authorization();
            }
            if let Err(e) = store.clear() {
                tracing::warn!(error = %e, "could not clear stored session");
            }
            session.sign_out();
        })
    }

    // -- session ------------------------------------------------------------

    /// `POST /sessions`: authenticate, persist the credentials and use them
    /// for every later request.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResponse> {
        let response: SignInResponse = self
            .client
            .post("/sessions", &Credentials { email, password })
            .await
            .map_err(ApiError::into_domain)?
            .json()?;

        let pair = CredentialPair::new(response.token.clone(), response.refresh_token.clone());
        if !pair.is_complete() {
            return Err(ApiError::Authentication(
                "sign-in response is missing a token".to_string(),
            ));
        }
        self.store.save(&pair)?;
        self.client.set_authorization(&pair.access_token)?;
        tracing::info!(user_id = %response.user.id, "signed in");
        Ok(response)
    }

    /// Reuse a stored session. Returns whether one was found.
    pub fn restore_session(&self) -> Result<bool> {
        match self.store.load()? {
            Some(pair) => {
                self.client.set_authorization(&pair.access_token)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Forget the stored session and stop sending credentials.
    pub fn sign_out(&self) -> Result<()> {
        self.client.clear_authorization();
        self.store.clear()?;
        Ok(())
    }

    // -- users --------------------------------------------------------------

    /// `POST /users`.
    pub async fn sign_up(&self, user: &NewUser) -> Result<()> {
        self.client
            .post("/users", user)
            .await
            .map_err(ApiError::into_domain)?;
        Ok(())
    }

    /// `PUT /users`.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        self.client
            .put("/users", update)
            .await
            .map_err(ApiError::into_domain)?;
        Ok(())
    }

    // -- exercises ----------------------------------------------------------

    /// `GET /groups`: muscle group names.
    pub async fn groups(&self) -> Result<Vec<String>> {
        self.client
            .get("/groups")
            .await
            .map_err(ApiError::into_domain)?
            .json()
    }

    /// `GET /exercises/bygroup/{group}`.
    pub async fn exercises_by_group(&self, group: &str) -> Result<Vec<Exercise>> {
        self.client
            .get(&format!("/exercises/bygroup/{group}"))
            .await
            .map_err(ApiError::into_domain)?
            .json()
    }

    /// `GET /exercises/{id}`.
    pub async fn exercise(&self, id: &str) -> Result<Exercise> {
        self.client
            .get(&format!("/exercises/{id}"))
            .await
            .map_err(ApiError::into_domain)?
            .json()
    }

    // -- history ------------------------------------------------------------

    /// `POST /history`: mark an exercise as done.
    pub async fn register_history(&self, exercise_id: &str) -> Result<()> {
        self.client
            .post("/history", &HistoryRegistration { exercise_id })
            .await
            .map_err(ApiError::into_domain)?;
        Ok(())
    }

    /// `GET /history`: completed exercises grouped by day.
    pub async fn history(&self) -> Result<Vec<HistorySection>> {
        self.client
            .get("/history")
            .await
            .map_err(ApiError::into_domain)?
            .json()
    }

    // -- assets -------------------------------------------------------------

    pub fn avatar_url(&self, file: &str) -> String {
        self.client.asset_url(&format!("avatar/{file}"))
    }

    pub fn exercise_demo_url(&self, file: &str) -> String {
        self.client.asset_url(&format!("exercise/demo/{file}"))
    }

    pub fn exercise_thumb_url(&self, file: &str) -> String {
        self.client.asset_url(&format!("exercise/thumb/{file}"))
    }
}
