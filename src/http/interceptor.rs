//! Response interceptor pipeline.

use std::sync::Weak;

use async_trait::async_trait;

use super::client::{ApiClient, ClientInner};
use super::request::ApiRequest;
use super::Outcome;

/// One stage of the response pipeline.
///
/// Every outcome (success or failure) produced by the transport passes
/// through the installed interceptors in registration order. A stage may
/// pass the outcome through, rewrite it, or resolve it by sending new
/// requests through `client`.
///
/// A request resent through `client` runs the full chain on its own. When a
/// stage resolves an outcome that way, the stages after it see the resent
/// request's outcome and then the same outcome again for the original
/// request.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn intercept(&self, client: &ApiClient, request: &ApiRequest, outcome: Outcome)
        -> Outcome;
}

/// Identifier of an installed interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorId(pub(crate) u64);

/// Handle returned when an interceptor is installed; removes it again.
#[derive(Debug)]
pub struct InterceptorHandle {
    id: InterceptorId,
    client: Weak<ClientInner>,
}

impl InterceptorHandle {
    pub(crate) fn new(id: InterceptorId, client: Weak<ClientInner>) -> Self {
        Self { id, client }
    }

    pub fn id(&self) -> InterceptorId {
        self.id
    }

    /// Remove the interceptor. Returns `false` if it was already removed or
    /// the client no longer exists.
    pub fn uninstall(self) -> bool {
        match self.client.upgrade() {
            Some(inner) => ApiClient::from_inner(inner).eject(self.id),
            None => false,
        }
    }
}
