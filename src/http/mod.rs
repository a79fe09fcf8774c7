//! HTTP client, transport and response interceptor pipeline.

pub mod client;
pub mod interceptor;
pub mod request;
pub mod transport;

pub use client::ApiClient;
pub use interceptor::{InterceptorHandle, InterceptorId, ResponseInterceptor};
pub use request::{ApiRequest, ApiResponse};
pub use transport::{ReqwestTransport, Transport};

/// What a request produced after the transport (and, on the way out, each
/// interceptor) has seen it.
pub type Outcome = std::result::Result<ApiResponse, crate::error::ApiError>;
