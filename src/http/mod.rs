//! Request plumbing: typed requests, a pluggable transport, and a client that
//! runs request and response interceptors around every send.

pub mod bearer;
pub mod client;
pub mod request;
pub mod transport;

pub use bearer::BearerInterceptor;
pub use client::{HttpClient, RequestInterceptor, ResponseInterceptor};
pub use request::{ApiRequest, ApiResponse, AuthMode, RequestBody};
pub use transport::{ReqwestTransport, Transport};
