//! Assistant Service Boundary
//!
//! The send boundary of the client: a trait for opening one streamed reply
//! per request, and the HTTP implementation used in production.

mod http;
mod traits;

pub use http::{HttpBackend, DEFAULT_CONNECT_TIMEOUT_MS};
pub use traits::{BackendError, ChatBackend, ChatRequest, ReplyStream};
