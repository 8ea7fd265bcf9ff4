//! HTTP transport for chunk retrieval.
//!
//! Mechanism only: this crate opens streams and reports failures. Verification,
//! placement on disk and retry orchestration belong to the caller.

mod error;
mod http;
mod mock;
mod url;

pub use error::{Result, TransportError};
pub use http::{BoxStream, ByteStream, HttpClient};
pub use mock::MockClient;
pub use url::{is_success, join_url};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
