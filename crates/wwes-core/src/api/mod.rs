//! Remote account API access.
//!
//! - `ApiRequest`/`ApiResponse`: request descriptors and raw documents
//! - `Transport`: the black-box remote call, `HttpTransport` over reqwest
//! - `EveApi`: typed calls checked against the `ResponseCache`

pub mod client;
pub mod error;
pub mod eve;
pub mod request;

pub use client::HttpTransport;
pub use error::ApiError;
pub use eve::{EveApi, DEFAULT_API_HOST};
pub use request::{parse_result, ApiRequest, ApiResponse, Transport};
