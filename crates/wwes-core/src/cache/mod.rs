//! Response caching between the application and the remote API.
//!
//! `ResponseCache` answers a request from memory or from a per-key file
//! under `<temp>/eveapi` while the document is within the validity window
//! the server declared. Entries are MessagePack, zstd-compressed, named
//! `<sha256 key>.cache`.

pub mod manager;

pub use manager::{cache_key, CachedResponse, ResponseCache};
