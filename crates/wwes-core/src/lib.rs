//! Corporation wallet and asset tracking against the remote account API.
//!
//! - `api`: request descriptors, HTTP transport, typed cached calls
//! - `cache`: two-tier response cache honouring server validity windows
//! - `resolver`: batched identifier-to-name lookups per namespace
//! - `assets`: asset tree reconstruction from the flat asset list
//! - `corp`: one fetch cycle with key pair fallthrough
//! - `snapshot`: SQLite snapshots of each fetch
//! - `report`: plain-text report

pub mod api;
pub mod assets;
pub mod auth;
pub mod cache;
pub mod config;
pub mod corp;
pub mod models;
pub mod report;
pub mod resolver;
pub mod snapshot;
pub mod utils;

#[cfg(test)]
mod testing;

pub use api::{ApiError, EveApi, HttpTransport};
pub use assets::{AssetError, AssetTree};
pub use cache::ResponseCache;
pub use config::Config;
pub use corp::{CorpSnapshot, FetchError};
pub use resolver::{Namespace, Resolver};
pub use snapshot::SnapshotStore;
