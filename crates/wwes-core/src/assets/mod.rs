//! Asset hierarchy reconstruction.
//!
//! Turns the flat asset list into stations, offices and containers holding
//! items by compartment flag, then names everything through the `Resolver`.

pub mod tree;

pub use tree::{AssetError, AssetTree};
