//! Data models for corporation state.
//!
//! - `Item`, `Quantity`, `AssetRow`: located assets
//! - `Location`: stations and item-hosted locations holding items by flag
//! - `Division`, `Shareholder`: wallet/hangar divisions and share register
//! - Response types for the remote calls in `responses`

pub mod division;
pub mod item;
pub mod location;
pub mod responses;

pub use division::{division_for_flag, Division, Shareholder};
pub use item::{AssetRow, Item, Quantity, DELIVERY_FLAG, OFFICE_SLOT_FLAG_BASE, OFFICE_TYPE_ID};
pub use location::Location;
pub use responses::{
    AccountBalance, ApiKeyInfo, AssetList, CharacterNames, CorporationSheet, LocationNames,
    ShareHolders, TypeNames,
};
