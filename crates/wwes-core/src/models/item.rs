use std::fmt;

use serde::{Deserialize, Serialize};

/// Type ID of a rented corporation office.
pub const OFFICE_TYPE_ID: i64 = 27;

/// Office slots and the hangars inside them are numbered from this flag.
pub const OFFICE_SLOT_FLAG_BASE: i32 = 69;

/// Flag of the delivery bucket at a station.
pub const DELIVERY_FLAG: i32 = 62;

/// How many of an item a row describes.
///
/// Rows carry either a raw quantity (blueprint originals and copies use
/// the sentinels -1 and -2), a normal stack count, or nothing at all,
/// which means a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantity {
    Raw(i64),
    Normal(i64),
    Default,
}

impl Quantity {
    pub const ORIGINAL: i64 = -1;
    pub const COPY: i64 = -2;

    /// Raw quantity wins over the plain count when both are present.
    pub fn from_fields(raw: Option<i64>, quantity: Option<i64>) -> Self {
        match (raw, quantity) {
            (Some(raw), _) => Quantity::Raw(raw),
            (None, Some(quantity)) => Quantity::Normal(quantity),
            (None, None) => Quantity::Default,
        }
    }

    pub fn value(&self) -> i64 {
        match *self {
            Quantity::Raw(n) | Quantity::Normal(n) => n,
            Quantity::Default => 1,
        }
    }

    /// The number of units, or `None` for the original/copy sentinels,
    /// which must never be summed.
    pub fn count(&self) -> Option<i64> {
        match self.value() {
            Self::ORIGINAL | Self::COPY => None,
            n => Some(n),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Quantity::Raw(_) => "raw",
            Quantity::Normal(_) => "normal",
            Quantity::Default => "default",
        }
    }

    /// Rebuild from the `kind`/`value` pair written by the snapshot store.
    pub fn from_stored(kind: &str, value: i64) -> Option<Self> {
        match kind {
            "raw" => Some(Quantity::Raw(value)),
            "normal" => Some(Quantity::Normal(value)),
            "default" => Some(Quantity::Default),
            _ => None,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Self::ORIGINAL => write!(f, "Original"),
            Self::COPY => write!(f, "Copy"),
            n => write!(f, "x{}", n),
        }
    }
}

/// One asset row as returned by the flat asset list.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetRow {
    #[serde(rename = "itemID")]
    pub item_id: i64,
    #[serde(rename = "typeID")]
    pub type_id: i64,
    #[serde(rename = "locationID")]
    pub location_id: i64,
    pub flag: i32,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default, rename = "rawQuantity")]
    pub raw_quantity: Option<i64>,
}

/// A located item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub item_id: i64,
    pub type_id: i64,
    pub quantity: Quantity,
    pub location_id: i64,
    pub flag: i32,
    name: Option<String>,
    contents: Option<i64>,
}

impl Item {
    pub fn new(item_id: i64, type_id: i64, quantity: Quantity, location_id: i64, flag: i32) -> Self {
        Self {
            item_id,
            type_id,
            quantity,
            location_id,
            flag,
            name: None,
            contents: None,
        }
    }

    pub fn is_office(&self) -> bool {
        self.type_id == OFFICE_TYPE_ID
    }

    /// Office slot number, or hangar slot for items inside an office.
    pub fn slot(&self) -> i32 {
        self.flag - OFFICE_SLOT_FLAG_BASE
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Assign the display name. Only the first assignment sticks.
    pub fn set_name(&mut self, name: String) -> bool {
        if self.name.is_some() {
            return false;
        }
        self.name = Some(name);
        true
    }

    /// Key of the location this item hosts, if it is a container.
    pub fn contents(&self) -> Option<i64> {
        self.contents
    }

    pub(crate) fn link_contents(&mut self) {
        self.contents = Some(self.item_id);
    }
}

impl From<&AssetRow> for Item {
    fn from(row: &AssetRow) -> Self {
        Item::new(
            row.item_id,
            row.type_id,
            Quantity::from_fields(row.raw_quantity, row.quantity),
            row.location_id,
            row.flag,
        )
    }
}
