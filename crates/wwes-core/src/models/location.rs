use std::collections::BTreeMap;

/// A place items sit in: a station or outpost, or an item (office or
/// container) that hosts other items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: i64,
    item: Option<i64>,
    sublocations: BTreeMap<i32, Vec<i64>>,
    name: Option<String>,
}

impl Location {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            item: None,
            sublocations: BTreeMap::new(),
            name: None,
        }
    }

    /// The item this location is, if any. `None` for stations.
    pub fn item(&self) -> Option<i64> {
        self.item
    }

    /// Link the hosting item. The first link is permanent.
    pub(crate) fn link_item(&mut self, item_id: i64) -> bool {
        if self.item.is_some() {
            return false;
        }
        self.item = Some(item_id);
        true
    }

    pub(crate) fn push(&mut self, flag: i32, item_id: i64) {
        self.sublocations.entry(flag).or_default().push(item_id);
    }

    /// Contents by compartment flag, in arrival order within each flag.
    pub fn sublocations(&self) -> &BTreeMap<i32, Vec<i64>> {
        &self.sublocations
    }

    pub fn items_at(&self, flag: i32) -> &[i64] {
        self.sublocations.get(&flag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn item_count(&self) -> usize {
        self.sublocations.values().map(Vec::len).sum()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}
