use std::collections::BTreeMap;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AssetRow, Item, Location, DELIVERY_FLAG};
use crate::resolver::{NameSource, Namespace, Resolver};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Could not resolve {namespace} names for {ids:?}")]
    ResolutionGap { namespace: Namespace, ids: Vec<i64> },
}

/// How a location gets its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocationKind {
    /// Hosted by an office item sitting in `station` at `slot`.
    Office { station: i64, slot: i32 },
    /// Hosted by any other item.
    Container,
    /// A station or outpost, not an item.
    Ground,
}

/// All items of one fetch and the locations they sit in.
#[derive(Debug, Default, Clone)]
pub struct AssetTree {
    items: BTreeMap<i64, Item>,
    locations: BTreeMap<i64, Location>,
}

impl AssetTree {
    pub fn from_rows(rows: &[AssetRow]) -> Self {
        Self::build(rows.iter().map(Item::from))
    }

    /// Build the location map from a flat item list.
    ///
    /// The first pass files every item under its host location; the second
    /// links each location whose key is an item's id to that item, in both
    /// directions. Input order does not affect the result.
    pub fn build(items: impl IntoIterator<Item = Item>) -> Self {
        let mut tree = Self::default();

        for item in items {
            if tree.items.contains_key(&item.item_id) {
                warn!(item_id = item.item_id, "Duplicate item in asset list, keeping first");
                continue;
            }
            tree.locations
                .entry(item.location_id)
                .or_insert_with(|| Location::new(item.location_id))
                .push(item.flag, item.item_id);
            tree.items.insert(item.item_id, item);
        }

        for (id, location) in tree.locations.iter_mut() {
            if let Some(item) = tree.items.get_mut(id) {
                location.link_item(*id);
                item.link_contents();
            }
        }

        debug!(
            items = tree.items.len(),
            locations = tree.locations.len(),
            "built asset tree"
        );
        tree
    }

    pub fn item(&self, item_id: i64) -> Option<&Item> {
        self.items.get(&item_id)
    }

    pub fn location(&self, location_id: i64) -> Option<&Location> {
        self.locations.get(&location_id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The item a location is, if it is one.
    pub fn location_item(&self, location: &Location) -> Option<&Item> {
        location.item().and_then(|id| self.items.get(&id))
    }

    /// The location an item hosts, if it is a container.
    pub fn contents(&self, item: &Item) -> Option<&Location> {
        item.contents().and_then(|id| self.locations.get(&id))
    }

    /// Locations that are not items themselves: stations and outposts.
    pub fn ground_locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values().filter(|l| l.item().is_none())
    }

    /// Locations hosted by office items.
    pub fn offices(&self) -> impl Iterator<Item = &Location> {
        self.locations
            .values()
            .filter(|l| self.location_item(l).is_some_and(Item::is_office))
    }

    /// Ground locations holding a delivery bucket.
    pub fn deliveries(&self) -> impl Iterator<Item = &Location> {
        self.ground_locations()
            .filter(|l| !l.items_at(DELIVERY_FLAG).is_empty())
    }

    /// Put back a location name read from a stored snapshot.
    pub(crate) fn restore_location_name(&mut self, location_id: i64, name: String) {
        if let Some(location) = self.locations.get_mut(&location_id) {
            location.set_name(name);
        }
    }

    fn kind(&self, location: &Location) -> LocationKind {
        match self.location_item(location) {
            Some(item) if item.is_office() => LocationKind::Office {
                station: item.location_id,
                slot: item.slot(),
            },
            Some(_) => LocationKind::Container,
            None => LocationKind::Ground,
        }
    }

    /// Resolve type, station and container names and label every location
    /// and item. Fails with `AssetError::ResolutionGap` if any identifier is
    /// left without a name.
    pub async fn resolve_names<S: NameSource>(
        &mut self,
        resolver: &mut Resolver,
        source: &S,
    ) -> Result<()> {
        let type_ids: Vec<i64> = self.items.values().map(|i| i.type_id).collect();
        resolver.resolve(source, Namespace::Type, type_ids.iter().copied()).await?;

        let kinds: Vec<(i64, LocationKind)> = self
            .locations
            .values()
            .map(|l| (l.id, self.kind(l)))
            .collect();

        let mut stations = Vec::new();
        let mut containers = Vec::new();
        for &(id, kind) in &kinds {
            match kind {
                LocationKind::Office { station, .. } => stations.push(station),
                LocationKind::Container => containers.push(id),
                LocationKind::Ground => stations.push(id),
            }
        }

        resolver.resolve(source, Namespace::Station, stations.iter().copied()).await?;
        resolver.resolve(source, Namespace::Container, containers.iter().copied()).await?;

        for (namespace, ids) in [
            (Namespace::Type, type_ids),
            (Namespace::Station, stations),
            (Namespace::Container, containers),
        ] {
            let missing = resolver.missing(namespace, ids);
            if !missing.is_empty() {
                return Err(AssetError::ResolutionGap {
                    namespace,
                    ids: missing,
                }
                .into());
            }
        }

        for (id, kind) in kinds {
            let name = match kind {
                LocationKind::Office { station, slot } => {
                    format!("Office {} slot {}", station_name(resolver, station), slot)
                }
                LocationKind::Container => container_name(resolver, id),
                LocationKind::Ground => station_name(resolver, id),
            };

            let Some(location) = self.locations.get_mut(&id) else {
                continue;
            };
            location.set_name(name.clone());

            let contained: Vec<i64> = location.sublocations().values().flatten().copied().collect();
            for item_id in contained {
                if let Some(item) = self.items.get_mut(&item_id) {
                    let label = match kind {
                        LocationKind::Office { .. } => format!("Slot {}", item.slot()),
                        LocationKind::Container | LocationKind::Ground => name.clone(),
                    };
                    item.set_name(label);
                }
            }
        }

        Ok(())
    }
}

fn station_name(resolver: &Resolver, id: i64) -> String {
    resolver
        .name(Namespace::Station, id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Location {}", id))
}

fn container_name(resolver: &Resolver, id: i64) -> String {
    resolver
        .name(Namespace::Container, id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Container {}", id))
}
