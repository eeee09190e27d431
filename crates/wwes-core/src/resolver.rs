//! Batched, memoized identifier-to-name resolution.
//!
//! Names live in three independent tables (types, stations, containers);
//! the same number can mean unrelated things in each. Only identifiers not
//! already known go to the remote side, at most `LOOKUP_CHUNK_SIZE` per call.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use anyhow::Result;
use tracing::debug;

/// Remote limit on identifiers per name lookup.
pub const LOOKUP_CHUNK_SIZE: usize = 250;

/// Pseudo-station ranges resolved through the character name lookup after
/// shifting onto the station range.
const FIRST_REMAP_RANGE: std::ops::Range<i64> = 66_000_000..67_000_000;
const FIRST_REMAP_OFFSET: i64 = 6_000_001;
const SECOND_REMAP_RANGE: std::ops::Range<i64> = 67_000_000..68_000_000;
const SECOND_REMAP_OFFSET: i64 = 6_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Type,
    Station,
    Container,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Type => write!(f, "type"),
            Namespace::Station => write!(f, "station"),
            Namespace::Container => write!(f, "container"),
        }
    }
}

/// Remote side of name resolution: one call per chunk of identifiers.
#[allow(async_fn_in_trait)]
pub trait NameSource {
    async fn lookup(&self, namespace: Namespace, ids: &[i64]) -> Result<Vec<(i64, String)>>;
}

/// Identifier actually sent for a station-namespace lookup.
pub fn station_lookup_id(id: i64) -> i64 {
    if FIRST_REMAP_RANGE.contains(&id) {
        id - FIRST_REMAP_OFFSET
    } else if SECOND_REMAP_RANGE.contains(&id) {
        id - SECOND_REMAP_OFFSET
    } else {
        id
    }
}

#[derive(Debug, Default)]
pub struct Resolver {
    types: HashMap<i64, String>,
    stations: HashMap<i64, String>,
    containers: HashMap<i64, String>,
    remote_calls: usize,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, namespace: Namespace) -> &HashMap<i64, String> {
        match namespace {
            Namespace::Type => &self.types,
            Namespace::Station => &self.stations,
            Namespace::Container => &self.containers,
        }
    }

    fn table_mut(&mut self, namespace: Namespace) -> &mut HashMap<i64, String> {
        match namespace {
            Namespace::Type => &mut self.types,
            Namespace::Station => &mut self.stations,
            Namespace::Container => &mut self.containers,
        }
    }

    /// Pre-load names known without asking, e.g. restored from a snapshot.
    pub fn seed(&mut self, namespace: Namespace, names: impl IntoIterator<Item = (i64, String)>) {
        self.table_mut(namespace).extend(names);
    }

    pub fn name(&self, namespace: Namespace, id: i64) -> Option<&str> {
        self.table(namespace).get(&id).map(String::as_str)
    }

    pub fn is_known(&self, namespace: Namespace, id: i64) -> bool {
        self.table(namespace).contains_key(&id)
    }

    /// Identifiers from `ids` that have no name in `namespace`, sorted.
    pub fn missing(&self, namespace: Namespace, ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
        let table = self.table(namespace);
        ids.into_iter()
            .filter(|id| !table.contains_key(id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of remote lookups performed so far.
    pub fn remote_calls(&self) -> usize {
        self.remote_calls
    }

    /// Make sure every identifier in `ids` has a name in `namespace`,
    /// asking `source` only for the unknown ones. Returns the names of the
    /// requested identifiers that are now known.
    pub async fn resolve<S: NameSource>(
        &mut self,
        source: &S,
        namespace: Namespace,
        ids: impl IntoIterator<Item = i64>,
    ) -> Result<HashMap<i64, String>> {
        let requested: BTreeSet<i64> = ids.into_iter().collect();

        // lookup id -> original ids it answers for
        let mut pending: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for &id in requested.iter().filter(|id| !self.is_known(namespace, **id)) {
            let lookup_id = match namespace {
                Namespace::Station => station_lookup_id(id),
                _ => id,
            };
            pending.entry(lookup_id).or_default().push(id);
        }

        let lookup_ids: Vec<i64> = pending.keys().copied().collect();
        for chunk in lookup_ids.chunks(LOOKUP_CHUNK_SIZE) {
            debug!(namespace = %namespace, count = chunk.len(), "resolving names");
            self.remote_calls += 1;
            let names = source.lookup(namespace, chunk).await?;
            let table = self.table_mut(namespace);
            for (lookup_id, name) in names {
                if let Some(originals) = pending.get(&lookup_id) {
                    for &original in originals {
                        table.insert(original, name.clone());
                    }
                }
            }
        }

        let table = self.table(namespace);
        Ok(requested
            .into_iter()
            .filter_map(|id| table.get(&id).map(|name| (id, name.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeNames;

    #[tokio::test]
    async fn test_known_identifier_is_not_looked_up_again() {
        let source = FakeNames::default();
        let mut resolver = Resolver::new();

        resolver.resolve(&source, Namespace::Type, [654]).await.unwrap();
        resolver.resolve(&source, Namespace::Type, [654]).await.unwrap();

        assert_eq!(source.calls().len(), 1);
        assert_eq!(resolver.remote_calls(), 1);
        assert_eq!(resolver.name(Namespace::Type, 654), Some("type 654"));
    }

    #[tokio::test]
    async fn test_overlapping_sets_only_fetch_new_ids() {
        let source = FakeNames::default();
        let mut resolver = Resolver::new();

        resolver.resolve(&source, Namespace::Type, [1, 2, 3]).await.unwrap();
        let names = resolver.resolve(&source, Namespace::Type, [2, 3, 4]).await.unwrap();

        let calls = source.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1, vec![4]);
        assert_eq!(names.len(), 3);
    }

    #[tokio::test]
    async fn test_lookups_are_chunked_at_limit() {
        let source = FakeNames::default();
        let mut resolver = Resolver::new();

        let names = resolver
            .resolve(&source, Namespace::Type, 1..=600)
            .await
            .unwrap();

        let sizes: Vec<usize> = source.calls().iter().map(|(_, ids)| ids.len()).collect();
        assert_eq!(sizes, vec![250, 250, 100]);
        assert_eq!(names.len(), 600);
    }

    #[tokio::test]
    async fn test_station_range_remap() {
        let source = FakeNames::default();
        let mut resolver = Resolver::new();

        resolver
            .resolve(&source, Namespace::Station, [66_000_050])
            .await
            .unwrap();

        assert_eq!(source.calls()[0].1, vec![60_000_049]);
        assert_eq!(
            resolver.name(Namespace::Station, 66_000_050),
            Some("station 60000049")
        );
        assert!(!resolver.is_known(Namespace::Station, 60_000_049));
    }

    #[test]
    fn test_station_lookup_id_ranges() {
        assert_eq!(station_lookup_id(66_000_000), 59_999_999);
        assert_eq!(station_lookup_id(66_999_999), 60_999_998);
        assert_eq!(station_lookup_id(67_000_010), 61_000_010);
        assert_eq!(station_lookup_id(60_003_760), 60_003_760);
        assert_eq!(station_lookup_id(68_000_000), 68_000_000);
    }

    #[tokio::test]
    async fn test_remap_only_applies_to_stations() {
        let source = FakeNames::default();
        let mut resolver = Resolver::new();

        resolver
            .resolve(&source, Namespace::Container, [66_000_050])
            .await
            .unwrap();

        assert_eq!(source.calls()[0].1, vec![66_000_050]);
    }

    #[tokio::test]
    async fn test_namespaces_are_independent() {
        let source = FakeNames::default();
        let mut resolver = Resolver::new();

        resolver.resolve(&source, Namespace::Type, [42]).await.unwrap();
        resolver.resolve(&source, Namespace::Container, [42]).await.unwrap();

        assert_eq!(source.calls().len(), 2);
        assert_eq!(resolver.name(Namespace::Type, 42), Some("type 42"));
        assert_eq!(resolver.name(Namespace::Container, 42), Some("container 42"));
        assert!(!resolver.is_known(Namespace::Station, 42));
    }

    #[tokio::test]
    async fn test_seeded_names_skip_lookup() {
        let source = FakeNames::default();
        let mut resolver = Resolver::new();
        resolver.seed(Namespace::Type, [(27, "Office".to_string())]);

        let names = resolver.resolve(&source, Namespace::Type, [27]).await.unwrap();

        assert!(source.calls().is_empty());
        assert_eq!(names.get(&27).map(String::as_str), Some("Office"));
    }

    #[tokio::test]
    async fn test_unanswered_ids_are_reported_missing() {
        let source = FakeNames::default().without(5);
        let mut resolver = Resolver::new();

        let names = resolver.resolve(&source, Namespace::Type, [4, 5]).await.unwrap();

        assert!(!names.contains_key(&5));
        assert_eq!(resolver.missing(Namespace::Type, [4, 5]), vec![5]);
    }
}
