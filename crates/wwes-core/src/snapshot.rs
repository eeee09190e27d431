//! Snapshot persistence.
//!
//! Each fetch is written to its own SQLite file under
//! `<snapshot dir>/<corporation>/<unix seconds>.sqlite`. The most recent
//! snapshot is the file whose name sorts last, which holds until unix time
//! gains an eleventh digit.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::assets::AssetTree;
use crate::corp::CorpSnapshot;
use crate::models::{Division, Item, Quantity};
use crate::resolver::{Namespace, Resolver};
use crate::utils::sanitize_file_name;

const APP_NAME: &str = "wwes";

const SNAPSHOT_EXTENSION: &str = "sqlite";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS summary (
    corp_name TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    balance TEXT NOT NULL,
    shares INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS divisions (
    account_key INTEGER PRIMARY KEY,
    wallet_name TEXT,
    hangar_name TEXT,
    balance TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS items (
    item_id INTEGER PRIMARY KEY,
    type_id INTEGER NOT NULL,
    type_name TEXT,
    quantity_kind TEXT NOT NULL,
    quantity INTEGER NOT NULL,
    location_id INTEGER NOT NULL,
    flag INTEGER NOT NULL,
    name TEXT
);
CREATE TABLE IF NOT EXISTS locations (
    location_id INTEGER PRIMARY KEY,
    name TEXT
);
";

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSummary {
    pub corp_name: String,
    pub fetched_at: DateTime<Utc>,
    pub balance: Decimal,
    pub shares: i64,
}

/// A snapshot read back from disk.
#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    pub path: PathBuf,
    pub summary: SnapshotSummary,
    pub divisions: Vec<Division>,
    pub items: Vec<Item>,
    pub type_names: HashMap<i64, String>,
    pub location_names: HashMap<i64, String>,
}

impl StoredSnapshot {
    /// Rebuild the in-memory state, with a resolver holding the stored
    /// type names.
    pub fn restore(self) -> (CorpSnapshot, Resolver) {
        let mut snapshot = CorpSnapshot::new(self.summary.corp_name, self.summary.fetched_at);
        snapshot.balance = self.summary.balance;
        snapshot.shares = self.summary.shares;
        snapshot.divisions = self
            .divisions
            .into_iter()
            .map(|d| (d.account_key, d))
            .collect();

        let mut assets = AssetTree::build(self.items);
        for (id, name) in self.location_names {
            assets.restore_location_name(id, name);
        }
        snapshot.assets = assets;

        let mut resolver = Resolver::new();
        resolver.seed(Namespace::Type, self.type_names);
        (snapshot, resolver)
    }
}

pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// `<data dir>/wwes`
    pub fn default_root() -> Result<PathBuf> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    fn corp_dir(&self, corp_name: &str) -> PathBuf {
        self.root.join(sanitize_file_name(corp_name))
    }

    pub fn save(&self, snapshot: &CorpSnapshot, resolver: &Resolver) -> Result<PathBuf> {
        let dir = self.corp_dir(&snapshot.name);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!(
            "{}.{}",
            snapshot.fetched_at.timestamp(),
            SNAPSHOT_EXTENSION
        ));

        let mut conn = Connection::open(&path)
            .with_context(|| format!("Failed to create snapshot {}", path.display()))?;
        conn.execute_batch(SCHEMA)
            .context("Failed to create snapshot schema")?;

        // A save within the same second reuses the file; replace its rows.
        let tx = conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM summary; DELETE FROM divisions; DELETE FROM items; DELETE FROM locations;",
        )
        .context("Failed to clear previous snapshot rows")?;
        tx.execute(
            "INSERT INTO summary (corp_name, fetched_at, balance, shares) VALUES (?1, ?2, ?3, ?4)",
            params![
                snapshot.name,
                snapshot.fetched_at.to_rfc3339(),
                snapshot.balance.to_string(),
                snapshot.shares
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO divisions (account_key, wallet_name, hangar_name, balance)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for division in snapshot.divisions.values() {
                stmt.execute(params![
                    division.account_key,
                    division.wallet_name,
                    division.hangar_name,
                    division.balance.to_string()
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO items (item_id, type_id, type_name, quantity_kind, quantity,
                                    location_id, flag, name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for item in snapshot.assets.items() {
                stmt.execute(params![
                    item.item_id,
                    item.type_id,
                    resolver.name(Namespace::Type, item.type_id),
                    item.quantity.kind(),
                    item.quantity.value(),
                    item.location_id,
                    item.flag,
                    item.name()
                ])?;
            }

            let mut stmt =
                tx.prepare("INSERT INTO locations (location_id, name) VALUES (?1, ?2)")?;
            for location in snapshot.assets.locations() {
                stmt.execute(params![location.id, location.name()])?;
            }
        }
        tx.commit()?;

        info!(path = %path.display(), "Saved snapshot");
        Ok(path)
    }

    /// Load the most recent snapshot of `corp_name`, if there is one.
    pub fn load_latest(&self, corp_name: &str) -> Result<Option<StoredSnapshot>> {
        let dir = self.corp_dir(corp_name);
        if !dir.exists() {
            debug!(dir = %dir.display(), "No snapshots yet");
            return Ok(None);
        }

        let mut latest: Option<(String, PathBuf)> = None;
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if latest.as_ref().map_or(true, |(best, _)| name > *best) {
                latest = Some((name, path));
            }
        }

        match latest {
            Some((_, path)) => Self::load(&path).map(Some),
            None => Ok(None),
        }
    }

    pub fn load(path: &Path) -> Result<StoredSnapshot> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open snapshot {}", path.display()))?;

        let summary = conn
            .query_row(
                "SELECT corp_name, fetched_at, balance, shares FROM summary LIMIT 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .context("Snapshot has no summary")?;
        let summary = SnapshotSummary {
            corp_name: summary.0,
            fetched_at: DateTime::parse_from_rfc3339(&summary.1)
                .context("Invalid snapshot timestamp")?
                .with_timezone(&Utc),
            balance: parse_decimal(&summary.2)?,
            shares: summary.3,
        };

        let mut stmt = conn.prepare(
            "SELECT account_key, wallet_name, hangar_name, balance FROM divisions ORDER BY account_key",
        )?;
        let divisions = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i32>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .map(|row| -> Result<Division> {
                let (account_key, wallet_name, hangar_name, balance) = row?;
                Ok(Division {
                    account_key,
                    wallet_name,
                    hangar_name,
                    balance: parse_decimal(&balance)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut type_names = HashMap::new();
        let mut stmt = conn.prepare(
            "SELECT item_id, type_id, type_name, quantity_kind, quantity, location_id, flag, name
             FROM items ORDER BY item_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i32>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;
        let mut items = Vec::new();
        for row in rows {
            let (item_id, type_id, type_name, kind, value, location_id, flag, name) = row?;
            let quantity = Quantity::from_stored(&kind, value)
                .ok_or_else(|| anyhow!("Unknown quantity kind {} for item {}", kind, item_id))?;
            let mut item = Item::new(item_id, type_id, quantity, location_id, flag);
            if let Some(name) = name {
                item.set_name(name);
            }
            if let Some(type_name) = type_name {
                type_names.insert(type_id, type_name);
            }
            items.push(item);
        }

        let mut stmt = conn.prepare("SELECT location_id, name FROM locations")?;
        let location_names = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .filter_map(|row| match row {
                Ok((id, Some(name))) => Some(Ok((id, name))),
                Ok((_, None)) => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;

        debug!(path = %path.display(), items = items.len(), "Loaded snapshot");
        Ok(StoredSnapshot {
            path: path.to_path_buf(),
            summary,
            divisions,
            items,
            type_names,
            location_names,
        })
    }
}

fn parse_decimal(value: &str) -> Result<Decimal> {
    Decimal::from_str(value).with_context(|| format!("Invalid amount in snapshot: {}", value))
}
