//! One fetch cycle of corporation state.
//!
//! Each configured key pair is tried in order until one is accepted as a
//! corporation key; the wallets, share register and asset tree are then
//! fetched and every asset is named.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, EveApi, Transport};
use crate::assets::AssetTree;
use crate::auth::KeyPair;
use crate::models::{Division, Shareholder};
use crate::resolver::Resolver;

/// Timestamp format of key expiry dates.
const KEY_EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("No working key pair found")]
    NoWorkingKey,
}

/// Corporation state at one point in time.
#[derive(Debug, Clone)]
pub struct CorpSnapshot {
    pub name: String,
    pub fetched_at: DateTime<Utc>,
    pub divisions: BTreeMap<i32, Division>,
    pub shareholders: Vec<Shareholder>,
    pub shares: i64,
    pub balance: Decimal,
    pub assets: AssetTree,
}

impl CorpSnapshot {
    pub fn new(name: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            fetched_at,
            divisions: BTreeMap::new(),
            shareholders: Vec::new(),
            shares: 0,
            balance: Decimal::ZERO,
            assets: AssetTree::default(),
        }
    }

    /// Wallet total divided over all shares; `None` without shareholders.
    pub fn per_share(&self) -> Option<Decimal> {
        if self.shares == 0 {
            return None;
        }
        self.balance.checked_div(Decimal::from(self.shares))
    }

    fn division(&mut self, account_key: i32) -> &mut Division {
        self.divisions
            .entry(account_key)
            .or_insert_with(|| Division::new(account_key))
    }
}

/// Whether `err` means the current key pair should be skipped.
pub fn is_credential_failure(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_credential_failure)
}

/// Try each key pair in turn. Credential failures move on to the next
/// pair; any other failure aborts the run.
pub async fn fetch_with_keys<T: Transport>(
    api: &mut EveApi<T>,
    resolver: &mut Resolver,
    keys: &[KeyPair],
) -> Result<CorpSnapshot> {
    for key in keys {
        info!(key_id = key.key_id, "Trying key pair");
        api.set_key(key.clone());
        match fetch(api, resolver).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(e) if is_credential_failure(&e) => {
                warn!(key_id = key.key_id, error = %e, "Key pair rejected, trying next");
            }
            Err(e) => return Err(e),
        }
    }
    Err(FetchError::NoWorkingKey.into())
}

/// Fetch everything with the key pair currently set on `api`.
pub async fn fetch<T: Transport>(api: &EveApi<T>, resolver: &mut Resolver) -> Result<CorpSnapshot> {
    let key = api.api_key_info().await?.key;
    if !key.is_corporation_key() {
        return Err(ApiError::AuthFailure(format!("{} key is not a corporation key", key.key_type)).into());
    }
    if key_expired(&key.expires, Utc::now())? {
        return Err(ApiError::AuthFailure(format!("key expired {}", key.expires)).into());
    }
    let name = key
        .characters
        .first()
        .map(|c| c.corporation_name.clone())
        .ok_or_else(|| ApiError::InvalidResponse("key has no characters".to_string()))?;

    let mut snapshot = CorpSnapshot::new(name, Utc::now());
    info!(corporation = %snapshot.name, "Fetching corporation state");

    let sheet = api.corporation_sheet().await?;
    for wallet in sheet.wallet_divisions {
        snapshot.division(wallet.account_key).wallet_name = Some(wallet.description);
    }
    for hangar in sheet.divisions {
        snapshot.division(hangar.account_key).hangar_name = Some(hangar.description);
    }

    let holders = api.shareholders().await?;
    for holder in holders.characters.into_iter().chain(holders.corporations) {
        snapshot.shares += holder.shares;
        snapshot.shareholders.push(Shareholder {
            name: holder.shareholder_name,
            shares: holder.shares,
        });
    }

    for account in api.account_balance().await?.accounts {
        snapshot.division(account.account_key).balance = account.balance;
        snapshot.balance += account.balance;
    }

    let rows = api.asset_list().await?.assets;
    let mut assets = AssetTree::from_rows(&rows);
    assets
        .resolve_names(resolver, api)
        .await
        .context("Failed to name assets")?;
    snapshot.assets = assets;

    for office in snapshot.assets.offices() {
        info!(office = office.name().unwrap_or_default(), "Got office");
    }

    Ok(snapshot)
}

/// Empty expiry means the key never expires.
fn key_expired(expires: &str, now: DateTime<Utc>) -> Result<bool> {
    let expires = expires.trim();
    if expires.is_empty() {
        return Ok(false);
    }
    let at = NaiveDateTime::parse_from_str(expires, KEY_EXPIRY_FORMAT)
        .with_context(|| format!("Invalid key expiry: {}", expires))?
        .and_utc();
    Ok(at <= now)
}
