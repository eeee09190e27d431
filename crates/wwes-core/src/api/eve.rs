//! Typed remote calls routed through the response cache.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::auth::KeyPair;
use crate::cache::ResponseCache;
use crate::models::{
    AccountBalance, ApiKeyInfo, AssetList, CharacterNames, CorporationSheet, LocationNames,
    ShareHolders, TypeNames,
};
use crate::resolver::{NameSource, Namespace};

use super::{parse_result, ApiRequest, Transport};

/// Default remote API host.
pub const DEFAULT_API_HOST: &str = "https://api.eveonline.com";

/// The remote API as seen by the rest of the crate: every call checks the
/// cache first and stores what the server sends back.
pub struct EveApi<T> {
    transport: T,
    host: String,
    cache: Mutex<ResponseCache>,
    key: Option<KeyPair>,
}

impl<T: Transport> EveApi<T> {
    pub fn new(transport: T, host: impl Into<String>, cache: ResponseCache) -> Self {
        Self {
            transport,
            host: host.into(),
            cache: Mutex::new(cache),
            key: None,
        }
    }

    /// Use `key` for authenticated calls from now on.
    pub fn set_key(&mut self, key: KeyPair) {
        self.key = Some(key);
    }

    pub fn key(&self) -> Option<&KeyPair> {
        self.key.as_ref()
    }

    fn cache(&self) -> Result<MutexGuard<'_, ResponseCache>> {
        self.cache
            .lock()
            .map_err(|_| anyhow!("Response cache lock poisoned"))
    }

    fn request(&self, path: &str, authenticated: bool) -> Result<ApiRequest> {
        let request = ApiRequest::new(self.host.as_str(), path);
        if !authenticated {
            return Ok(request);
        }
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| anyhow!("No key pair set for {}", path))?;
        Ok(request
            .param("keyID", key.key_id)
            .param("vCode", &key.v_code))
    }

    async fn call<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        let cached = self.cache()?.retrieve(&request);
        if let Some(body) = cached {
            return parse_result(&body)
                .with_context(|| format!("Failed to parse cached {}", request.path));
        }

        let response = self.transport.fetch(&request).await?;
        if let Err(e) = self
            .cache()?
            .store(&request, &response.body, response.cached_for)
        {
            warn!(path = %request.path, error = %e, "Failed to cache response");
        }
        parse_result(&response.body).with_context(|| format!("Failed to parse {}", request.path))
    }

    pub async fn api_key_info(&self) -> Result<ApiKeyInfo> {
        self.call(self.request("/account/APIKeyInfo", true)?).await
    }

    pub async fn corporation_sheet(&self) -> Result<CorporationSheet> {
        self.call(self.request("/corp/CorporationSheet", true)?).await
    }

    pub async fn shareholders(&self) -> Result<ShareHolders> {
        self.call(self.request("/corp/ShareHolders", true)?).await
    }

    pub async fn account_balance(&self) -> Result<AccountBalance> {
        self.call(self.request("/corp/AccountBalance", true)?).await
    }

    pub async fn asset_list(&self) -> Result<AssetList> {
        let request = self.request("/corp/AssetList", true)?.param("flat", 1);
        self.call(request).await
    }

    pub async fn type_name(&self, ids: &[i64]) -> Result<TypeNames> {
        let request = self.request("/eve/TypeName", false)?.param("ids", join_ids(ids));
        self.call(request).await
    }

    pub async fn character_name(&self, ids: &[i64]) -> Result<CharacterNames> {
        let request = self
            .request("/eve/CharacterName", false)?
            .param("IDs", join_ids(ids));
        self.call(request).await
    }

    pub async fn locations(&self, ids: &[i64]) -> Result<LocationNames> {
        let request = self.request("/corp/Locations", true)?.param("IDs", join_ids(ids));
        self.call(request).await
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl<T: Transport> NameSource for EveApi<T> {
    async fn lookup(&self, namespace: Namespace, ids: &[i64]) -> Result<Vec<(i64, String)>> {
        Ok(match namespace {
            Namespace::Type => self
                .type_name(ids)
                .await?
                .types
                .into_iter()
                .map(|t| (t.type_id, t.type_name))
                .collect(),
            // Stations share the character name lookup
            Namespace::Station => self
                .character_name(ids)
                .await?
                .characters
                .into_iter()
                .map(|c| (c.character_id, c.name))
                .collect(),
            Namespace::Container => self
                .locations(ids)
                .await?
                .locations
                .into_iter()
                .map(|l| (l.item_id, l.item_name))
                .collect(),
        })
    }
}
