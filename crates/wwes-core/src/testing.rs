//! Test doubles shared by unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::Result;
use chrono::Duration;

use crate::api::{ApiError, ApiRequest, ApiResponse, Transport};
use crate::resolver::{NameSource, Namespace};

/// Name source answering `"<namespace> <id>"` and recording every call.
#[derive(Default)]
pub struct FakeNames {
    calls: Mutex<Vec<(Namespace, Vec<i64>)>>,
    unknown: HashSet<i64>,
}

impl FakeNames {
    /// Never answer for `id`.
    pub fn without(mut self, id: i64) -> Self {
        self.unknown.insert(id);
        self
    }

    pub fn calls(&self) -> Vec<(Namespace, Vec<i64>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl NameSource for FakeNames {
    async fn lookup(&self, namespace: Namespace, ids: &[i64]) -> Result<Vec<(i64, String)>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((namespace, ids.to_vec()));
        }
        Ok(ids
            .iter()
            .filter(|id| !self.unknown.contains(id))
            .map(|&id| (id, format!("{} {}", namespace, id)))
            .collect())
    }
}

/// In-process remote serving a small corporation: one office in a station
/// holding one item. Key ID 99 is always rejected.
pub struct FakeRemote {
    key_type: String,
    failing_path: Option<String>,
}

impl FakeRemote {
    pub const REJECTED_KEY_ID: &'static str = "99";

    pub fn corporation() -> Self {
        Self {
            key_type: "Corporation".to_string(),
            failing_path: None,
        }
    }

    pub fn with_key_type(mut self, key_type: &str) -> Self {
        self.key_type = key_type.to_string();
        self
    }

    /// Answer `path` with a server error.
    pub fn failing(mut self, path: &str) -> Self {
        self.failing_path = Some(path.to_string());
        self
    }

    fn document(result: &str) -> ApiResponse {
        ApiResponse {
            body: format!(
                r#"{{"currentTime":"2013-05-01 12:00:00","cachedUntil":"2013-05-01 13:00:00","result":{}}}"#,
                result
            ),
            cached_for: Duration::hours(1),
        }
    }

    fn requested_ids(request: &ApiRequest) -> Vec<i64> {
        request
            .params
            .get("ids")
            .or_else(|| request.params.get("IDs"))
            .map(|ids| ids.split(',').filter_map(|id| id.parse().ok()).collect())
            .unwrap_or_default()
    }

    fn rows(ids: &[i64], render: impl Fn(i64) -> Option<String>) -> String {
        ids.iter()
            .filter_map(|&id| render(id))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Transport for FakeRemote {
    async fn fetch(&self, request: &ApiRequest) -> Result<ApiResponse> {
        if self.failing_path.as_deref() == Some(request.path.as_str()) {
            return Err(ApiError::ServerError("boom".to_string()).into());
        }
        if request.params.get("keyID").map(String::as_str) == Some(Self::REJECTED_KEY_ID) {
            return Err(ApiError::from_remote(203, "Authentication failure.").into());
        }

        let ids = Self::requested_ids(request);
        let result = match request.path.as_str() {
            "/account/APIKeyInfo" => format!(
                r#"{{"key":{{"accessMask":134217727,"type":"{}","expires":"","characters":[
                    {{"characterID":9,"characterName":"Director","corporationID":77,"corporationName":"Widget Works"}}]}}}}"#,
                self.key_type
            ),
            "/corp/CorporationSheet" => r#"{"corporationID":77,"corporationName":"Widget Works",
                "walletDivisions":[{"accountKey":1000,"description":"Master Wallet"},{"accountKey":1001,"description":"Reserve"}],
                "divisions":[{"accountKey":1000,"description":"Corp Hangar"},{"accountKey":1001,"description":"Minerals"}]}"#
                .to_string(),
            "/corp/ShareHolders" => r#"{"characters":[{"shareholderID":9,"shareholderName":"Director","shares":900}],
                "corporations":[{"shareholderID":77,"shareholderName":"Widget Works","shares":100}]}"#
                .to_string(),
            "/corp/AccountBalance" => r#"{"accounts":[
                {"accountID":1,"accountKey":1000,"balance":"1000000.00"},
                {"accountID":2,"accountKey":1001,"balance":"500000.50"}]}"#
                .to_string(),
            "/corp/AssetList" => r#"{"assets":[
                {"itemID":2,"typeID":27,"locationID":60003760,"flag":70,"quantity":1},
                {"itemID":3,"typeID":654,"locationID":2,"flag":4,"rawQuantity":-1}]}"#
                .to_string(),
            "/eve/TypeName" => format!(
                r#"{{"types":[{}]}}"#,
                Self::rows(&ids, |id| {
                    let name = match id {
                        27 => "Office",
                        654 => "Iteron Mark II",
                        _ => return None,
                    };
                    Some(format!(r#"{{"typeID":{},"typeName":"{}"}}"#, id, name))
                })
            ),
            "/eve/CharacterName" => format!(
                r#"{{"characters":[{}]}}"#,
                Self::rows(&ids, |id| {
                    (id == 60_003_760)
                        .then(|| format!(r#"{{"characterID":{},"name":"Jita IV - Moon 4"}}"#, id))
                })
            ),
            "/corp/Locations" => format!(
                r#"{{"locations":[{}]}}"#,
                Self::rows(&ids, |id| {
                    Some(format!(r#"{{"itemID":{},"itemName":"Container {}"}}"#, id, id))
                })
            ),
            other => return Err(ApiError::NotFound(other.to_string()).into()),
        };
        Ok(Self::document(&result))
    }
}
