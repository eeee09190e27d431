// Allow dead code: response structs have fields for completeness
#![allow(dead_code)]

use rust_decimal::Decimal;
use serde::Deserialize;

use super::AssetRow;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyInfo {
    pub key: KeyInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    #[serde(default)]
    pub access_mask: i64,
    #[serde(rename = "type")]
    pub key_type: String,
    /// Empty when the key never expires.
    #[serde(default)]
    pub expires: String,
    #[serde(default)]
    pub characters: Vec<KeyCharacter>,
}

impl KeyInfo {
    pub fn is_corporation_key(&self) -> bool {
        self.key_type == "Corporation"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyCharacter {
    #[serde(rename = "characterID")]
    pub character_id: i64,
    #[serde(rename = "characterName")]
    pub character_name: String,
    #[serde(rename = "corporationID")]
    pub corporation_id: i64,
    #[serde(rename = "corporationName")]
    pub corporation_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorporationSheet {
    #[serde(rename = "corporationID")]
    pub corporation_id: i64,
    #[serde(rename = "corporationName")]
    pub corporation_name: String,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default, rename = "walletDivisions")]
    pub wallet_divisions: Vec<DivisionRow>,
    #[serde(default)]
    pub divisions: Vec<DivisionRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DivisionRow {
    #[serde(rename = "accountKey")]
    pub account_key: i32,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShareHolders {
    #[serde(default)]
    pub characters: Vec<ShareholderRow>,
    #[serde(default)]
    pub corporations: Vec<ShareholderRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShareholderRow {
    #[serde(rename = "shareholderID")]
    pub shareholder_id: i64,
    #[serde(rename = "shareholderName")]
    pub shareholder_name: String,
    pub shares: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountBalance {
    #[serde(default)]
    pub accounts: Vec<AccountRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountRow {
    #[serde(rename = "accountID")]
    pub account_id: i64,
    #[serde(rename = "accountKey")]
    pub account_key: i32,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetList {
    #[serde(default)]
    pub assets: Vec<AssetRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeNames {
    #[serde(default)]
    pub types: Vec<TypeNameRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeNameRow {
    #[serde(rename = "typeID")]
    pub type_id: i64,
    #[serde(rename = "typeName")]
    pub type_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterNames {
    #[serde(default)]
    pub characters: Vec<CharacterNameRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CharacterNameRow {
    #[serde(rename = "characterID")]
    pub character_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationNames {
    #[serde(default)]
    pub locations: Vec<LocationNameRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationNameRow {
    #[serde(rename = "itemID")]
    pub item_id: i64,
    #[serde(rename = "itemName")]
    pub item_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_accepts_string_and_number() {
        let parsed: AccountBalance = serde_json::from_str(
            r#"{"accounts":[
                {"accountID":1,"accountKey":1000,"balance":"1234567.89"},
                {"accountID":2,"accountKey":1001,"balance":10.5}
            ]}"#,
        )
        .unwrap();
        assert_eq!(parsed.accounts[0].balance, Decimal::new(123456789, 2));
        assert_eq!(parsed.accounts[1].balance, Decimal::new(105, 1));
    }

    #[test]
    fn test_key_info_type() {
        let parsed: ApiKeyInfo = serde_json::from_str(
            r#"{"key":{"accessMask":134217727,"type":"Corporation","expires":"","characters":[
                {"characterID":9,"characterName":"Director","corporationID":77,"corporationName":"Widget Works"}
            ]}}"#,
        )
        .unwrap();
        assert!(parsed.key.is_corporation_key());
        assert_eq!(parsed.key.characters[0].corporation_name, "Widget Works");
    }
}
