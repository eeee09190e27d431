use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account key of the first corporation division.
pub const FIRST_DIVISION_KEY: i32 = 1000;

/// Flag of the first office hangar.
pub const FIRST_HANGAR_FLAG: i32 = 4;

/// Hangars two through seven use consecutive flags starting here.
pub const SECOND_HANGAR_FLAG: i32 = 116;

pub const DIVISION_COUNT: i32 = 7;

/// Wallet and hangar of one corporation division.
///
/// Both halves share the account key by convention only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Division {
    pub account_key: i32,
    pub wallet_name: Option<String>,
    pub hangar_name: Option<String>,
    pub balance: Decimal,
}

impl Division {
    pub fn new(account_key: i32) -> Self {
        Self {
            account_key,
            wallet_name: None,
            hangar_name: None,
            balance: Decimal::ZERO,
        }
    }

    pub fn wallet_label(&self) -> String {
        self.wallet_name
            .clone()
            .unwrap_or_else(|| format!("Wallet {}", self.account_key))
    }

    pub fn hangar_label(&self) -> String {
        self.hangar_name
            .clone()
            .unwrap_or_else(|| format!("Hangar {}", self.account_key))
    }
}

/// Division account key owning an office hangar flag.
pub fn division_for_flag(flag: i32) -> Option<i32> {
    let last_hangar = SECOND_HANGAR_FLAG + DIVISION_COUNT - 2;
    match flag {
        FIRST_HANGAR_FLAG => Some(FIRST_DIVISION_KEY),
        f if (SECOND_HANGAR_FLAG..=last_hangar).contains(&f) => {
            Some(FIRST_DIVISION_KEY + 1 + (f - SECOND_HANGAR_FLAG))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shareholder {
    pub name: String,
    pub shares: i64,
}
