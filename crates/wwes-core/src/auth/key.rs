use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CredentialStore;

/// A key ID and verification code granting access to corporation data.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub key_id: i64,
    pub v_code: String,
}

impl KeyPair {
    pub fn new(key_id: i64, v_code: impl Into<String>) -> Self {
        Self {
            key_id,
            v_code: v_code.into(),
        }
    }
}

// Never print the verification code
impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_id", &self.key_id)
            .field("v_code", &"<redacted>")
            .finish()
    }
}

/// One key file line: `keyID:vCode`, or a bare key ID whose code lives in
/// the keychain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLine {
    Pair(KeyPair),
    KeyIdOnly(i64),
}

impl KeyLine {
    pub fn into_pair(self) -> Result<KeyPair> {
        match self {
            KeyLine::Pair(pair) => Ok(pair),
            KeyLine::KeyIdOnly(key_id) => {
                debug!(key_id, "Looking up verification code in keychain");
                Ok(KeyPair::new(key_id, CredentialStore::get_v_code(key_id)?))
            }
        }
    }
}

impl FromStr for KeyLine {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.splitn(2, ':').map(str::trim);
        let key_id: i64 = parts
            .next()
            .unwrap_or_default()
            .parse()
            .with_context(|| format!("Invalid key ID in line: {}", line))?;
        match parts.next() {
            Some(v_code) if !v_code.is_empty() => Ok(KeyLine::Pair(KeyPair::new(key_id, v_code))),
            _ => Ok(KeyLine::KeyIdOnly(key_id)),
        }
    }
}

/// Parse a key file. Blank lines and `#` comments are skipped.
pub fn parse_key_file(contents: &str) -> Result<Vec<KeyLine>> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_file() {
        let lines = parse_key_file(
            "# director key\n 123 : abcDEF \n\n456\n#789:zzz\n",
        )
        .unwrap();
        assert_eq!(
            lines,
            vec![
                KeyLine::Pair(KeyPair::new(123, "abcDEF")),
                KeyLine::KeyIdOnly(456),
            ]
        );
    }

    #[test]
    fn test_invalid_key_id_is_rejected() {
        assert!(parse_key_file("abc:def").is_err());
    }

    #[test]
    fn test_debug_redacts_code() {
        let pair = KeyPair::new(1, "secret");
        assert!(!format!("{:?}", pair).contains("secret"));
    }
}
