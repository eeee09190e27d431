use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "wwes";

/// Verification codes kept in the OS keychain, one entry per key ID.
pub struct CredentialStore;

impl CredentialStore {
    fn entry(key_id: i64) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &key_id.to_string()).context("Failed to create keyring entry")
    }

    /// Store the verification code for a key ID
    pub fn store(key_id: i64, v_code: &str) -> Result<()> {
        Self::entry(key_id)?
            .set_password(v_code)
            .context("Failed to store verification code in keychain")?;
        Ok(())
    }

    /// Retrieve the verification code for a key ID
    pub fn get_v_code(key_id: i64) -> Result<String> {
        Self::entry(key_id)?
            .get_password()
            .with_context(|| format!("No verification code in keychain for key {}", key_id))
    }

    /// Delete the stored verification code for a key ID
    pub fn delete(key_id: i64) -> Result<()> {
        Self::entry(key_id)?
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }
}
