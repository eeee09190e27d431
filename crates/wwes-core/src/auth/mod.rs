//! Credentials for the remote API.
//!
//! - `KeyPair`: key ID and verification code
//! - `CredentialStore`: verification codes in the OS keychain via keyring
//! - Key file parsing (`keyID:vCode` per line)

pub mod credentials;
pub mod key;

pub use credentials::CredentialStore;
pub use key::{parse_key_file, KeyLine, KeyPair};
