//! Local Ed25519 keypair signer.
//!
//! # Security
//! - The private key is never logged or serialized; `Debug` shows only the
//!   derived address.
//! - [`LocalAccount::from_env`] is the only place the SDK reads key material
//!   from the environment.

use ed25519_dalek::{Signer as _, SigningKey};
use rand::RngCore;
use sha3::{Digest, Sha3_256};
use tracing::info;

use crate::error::{Result, VrfError};
use crate::types::{AccountAddress, TransactionSignature};

/// Environment variable holding a hex-encoded private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "APTOS_PRIVATE_KEY";

/// Authentication scheme byte for single-key Ed25519 accounts.
const ED25519_SCHEME: u8 = 0x00;

/// A keypair held in process memory.
#[derive(Clone)]
pub struct LocalAccount {
    key: SigningKey,
    address: AccountAddress,
}

impl LocalAccount {
    /// Account whose address is the authentication key derived from `key`.
    pub fn new(key: SigningKey) -> Self {
        let address = derive_address(&key.verifying_key().to_bytes());
        Self { key, address }
    }

    /// Account at an explicit address, for keys that were rotated onto it.
    pub fn with_address(key: SigningKey, address: AccountAddress) -> Self {
        Self { key, address }
    }

    /// Fresh random keypair.
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Self::new(SigningKey::from_bytes(&secret))
    }

    /// Parse a 32-byte private key given as hex, with or without `0x`.
    pub fn from_private_key_hex(private_key_hex: &str) -> Result<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let mut secret = [0u8; 32];
        hex::decode_to_slice(key_hex, &mut secret)
            .map_err(|e| VrfError::InvalidArgument(format!("invalid private key format: {e}")))?;

        let account = Self::new(SigningKey::from_bytes(&secret));
        info!(address = %account.address, "Local account loaded");
        Ok(account)
    }

    /// Load the private key from `APTOS_PRIVATE_KEY`.
    pub fn from_env() -> Result<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            VrfError::InvalidArgument(format!("environment variable {PRIVATE_KEY_ENV_VAR} not set"))
        })?;
        Self::from_private_key_hex(&private_key)
    }

    pub fn address(&self) -> AccountAddress {
        self.address
    }

    /// `0x`-prefixed hex of the Ed25519 public key.
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.key.verifying_key().to_bytes()))
    }

    /// Sign a transaction signing message.
    pub fn sign(&self, message: &[u8]) -> TransactionSignature {
        let signature = self.key.sign(message);
        TransactionSignature {
            kind: "ed25519_signature".to_string(),
            public_key: self.public_key_hex(),
            signature: format!("0x{}", hex::encode(signature.to_bytes())),
        }
    }
}

impl std::fmt::Debug for LocalAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAccount")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// `sha3_256(public_key || scheme)`, which is also the address of an account
/// created from this key.
fn derive_address(public_key: &[u8; 32]) -> AccountAddress {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key);
    hasher.update([ED25519_SCHEME]);
    AccountAddress::new(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    const TEST_PRIVATE_KEY: &str = "9bf49a6a0755f953811fce125f2683d50429c3bb49e074147e0089a52eae155f";

    #[test]
    fn prefix_is_optional() {
        let bare = LocalAccount::from_private_key_hex(TEST_PRIVATE_KEY).unwrap();
        let prefixed = LocalAccount::from_private_key_hex(&format!("0x{TEST_PRIVATE_KEY}")).unwrap();
        assert_eq!(bare.address(), prefixed.address());
        assert_eq!(bare.public_key_hex(), prefixed.public_key_hex());
    }

    #[test]
    fn address_is_sha3_of_key_and_scheme() {
        let account = LocalAccount::from_private_key_hex(TEST_PRIVATE_KEY).unwrap();
        let public_key = hex::decode(account.public_key_hex().trim_start_matches("0x")).unwrap();

        let mut preimage = public_key.clone();
        preimage.push(0x00);
        let expected: [u8; 32] = Sha3_256::digest(&preimage).into();
        assert_eq!(account.address().as_bytes(), &expected);
    }

    #[test]
    fn invalid_keys_are_rejected() {
        for key in ["", "0x1234", "zz", "ab".repeat(33).as_str()] {
            let err = LocalAccount::from_private_key_hex(key).unwrap_err();
            assert!(err.to_string().contains("invalid private key"), "{key}");
        }
    }

    #[test]
    fn signatures_verify_against_public_key() {
        let account = LocalAccount::generate();
        let message = b"APTOS::RawTransaction test message";
        let signature = account.sign(message);
        assert_eq!(signature.kind, "ed25519_signature");

        let public_key: [u8; 32] = hex::decode(signature.public_key.trim_start_matches("0x"))
            .unwrap()
            .try_into()
            .unwrap();
        let sig_bytes: [u8; 64] = hex::decode(signature.signature.trim_start_matches("0x"))
            .unwrap()
            .try_into()
            .unwrap();
        VerifyingKey::from_bytes(&public_key)
            .unwrap()
            .verify(message, &Signature::from_bytes(&sig_bytes))
            .unwrap();
    }

    #[test]
    fn debug_hides_key_material() {
        let account = LocalAccount::from_private_key_hex(TEST_PRIVATE_KEY).unwrap();
        let rendered = format!("{account:?}");
        assert!(!rendered.contains(TEST_PRIVATE_KEY));
        assert!(rendered.contains(&account.address().to_hex_literal()));
    }
}
