use k256::ecdsa::{SigningKey, VerifyingKey};
use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::identity::types::IdentityError;

use super::types::Curve;

const MULTICODEC_SECP256K1_PUB: [u8; 2] = [0xe7, 0x01];
const MULTICODEC_ED25519_PUB: [u8; 2] = [0xed, 0x01];
const PRIVATE_KEY_LEN: usize = 32;

/// `KeyMaterial` is the derived key pair of an account
///
/// The `address` is only available for `Secp256k1` keys, an `Ed25519` key has no
/// `EVM` address and is bound to its chain native account id instead.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMaterial {
    pub curve: Curve,
    pub private_key_hex: String,
    pub public_key_hex: String,
    pub address: Option<String>,
}

fn strip_hex(value: &str) -> &str {
    value.strip_prefix("0x").unwrap_or(value)
}

fn decode_hex(value: &str) -> Result<Vec<u8>, IdentityError> {
    hex::decode(strip_hex(value.trim()))
        .map_err(|err| IdentityError::AccountError(format!("invalid hex value: {}", err)))
}

/// `raw_private_key` accepts both raw 32 bytes keys and `DER` encoded keys, the
/// raw key is always the tail of the `DER` structure
fn raw_private_key(private_key_hex: &str) -> Result<[u8; PRIVATE_KEY_LEN], IdentityError> {
    let bytes = decode_hex(private_key_hex)?;
    if bytes.len() < PRIVATE_KEY_LEN {
        return Err(IdentityError::AccountError(String::from(
            "private key is too short",
        )));
    }

    let mut raw = [0u8; PRIVATE_KEY_LEN];
    raw.copy_from_slice(&bytes[bytes.len() - PRIVATE_KEY_LEN..]);
    Ok(raw)
}

pub fn evm_address(verifying_key: &VerifyingKey) -> String {
    let point = verifying_key.to_encoded_point(false);
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&digest[12..]))
}

/// `derive_from_entropy` builds the deterministic snap account from the host entropy
pub fn derive_from_entropy(entropy_hex: &str) -> Result<KeyMaterial, IdentityError> {
    let entropy = decode_hex(entropy_hex)?;
    if entropy.is_empty() {
        return Err(IdentityError::AccountError(String::from(
            "host returned empty entropy",
        )));
    }

    let seed = if entropy.len() == PRIVATE_KEY_LEN {
        entropy
    } else {
        Sha256::digest(&entropy).to_vec()
    };

    from_private_key(Curve::Secp256k1, &hex::encode(seed))
}

/// `from_private_key` derives the public key and the address of the given private key
pub fn from_private_key(curve: Curve, private_key_hex: &str) -> Result<KeyMaterial, IdentityError> {
    let raw = raw_private_key(private_key_hex)?;

    match curve {
        Curve::Secp256k1 => {
            let signing_key = SigningKey::from_slice(&raw)
                .map_err(|err| IdentityError::AccountError(err.to_string()))?;
            let verifying_key = signing_key.verifying_key();
            let public_key = verifying_key.to_encoded_point(false);

            Ok(KeyMaterial {
                curve,
                private_key_hex: format!("0x{}", hex::encode(raw)),
                public_key_hex: format!("0x{}", hex::encode(public_key.as_bytes())),
                address: Some(evm_address(verifying_key)),
            })
        }
        Curve::Ed25519 => {
            let signing_key = ed25519_dalek::SigningKey::from_bytes(&raw);
            let public_key = signing_key.verifying_key().to_bytes();

            Ok(KeyMaterial {
                curve,
                private_key_hex: format!("0x{}", hex::encode(raw)),
                public_key_hex: format!("0x{}", hex::encode(public_key)),
                address: None,
            })
        }
    }
}

/// `compressed_public_key` gives the `SEC1` compressed form of a secp256k1 key, ed25519
/// keys are returned as they are
pub fn compressed_public_key(curve: Curve, public_key_hex: &str) -> Result<Vec<u8>, IdentityError> {
    let bytes = decode_hex(public_key_hex)?;
    match curve {
        Curve::Secp256k1 => {
            let key = VerifyingKey::from_sec1_bytes(&bytes)
                .map_err(|err| IdentityError::AccountError(err.to_string()))?;
            Ok(key.to_encoded_point(true).as_bytes().to_vec())
        }
        Curve::Ed25519 => {
            if bytes.len() != 32 {
                return Err(IdentityError::AccountError(String::from(
                    "invalid ed25519 public key length",
                )));
            }
            Ok(bytes)
        }
    }
}

/// `did_key_identifier` builds the method specific id of a `did:key`, a `z` prefixed
/// base58btc multibase of the multicodec tagged public key
pub fn did_key_identifier(curve: Curve, public_key_hex: &str) -> Result<String, IdentityError> {
    let key = compressed_public_key(curve, public_key_hex)?;
    let codec = match curve {
        Curve::Secp256k1 => MULTICODEC_SECP256K1_PUB,
        Curve::Ed25519 => MULTICODEC_ED25519_PUB,
    };

    let mut bytes = codec.to_vec();
    bytes.extend(key);
    Ok(format!("z{}", bs58::encode(bytes).into_string()))
}
