use super::types::IdentityError;

pub const HEDERA_MAINNET: &str = "0x127";
pub const HEDERA_TESTNET: &str = "0x128";
pub const HEDERA_PREVIEWNET: &str = "0x129";

/// `normalize_chain_id` lowers the given hex chain id and strips the leading zeros
/// so `0x0128` and `0x128` point to the same network record
pub fn normalize_chain_id(chain_id: &str) -> Result<String, IdentityError> {
    let value = parse_chain_id(chain_id)?;
    Ok(format!("0x{:x}", value))
}

/// `parse_chain_id` parses an `EIP-155` hex chain id into its decimal value
pub fn parse_chain_id(chain_id: &str) -> Result<u64, IdentityError> {
    let trimmed = chain_id.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or(IdentityError::InvalidParams(format!(
            "chain id must be hex encoded: {}",
            chain_id
        )))?;

    u64::from_str_radix(hex_part, 16)
        .map_err(|err| IdentityError::InvalidParams(format!("invalid chain id: {}", err)))
}

pub fn is_hedera_network(chain_id: &str) -> bool {
    hedera_network_name(chain_id).is_some()
}

/// `hedera_network_name` maps the Hedera EVM chain ids to the network names used by
/// the mirror node and the `did:hedera` method
pub fn hedera_network_name(chain_id: &str) -> Option<&'static str> {
    let normalized = normalize_chain_id(chain_id).ok()?;
    match normalized.as_str() {
        HEDERA_MAINNET => Some("mainnet"),
        HEDERA_TESTNET => Some("testnet"),
        HEDERA_PREVIEWNET => Some("previewnet"),
        _ => None,
    }
}

/// `is_native_account_id` checks the Hedera `shard.realm.num` account id format
pub fn is_native_account_id(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// `is_evm_address` checks a `0x` prefixed 20 bytes hex address
pub fn is_evm_address(value: &str) -> bool {
    match value.strip_prefix("0x") {
        Some(hex_part) => hex_part.len() == 40 && hex_part.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}
