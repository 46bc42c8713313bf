//! Cardano asset identifiers
//!
//! A [`Token`] is either the native currency (lovelace) or a native asset
//! identified by its minting policy and hex-encoded asset name.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

/// Length of a minting policy id in hex characters (28 bytes)
const POLICY_ID_HEX_LEN: usize = 56;
/// Asset names are at most 32 bytes
const MAX_ASSET_NAME_HEX_LEN: usize = 64;

pub const LOVELACE: &str = "lovelace";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("Malformed asset identifier: '{0}'")]
    MalformedAssetIdentifier(String),
}

/// Native asset. Identity is `policy_id ++ name_hex`; `decimals` is display metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub policy_id: String,
    pub name_hex: String,
    pub decimals: u8,
}

impl Asset {
    pub fn new(policy_id: &str, name_hex: &str, decimals: u8) -> Result<Self, AssetError> {
        let policy_id = policy_id.to_ascii_lowercase();
        let name_hex = name_hex.to_ascii_lowercase();
        let malformed = || AssetError::MalformedAssetIdentifier(format!("{policy_id}.{name_hex}"));

        if policy_id.len() != POLICY_ID_HEX_LEN || hex::decode(&policy_id).is_err() {
            return Err(malformed());
        }
        if name_hex.len() > MAX_ASSET_NAME_HEX_LEN || hex::decode(&name_hex).is_err() {
            return Err(malformed());
        }

        Ok(Self {
            policy_id,
            name_hex,
            decimals,
        })
    }

    /// Parse `<policy>.<name>` or `<policy><name>`; the name part may be empty.
    pub fn from_identifier(id: &str, decimals: u8) -> Result<Self, AssetError> {
        let trimmed = id.trim();
        let malformed = || AssetError::MalformedAssetIdentifier(id.to_string());

        let (policy, name) = match trimmed.split_once('.') {
            Some((policy, name)) => (policy, name),
            None if trimmed.len() >= POLICY_ID_HEX_LEN
                && trimmed.is_char_boundary(POLICY_ID_HEX_LEN) =>
            {
                trimmed.split_at(POLICY_ID_HEX_LEN)
            }
            None => return Err(malformed()),
        };

        Self::new(policy, name, decimals).map_err(|_| malformed())
    }

    /// Canonical identifier, `policy<delimiter>name`
    pub fn identifier(&self, delimiter: &str) -> String {
        format!("{}{}{}", self.policy_id, delimiter, self.name_hex)
    }

    /// Asset name decoded as UTF-8 when printable, else the raw hex
    pub fn asset_name(&self) -> String {
        hex::decode(&self.name_hex)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .filter(|name| !name.chars().any(char::is_control))
            .unwrap_or_else(|| self.name_hex.clone())
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.policy_id == other.policy_id && self.name_hex == other.name_hex
    }
}

impl Eq for Asset {}

impl Hash for Asset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.policy_id.hash(state);
        self.name_hex.hash(state);
    }
}

/// Either side of a swap or a pool
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Lovelace,
    Asset(Asset),
}

impl Token {
    /// Unit string as used by the data providers: `lovelace` or `policy ++ name`
    pub fn unit(&self) -> String {
        match self {
            Token::Lovelace => LOVELACE.to_string(),
            Token::Asset(asset) => asset.identifier(""),
        }
    }

    /// Identifier shown to API callers, same form as [`Token::unit`]
    pub fn identifier(&self) -> String {
        self.unit()
    }

    pub fn display_name(&self) -> String {
        match self {
            Token::Lovelace => "ADA".to_string(),
            Token::Asset(asset) => asset.asset_name(),
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            Token::Lovelace => 6,
            Token::Asset(asset) => asset.decimals,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Lovelace => f.write_str("ADA"),
            Token::Asset(asset) => f.write_str(&asset.identifier(".")),
        }
    }
}

/// Parse a user supplied asset string. `lovelace` / `ada` (any case) map to
/// the native currency and ignore `decimals`.
pub fn parse_asset(raw: &str, decimals: u8) -> Result<Token, AssetError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(LOVELACE) || trimmed.eq_ignore_ascii_case("ada") {
        return Ok(Token::Lovelace);
    }

    Asset::from_identifier(trimmed, decimals).map(Token::Asset)
}
