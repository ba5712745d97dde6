use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Merchant catalog entry. `blockchain` is the canonical network identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub code: String,
    pub blockchain: String,
}

impl Token {
    pub fn new(code: impl Into<String>, blockchain: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            blockchain: blockchain.into(),
        }
    }
}

/// Resolved deposit/withdraw status of one token on one venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueExchangeStatus {
    // Existing consumers read this field as `network`
    #[serde(rename = "network", alias = "network_alias_used")]
    pub network_alias_used: Option<String>,
    pub deposit: bool,
    pub withdraw: bool,
    pub limits: Option<Value>,
}

impl VenueExchangeStatus {
    /// Status used whenever no alias matched or the venue returned nothing.
    pub fn absent() -> Self {
        Self {
            network_alias_used: None,
            deposit: false,
            withdraw: false,
            limits: None,
        }
    }

    pub fn is_absent(&self) -> bool {
        *self == Self::absent()
    }
}

impl Default for VenueExchangeStatus {
    fn default() -> Self {
        Self::absent()
    }
}

/// Venue identifier -> status, for one canonical network.
pub type VenueStatuses = BTreeMap<String, VenueExchangeStatus>;

/// Canonical network -> venue statuses, for one token.
pub type TokenRecord = BTreeMap<String, VenueStatuses>;

/// Token code -> record, for one full aggregation cycle.
pub type Snapshot = BTreeMap<String, TokenRecord>;
