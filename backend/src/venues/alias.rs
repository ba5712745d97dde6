use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static DEFAULT_NETWORK_ALIASES: Lazy<NetworkAliasTable> = Lazy::new(|| {
    NetworkAliasTable::from_pairs(&[
        ("bitcoin", &["BTC", "BRC20"]),
        ("ethereum", &["ETH", "ERC20"]),
        ("tron", &["TRX", "TRC20", "TRX1"]),
        ("litecoin", &["LTC"]),
        ("bitcoincash", &["BCH", "bchn"]),
        ("bsc", &["BSC", "BEP20"]),
        ("polygon", &["MATIC", "POLYGON"]),
    ])
});

/// Canonical network -> venue network codes, in match priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkAliasTable {
    entries: HashMap<String, Vec<String>>,
}

impl NetworkAliasTable {
    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let entries = pairs
            .iter()
            .map(|(network, aliases)| {
                (
                    network.to_string(),
                    aliases.iter().map(|alias| alias.to_string()).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    /// Aliases for `network`; unknown networks have none.
    pub fn aliases(&self, network: &str) -> &[String] {
        self.entries
            .get(network)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NetworkAliasTable {
    fn default() -> Self {
        DEFAULT_NETWORK_ALIASES.clone()
    }
}
