use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::warn;

use super::VenueError;

/// Deposit metadata a venue reports for one of its network codes.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkMetadata {
    pub deposit: bool,
    pub withdraw: bool,
    pub limits: Option<Value>,
}

/// One currency as reported by a venue. `networks` is `None` when the venue
/// sent no usable `networks` field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrencyEntry {
    pub networks: Option<HashMap<String, NetworkMetadata>>,
}

/// Typed view of a venue's `fetch_currencies` payload.
///
/// Built once per venue per cycle by [`VenueCurrencyTable::from_raw`], which is
/// the only place that walks the untyped response. Entries that do not have
/// the expected shape are logged and dropped, so lookups against the table
/// never fail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenueCurrencyTable {
    currencies: HashMap<String, CurrencyEntry>,
}

impl VenueCurrencyTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalizes a raw payload of the form
    /// `{CODE: {"networks": {ALIAS: {"deposit", "withdraw", "limits"}}}}`.
    pub fn from_raw(venue: &str, raw: Value) -> Result<Self, VenueError> {
        let currencies = match raw {
            Value::Null => return Ok(Self::empty()),
            Value::Object(currencies) => currencies,
            other => {
                return Err(VenueError::MalformedPayload(format!(
                    "expected currency object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut table = Self::empty();
        for (code, entry) in currencies {
            let Value::Object(entry) = entry else {
                warn!(venue, currency = %code, "Skipping currency entry with unexpected shape");
                continue;
            };
            let networks = normalize_networks(venue, &code, &entry);
            table.currencies.insert(code, CurrencyEntry { networks });
        }

        Ok(table)
    }

    pub fn currency(&self, code: &str) -> Option<&CurrencyEntry> {
        self.currencies.get(code)
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}

fn normalize_networks(
    venue: &str,
    code: &str,
    entry: &Map<String, Value>,
) -> Option<HashMap<String, NetworkMetadata>> {
    let networks = match entry.get("networks") {
        None | Some(Value::Null) => return None,
        Some(Value::Object(networks)) => networks,
        Some(other) => {
            warn!(
                venue,
                currency = code,
                kind = json_kind(other),
                "Ignoring networks field with unexpected type"
            );
            return None;
        }
    };

    let mut normalized = HashMap::with_capacity(networks.len());
    for (alias, data) in networks {
        match data {
            // Empty entries never count as a match
            Value::Null => {}
            Value::Object(fields) if fields.is_empty() => {}
            Value::Object(fields) => {
                let metadata = NetworkMetadata {
                    deposit: flag(venue, code, alias, fields, "deposit"),
                    withdraw: flag(venue, code, alias, fields, "withdraw"),
                    limits: fields.get("limits").filter(|v| !v.is_null()).cloned(),
                };
                normalized.insert(alias.clone(), metadata);
            }
            other => warn!(
                venue,
                currency = code,
                network = %alias,
                kind = json_kind(other),
                "Ignoring network entry with unexpected type"
            ),
        }
    }

    Some(normalized)
}

fn flag(venue: &str, code: &str, alias: &str, fields: &Map<String, Value>, name: &str) -> bool {
    match fields.get(name) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(value)) => *value,
        Some(other) => {
            warn!(
                venue,
                currency = code,
                network = alias,
                field = name,
                kind = json_kind(other),
                "Treating non-boolean flag as false"
            );
            false
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
