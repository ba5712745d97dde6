use std::collections::HashMap;

use super::resolver::resolve_network;
use crate::types::{Token, VenueExchangeStatus, VenueStatuses};
use crate::venues::{NetworkAliasTable, VenueCurrencyTable};

/// Builds the venue statuses of `token` on its canonical network.
///
/// Every venue in `venues` gets an entry; venues without a table or without
/// a matching alias get [`VenueExchangeStatus::absent`].
pub fn build_token_record(
    token: &Token,
    venues: &[String],
    tables: &HashMap<String, VenueCurrencyTable>,
    aliases: &NetworkAliasTable,
) -> (String, VenueStatuses) {
    let network_aliases = aliases.aliases(&token.blockchain);
    let missing = VenueCurrencyTable::empty();

    let statuses = venues
        .iter()
        .map(|venue| {
            let table = tables.get(venue).unwrap_or(&missing);
            let status = match resolve_network(network_aliases, &token.code, table) {
                Some((alias, metadata)) => VenueExchangeStatus {
                    network_alias_used: Some(alias.to_string()),
                    deposit: metadata.deposit,
                    withdraw: metadata.withdraw,
                    limits: metadata.limits.clone(),
                },
                None => VenueExchangeStatus::absent(),
            };
            (venue.clone(), status)
        })
        .collect();

    (token.blockchain.clone(), statuses)
}
