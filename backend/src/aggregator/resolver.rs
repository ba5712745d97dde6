use crate::venues::{NetworkMetadata, VenueCurrencyTable};

/// Finds the first alias, in table order, under which `table` has metadata
/// for `token_code`.
///
/// Returns `None` when the token is unknown to the venue, the venue sent no
/// networks for it, `aliases` is empty, or none of the aliases match.
pub fn resolve_network<'a, 'b>(
    aliases: &'b [String],
    token_code: &str,
    table: &'a VenueCurrencyTable,
) -> Option<(&'b str, &'a NetworkMetadata)> {
    let networks = table.currency(token_code)?.networks.as_ref()?;
    aliases
        .iter()
        .find_map(|alias| networks.get(alias).map(|metadata| (alias.as_str(), metadata)))
}
