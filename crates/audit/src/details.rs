//! The `details` display grammar and its legacy parse.
//!
//! Ledger operations must produce these strings exactly: entries written
//! before structured facts existed are re-parsed by analytics, and the parse
//! is positional. Only sale details are ever parsed; the rest are display
//! text.

/// `"Created new item: {name}"`
pub fn created(name: &str) -> String {
    format!("Created new item: {name}")
}

/// `"Updated item: {name}"` — rendered with the post-update name.
pub fn updated(name: &str) -> String {
    format!("Updated item: {name}")
}

/// `"Deleted item: {name}"` — rendered with the pre-deletion name.
pub fn deleted(name: &str) -> String {
    format!("Deleted item: {name}")
}

/// `"Sold {quantity} {unit} of {name}"`
pub fn sold(quantity: i64, unit: &str, name: &str) -> String {
    format!("Sold {quantity} {unit} of {name}")
}

/// `"Restocked {quantity} {unit} of {name}"`
pub fn restocked(quantity: i64, unit: &str, name: &str) -> String {
    format!("Restocked {quantity} {unit} of {name}")
}

/// A sale recovered from a legacy `details` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSale {
    pub quantity: i64,
    pub name: String,
}

/// Parse a legacy sale details string.
///
/// Positional split on single spaces: token 1 is the quantity, tokens 4..
/// rejoined are the name. The unit is assumed to be a single token; a
/// multi-token unit shifts the positions and the entry is treated as
/// unparseable (`None`), never an error.
pub fn parse_sold(details: &str) -> Option<ParsedSale> {
    let tokens: Vec<&str> = details.split(' ').collect();
    if tokens.len() < 5 || tokens[0] != "Sold" || tokens[3] != "of" {
        return None;
    }
    let quantity: i64 = tokens[1].parse().ok()?;
    let name = tokens[4..].join(" ");
    Some(ParsedSale { quantity, name })
}
