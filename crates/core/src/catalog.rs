use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::order::LineItem;

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub unit_price: Decimal,
}

/// Static price list, loaded once at process start.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The stock laundry menu.
    pub fn standard() -> Self {
        Self::new(vec![
            CatalogEntry { name: "Shirt".to_string(), unit_price: Decimal::from(15) },
            CatalogEntry { name: "Pants".to_string(), unit_price: Decimal::from(20) },
            CatalogEntry { name: "Saree".to_string(), unit_price: Decimal::from(100) },
            CatalogEntry { name: "Suit".to_string(), unit_price: Decimal::from(250) },
        ])
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// First entry whose name is a case-insensitive substring of `item_name`
    /// wins. First-match, not best-match: "suit shirt" prices as a Shirt
    /// only if Shirt is listed first.
    pub fn resolve_price(&self, item_name: &str) -> Option<Decimal> {
        let normalized = item_name.to_lowercase();
        self.entries
            .iter()
            .find(|entry| normalized.contains(&entry.name.to_lowercase()))
            .map(|entry| entry.unit_price)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LineItemParseError {
    #[error("input does not match `<item> x <quantity>`")]
    Malformed,
    #[error("no catalog entry matches `{0}`")]
    UnknownItem(String),
}

/// Parses `<item name> x <quantity>` and snapshots the unit price from the
/// catalog. A failure here is a recognized dialog outcome that becomes a
/// format hint to the user, never a system fault.
pub fn parse_line_item(input: &str, catalog: &Catalog) -> Result<LineItem, LineItemParseError> {
    let (raw_name, digits) =
        split_on_quantity_marker(input).ok_or(LineItemParseError::Malformed)?;

    let name = raw_name.trim();
    if name.is_empty() {
        return Err(LineItemParseError::Malformed);
    }

    let quantity = digits
        .parse::<u32>()
        .ok()
        .filter(|quantity| *quantity >= 1)
        .ok_or(LineItemParseError::Malformed)?;

    let unit_price = catalog
        .resolve_price(name)
        .ok_or_else(|| LineItemParseError::UnknownItem(name.to_owned()))?;

    Ok(LineItem { name: name.to_owned(), quantity, unit_price })
}

/// Finds the first `x`/`X` that is followed (after optional whitespace) by
/// digits and splits there, so item names containing an `x` still parse:
/// "Box shirt x 2" -> ("Box shirt ", "2").
fn split_on_quantity_marker(input: &str) -> Option<(&str, String)> {
    for (index, character) in input.char_indices() {
        if character != 'x' && character != 'X' {
            continue;
        }

        let rest = input[index + character.len_utf8()..].trim_start();
        let digits: String =
            rest.chars().take_while(|candidate| candidate.is_ascii_digit()).collect();
        if digits.is_empty() {
            continue;
        }

        return Some((&input[..index], digits));
    }

    None
}
