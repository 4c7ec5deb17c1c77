//! # Display Codes
//!
//! Human-readable identifiers printed on tags and shown in the inventory.
//!
//! ```text
//!   Stone display id     L  DIA  001        U  ESM  123
//!                        │   │    │
//!                        │   │    └── serial: sequence (3+ digits) or last
//!                        │   │        3 chars of an opaque id
//!                        │   └─────── stone code (table, else name prefix)
//!                        └─────────── L = lot tracked, U = unique
//!
//!   Stone catalog code   RUB001   /   CZLOT
//!
//!   Piece code           AN-PL-12G-DI1-ES2-007
//!                        kind-material-weight-stones-inventory number
//! ```
//!
//! Everything here is plain formatting. Unknown names never fail: they fall
//! back to an uppercased prefix of the raw name.

use crate::types::TrackingType;
use crate::validation::{validate_non_negative, ValidationResult};

// =============================================================================
// Lookup Tables
// =============================================================================

/// Stone name → three-letter code. Matched case-insensitively.
const STONE_CODES: &[(&str, &str)] = &[
    ("diamante", "DIA"),
    ("esmeralda", "ESM"),
    ("rubí", "RUB"),
    ("zafiro", "ZAF"),
    ("amatista", "AMA"),
    ("topacio", "TOP"),
    ("granate", "GRA"),
    ("perla", "PER"),
    ("ópalo", "OPA"),
    ("aguamarina", "AGU"),
    ("turmalina", "TUR"),
    ("citrino", "CIT"),
    ("zirconia", "ZIR"),
    ("moissanita", "MOI"),
    ("sintético", "SIN"),
];

const JEWELRY_KIND_CODES: &[(&str, &str)] = &[
    ("aretes", "AR"),
    ("anillo", "AN"),
    ("collar", "CO"),
    ("brazalete", "BR"),
    ("dije", "DJ"),
    ("broche", "BC"),
];

const MATERIAL_CODES: &[(&str, &str)] = &[("plata", "PL"), ("oro", "OR")];

fn lookup(table: &[(&str, &'static str)], name: &str) -> Option<&'static str> {
    let key = name.trim().to_lowercase();
    table
        .iter()
        .find(|(entry, _)| *entry == key)
        .map(|(_, code)| *code)
}

/// First `n` characters of `value`, uppercased.
fn upper_prefix(value: &str, n: usize) -> String {
    value.chars().take(n).collect::<String>().to_uppercase()
}

// =============================================================================
// Stone Display Id
// =============================================================================

/// Source of the serial part of a stone display id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoneSerial<'a> {
    /// Sequence number, zero-padded to three digits (never truncated).
    Sequence(u32),
    /// Opaque identifier (uuid, customer code); its last three characters
    /// are used.
    Identifier(&'a str),
}

/// Three-letter code of a stone name.
///
/// Known names come from the table. Anything else uses its first three
/// characters uppercased, with every non `A-Z` character replaced by `X`
/// and `X` padding when the name is shorter than three.
pub fn stone_code(name: &str) -> String {
    if let Some(code) = lookup(STONE_CODES, name) {
        return code.to_string();
    }

    let mut code: String = name
        .trim()
        .chars()
        .take(3)
        .flat_map(char::to_uppercase)
        .map(|c| if c.is_ascii_uppercase() { c } else { 'X' })
        .take(3)
        .collect();

    while code.len() < 3 {
        code.push('X');
    }
    code
}

fn serial(serial: StoneSerial<'_>) -> String {
    match serial {
        StoneSerial::Sequence(n) => format!("{n:03}"),
        StoneSerial::Identifier(id) => {
            let chars: Vec<char> = id.chars().collect();
            let tail: String = chars[chars.len().saturating_sub(3)..].iter().collect();
            format!("{:0>3}", tail.to_uppercase())
        }
    }
}

/// Builds a stone's display id: `[L|U][CODE][SERIAL]`.
///
/// ## Example
/// ```rust
/// use orfebre_core::codes::{stone_display_id, StoneSerial};
/// use orfebre_core::types::TrackingType;
///
/// assert_eq!(stone_display_id(TrackingType::Lot, "Diamante", StoneSerial::Sequence(1)), "LDIA001");
/// assert_eq!(
///     stone_display_id(TrackingType::Unique, "Esmeralda", StoneSerial::Identifier("cust-id-123")),
///     "UESM123"
/// );
/// ```
pub fn stone_display_id(tracking: TrackingType, name: &str, serial_source: StoneSerial<'_>) -> String {
    format!(
        "{}{}{}",
        tracking.prefix(),
        stone_code(name),
        serial(serial_source)
    )
}

// =============================================================================
// Stone Catalog Code
// =============================================================================

/// First three ASCII letters of a stone name, uppercased.
pub fn stone_catalog_prefix(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphabetic)
        .take(3)
        .collect::<String>()
        .to_uppercase()
}

/// Code assigned to a new catalog entry.
///
/// Lot tracked stones share one code per type (`CZLOT`); unique stones are
/// numbered after the `existing_count` already registered under the same
/// prefix.
pub fn stone_catalog_code(name: &str, tracking: TrackingType, existing_count: u32) -> String {
    let prefix = stone_catalog_prefix(name);

    match tracking {
        TrackingType::Lot => format!("{prefix}LOT"),
        TrackingType::Unique => format!("{prefix}{:03}", existing_count.saturating_add(1)),
    }
}

// =============================================================================
// Piece Code
// =============================================================================

/// A stone entry on a piece code: raw type name and count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceStone<'a> {
    pub name: &'a str,
    pub quantity: u32,
}

/// Builds an inventory code for a finished piece.
///
/// Format `KIND-MAT-{weight}G[-{ST}{qty}...]-{NNN}`, weight rounded to whole
/// grams, stone codes being the first two letters of the stone name.
///
/// ## Example
/// ```rust
/// use orfebre_core::codes::{piece_code, PieceStone};
///
/// let stones = [PieceStone { name: "Diamante", quantity: 1 }, PieceStone { name: "esmeralda", quantity: 2 }];
/// assert_eq!(piece_code("Anillo", "plata", 11.6, &stones, 7).unwrap(), "AN-PL-12G-DI1-ES2-007");
/// assert_eq!(piece_code("tobillera", "cobre", 3.2, &[], 15).unwrap(), "TO-CO-3G-015");
/// ```
pub fn piece_code(
    kind: &str,
    material: &str,
    weight_grams: f64,
    stones: &[PieceStone<'_>],
    inventory_number: u32,
) -> ValidationResult<String> {
    validate_non_negative("weight_grams", weight_grams)?;

    let kind = lookup(JEWELRY_KIND_CODES, kind)
        .map(str::to_string)
        .unwrap_or_else(|| upper_prefix(kind, 2));
    let material = lookup(MATERIAL_CODES, material)
        .map(str::to_string)
        .unwrap_or_else(|| upper_prefix(material, 2));

    let mut parts = vec![kind, material, format!("{}G", weight_grams.round() as u64)];
    parts.extend(
        stones
            .iter()
            .map(|s| format!("{}{}", upper_prefix(s.name, 2), s.quantity)),
    );
    parts.push(format!("{inventory_number:03}"));

    Ok(parts.join("-"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stone_display_id_examples() {
        assert_eq!(
            stone_display_id(TrackingType::Lot, "Diamante", StoneSerial::Sequence(1)),
            "LDIA001"
        );
        assert_eq!(
            stone_display_id(TrackingType::Unique, "Esmeralda", StoneSerial::Identifier("cust-id-123")),
            "UESM123"
        );
        assert_eq!(
            stone_display_id(TrackingType::Lot, "Zirconia", StoneSerial::Sequence(15)),
            "LZIR015"
        );
        assert_eq!(
            stone_display_id(TrackingType::Unique, "Rubí", StoneSerial::Identifier("some-uuid-abc")),
            "URUBABC"
        );
        assert_eq!(
            stone_display_id(TrackingType::Lot, "UnknownStone", StoneSerial::Sequence(99)),
            "LUNK099"
        );
    }

    #[test]
    fn test_stone_code_is_case_insensitive() {
        assert_eq!(stone_code("DIAMANTE"), "DIA");
        assert_eq!(stone_code("ópalo"), "OPA");
        assert_eq!(stone_code("ÓPALO"), "OPA");
    }

    #[test]
    fn test_unknown_stone_code_fallback() {
        assert_eq!(stone_code("Ónix"), "XNI");
        assert_eq!(stone_code("CZ"), "CZX");
        assert_eq!(stone_code("a1"), "AXX");
        assert_eq!(stone_code(""), "XXX");
    }

    #[test]
    fn test_serial_edge_cases() {
        assert_eq!(serial(StoneSerial::Sequence(0)), "000");
        assert_eq!(serial(StoneSerial::Sequence(1234)), "1234");
        assert_eq!(serial(StoneSerial::Identifier("7")), "007");
        assert_eq!(serial(StoneSerial::Identifier("")), "000");
    }

    #[test]
    fn test_stone_catalog_code() {
        assert_eq!(stone_catalog_code("Rubí", TrackingType::Unique, 0), "RUB001");
        assert_eq!(stone_catalog_code("Esmeralda", TrackingType::Unique, 41), "ESM042");
        assert_eq!(stone_catalog_code("CZ 1mm", TrackingType::Lot, 3), "CZMLOT");
        assert_eq!(stone_catalog_code("Corindón Laboratorio", TrackingType::Lot, 0), "CORLOT");
    }

    #[test]
    fn test_piece_code() {
        let stones = [
            PieceStone { name: "Zafiro", quantity: 3 },
        ];
        assert_eq!(
            piece_code("collar", "Oro", 24.4, &stones, 120).unwrap(),
            "CO-OR-24G-ZA3-120"
        );
        assert_eq!(piece_code("dije", "plata", 0.0, &[], 1).unwrap(), "DJ-PL-0G-001");
        assert!(piece_code("dije", "plata", f64::NAN, &[], 1).is_err());
    }
}
