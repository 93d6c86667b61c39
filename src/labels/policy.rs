//! Sentinel label resolution.
//!
//! The scanner software writes placeholder values into the `PollenSpecies`
//! column when a human reviewer never confirmed the automatic prediction. Each
//! placeholder maps to the column that carries the real label. Exactly one
//! rule can fire per row, keyed on the raw primary value.

/// Label-ish columns of a label table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelField {
    Species,
    PredictedSpecies,
    PredictedSpeciesLatin,
}

/// `primary value -> column to use instead`, checked in order.
pub const SENTINEL_POLICY: &[(&str, LabelField)] = &[
    ("--", LabelField::PredictedSpecies),
    ("Y", LabelField::PredictedSpeciesLatin),
];

/// The column whose value becomes the label for a row with this primary value.
pub fn resolve_field(primary: &str) -> LabelField {
    SENTINEL_POLICY
        .iter()
        .find(|(sentinel, _)| *sentinel == primary)
        .map(|(_, field)| *field)
        .unwrap_or(LabelField::Species)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert_eq!(resolve_field("--"), LabelField::PredictedSpecies);
        assert_eq!(resolve_field("Y"), LabelField::PredictedSpeciesLatin);
    }

    #[test]
    fn test_everything_else_is_verbatim() {
        for primary in ["Betula", "", "y", "Y ", "-", "YY", "Pinus"] {
            assert_eq!(resolve_field(primary), LabelField::Species, "{primary:?}");
        }
    }
}
