// 🍽️ Meal Slot - The four fixed meals of a day

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    /// All slots, in display order
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
            MealSlot::Snack => "snack",
        }
    }

    /// Position in `ALL`
    pub fn index(&self) -> usize {
        match self {
            MealSlot::Breakfast => 0,
            MealSlot::Lunch => 1,
            MealSlot::Dinner => 2,
            MealSlot::Snack => 3,
        }
    }

    /// Parse free text (trimmed, case-insensitive). Never defaults.
    pub fn parse(s: &str) -> Result<MealSlot, LedgerError> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "dinner" => Ok(MealSlot::Dinner),
            "snack" => Ok(MealSlot::Snack),
            _ => Err(LedgerError::InvalidMealSlot(s.to_string())),
        }
    }
}

impl FromStr for MealSlot {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealSlot::parse(s)
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(MealSlot::parse("BREAKFAST"), Ok(MealSlot::Breakfast));
        assert_eq!(MealSlot::parse("  Lunch "), Ok(MealSlot::Lunch));
        assert_eq!("dinner".parse::<MealSlot>(), Ok(MealSlot::Dinner));
        assert_eq!(MealSlot::parse("sNaCk"), Ok(MealSlot::Snack));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(
            MealSlot::parse("brunch"),
            Err(LedgerError::InvalidMealSlot("brunch".to_string()))
        );
        assert!(MealSlot::parse("").is_err());
        assert!(MealSlot::parse("snacks").is_err());
    }

    #[test]
    fn test_index_matches_all() {
        for (i, slot) in MealSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
            assert_eq!(MealSlot::parse(slot.as_str()), Ok(*slot));
        }
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&MealSlot::Dinner).unwrap(), "\"dinner\"");
        let slot: MealSlot = serde_json::from_str("\"snack\"").unwrap();
        assert_eq!(slot, MealSlot::Snack);
    }
}
