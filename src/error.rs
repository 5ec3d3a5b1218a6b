// ⚠️ Error types
// Ledger errors are recoverable at the call site and never corrupt state.
// An unresolved food is NOT an error - it travels as ResolvedEntry::Unresolved.

use thiserror::Error;
use uuid::Uuid;

/// Errors returned by ledger and resolver operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    /// Meal name is not one of breakfast, lunch, dinner, snack.
    #[error("Invalid meal slot: {0:?}")]
    InvalidMealSlot(String),

    /// No logged entry carries this id.
    #[error("Entry not found: {0}")]
    EntryNotFound(Uuid),

    /// Quantity must be a positive, finite number.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(f64),

    /// Calories or macro grams must be finite and non-negative.
    #[error("Invalid {nutrient}: {value}")]
    InvalidNutrient { nutrient: &'static str, value: f64 },

    /// Daily goal targets must be finite and positive.
    #[error("Invalid {nutrient} goal: {value}")]
    InvalidGoal { nutrient: &'static str, value: f64 },

    /// A writer panicked while holding the ledger lock.
    #[error("Ledger lock poisoned")]
    LockPoisoned,
}

/// Errors raised while loading a reference food table.
#[derive(Debug, Error)]
pub enum FoodTableError {
    #[error("Failed to read food table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse food table CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse food table JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Row parsed but violates a FoodItem invariant.
    #[error("Invalid food record at row {row} ({name:?}): {reason}")]
    InvalidRecord {
        row: usize,
        name: String,
        reason: String,
    },

    #[error("Unsupported food table format: {0}")]
    UnsupportedFormat(String),
}
