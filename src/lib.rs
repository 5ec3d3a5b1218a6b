// Calify - Core Library
// Food resolution + nutrition ledger, shared by the CLI, API server, and tests

pub mod error;
pub mod entities;       // Reference foods + meal slots
pub mod resolver;       // Free text → food (exact, then substring)
pub mod nutrition;      // Macro math + daily goals
pub mod ledger;         // Per-meal / per-day running totals
pub mod summary;        // Display snapshots
pub mod intake;         // Transcription results → ledger
pub mod config;
pub mod logging;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::Config;
pub use entities::{normalize_food_name, FoodDatabase, FoodItem, MealSlot};
pub use error::{FoodTableError, LedgerError};
pub use intake::{IntakeOutcome, TranscriptionDetails, TranscriptionResult, VoiceIntake};
pub use ledger::{DayLedger, LoggedFood, MealLedgerEntry, NutritionLedger};
pub use nutrition::{
    calorie_macro_split, macro_percentages, DailyGoal, GoalProgress, MacroPercentages, MacroTotals,
};
pub use resolver::{FoodMatch, FoodResolver, MatchKind, ResolvedEntry, DEFAULT_FALLBACK_CALORIES};
pub use summary::{DaySummary, MealSummary, NutrientProgress};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
