// 🔎 Food Resolver - Free text → reference food
//
// Exact match first, then bidirectional substring match, first hit in
// table order wins. No state, no side effects.

use serde::{Deserialize, Serialize};

use crate::entities::{normalize_food_name, FoodDatabase, FoodItem};
use crate::error::LedgerError;
use crate::nutrition::MacroTotals;

/// Calories assumed for food the resolver cannot identify
pub const DEFAULT_FALLBACK_CALORIES: f64 = 100.0;

/// Confidence attached to an exact name match
pub const EXACT_MATCH_CONFIDENCE: f64 = 1.0;

/// Confidence attached to a substring match
pub const PARTIAL_MATCH_CONFIDENCE: f64 = 0.7;

// ============================================================================
// MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Partial,
}

impl MatchKind {
    pub fn confidence(&self) -> f64 {
        match self {
            MatchKind::Exact => EXACT_MATCH_CONFIDENCE,
            MatchKind::Partial => PARTIAL_MATCH_CONFIDENCE,
        }
    }
}

/// A reference row plus how it was found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodMatch {
    pub food: FoodItem,
    pub kind: MatchKind,
}

// ============================================================================
// RESOLVED ENTRY
// ============================================================================

/// Outcome of resolving one utterance, ready to be applied to a ledger.
///
/// `Unresolved` is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolvedEntry {
    Resolved {
        food: FoodItem,
        quantity: f64,
        confidence: f64,
    },
    Unresolved {
        /// Original text, verbatim
        query: String,
        /// Caller-assigned estimate
        calories: f64,
    },
}

impl ResolvedEntry {
    /// One serving of `food`, exact-match confidence
    pub fn resolved(food: FoodItem) -> Self {
        ResolvedEntry::Resolved {
            food,
            quantity: 1.0,
            confidence: EXACT_MATCH_CONFIDENCE,
        }
    }

    pub fn unresolved(query: &str, calories: f64) -> Self {
        ResolvedEntry::Unresolved {
            query: query.to_string(),
            calories,
        }
    }

    /// Same entry with a different serving count. Unresolved entries
    /// keep their flat estimate.
    pub fn with_quantity(self, quantity: f64) -> Result<Self, LedgerError> {
        check_quantity(quantity)?;

        Ok(match self {
            ResolvedEntry::Resolved { food, confidence, .. } => ResolvedEntry::Resolved {
                food,
                quantity,
                confidence,
            },
            unresolved => unresolved,
        })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolvedEntry::Resolved { .. })
    }

    pub fn quantity(&self) -> f64 {
        match self {
            ResolvedEntry::Resolved { quantity, .. } => *quantity,
            ResolvedEntry::Unresolved { .. } => 1.0,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            ResolvedEntry::Resolved { confidence, .. } => Some(*confidence),
            ResolvedEntry::Unresolved { .. } => None,
        }
    }

    /// Food name, or the original text when unresolved
    pub fn name(&self) -> &str {
        match self {
            ResolvedEntry::Resolved { food, .. } => &food.name,
            ResolvedEntry::Unresolved { query, .. } => query,
        }
    }

    /// String shown in a meal's item list, e.g. "apple" or "2 x eggs"
    pub fn display_name(&self) -> String {
        display_label(self.name(), self.quantity())
    }

    /// Check the entry can be applied without driving any total negative.
    ///
    /// Variants are public, so entries built by hand skip the checks in
    /// [`ResolvedEntry::with_quantity`] and [`FoodResolver::with_fallback_calories`].
    pub fn validate(&self) -> Result<(), LedgerError> {
        match self {
            ResolvedEntry::Resolved { food, quantity, .. } => {
                check_quantity(*quantity)?;
                check_nutrient("calories", food.calories)?;
                check_nutrient("protein", food.protein)?;
                check_nutrient("carbs", food.carbs)?;
                check_nutrient("fat", food.fat)
            }
            ResolvedEntry::Unresolved { calories, .. } => check_nutrient("calories", *calories),
        }
    }

    /// Calories this entry contributes
    pub fn calories(&self) -> f64 {
        match self {
            ResolvedEntry::Resolved { food, quantity, .. } => food.calories * quantity,
            ResolvedEntry::Unresolved { calories, .. } => *calories,
        }
    }

    /// Macros this entry contributes (zero when unresolved)
    pub fn macros(&self) -> MacroTotals {
        match self {
            ResolvedEntry::Resolved { food, quantity, .. } => {
                MacroTotals::new(food.protein, food.carbs, food.fat).scaled(*quantity)
            }
            ResolvedEntry::Unresolved { .. } => MacroTotals::default(),
        }
    }
}

/// "apple" for one serving, "2 x eggs" otherwise
pub(crate) fn display_label(name: &str, quantity: f64) -> String {
    if quantity == 1.0 {
        name.to_string()
    } else {
        format!("{} x {}", quantity, name)
    }
}

pub(crate) fn check_quantity(quantity: f64) -> Result<(), LedgerError> {
    if quantity.is_finite() && quantity > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidQuantity(quantity))
    }
}

fn check_nutrient(nutrient: &'static str, value: f64) -> Result<(), LedgerError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidNutrient { nutrient, value })
    }
}

// ============================================================================
// FOOD RESOLVER
// ============================================================================

#[derive(Debug, Clone)]
pub struct FoodResolver {
    database: FoodDatabase,
    fallback_calories: f64,
}

impl FoodResolver {
    pub fn new(database: FoodDatabase) -> Self {
        FoodResolver {
            database,
            fallback_calories: DEFAULT_FALLBACK_CALORIES,
        }
    }

    /// Resolver over the built-in table with the standard 100 kcal fallback
    pub fn with_defaults() -> Self {
        Self::new(FoodDatabase::with_defaults())
    }

    /// Fails with `InvalidNutrient` unless `calories` is finite and non-negative
    pub fn with_fallback_calories(mut self, calories: f64) -> Result<Self, LedgerError> {
        check_nutrient("calories", calories)?;
        self.fallback_calories = calories;
        Ok(self)
    }

    pub fn database(&self) -> &FoodDatabase {
        &self.database
    }

    pub fn fallback_calories(&self) -> f64 {
        self.fallback_calories
    }

    /// Look a query up in the table.
    ///
    /// Empty or whitespace-only queries never match.
    pub fn find(&self, query: &str) -> Option<FoodMatch> {
        let normalized = normalize_food_name(query);
        if normalized.is_empty() {
            return None;
        }

        let foods = self.database.foods();

        if let Some(food) = foods.iter().find(|food| food.matches_exactly(&normalized)) {
            return Some(FoodMatch {
                food: food.clone(),
                kind: MatchKind::Exact,
            });
        }

        foods
            .iter()
            .find(|food| food.matches_partially(&normalized))
            .map(|food| FoodMatch {
                food: food.clone(),
                kind: MatchKind::Partial,
            })
    }

    /// Resolve to one serving, or `Unresolved` carrying the fallback calories
    pub fn resolve(&self, query: &str) -> ResolvedEntry {
        match self.find(query) {
            Some(found) => {
                tracing::debug!(
                    query = %query,
                    food = %found.food.name,
                    kind = ?found.kind,
                    "Resolved food"
                );
                ResolvedEntry::Resolved {
                    confidence: found.kind.confidence(),
                    food: found.food,
                    quantity: 1.0,
                }
            }
            None => {
                tracing::debug!(query = %query, "No food match");
                ResolvedEntry::unresolved(query, self.fallback_calories)
            }
        }
    }

    /// Resolve with an explicit serving count
    pub fn resolve_entry(&self, query: &str, quantity: f64) -> Result<ResolvedEntry, LedgerError> {
        self.resolve(query).with_quantity(quantity)
    }
}

impl Default for FoodResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// TESTS
// ============================================================================
