// 🥗 Nutrition Math - Macro totals, percentages, daily goals
//
// Percentages are display values: rounded integers that may sum to 99 or 101.
// When there is nothing to divide by, an even 33/33/33 split is returned
// instead of 0/0/0 or NaN.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crate::error::LedgerError;

/// kcal per gram of protein
pub const PROTEIN_KCAL_PER_GRAM: f64 = 4.0;
/// kcal per gram of carbohydrate
pub const CARBS_KCAL_PER_GRAM: f64 = 4.0;
/// kcal per gram of fat
pub const FAT_KCAL_PER_GRAM: f64 = 9.0;

// ============================================================================
// MACRO TOTALS
// ============================================================================

/// Grams of each macronutrient
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroTotals {
    pub fn new(protein: f64, carbs: f64, fat: f64) -> Self {
        MacroTotals { protein, carbs, fat }
    }

    pub fn total_grams(&self) -> f64 {
        self.protein + self.carbs + self.fat
    }

    pub fn scaled(&self, factor: f64) -> Self {
        MacroTotals {
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
        }
    }

    /// Subtract, flooring each macro at zero (absorbs float residue)
    pub fn saturating_sub(&self, other: &MacroTotals) -> Self {
        MacroTotals {
            protein: (self.protein - other.protein).max(0.0),
            carbs: (self.carbs - other.carbs).max(0.0),
            fat: (self.fat - other.fat).max(0.0),
        }
    }

    /// Gram-based breakdown, see [`macro_percentages`]
    pub fn percentages(&self) -> MacroPercentages {
        macro_percentages(self.protein, self.carbs, self.fat)
    }
}

impl Add for MacroTotals {
    type Output = MacroTotals;

    fn add(self, other: MacroTotals) -> MacroTotals {
        MacroTotals {
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
        }
    }
}

impl AddAssign for MacroTotals {
    fn add_assign(&mut self, other: MacroTotals) {
        *self = *self + other;
    }
}

// ============================================================================
// MACRO PERCENTAGES
// ============================================================================

/// Rounded integer share of each macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroPercentages {
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

impl MacroPercentages {
    /// Display fallback used when there is nothing to split.
    /// Not a real percentage: it sums to 99.
    pub const EVEN_SPLIT: MacroPercentages = MacroPercentages {
        protein: 33,
        carbs: 33,
        fat: 33,
    };

    pub fn sum(&self) -> u32 {
        self.protein + self.carbs + self.fat
    }
}

fn percent_of(part: f64, whole: f64) -> u32 {
    (100.0 * part / whole).round().max(0.0) as u32
}

/// `round(100 * grams / total_grams)` for each macro.
///
/// Returns [`MacroPercentages::EVEN_SPLIT`] when total grams is zero.
pub fn macro_percentages(protein: f64, carbs: f64, fat: f64) -> MacroPercentages {
    let total = protein + carbs + fat;
    if !(total > 0.0) {
        return MacroPercentages::EVEN_SPLIT;
    }

    MacroPercentages {
        protein: percent_of(protein, total),
        carbs: percent_of(carbs, total),
        fat: percent_of(fat, total),
    }
}

/// Energy-based breakdown: share of `calories` coming from each macro,
/// using 4/4/9 kcal per gram.
///
/// Returns [`MacroPercentages::EVEN_SPLIT`] when `calories` is not positive.
pub fn calorie_macro_split(calories: f64, protein: f64, carbs: f64, fat: f64) -> MacroPercentages {
    if !(calories > 0.0) {
        return MacroPercentages::EVEN_SPLIT;
    }

    MacroPercentages {
        protein: percent_of(protein * PROTEIN_KCAL_PER_GRAM, calories),
        carbs: percent_of(carbs * CARBS_KCAL_PER_GRAM, calories),
        fat: percent_of(fat * FAT_KCAL_PER_GRAM, calories),
    }
}

// ============================================================================
// DAILY GOAL
// ============================================================================

/// Daily calorie and macro targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyGoal {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Default for DailyGoal {
    fn default() -> Self {
        DailyGoal {
            calories: 2000.0,
            protein: 150.0,
            carbs: 250.0,
            fat: 65.0,
        }
    }
}

impl DailyGoal {
    /// Default macro targets with a custom calorie target
    pub fn with_calories(calories: f64) -> Self {
        DailyGoal {
            calories,
            ..DailyGoal::default()
        }
    }

    /// Every target must be finite and positive
    pub fn validate(&self) -> Result<(), LedgerError> {
        [
            ("calorie", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
        ]
        .into_iter()
        .find(|(_, value)| !(value.is_finite() && *value > 0.0))
        .map_or(Ok(()), |(nutrient, value)| Err(LedgerError::InvalidGoal { nutrient, value }))
    }
}

/// Consumed vs target for one nutrient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub consumed: f64,
    pub target: f64,
    /// target - consumed; negative once the target is exceeded
    pub remaining: f64,
    /// Rounded share of the target, not capped at 100
    pub percent: u32,
}

impl GoalProgress {
    pub fn new(consumed: f64, target: f64) -> Self {
        let percent = if target > 0.0 { percent_of(consumed, target) } else { 0 };
        GoalProgress {
            consumed,
            target,
            remaining: target - consumed,
            percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_percentages() {
        let pct = macro_percentages(15.0, 25.0, 10.0);
        assert_eq!(pct, MacroPercentages { protein: 30, carbs: 50, fat: 20 });
    }

    #[test]
    fn test_macro_percentages_zero_grams_even_split() {
        let pct = macro_percentages(0.0, 0.0, 0.0);
        assert_eq!(pct, MacroPercentages::EVEN_SPLIT);
        assert_eq!(pct.sum(), 99);

        assert_eq!(MacroTotals::default().percentages(), MacroPercentages::EVEN_SPLIT);
    }

    #[test]
    fn test_macro_percentages_rounding() {
        // 1/3 each -> 33.33 rounds to 33
        let pct = macro_percentages(1.0, 1.0, 1.0);
        assert_eq!(pct, MacroPercentages { protein: 33, carbs: 33, fat: 33 });

        // 2/3 -> 66.67 rounds up
        let pct = macro_percentages(2.0, 1.0, 0.0);
        assert_eq!(pct, MacroPercentages { protein: 67, carbs: 33, fat: 0 });
    }

    #[test]
    fn test_calorie_macro_split() {
        // Chicken sandwich: 28*4=112, 35*4=140, 12*9=108 over 350 kcal
        let pct = calorie_macro_split(350.0, 28.0, 35.0, 12.0);
        assert_eq!(pct, MacroPercentages { protein: 32, carbs: 40, fat: 31 });

        assert_eq!(calorie_macro_split(0.0, 5.0, 5.0, 5.0), MacroPercentages::EVEN_SPLIT);
    }

    #[test]
    fn test_macro_totals_arithmetic() {
        let mut totals = MacroTotals::new(1.0, 2.0, 3.0);
        totals += MacroTotals::new(0.5, 0.5, 0.5);
        assert_eq!(totals, MacroTotals::new(1.5, 2.5, 3.5));
        assert_eq!(totals.total_grams(), 7.5);

        assert_eq!(MacroTotals::new(1.0, 2.0, 3.0).scaled(2.0), MacroTotals::new(2.0, 4.0, 6.0));

        let floored = MacroTotals::new(1.0, 1.0, 1.0).saturating_sub(&MacroTotals::new(2.0, 0.5, 1.0));
        assert_eq!(floored, MacroTotals::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn test_daily_goal_defaults() {
        let goal = DailyGoal::default();
        assert_eq!(goal.calories, 2000.0);
        assert_eq!(goal.protein, 150.0);
        assert_eq!(goal.carbs, 250.0);
        assert_eq!(goal.fat, 65.0);

        assert_eq!(DailyGoal::with_calories(1200.0).protein, 150.0);
    }

    #[test]
    fn test_daily_goal_validate() {
        assert_eq!(DailyGoal::default().validate(), Ok(()));
        assert_eq!(
            DailyGoal::with_calories(0.0).validate(),
            Err(LedgerError::InvalidGoal { nutrient: "calorie", value: 0.0 })
        );

        let goal = DailyGoal { fat: -1.0, ..DailyGoal::default() };
        assert_eq!(
            goal.validate(),
            Err(LedgerError::InvalidGoal { nutrient: "fat", value: -1.0 })
        );
    }

    #[test]
    fn test_goal_progress() {
        let progress = GoalProgress::new(1500.0, 1200.0);
        assert_eq!(progress.remaining, -300.0);
        assert_eq!(progress.percent, 125);

        assert_eq!(GoalProgress::new(10.0, 0.0).percent, 0);
    }
}
