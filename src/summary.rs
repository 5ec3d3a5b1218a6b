// 📊 Day Summary - Read-only snapshot for display
//
// Everything a dashboard needs in one serializable value: per-meal items and
// totals, day totals, macro split, and progress against the daily goal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::MealSlot;
use crate::ledger::DayLedger;
use crate::nutrition::{DailyGoal, GoalProgress, MacroPercentages, MacroTotals};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSummary {
    pub meal: MealSlot,
    pub items: Vec<String>,
    pub calories: f64,
    pub macros: MacroTotals,
    pub macro_percent: MacroPercentages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientProgress {
    pub calories: GoalProgress,
    pub protein: GoalProgress,
    pub carbs: GoalProgress,
    pub fat: GoalProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub meals: Vec<MealSummary>,
    pub total_calories: f64,
    pub macros: MacroTotals,
    /// 33/33/33 when nothing with macros has been logged
    pub macro_percent: MacroPercentages,
    pub goal: DailyGoal,
    /// May be negative
    pub calories_remaining: f64,
    pub progress: NutrientProgress,
    pub entries_count: usize,
}

impl DaySummary {
    pub fn from_ledger(ledger: &DayLedger, goal: &DailyGoal) -> Self {
        let meals = ledger
            .meals()
            .map(|(slot, meal)| MealSummary {
                meal: slot,
                items: meal.items.clone(),
                calories: meal.calories,
                macros: meal.macros(),
                macro_percent: meal.macro_breakdown_percent(),
            })
            .collect();

        let total_calories = ledger.total_calories();
        let macros = ledger.macro_totals();

        DaySummary {
            date: ledger.date(),
            meals,
            total_calories,
            macros,
            macro_percent: macros.percentages(),
            goal: *goal,
            calories_remaining: ledger.calories_remaining(goal.calories),
            progress: NutrientProgress {
                calories: GoalProgress::new(total_calories, goal.calories),
                protein: GoalProgress::new(macros.protein, goal.protein),
                carbs: GoalProgress::new(macros.carbs, goal.carbs),
                fat: GoalProgress::new(macros.fat, goal.fat),
            },
            entries_count: ledger.entries().len(),
        }
    }

    pub fn meal(&self, slot: MealSlot) -> Option<&MealSummary> {
        self.meals.iter().find(|meal| meal.meal == slot)
    }

    /// Multi-line, human-readable rendering
    pub fn render_text(&self) -> String {
        let mut out = format!(
            "📅 {}\nEaten: {:.0} kcal  Goal: {:.0} kcal  Remaining: {:.0} kcal\n",
            self.date, self.total_calories, self.goal.calories, self.calories_remaining
        );

        out.push_str(&format!(
            "Macros: P {:.1}g ({}%)  C {:.1}g ({}%)  F {:.1}g ({}%)\n",
            self.macros.protein,
            self.macro_percent.protein,
            self.macros.carbs,
            self.macro_percent.carbs,
            self.macros.fat,
            self.macro_percent.fat,
        ));

        for meal in &self.meals {
            if meal.items.is_empty() {
                out.push_str(&format!("\n{}: No items added yet\n", meal.meal));
            } else {
                out.push_str(&format!(
                    "\n{}: {}\n  {:.0} kcal • P: {:.1}g • C: {:.1}g • F: {:.1}g\n",
                    meal.meal,
                    meal.items.join(", "),
                    meal.calories,
                    meal.macros.protein,
                    meal.macros.carbs,
                    meal.macros.fat,
                ));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::NutritionLedger;
    use crate::resolver::FoodResolver;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_summary_of_empty_day() {
        let ledger = NutritionLedger::for_day(day());
        let summary = ledger.summary(&DailyGoal::default()).unwrap();

        assert_eq!(summary.date, day());
        assert_eq!(summary.meals.len(), 4);
        assert_eq!(summary.total_calories, 0.0);
        assert_eq!(summary.calories_remaining, 2000.0);
        assert_eq!(summary.macro_percent, MacroPercentages::EVEN_SPLIT);
        assert_eq!(summary.entries_count, 0);
        assert!(summary.render_text().contains("breakfast: No items added yet"));
    }

    #[test]
    fn test_summary_totals_and_progress() {
        let resolver = FoodResolver::with_defaults();
        let ledger = NutritionLedger::for_day(day());
        ledger.apply_entry("breakfast", &resolver.resolve("apple")).unwrap();
        ledger.apply_entry("lunch", &resolver.resolve("salad")).unwrap();

        let summary = ledger.summary(&DailyGoal::with_calories(200.0)).unwrap();

        assert_eq!(summary.total_calories, 215.0);
        assert_eq!(summary.calories_remaining, -15.0);
        assert_eq!(summary.progress.calories.percent, 108);
        assert_eq!(summary.entries_count, 2);

        let breakfast = summary.meal(MealSlot::Breakfast).unwrap();
        assert_eq!(breakfast.items, vec!["apple"]);
        assert_eq!(breakfast.calories, 95.0);

        let text = summary.render_text();
        assert!(text.contains("lunch: salad"));
        assert!(text.contains("Remaining: -15 kcal"));
    }

    #[test]
    fn test_summary_serializes() {
        let ledger = NutritionLedger::for_day(day());
        let summary = ledger.summary(&DailyGoal::default()).unwrap();

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["date"], "2025-06-01");
        assert_eq!(json["meals"][2]["meal"], "dinner");
        assert_eq!(json["macro_percent"]["fat"], 33);
    }
}
