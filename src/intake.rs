// 🎙️ Voice Intake - Transcription result → ledger entry
//
// The voice collaborator hands over a structured result. A failed result
// never touches the ledger. A result without a meal is rejected rather than
// defaulted to breakfast.

use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::{FoodItem, MealSlot};
use crate::error::LedgerError;
use crate::ledger::{LoggedFood, NutritionLedger};
use crate::resolver::{FoodResolver, ResolvedEntry};

/// Category tag for foods described only by the transcription service
pub const TRANSCRIBED_CATEGORY: &str = "transcribed";

// ============================================================================
// TRANSCRIPTION RESULT
// ============================================================================

/// Structured output of the speech-to-text collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    #[serde(default)]
    pub success: bool,
    pub food: Option<String>,
    pub meal: Option<String>,
    pub calories: Option<f64>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub message: Option<String>,
    pub details: Option<TranscriptionDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionDetails {
    /// Some services send this as a string ("0.92")
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub alternatives: Vec<String>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

impl TranscriptionResult {
    /// Successful result for `food` in `meal`
    pub fn recognized(food: &str, meal: &str) -> Self {
        TranscriptionResult {
            success: true,
            food: Some(food.to_string()),
            meal: Some(meal.to_string()),
            ..Default::default()
        }
    }

    pub fn failed(message: &str) -> Self {
        TranscriptionResult {
            success: false,
            message: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn confidence(&self) -> Option<f64> {
        self.details.as_ref().and_then(|d| d.confidence)
    }

    /// Food described by the collaborator itself, used when the reference
    /// table has no match but the service supplied calories.
    fn described_food(&self, name: &str) -> Option<FoodItem> {
        let calories = self.calories.filter(|c| c.is_finite() && *c > 0.0)?;
        let grams = |value: Option<f64>| value.filter(|g| g.is_finite()).unwrap_or(0.0).max(0.0);
        let details = self.details.clone().unwrap_or_default();

        Some(FoodItem {
            name: name.to_string(),
            calories,
            protein: grams(details.protein),
            carbs: grams(details.carbs),
            fat: grams(details.fat),
            serving: self.unit.clone().unwrap_or_else(|| "serving".to_string()),
            category: TRANSCRIBED_CATEGORY.to_string(),
        })
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

// ============================================================================
// INTAKE OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntakeOutcome {
    /// Entry applied to the ledger
    Logged { entry: LoggedFood },
    /// Nothing applied; reason is for user-facing messaging
    Skipped { reason: String },
}

impl IntakeOutcome {
    pub fn is_logged(&self) -> bool {
        matches!(self, IntakeOutcome::Logged { .. })
    }
}

// ============================================================================
// VOICE INTAKE
// ============================================================================

/// Resolver + ledger, wired together for the voice workflow
#[derive(Debug, Clone)]
pub struct VoiceIntake {
    resolver: FoodResolver,
    ledger: NutritionLedger,
}

impl VoiceIntake {
    pub fn new(resolver: FoodResolver, ledger: NutritionLedger) -> Self {
        VoiceIntake { resolver, ledger }
    }

    pub fn resolver(&self) -> &FoodResolver {
        &self.resolver
    }

    pub fn ledger(&self) -> &NutritionLedger {
        &self.ledger
    }

    /// Turn a transcription result into a ledger entry.
    ///
    /// Meal and quantity are validated before anything is applied, so an
    /// error leaves the ledger untouched.
    pub fn process(&self, result: &TranscriptionResult) -> Result<IntakeOutcome, LedgerError> {
        if !result.success {
            let reason = result
                .message
                .clone()
                .unwrap_or_else(|| "Transcription failed".to_string());
            tracing::debug!(reason = %reason, "Skipping failed transcription");
            return Ok(IntakeOutcome::Skipped { reason });
        }

        let food = match result.food.as_deref().map(str::trim) {
            Some(food) if !food.is_empty() => food,
            _ => {
                tracing::debug!("Skipping transcription without food");
                return Ok(IntakeOutcome::Skipped {
                    reason: "No food recognized".to_string(),
                });
            }
        };

        let slot = MealSlot::parse(result.meal.as_deref().unwrap_or_default())?;
        let entry = self.entry_for(food, result)?;

        let logged = self.ledger.apply_entry_to(slot, &entry)?;
        Ok(IntakeOutcome::Logged { entry: logged })
    }

    /// Process a batch in order, stopping at the first error
    pub fn process_all(&self, results: &[TranscriptionResult]) -> Result<Vec<IntakeOutcome>, LedgerError> {
        results.iter().map(|result| self.process(result)).collect()
    }

    fn entry_for(&self, food: &str, result: &TranscriptionResult) -> Result<ResolvedEntry, LedgerError> {
        let quantity = result.quantity.unwrap_or(1.0);

        let entry = match self.resolver.find(food) {
            Some(found) => ResolvedEntry::Resolved {
                confidence: result.confidence().unwrap_or_else(|| found.kind.confidence()),
                food: found.food,
                quantity: 1.0,
            },
            None => match result.described_food(food) {
                Some(described) => ResolvedEntry::Resolved {
                    food: described,
                    quantity: 1.0,
                    confidence: result.confidence().unwrap_or(0.0),
                },
                None => ResolvedEntry::unresolved(food, self.resolver.fallback_calories()),
            },
        };

        entry.with_quantity(quantity)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::MacroTotals;
    use chrono::NaiveDate;

    fn intake() -> VoiceIntake {
        let ledger = NutritionLedger::for_day(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        VoiceIntake::new(FoodResolver::with_defaults(), ledger)
    }

    fn logged(outcome: IntakeOutcome) -> LoggedFood {
        match outcome {
            IntakeOutcome::Logged { entry } => entry,
            other => panic!("expected logged outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_transcription_is_skipped() {
        let intake = intake();

        let outcome = intake
            .process(&TranscriptionResult::failed("Network timeout"))
            .unwrap();

        assert_eq!(
            outcome,
            IntakeOutcome::Skipped {
                reason: "Network timeout".to_string()
            }
        );
        assert!(intake.ledger().entries().unwrap().is_empty());
    }

    #[test]
    fn test_blank_food_is_skipped() {
        let intake = intake();
        let result = TranscriptionResult::recognized("   ", "lunch");

        assert!(!intake.process(&result).unwrap().is_logged());
        assert_eq!(intake.ledger().total_calories().unwrap(), 0.0);
    }

    #[test]
    fn test_known_food_uses_reference_values() {
        let intake = intake();
        let mut result = TranscriptionResult::recognized("Banana", "Breakfast");
        // Collaborator numbers are ignored when the table knows the food
        result.calories = Some(999.0);

        let entry = logged(intake.process(&result).unwrap());

        assert_eq!(entry.meal, MealSlot::Breakfast);
        assert_eq!(entry.name, "banana");
        assert_eq!(entry.calories, 105.0);
        assert_eq!(entry.confidence, Some(1.0));
    }

    #[test]
    fn test_missing_meal_is_rejected() {
        let intake = intake();
        let result = TranscriptionResult {
            success: true,
            food: Some("apple".to_string()),
            ..Default::default()
        };

        assert_eq!(
            intake.process(&result),
            Err(LedgerError::InvalidMealSlot(String::new()))
        );
        assert!(intake.ledger().entries().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_meal_is_rejected() {
        let intake = intake();
        let result = TranscriptionResult::recognized("apple", "brunch");

        assert!(matches!(
            intake.process(&result),
            Err(LedgerError::InvalidMealSlot(_))
        ));
        assert_eq!(intake.ledger().total_calories().unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_food_uses_collaborator_values() {
        let intake = intake();
        let json = r#"{
            "success": true,
            "food": "pad thai",
            "meal": "dinner",
            "calories": 550,
            "unit": "1 plate",
            "details": {"confidence": "0.81", "protein": 20, "carbs": 70, "fat": 18}
        }"#;
        let result: TranscriptionResult = serde_json::from_str(json).unwrap();

        let entry = logged(intake.process(&result).unwrap());

        assert!(entry.resolved);
        assert_eq!(entry.calories, 550.0);
        assert_eq!(entry.macros, MacroTotals::new(20.0, 70.0, 18.0));
        assert_eq!(entry.confidence, Some(0.81));
    }

    #[test]
    fn test_unknown_food_without_calories_uses_fallback() {
        let intake = intake();
        let result = TranscriptionResult::recognized("xyznotfood", "snack");

        let entry = logged(intake.process(&result).unwrap());

        assert!(!entry.resolved);
        assert_eq!(entry.calories, 100.0);
        assert_eq!(entry.macros, MacroTotals::default());
        assert_eq!(intake.ledger().meal(MealSlot::Snack).unwrap().items, vec!["xyznotfood"]);
    }

    #[test]
    fn test_quantity_is_applied() {
        let intake = intake();
        let mut result = TranscriptionResult::recognized("eggs", "breakfast");
        result.quantity = Some(3.0);

        let entry = logged(intake.process(&result).unwrap());
        assert_eq!(entry.calories, 234.0);
        assert_eq!(entry.display_name, "3 x eggs");

        result.quantity = Some(-1.0);
        assert_eq!(intake.process(&result), Err(LedgerError::InvalidQuantity(-1.0)));
        assert_eq!(intake.ledger().entries().unwrap().len(), 1);
    }

    #[test]
    fn test_process_all_in_order() {
        let intake = intake();
        let results = vec![
            TranscriptionResult::recognized("apple", "breakfast"),
            TranscriptionResult::failed("could not hear"),
            TranscriptionResult::recognized("salad", "lunch"),
        ];

        let outcomes = intake.process_all(&results).unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_logged());
        assert!(!outcomes[1].is_logged());
        assert_eq!(intake.ledger().total_calories().unwrap(), 215.0);
    }

    #[test]
    fn test_mock_payload_shape_parses() {
        let json = r#"{
            "success": true,
            "message": "Successfully processed audio",
            "food": "yogurt",
            "calories": 150,
            "meal": "snack",
            "details": {"food": "yogurt", "calories": 150, "meal": "snack", "confidence": "0.42"}
        }"#;

        let result: TranscriptionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.details.as_ref().unwrap().confidence, Some(0.42));
        assert!(result.details.as_ref().unwrap().alternatives.is_empty());
    }
}
