// 📒 Nutrition Ledger - Per-meal and per-day running totals
//
// Invariant: running_total_calories == sum of the four meal calorie totals.
// Every mutation for one entry happens under a single write lock, so readers
// never see items appended without the matching calories, or the reverse.
// Entries are validated before the lock is taken.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::entities::MealSlot;
use crate::error::LedgerError;
use crate::nutrition::{DailyGoal, MacroPercentages, MacroTotals};
use crate::resolver::{check_quantity, display_label, ResolvedEntry};
use crate::summary::DaySummary;

/// Absolute floor when comparing the incremental and recomputed calorie totals
pub const TOTALS_EPSILON: f64 = 1e-6;

/// Allowed drift per kcal that has passed through the ledger
const RELATIVE_TOLERANCE: f64 = 1e-12;

// ============================================================================
// MEAL LEDGER ENTRY
// ============================================================================

/// Aggregate for one meal slot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealLedgerEntry {
    /// Display strings, in the order they were logged
    pub items: Vec<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MealLedgerEntry {
    pub fn macros(&self) -> MacroTotals {
        MacroTotals::new(self.protein, self.carbs, self.fat)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Gram-based macro split for this meal (33/33/33 when empty)
    pub fn macro_breakdown_percent(&self) -> MacroPercentages {
        self.macros().percentages()
    }

    fn add(&mut self, display_name: String, calories: f64, macros: MacroTotals) {
        self.items.push(display_name);
        self.calories += calories;
        self.protein += macros.protein;
        self.carbs += macros.carbs;
        self.fat += macros.fat;
    }

    fn replace_at(&mut self, position: usize, old: &LoggedFood, new: &LoggedFood) {
        self.items[position] = new.display_name.clone();
        self.calories = (self.calories - old.calories + new.calories).max(0.0);
        let macros = self.macros().saturating_sub(&old.macros) + new.macros;
        self.protein = macros.protein;
        self.carbs = macros.carbs;
        self.fat = macros.fat;
    }

    fn remove_at(&mut self, position: usize, calories: f64, macros: MacroTotals) {
        self.items.remove(position);

        if self.items.is_empty() {
            *self = MealLedgerEntry::default();
            return;
        }

        self.calories = (self.calories - calories).max(0.0);
        let remaining = self.macros().saturating_sub(&macros);
        self.protein = remaining.protein;
        self.carbs = remaining.carbs;
        self.fat = remaining.fat;
    }
}

// ============================================================================
// LOGGED FOOD
// ============================================================================

/// One applied entry, kept so it can be listed or removed later
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedFood {
    pub id: Uuid,
    pub meal: MealSlot,
    /// Food name, or the original text when unresolved
    pub name: String,
    pub display_name: String,
    pub quantity: f64,
    pub calories: f64,
    pub macros: MacroTotals,
    pub resolved: bool,
    pub confidence: Option<f64>,
    pub logged_at: DateTime<Utc>,
}

impl LoggedFood {
    fn from_entry(meal: MealSlot, entry: &ResolvedEntry) -> Self {
        LoggedFood {
            id: Uuid::new_v4(),
            meal,
            name: entry.name().to_string(),
            display_name: entry.display_name(),
            quantity: entry.quantity(),
            calories: entry.calories(),
            macros: entry.macros(),
            resolved: entry.is_resolved(),
            confidence: entry.confidence(),
            logged_at: Utc::now(),
        }
    }

    /// Same entry at a new serving count. Unresolved entries keep their
    /// flat estimate, like [`ResolvedEntry::with_quantity`].
    fn rescaled(&self, quantity: f64) -> LoggedFood {
        if !self.resolved {
            return self.clone();
        }

        let factor = quantity / self.quantity;
        LoggedFood {
            display_name: display_label(&self.name, quantity),
            quantity,
            calories: self.calories * factor,
            macros: self.macros.scaled(factor),
            ..self.clone()
        }
    }
}

// ============================================================================
// DAY LEDGER
// ============================================================================

/// Everything eaten on one day. Owned exclusively by a [`NutritionLedger`];
/// callers only ever see clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayLedger {
    date: NaiveDate,
    meals: [MealLedgerEntry; 4],
    running_calories: f64,
    /// Sum of |calories| added or taken away, scales the consistency tolerance
    calorie_volume: f64,
    log: Vec<LoggedFood>,
}

impl DayLedger {
    /// Empty ledger for a day key
    pub fn new(date: NaiveDate) -> Self {
        DayLedger {
            date,
            meals: Default::default(),
            running_calories: 0.0,
            calorie_volume: 0.0,
            log: Vec::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn meal(&self, slot: MealSlot) -> &MealLedgerEntry {
        &self.meals[slot.index()]
    }

    /// `(slot, entry)` pairs in display order
    pub fn meals(&self) -> impl Iterator<Item = (MealSlot, &MealLedgerEntry)> {
        MealSlot::ALL.into_iter().map(move |slot| (slot, self.meal(slot)))
    }

    /// Applied entries, oldest first
    pub fn entries(&self) -> &[LoggedFood] {
        &self.log
    }

    pub fn entry(&self, id: Uuid) -> Option<&LoggedFood> {
        self.log.iter().find(|logged| logged.id == id)
    }

    /// Sum of the four meal calorie totals
    pub fn total_calories(&self) -> f64 {
        self.meals.iter().map(|meal| meal.calories).sum()
    }

    /// Incrementally maintained day total
    pub fn running_total_calories(&self) -> f64 {
        self.running_calories
    }

    /// True when both calorie paths agree.
    ///
    /// Summation order differs between the two, so the allowed gap grows
    /// with the calories that have passed through the ledger.
    pub fn is_consistent(&self) -> bool {
        let tolerance = TOTALS_EPSILON.max(self.calorie_volume * RELATIVE_TOLERANCE);
        (self.total_calories() - self.running_calories).abs() <= tolerance
    }

    pub fn macro_totals(&self) -> MacroTotals {
        self.meals
            .iter()
            .fold(MacroTotals::default(), |acc, meal| acc + meal.macros())
    }

    /// Whole-day gram-based split.
    ///
    /// With no grams logged this returns the 33/33/33 display fallback,
    /// which is not a real percentage.
    pub fn macro_breakdown_percent(&self) -> MacroPercentages {
        self.macro_totals().percentages()
    }

    /// Same formula, scoped to one meal
    pub fn meal_macro_breakdown_percent(&self, slot: MealSlot) -> MacroPercentages {
        self.meal(slot).macro_breakdown_percent()
    }

    /// `daily_goal - total_calories()`. Negative once the goal is exceeded.
    pub fn calories_remaining(&self, daily_goal: f64) -> f64 {
        daily_goal - self.total_calories()
    }

    pub fn summary(&self, goal: &DailyGoal) -> DaySummary {
        DaySummary::from_ledger(self, goal)
    }

    fn apply(&mut self, slot: MealSlot, entry: &ResolvedEntry) -> LoggedFood {
        let logged = LoggedFood::from_entry(slot, entry);

        self.meals[slot.index()].add(logged.display_name.clone(), logged.calories, logged.macros);
        self.running_calories += logged.calories;
        self.calorie_volume += logged.calories;
        self.log.push(logged.clone());

        self.settle_running_total();
        logged
    }

    fn update(&mut self, id: Uuid, quantity: f64) -> Result<LoggedFood, LedgerError> {
        let index = self
            .log
            .iter()
            .position(|logged| logged.id == id)
            .ok_or(LedgerError::EntryNotFound(id))?;

        let old = self.log[index].clone();
        let new = old.rescaled(quantity);

        let position = self.meal_position(index, old.meal);
        self.meals[old.meal.index()].replace_at(position, &old, &new);

        self.running_calories = (self.running_calories - old.calories + new.calories).max(0.0);
        self.calorie_volume += old.calories + new.calories;
        self.log[index] = new.clone();

        self.settle_running_total();
        Ok(new)
    }

    fn remove(&mut self, id: Uuid) -> Result<LoggedFood, LedgerError> {
        let index = self
            .log
            .iter()
            .position(|logged| logged.id == id)
            .ok_or(LedgerError::EntryNotFound(id))?;

        let position = self.meal_position(index, self.log[index].meal);
        let removed = self.log.remove(index);

        self.meals[removed.meal.index()].remove_at(position, removed.calories, removed.macros);

        self.running_calories = if self.log.is_empty() {
            0.0
        } else {
            (self.running_calories - removed.calories).max(0.0)
        };
        self.calorie_volume += removed.calories;

        self.settle_running_total();
        Ok(removed)
    }

    /// Index of log entry `index` inside its meal's item list.
    /// Items in a meal follow log order for that meal.
    fn meal_position(&self, index: usize, meal: MealSlot) -> usize {
        self.log[..index].iter().filter(|logged| logged.meal == meal).count()
    }

    /// Re-anchor the running total if rounding pushed it past tolerance.
    /// Runs under the write lock, so it must never panic.
    fn settle_running_total(&mut self) {
        if !self.is_consistent() {
            let recomputed = self.total_calories();
            tracing::warn!(
                running = self.running_calories,
                recomputed,
                "Calorie totals drifted, resyncing running total"
            );
            self.running_calories = recomputed;
        }
    }
}

// ============================================================================
// NUTRITION LEDGER
// ============================================================================

/// Shared handle over one [`DayLedger`].
///
/// Clones share the same state. Reads return snapshots.
#[derive(Debug, Clone)]
pub struct NutritionLedger {
    state: Arc<RwLock<DayLedger>>,
}

impl NutritionLedger {
    /// Empty ledger for today (local time)
    pub fn new() -> Self {
        Self::for_day(Local::now().date_naive())
    }

    /// Empty ledger for a given day key
    pub fn for_day(date: NaiveDate) -> Self {
        NutritionLedger {
            state: Arc::new(RwLock::new(DayLedger::new(date))),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, DayLedger>, LedgerError> {
        self.state.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, DayLedger>, LedgerError> {
        self.state.write().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Apply an entry to a meal given as free text (trimmed, case-insensitive).
    ///
    /// An unknown meal fails with `InvalidMealSlot` and changes nothing.
    pub fn apply_entry(&self, meal: &str, entry: &ResolvedEntry) -> Result<LoggedFood, LedgerError> {
        let slot = MealSlot::parse(meal).map_err(|err| {
            tracing::warn!(meal = %meal, food = %entry.name(), "Rejected entry for unknown meal");
            err
        })?;
        self.apply_entry_to(slot, entry)
    }

    /// Apply an entry to a typed meal slot.
    ///
    /// Entries with a non-positive quantity or negative nutrients are
    /// rejected before the lock is taken.
    pub fn apply_entry_to(&self, slot: MealSlot, entry: &ResolvedEntry) -> Result<LoggedFood, LedgerError> {
        entry.validate().map_err(|err| {
            tracing::warn!(meal = %slot, food = %entry.name(), error = %err, "Rejected invalid entry");
            err
        })?;

        let logged = self.write()?.apply(slot, entry);

        tracing::info!(
            meal = %slot,
            food = %logged.display_name,
            calories = logged.calories,
            resolved = logged.resolved,
            "Logged food"
        );
        Ok(logged)
    }

    /// Undo a logged entry. Unknown ids fail with `EntryNotFound` and change nothing.
    pub fn remove_entry(&self, id: Uuid) -> Result<LoggedFood, LedgerError> {
        let removed = self.write()?.remove(id)?;
        tracing::info!(meal = %removed.meal, food = %removed.display_name, "Removed food");
        Ok(removed)
    }

    /// Change the serving count of a logged entry, keeping its id.
    ///
    /// The old contribution is swapped for the new one under one write lock.
    pub fn update_entry(&self, id: Uuid, quantity: f64) -> Result<LoggedFood, LedgerError> {
        check_quantity(quantity)?;

        let updated = self.write()?.update(id, quantity)?;
        tracing::info!(
            meal = %updated.meal,
            food = %updated.display_name,
            calories = updated.calories,
            "Updated food"
        );
        Ok(updated)
    }

    /// Replace the ledger with an empty one for `date`
    pub fn new_day(&self, date: NaiveDate) -> Result<(), LedgerError> {
        *self.write()? = DayLedger::new(date);
        tracing::info!(date = %date, "Started new day");
        Ok(())
    }

    /// Consistent copy of the whole day
    pub fn snapshot(&self) -> Result<DayLedger, LedgerError> {
        Ok(self.read()?.clone())
    }

    pub fn date(&self) -> Result<NaiveDate, LedgerError> {
        Ok(self.read()?.date())
    }

    pub fn meal(&self, slot: MealSlot) -> Result<MealLedgerEntry, LedgerError> {
        Ok(self.read()?.meal(slot).clone())
    }

    pub fn entries(&self) -> Result<Vec<LoggedFood>, LedgerError> {
        Ok(self.read()?.entries().to_vec())
    }

    /// One logged entry by id
    pub fn entry(&self, id: Uuid) -> Result<LoggedFood, LedgerError> {
        self.read()?
            .entry(id)
            .cloned()
            .ok_or(LedgerError::EntryNotFound(id))
    }

    pub fn total_calories(&self) -> Result<f64, LedgerError> {
        Ok(self.read()?.total_calories())
    }

    pub fn running_total_calories(&self) -> Result<f64, LedgerError> {
        Ok(self.read()?.running_total_calories())
    }

    pub fn macro_totals(&self) -> Result<MacroTotals, LedgerError> {
        Ok(self.read()?.macro_totals())
    }

    /// See [`DayLedger::macro_breakdown_percent`]
    pub fn macro_breakdown_percent(&self) -> Result<MacroPercentages, LedgerError> {
        Ok(self.read()?.macro_breakdown_percent())
    }

    pub fn meal_macro_breakdown_percent(&self, slot: MealSlot) -> Result<MacroPercentages, LedgerError> {
        Ok(self.read()?.meal_macro_breakdown_percent(slot))
    }

    pub fn calories_remaining(&self, daily_goal: f64) -> Result<f64, LedgerError> {
        Ok(self.read()?.calories_remaining(daily_goal))
    }

    pub fn summary(&self, goal: &DailyGoal) -> Result<DaySummary, LedgerError> {
        Ok(self.read()?.summary(goal))
    }
}

impl Default for NutritionLedger {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
