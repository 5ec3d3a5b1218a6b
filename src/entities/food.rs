// 🍎 Food Entity - Immutable reference nutrition data
//
// The reference table is an ORDERED list. Order is significant:
// partial matching returns the first hit in table order, so any loader
// must preserve the order of the source file.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::error::FoodTableError;

// ============================================================================
// FOOD ITEM
// ============================================================================

/// One row of the reference table. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    /// Canonical identifier (compared case-insensitively)
    pub name: String,

    /// Calories per serving (always > 0)
    pub calories: f64,

    /// Grams per serving
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,

    /// Serving size description, e.g. "1 medium (182g)"
    pub serving: String,

    /// Grouping tag, e.g. "fruits"
    pub category: String,
}

impl FoodItem {
    pub fn new(
        name: &str,
        calories: f64,
        protein: f64,
        carbs: f64,
        fat: f64,
        serving: &str,
        category: &str,
    ) -> Self {
        FoodItem {
            name: name.to_string(),
            calories,
            protein,
            carbs,
            fat,
            serving: serving.to_string(),
            category: category.to_string(),
        }
    }

    /// Normalized name used for all comparisons
    pub fn normalized_name(&self) -> String {
        normalize_food_name(&self.name)
    }

    /// Exact match against an already-normalized query
    pub fn matches_exactly(&self, normalized_query: &str) -> bool {
        self.normalized_name() == normalized_query
    }

    /// Bidirectional containment against an already-normalized query.
    ///
    /// The empty query is contained in every name, so it never matches here.
    pub fn matches_partially(&self, normalized_query: &str) -> bool {
        if normalized_query.is_empty() {
            return false;
        }
        let name = self.normalized_name();
        name.contains(normalized_query) || normalized_query.contains(name.as_str())
    }

    fn validate(&self, row: usize) -> Result<(), FoodTableError> {
        let reason = if normalize_food_name(&self.name).is_empty() {
            Some("name must not be empty".to_string())
        } else if !(self.calories.is_finite() && self.calories > 0.0) {
            Some(format!("calories must be positive, got {}", self.calories))
        } else {
            [("protein", self.protein), ("carbs", self.carbs), ("fat", self.fat)]
                .iter()
                .find(|(_, grams)| !(grams.is_finite() && *grams >= 0.0))
                .map(|(label, grams)| format!("{} must be non-negative, got {}", label, grams))
        };

        match reason {
            Some(reason) => Err(FoodTableError::InvalidRecord {
                row,
                name: self.name.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

// ============================================================================
// FOOD DATABASE
// ============================================================================

/// Ordered, immutable reference table.
///
/// Cloning is cheap; all clones share the same rows.
#[derive(Debug, Clone)]
pub struct FoodDatabase {
    foods: Arc<Vec<FoodItem>>,
}

impl FoodDatabase {
    /// Build a table from rows, validating each one. Order is kept as given.
    pub fn from_foods(foods: Vec<FoodItem>) -> Result<Self, FoodTableError> {
        for (index, food) in foods.iter().enumerate() {
            food.validate(index + 1)?;
        }
        Ok(FoodDatabase {
            foods: Arc::new(foods),
        })
    }

    /// Table pre-loaded with the built-in reference foods
    pub fn with_defaults() -> Self {
        FoodDatabase {
            foods: Arc::new(default_foods()),
        }
    }

    /// Load from CSV with header `name,calories,protein,carbs,fat,serving,category`
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, FoodTableError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut foods = Vec::new();
        for result in rdr.deserialize() {
            let food: FoodItem = result?;
            foods.push(food);
        }

        tracing::debug!(rows = foods.len(), "Parsed food table CSV");
        Self::from_foods(foods)
    }

    /// Load from a JSON array of food records
    pub fn from_json_str(json: &str) -> Result<Self, FoodTableError> {
        let foods: Vec<FoodItem> = serde_json::from_str(json)?;
        tracing::debug!(rows = foods.len(), "Parsed food table JSON");
        Self::from_foods(foods)
    }

    /// Load from a `.csv` or `.json` file, picked by extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FoodTableError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        let database = match extension.as_str() {
            "csv" => Self::from_csv_reader(std::fs::File::open(path)?)?,
            "json" => Self::from_json_str(&std::fs::read_to_string(path)?)?,
            other => return Err(FoodTableError::UnsupportedFormat(other.to_string())),
        };

        tracing::info!(path = %path.display(), foods = database.count(), "Loaded food table");
        Ok(database)
    }

    /// Rows in table order
    pub fn foods(&self) -> &[FoodItem] {
        &self.foods
    }

    /// Copy of every row, in table order
    pub fn all_foods(&self) -> Vec<FoodItem> {
        self.foods.to_vec()
    }

    pub fn count(&self) -> usize {
        self.foods.len()
    }

    /// Foods in a category (case-insensitive)
    pub fn by_category(&self, category: &str) -> Vec<FoodItem> {
        let wanted = normalize_food_name(category);
        self.foods
            .iter()
            .filter(|food| normalize_food_name(&food.category) == wanted)
            .cloned()
            .collect()
    }

    /// Unique categories, in first-seen order
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for food in self.foods.iter() {
            if !categories.contains(&food.category) {
                categories.push(food.category.clone());
            }
        }
        categories
    }

    /// Every food whose name contains `fragment` (case-insensitive).
    /// An empty fragment lists the whole table.
    pub fn search(&self, fragment: &str) -> Vec<FoodItem> {
        let needle = normalize_food_name(fragment);
        self.foods
            .iter()
            .filter(|food| food.normalized_name().contains(&needle))
            .cloned()
            .collect()
    }

    /// [`search`](Self::search) narrowed to [`by_category`](Self::by_category).
    /// `None` skips that filter.
    pub fn filter(&self, category: Option<&str>, search: Option<&str>) -> Vec<FoodItem> {
        let matches = self.search(search.unwrap_or_default());
        match category {
            Some(category) => {
                let in_category = self.by_category(category);
                matches
                    .into_iter()
                    .filter(|food| in_category.contains(food))
                    .collect()
            }
            None => matches,
        }
    }
}

impl Default for FoodDatabase {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Trim + lowercase
pub fn normalize_food_name(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Built-in reference table. Order matters for partial matching.
fn default_foods() -> Vec<FoodItem> {
    vec![
        FoodItem::new("apple", 95.0, 0.5, 25.0, 0.3, "1 medium (182g)", "fruits"),
        FoodItem::new("banana", 105.0, 1.3, 27.0, 0.4, "1 medium (118g)", "fruits"),
        FoodItem::new("orange", 62.0, 1.2, 15.4, 0.2, "1 medium (131g)", "fruits"),
        FoodItem::new("grilled chicken breast", 165.0, 31.0, 0.0, 3.6, "100g", "protein"),
        FoodItem::new("salmon", 208.0, 20.0, 0.0, 13.0, "100g", "protein"),
        FoodItem::new("chicken sandwich", 350.0, 28.0, 35.0, 12.0, "1 sandwich", "meal"),
        FoodItem::new("rice", 130.0, 2.7, 28.0, 0.3, "100g cooked", "grains"),
        FoodItem::new("bread", 75.0, 3.0, 13.0, 1.0, "1 slice", "grains"),
        FoodItem::new("pasta", 200.0, 7.0, 42.0, 1.2, "100g cooked", "grains"),
        FoodItem::new("milk", 122.0, 8.1, 12.0, 4.8, "240ml", "dairy"),
        FoodItem::new("yogurt", 150.0, 12.0, 17.0, 3.8, "170g", "dairy"),
        FoodItem::new("cheese", 113.0, 7.1, 0.9, 9.4, "30g", "dairy"),
        FoodItem::new("salad", 120.0, 3.0, 8.0, 9.0, "1 bowl", "vegetables"),
        FoodItem::new("broccoli", 55.0, 3.7, 11.2, 0.6, "100g cooked", "vegetables"),
        FoodItem::new("eggs", 78.0, 6.0, 0.6, 5.3, "1 large egg", "protein"),
        FoodItem::new("chocolate", 150.0, 2.0, 16.0, 9.0, "30g", "snacks"),
        FoodItem::new("avocado", 160.0, 2.0, 8.5, 14.7, "1/2 avocado", "fruits"),
        FoodItem::new("almonds", 164.0, 6.0, 6.0, 14.0, "30g (small handful)", "snacks"),
        FoodItem::new("oatmeal", 150.0, 5.6, 27.0, 2.5, "1 cup cooked", "grains"),
    ]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_table_order() {
        let db = FoodDatabase::with_defaults();
        assert_eq!(db.count(), 19);

        let names: Vec<&str> = db.foods().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names[0], "apple");
        assert_eq!(names[3], "grilled chicken breast");
        assert_eq!(names[5], "chicken sandwich");
        assert_eq!(names[18], "oatmeal");
    }

    #[test]
    fn test_default_table_is_valid() {
        let db = FoodDatabase::with_defaults();
        assert!(FoodDatabase::from_foods(db.all_foods()).is_ok());
    }

    #[test]
    fn test_partial_match_guards_empty_query() {
        let apple = FoodItem::new("apple", 95.0, 0.5, 25.0, 0.3, "1 medium", "fruits");
        assert!(!apple.matches_partially(""));
        assert!(apple.matches_partially("app"));
        assert!(apple.matches_partially("green apple slices"));
        assert!(!apple.matches_partially("banana"));
    }

    #[test]
    fn test_by_category() {
        let db = FoodDatabase::with_defaults();

        let fruits = db.by_category("FRUITS");
        let names: Vec<&str> = fruits.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "banana", "orange", "avocado"]);

        assert!(db.by_category("desserts").is_empty());
    }

    #[test]
    fn test_categories_first_seen_order() {
        let db = FoodDatabase::with_defaults();
        assert_eq!(
            db.categories(),
            vec!["fruits", "protein", "meal", "grains", "dairy", "vegetables", "snacks"]
        );
    }

    #[test]
    fn test_search() {
        let db = FoodDatabase::with_defaults();

        let chicken: Vec<String> = db.search("Chicken").into_iter().map(|f| f.name).collect();
        assert_eq!(chicken, vec!["grilled chicken breast", "chicken sandwich"]);

        assert_eq!(db.search("").len(), 19);
        assert!(db.search("pizza").is_empty());
    }

    #[test]
    fn test_filter_combines_category_and_search() {
        let db = FoodDatabase::with_defaults();

        let names = |foods: Vec<FoodItem>| foods.into_iter().map(|f| f.name).collect::<Vec<_>>();
        assert_eq!(names(db.filter(None, Some("chicken"))), vec!["grilled chicken breast", "chicken sandwich"]);
        assert_eq!(names(db.filter(Some("Meal"), Some("chicken"))), vec!["chicken sandwich"]);
        assert_eq!(db.filter(Some(" dairy "), None).len(), 3);
        assert_eq!(db.filter(None, None).len(), 19);

        let db = FoodDatabase::from_foods(vec![
            FoodItem::new("ratatouille", 90.0, 2.0, 12.0, 4.0, "1 bowl", "Légumes"),
            FoodItem::new("soupe", 70.0, 2.0, 10.0, 2.0, "1 bowl", "Soupes"),
        ])
        .unwrap();
        assert_eq!(names(db.filter(Some("LÉGUMES"), None)), vec!["ratatouille"]);
    }

    #[test]
    fn test_csv_preserves_order() {
        let csv = "name,calories,protein,carbs,fat,serving,category\n\
                   toast, 80, 3, 14, 1, 1 slice, grains\n\
                   butter toast,180,3,14,12,1 slice,grains\n";

        let db = FoodDatabase::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(db.count(), 2);
        assert_eq!(db.foods()[0].name, "toast");
        assert_eq!(db.foods()[0].serving, "1 slice");
        assert_eq!(db.foods()[1].name, "butter toast");
        assert_eq!(db.foods()[1].fat, 12.0);
    }

    #[test]
    fn test_csv_rejects_invalid_rows() {
        let csv = "name,calories,protein,carbs,fat,serving,category\n\
                   water,0,0,0,0,1 glass,drinks\n";
        let err = FoodDatabase::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, FoodTableError::InvalidRecord { row: 1, .. }));

        let csv = "name,calories,protein,carbs,fat,serving,category\n\
                   toast,80,-3,14,1,1 slice,grains\n";
        let err = FoodDatabase::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("protein"));

        let csv = "name,calories,protein,carbs,fat,serving,category\n\
                   toast,eighty,3,14,1,1 slice,grains\n";
        assert!(matches!(
            FoodDatabase::from_csv_reader(csv.as_bytes()),
            Err(FoodTableError::Csv(_))
        ));
    }

    #[test]
    fn test_json_table() {
        let json = r#"[
            {"name": "kiwi", "calories": 42, "protein": 0.8, "carbs": 10, "fat": 0.4,
             "serving": "1 fruit", "category": "fruits"},
            {"name": "  ", "calories": 10, "protein": 0, "carbs": 0, "fat": 0,
             "serving": "-", "category": "misc"}
        ]"#;

        let err = FoodDatabase::from_json_str(json).unwrap_err();
        assert!(matches!(err, FoodTableError::InvalidRecord { row: 2, .. }));

        let json = r#"[{"name": "kiwi", "calories": 42, "protein": 0.8, "carbs": 10,
                        "fat": 0.4, "serving": "1 fruit", "category": "fruits"}]"#;
        let db = FoodDatabase::from_json_str(json).unwrap();
        assert_eq!(db.foods()[0].calories, 42.0);
    }

    #[test]
    fn test_from_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("foods.csv");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        writeln!(file, "name,calories,protein,carbs,fat,serving,category").unwrap();
        writeln!(file, "pear,101,0.6,27,0.2,1 medium,fruits").unwrap();
        drop(file);

        let db = FoodDatabase::from_path(&csv_path).unwrap();
        assert_eq!(db.foods()[0].name, "pear");

        let txt_path = dir.path().join("foods.txt");
        std::fs::write(&txt_path, "pear").unwrap();
        assert!(matches!(
            FoodDatabase::from_path(&txt_path),
            Err(FoodTableError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            FoodDatabase::from_path(dir.path().join("missing.csv")),
            Err(FoodTableError::Io(_))
        ));
    }
}
