// ⚙️ Configuration
//
// Precedence: environment variables > JSON config file > defaults.
//
//   CALIFY_DAILY_GOAL         daily calorie target (kcal)
//   CALIFY_FALLBACK_CALORIES  calories for unrecognized food
//   CALIFY_FOOD_TABLE         path to a .csv or .json reference table
//   CALIFY_BIND_ADDR          server listen address

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::entities::FoodDatabase;
use crate::nutrition::DailyGoal;
use crate::resolver::{FoodResolver, DEFAULT_FALLBACK_CALORIES};

pub const ENV_DAILY_GOAL: &str = "CALIFY_DAILY_GOAL";
pub const ENV_FALLBACK_CALORIES: &str = "CALIFY_FALLBACK_CALORIES";
pub const ENV_FOOD_TABLE: &str = "CALIFY_FOOD_TABLE";
pub const ENV_BIND_ADDR: &str = "CALIFY_BIND_ADDR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub daily_goal: DailyGoal,
    pub fallback_calories: f64,
    /// Built-in table when unset
    pub food_table: Option<PathBuf>,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            daily_goal: DailyGoal::default(),
            fallback_calories: DEFAULT_FALLBACK_CALORIES,
            food_table: None,
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config = serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Optional file, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let vars: HashMap<String, String> = std::env::vars().collect();
        base.with_overrides(&vars)
    }

    /// Apply `CALIFY_*` overrides from a variable map
    pub fn with_overrides(mut self, vars: &HashMap<String, String>) -> Result<Self> {
        if let Some(value) = vars.get(ENV_DAILY_GOAL) {
            self.daily_goal.calories = parse_number(ENV_DAILY_GOAL, value)?;
        }
        if let Some(value) = vars.get(ENV_FALLBACK_CALORIES) {
            self.fallback_calories = parse_number(ENV_FALLBACK_CALORIES, value)?;
        }
        if let Some(value) = vars.get(ENV_FOOD_TABLE) {
            self.food_table = Some(PathBuf::from(value));
        }
        if let Some(value) = vars.get(ENV_BIND_ADDR) {
            self.bind_addr = value.clone();
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        self.daily_goal.validate().context("Invalid daily goal")?;
        if !(self.fallback_calories.is_finite() && self.fallback_calories >= 0.0) {
            anyhow::bail!("fallback calories must be non-negative, got {}", self.fallback_calories);
        }
        Ok(())
    }

    /// Configured table, or the built-in one
    pub fn food_database(&self) -> Result<FoodDatabase> {
        match &self.food_table {
            Some(path) => FoodDatabase::from_path(path)
                .with_context(|| format!("Failed to load food table: {:?}", path)),
            None => Ok(FoodDatabase::with_defaults()),
        }
    }

    pub fn resolver(&self) -> Result<FoodResolver> {
        FoodResolver::new(self.food_database()?)
            .with_fallback_calories(self.fallback_calories)
            .context("Invalid fallback calories")
    }
}

fn parse_number(name: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("{} must be a number, got {:?}", name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.daily_goal, DailyGoal::default());
        assert_eq!(config.fallback_calories, 100.0);
        assert!(config.food_table.is_none());
        assert_eq!(config.resolver().unwrap().database().count(), 19);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_overrides(&vars(&[
                (ENV_DAILY_GOAL, "1200"),
                (ENV_FALLBACK_CALORIES, " 150 "),
                (ENV_BIND_ADDR, "0.0.0.0:8080"),
            ]))
            .unwrap();

        assert_eq!(config.daily_goal.calories, 1200.0);
        assert_eq!(config.daily_goal.protein, 150.0);
        assert_eq!(config.fallback_calories, 150.0);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.resolver().unwrap().fallback_calories(), 150.0);
    }

    #[test]
    fn test_invalid_env_values() {
        let err = Config::default()
            .with_overrides(&vars(&[(ENV_DAILY_GOAL, "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_DAILY_GOAL));

        assert!(Config::default()
            .with_overrides(&vars(&[(ENV_DAILY_GOAL, "-5")]))
            .is_err());
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calify.json");
        std::fs::write(
            &path,
            r#"{"daily_goal": {"calories": 1800, "protein": 120, "carbs": 200, "fat": 60},
                "fallback_calories": 80}"#,
        )
        .unwrap();

        let from_file = Config::from_file(&path).unwrap();
        assert_eq!(from_file.daily_goal.calories, 1800.0);
        assert_eq!(from_file.fallback_calories, 80.0);
        assert_eq!(from_file.bind_addr, "127.0.0.1:3000");

        let merged = from_file
            .with_overrides(&vars(&[(ENV_FALLBACK_CALORIES, "90")]))
            .unwrap();
        assert_eq!(merged.daily_goal.calories, 1800.0);
        assert_eq!(merged.fallback_calories, 90.0);
    }

    #[test]
    fn test_missing_food_table_is_an_error() {
        let config = Config {
            food_table: Some(PathBuf::from("/nonexistent/foods.csv")),
            ..Config::default()
        };
        assert!(config.resolver().is_err());
    }
}
