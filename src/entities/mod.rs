// Entity Models
// Reference foods are immutable values; meal slots are a closed set.

pub mod food;
pub mod meal;

pub use food::{normalize_food_name, FoodDatabase, FoodItem};
pub use meal::MealSlot;
