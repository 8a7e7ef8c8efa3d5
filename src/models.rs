use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Biological sex used to pick the BMR equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Any key other than `male` selects the female equation.
    pub fn from_key(key: &str) -> Self {
        if key.trim().eq_ignore_ascii_case("male") {
            Sex::Male
        } else {
            Sex::Female
        }
    }
}

/// Lifestyle activity level; each maps to a fixed BMR multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 4] = [
        ActivityLevel::Sedentary,
        ActivityLevel::LightlyActive,
        ActivityLevel::ModeratelyActive,
        ActivityLevel::VeryActive,
    ];

    pub fn factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightlyActive",
            ActivityLevel::ModeratelyActive => "moderatelyActive",
            ActivityLevel::VeryActive => "veryActive",
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityLevel::ALL
            .into_iter()
            .find(|level| level.key() == s)
            .ok_or_else(|| Error::UnknownActivityLevel(s.to_string()))
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Biometrics entered at onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Age in years
    pub age: u32,
    pub sex: Sex,
    /// Height in cm
    pub height_cm: f64,
    /// Weight in kg
    pub weight_kg: f64,
    pub activity_level: ActivityLevel,
}

/// Daily calorie target derived from a [`UserProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalorieBudget {
    pub total_calories: i64,
}

/// Profile and budget persisted together once onboarding completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub profile: UserProfile,
    pub budget: CalorieBudget,
}

/// Time-of-day partition of the ledger. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];

    pub fn as_str(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
        }
    }

    /// Body text for the slot's reminder notification.
    pub fn reminder_message(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast awaits! Rise and shine!",
            MealSlot::Lunch => "Time to refuel with lunch!",
            MealSlot::Dinner => "Dinner is served, enjoy your meal!",
        }
    }
}

impl FromStr for MealSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("unknown meal slot: {s}")))
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identifier assigned to a meal when it enters the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named food and its calories, as it goes into the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub name: String,
    /// Calories (kcal)
    pub calories: f64,
}

impl FoodRecord {
    /// Negative and non-finite calories are stored as 0.
    pub fn new(name: impl Into<String>, calories: f64) -> Self {
        let calories = if calories.is_finite() && calories > 0.0 {
            calories
        } else {
            0.0
        };
        Self {
            name: name.into(),
            calories,
        }
    }
}

/// A food record that has been logged against a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedMeal {
    pub id: EntryId,
    pub name: String,
    /// Calories (kcal)
    pub calories: f64,
}

impl LoggedMeal {
    pub fn record(&self) -> FoodRecord {
        FoodRecord {
            name: self.name.clone(),
            calories: self.calories,
        }
    }
}

/// `labelNutrients` entry of a FoodData Central record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelNutrient {
    #[serde(default)]
    pub value: Option<f64>,
}

/// Nutrient entry as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNutrient {
    #[serde(default)]
    pub nutrient_name: String,
    #[serde(default)]
    pub unit_name: String,
    #[serde(default)]
    pub value: Option<f64>,
}

/// A food search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodSummary {
    pub fdc_id: u64,
    pub description: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub brand_owner: Option<String>,
    #[serde(default)]
    pub label_nutrients: HashMap<String, LabelNutrient>,
    #[serde(default)]
    pub food_nutrients: Vec<SearchNutrient>,
}

impl FoodSummary {
    /// Calories from the label, else from the `Energy` (kcal) nutrient, else 0.
    pub fn calories(&self) -> f64 {
        label_value(&self.label_nutrients, "calories")
            .or_else(|| {
                self.food_nutrients
                    .iter()
                    .find(|n| is_energy_kcal(&n.nutrient_name, &n.unit_name))
                    .and_then(|n| n.value)
            })
            .unwrap_or(0.0)
    }
}

/// Nutrient reference inside a details `foodNutrients` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit_name: String,
}

/// `foodNutrients` entry of the details endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodNutrient {
    #[serde(default)]
    pub nutrient: Option<NutrientInfo>,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Full record for a single food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDetails {
    pub fdc_id: u64,
    pub description: String,
    #[serde(default)]
    pub label_nutrients: HashMap<String, LabelNutrient>,
    #[serde(default)]
    pub food_nutrients: Vec<FoodNutrient>,
}

/// Per-serving nutrition shown before a food is logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutritionFacts {
    pub calories: f64,
    /// Protein (g)
    pub protein: Option<f64>,
    /// Carbohydrates (g)
    pub carbohydrates: Option<f64>,
    /// Fat (g)
    pub fat: Option<f64>,
}

impl FoodDetails {
    pub fn facts(&self) -> NutritionFacts {
        let calories = label_value(&self.label_nutrients, "calories")
            .or_else(|| {
                self.food_nutrients.iter().find_map(|n| {
                    let info = n.nutrient.as_ref()?;
                    if is_energy_kcal(&info.name, &info.unit_name) {
                        n.amount
                    } else {
                        None
                    }
                })
            })
            .unwrap_or(0.0);

        NutritionFacts {
            calories,
            protein: label_value(&self.label_nutrients, "protein"),
            carbohydrates: label_value(&self.label_nutrients, "carbohydrates"),
            fat: label_value(&self.label_nutrients, "fat"),
        }
    }

    pub fn to_record(&self) -> FoodRecord {
        FoodRecord::new(self.description.clone(), self.facts().calories)
    }
}

fn label_value(nutrients: &HashMap<String, LabelNutrient>, key: &str) -> Option<f64> {
    nutrients.get(key).and_then(|n| n.value)
}

fn is_energy_kcal(name: &str, unit: &str) -> bool {
    name.eq_ignore_ascii_case("energy") && unit.eq_ignore_ascii_case("kcal")
}
