//! Data models for food products, burn estimates and verdict history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product as returned by Open Food Facts. Only `code` is guaranteed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brands: Option<String>,
    #[serde(default)]
    pub categories_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition_grades: Option<String>,
    #[serde(default)]
    pub nutriments: Nutriments,
}

impl Product {
    /// Name to show the user, falling back to the barcode
    pub fn display_name(&self) -> &str {
        match self.product_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.code,
        }
    }
}

/// Nutrient mapping, keyed by the Open Food Facts wire names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutriments {
    #[serde(rename = "energy-kcal_serving", default, skip_serializing_if = "Option::is_none")]
    pub energy_kcal_serving: Option<f64>,
    #[serde(rename = "energy-kcal_100g", default, skip_serializing_if = "Option::is_none")]
    pub energy_kcal_100g: Option<f64>,
    #[serde(rename = "energy-kcal", default, skip_serializing_if = "Option::is_none")]
    pub energy_kcal: Option<f64>,
    #[serde(rename = "energy-kj_100g", default, skip_serializing_if = "Option::is_none")]
    pub energy_kj_100g: Option<f64>,
    #[serde(rename = "proteins_100g", default, skip_serializing_if = "Option::is_none")]
    pub proteins_100g: Option<f64>,
    #[serde(rename = "carbohydrates_100g", default, skip_serializing_if = "Option::is_none")]
    pub carbohydrates_100g: Option<f64>,
    #[serde(rename = "sugars_100g", default, skip_serializing_if = "Option::is_none")]
    pub sugars_100g: Option<f64>,
    #[serde(rename = "fat_100g", default, skip_serializing_if = "Option::is_none")]
    pub fat_100g: Option<f64>,
}

/// A known, non-negative energy value in kcal.
///
/// Holding one of these is what gates burn estimates and verdict recording;
/// an unknown value is represented by `Option::None` at the call site.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CalorieValue(f64);

impl CalorieValue {
    /// Returns `None` for negative or non-finite input
    pub fn new(kcal: f64) -> Option<Self> {
        (kcal.is_finite() && kcal >= 0.0).then_some(Self(kcal))
    }

    pub fn kcal(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for CalorieValue {
    type Error = String;

    fn try_from(kcal: f64) -> Result<Self, Self::Error> {
        Self::new(kcal).ok_or_else(|| format!("invalid calorie value {kcal}"))
    }
}

impl From<CalorieValue> for f64 {
    fn from(value: CalorieValue) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityUnit {
    #[serde(rename = "mins")]
    Minutes,
    #[serde(rename = "reps")]
    Reps,
}

impl ActivityUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityUnit::Minutes => "mins",
            ActivityUnit::Reps => "reps",
        }
    }
}

/// One row of the static burn-rate table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Activity {
    pub id: &'static str,
    pub label: &'static str,
    /// kcal per minute or per repetition, depending on `unit`
    pub rate: f64,
    pub unit: ActivityUnit,
}

/// How much of an activity it takes to burn a given energy value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseEstimate {
    pub id: &'static str,
    pub label: &'static str,
    pub amount: u64,
    pub unit: ActivityUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    WorthIt,
    NotWorthIt,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::WorthIt => write!(f, "worth it"),
            Verdict::NotWorthIt => write!(f, "not worth it"),
        }
    }
}

/// A recorded verdict. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub product: Product,
    pub date: DateTime<Utc>,
    pub verdict: Verdict,
    pub calories: CalorieValue,
}

/// Aggregate figures over the whole verdict history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub worth_it: usize,
    pub not_worth_it: usize,
    pub worth_it_percentage: u32,
    pub not_worth_it_percentage: u32,
    pub calories_to_burn_today: f64,
}

/// Per-100g macronutrients, each optional
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Macros {
    pub protein: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub sugars: Option<f64>,
    pub fat: Option<f64>,
}
