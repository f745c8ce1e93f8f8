//! Calorie extraction and burn estimate logic

use crate::models::{Activity, ActivityUnit, CalorieValue, ExerciseEstimate, Macros, Nutriments};

/// kJ per kcal
const KJ_PER_KCAL: f64 = 4.184;

/// Burn rates for an average adult (~70kg)
pub const ACTIVITIES: [Activity; 5] = [
    Activity {
        id: "running",
        label: "Running",
        rate: 11.5,
        unit: ActivityUnit::Minutes,
    },
    Activity {
        id: "walking",
        label: "Walking",
        rate: 5.0,
        unit: ActivityUnit::Minutes,
    },
    Activity {
        id: "cycling",
        label: "Cycling",
        rate: 8.0,
        unit: ActivityUnit::Minutes,
    },
    Activity {
        id: "burpees",
        label: "Burpees",
        rate: 1.2,
        unit: ActivityUnit::Reps,
    },
    Activity {
        id: "squats",
        label: "Squats",
        rate: 0.5,
        unit: ActivityUnit::Reps,
    },
];

/// Activity shown as the headline figure
pub const HEADLINE_ACTIVITY: &str = "running";

/// Pick the energy value of a product.
///
/// Preference: kcal per serving, kcal per 100g, generic kcal, then kJ per
/// 100g converted to kcal and rounded to 2 decimals. A reading of zero is a
/// real value, not missing data.
pub fn extract_calories(nutriments: &Nutriments) -> Option<CalorieValue> {
    let kcal = [
        nutriments.energy_kcal_serving,
        nutriments.energy_kcal_100g,
        nutriments.energy_kcal,
    ]
    .into_iter()
    .flatten()
    .find_map(CalorieValue::new);

    kcal.or_else(|| {
        nutriments
            .energy_kj_100g
            .and_then(|kj| CalorieValue::new(round_2dp(kj / KJ_PER_KCAL)))
    })
}

fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One estimate per activity, in table order: `ceil(kcal / rate)`
pub fn calculate_exercise(calories: CalorieValue) -> Vec<ExerciseEstimate> {
    ACTIVITIES
        .iter()
        .map(|activity| ExerciseEstimate {
            id: activity.id,
            label: activity.label,
            amount: (calories.kcal() / activity.rate).ceil() as u64,
            unit: activity.unit,
        })
        .collect()
}

/// The headline estimate (running), if present
pub fn headline(estimates: &[ExerciseEstimate]) -> Option<&ExerciseEstimate> {
    estimates.iter().find(|e| e.id == HEADLINE_ACTIVITY)
}

pub fn macros(nutriments: &Nutriments) -> Macros {
    Macros {
        protein: nutriments.proteins_100g,
        carbohydrates: nutriments.carbohydrates_100g,
        sugars: nutriments.sugars_100g,
        fat: nutriments.fat_100g,
    }
}
