//! Plain-text rendering of products, burn estimates and history

use std::fmt::Write;

use crate::calculator;
use crate::models::{CalorieValue, ExerciseEstimate, HistoryEntry, Product, Stats};

/// Product card: name, brand, serving, energy and macro grid
pub fn format_product(product: &Product, calories: Option<CalorieValue>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{} [{}]", product.display_name(), product.code);
    if let Some(brands) = &product.brands {
        let _ = writeln!(output, "  Brand:   {brands}");
    }
    if let Some(serving) = &product.serving_size {
        let _ = writeln!(output, "  Serving: {serving}");
    }
    if let Some(grade) = &product.nutrition_grades {
        let _ = writeln!(output, "  Grade:   {}", grade.to_uppercase());
    }

    match calories {
        Some(c) => {
            let _ = writeln!(output, "  Energy:  {:.2} kcal", c.kcal());
        }
        None => {
            let _ = writeln!(output, "  Energy:  ? kcal");
        }
    }

    let m = calculator::macros(&product.nutriments);
    let _ = writeln!(
        output,
        "  Per 100g: protein {}  carbs {}  sugars {}  fat {}",
        grams(m.protein),
        grams(m.carbohydrates),
        grams(m.sugars),
        grams(m.fat)
    );

    output
}

fn grams(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}g"))
}

/// Headline activity first, then the other burn options
pub fn format_estimates(estimates: &[ExerciseEstimate]) -> String {
    let mut output = String::new();

    if let Some(main) = calculator::headline(estimates) {
        let _ = writeln!(
            output,
            "To burn it off: {} {} of {}",
            main.amount,
            main.unit.as_str(),
            main.label.to_lowercase()
        );
    }

    let _ = writeln!(output, "Burn options:");
    for e in estimates
        .iter()
        .filter(|e| e.id != calculator::HEADLINE_ACTIVITY)
    {
        let _ = writeln!(output, "  {:<10} {:>6} {}", e.label, e.amount, e.unit.as_str());
    }

    output
}

pub fn format_alternatives(alternatives: &[Product]) -> String {
    let mut output = String::from("Healthier alternatives:\n");
    for alt in alternatives {
        let energy = calculator::extract_calories(&alt.nutriments)
            .map_or_else(|| "? kcal".to_string(), |c| format!("{:.0} kcal", c.kcal()));
        let _ = writeln!(output, "  {} [{}] {}", alt.display_name(), alt.code, energy);
    }
    output
}

pub fn format_history(entries: &[HistoryEntry]) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<36} {:<16} {:<13} {:>9}  {}",
        "ID", "Date", "Verdict", "kcal", "Product"
    );
    let _ = writeln!(output, "{}", "-".repeat(90));
    for e in entries {
        let _ = writeln!(
            output,
            "{:<36} {:<16} {:<13} {:>9.2}  {}",
            e.id,
            e.date
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            e.verdict.to_string(),
            e.calories.kcal(),
            e.product.display_name()
        );
    }
    output
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Verdict Summary ===")?;
        writeln!(f, "Total:        {}", self.total)?;
        writeln!(
            f,
            "Worth it:     {} ({}%)",
            self.worth_it, self.worth_it_percentage
        )?;
        writeln!(
            f,
            "Not worth it: {} ({}%)",
            self.not_worth_it, self.not_worth_it_percentage
        )?;
        writeln!(f)?;
        writeln!(f, "Calories to burn today: {:.0} kcal", self.calories_to_burn_today)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutriments;

    #[test]
    fn unknown_energy_renders_question_mark() {
        let product = Product {
            code: "42".to_string(),
            product_name: Some("Mystery".to_string()),
            ..Default::default()
        };
        let text = format_product(&product, None);
        assert!(text.contains("Mystery [42]"));
        assert!(text.contains("? kcal"));
        assert!(text.contains("protein -"));
    }

    #[test]
    fn estimates_lead_with_running() {
        let c = CalorieValue::new(250.0).unwrap();
        let text = format_estimates(&calculator::calculate_exercise(c));
        assert!(text.starts_with("To burn it off: 22 mins of running"));
        assert!(!text.contains("Running"));
        assert!(text.contains("Squats"));
    }

    #[test]
    fn alternatives_list_energy() {
        let alt = Product {
            code: "7".to_string(),
            product_name: Some("Sparkling water".to_string()),
            nutriments: Nutriments {
                energy_kcal_100g: Some(0.0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(format_alternatives(&[alt]).contains("Sparkling water [7] 0 kcal"));
    }
}
