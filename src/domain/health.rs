use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    #[serde(rename = "Normal weight")]
    NormalWeight,
    Overweight,
    Obesity,
}

impl BmiCategory {
    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::NormalWeight => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obesity => "Obesity",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BmiCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Underweight" => Ok(BmiCategory::Underweight),
            "Normal weight" => Ok(BmiCategory::NormalWeight),
            "Overweight" => Ok(BmiCategory::Overweight),
            "Obesity" => Ok(BmiCategory::Obesity),
            other => Err(DomainError::Validation(format!(
                "Unknown BMI category: {}",
                other
            ))),
        }
    }
}

/// BMI from a weight in kilograms and a height in centimeters.
///
/// Callers only invoke this with a positive height.
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Lower bound of each band is inclusive.
pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::NormalWeight
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obesity
    }
}

/// Weekly change in kilograms needed to reach `goal_weight_kg` by `target_date`.
///
/// Positive means lose this much per week, negative means gain. The window is
/// floored at one week, so a target date today or in the past asks for the
/// whole difference in a single week.
pub fn calculate_weekly_target(
    latest_weight_kg: f64,
    goal_weight_kg: f64,
    current_date: NaiveDate,
    target_date: NaiveDate,
) -> f64 {
    let days = (target_date - current_date).num_days() as f64;
    let total_weeks = (days / 7.0).max(1.0);
    (latest_weight_kg - goal_weight_kg) / total_weeks
}
