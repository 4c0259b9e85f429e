use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::error::DomainError;
use crate::domain::health::BmiCategory;
use crate::domain::units::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitPreference {
    #[default]
    Metric,
    Imperial,
}

impl UnitPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitPreference::Metric => "metric",
            UnitPreference::Imperial => "imperial",
        }
    }

    pub fn weight_unit(&self) -> Unit {
        match self {
            UnitPreference::Metric => Unit::Kg,
            UnitPreference::Imperial => Unit::Lbs,
        }
    }

    pub fn height_unit(&self) -> Unit {
        match self {
            UnitPreference::Metric => Unit::Cm,
            UnitPreference::Imperial => Unit::Inches,
        }
    }
}

impl FromStr for UnitPreference {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metric" => Ok(UnitPreference::Metric),
            "imperial" => Ok(UnitPreference::Imperial),
            _ => Err(DomainError::Validation(
                "Invalid unit preference.".to_string(),
            )),
        }
    }
}

/// Weight is always stored in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: String,
    pub user_id: String,
    pub weight_kg: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightGoal {
    pub id: String,
    pub user_id: String,
    pub goal_weight_kg: f64,
    pub target_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmiEntry {
    pub id: String,
    pub user_id: String,
    pub bmi_value: f64,
    pub category: BmiCategory,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

// Form inputs arrive as raw strings; the tracker service validates them.

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AddWeightForm {
    pub weight: Option<String>,
    pub unit: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SetGoalForm {
    pub goal_weight: Option<String>,
    pub unit: Option<String>,
    pub target_date: Option<String>,
}
