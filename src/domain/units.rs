//! Conversions between the canonical storage units (kilograms, centimeters)
//! and the display units a user may prefer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const LBS_PER_KG: f64 = 2.20462;
pub const CM_PER_INCH: f64 = 2.54;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Lbs,
    Cm,
    Inches,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Lbs => "lbs",
            Unit::Cm => "cm",
            Unit::Inches => "inches",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kg" => Ok(Unit::Kg),
            "lbs" => Ok(Unit::Lbs),
            "cm" => Ok(Unit::Cm),
            "inches" => Ok(Unit::Inches),
            other => Err(UnitError::Unknown(other.to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit: {0}")]
    Unknown(String),
    #[error("Invalid conversion units: {from} -> {to}")]
    InvalidConversion { from: Unit, to: Unit },
}

pub fn convert_weight(value: f64, from: Unit, to: Unit) -> Result<f64, UnitError> {
    if from == to {
        return Ok(value);
    }
    match (from, to) {
        (Unit::Kg, Unit::Lbs) => Ok(value * LBS_PER_KG),
        (Unit::Lbs, Unit::Kg) => Ok(value / LBS_PER_KG),
        _ => Err(UnitError::InvalidConversion { from, to }),
    }
}

pub fn convert_height(value: f64, from: Unit, to: Unit) -> Result<f64, UnitError> {
    if from == to {
        return Ok(value);
    }
    match (from, to) {
        (Unit::Cm, Unit::Inches) => Ok(value / CM_PER_INCH),
        (Unit::Inches, Unit::Cm) => Ok(value * CM_PER_INCH),
        _ => Err(UnitError::InvalidConversion { from, to }),
    }
}
