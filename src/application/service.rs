use crate::domain::error::DomainError;
use crate::domain::models::{
    AddWeightForm, BmiEntry, SetGoalForm, SortOrder, WeightEntry, WeightGoal,
};
use crate::domain::repository::{RecordRepository, UserRepository};
use crate::domain::units::{Unit, convert_weight};
use crate::domain::user::User;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Weight entry as listed to the user, in kilograms and in their display unit.
#[derive(Debug, Clone, Serialize)]
pub struct WeightHistoryItem {
    pub id: String,
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeightHistory {
    pub unit: Unit,
    pub entries: Vec<WeightHistoryItem>,
}

pub struct TrackerService {
    pub(crate) users: Arc<dyn UserRepository>,
    pub(crate) records: Arc<dyn RecordRepository>,
}

impl TrackerService {
    pub fn new(users: Arc<dyn UserRepository>, records: Arc<dyn RecordRepository>) -> Self {
        Self { users, records }
    }

    pub async fn current_user(&self, user_id: &str) -> Result<User> {
        self.users
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User not found: {}", user_id)).into())
    }

    #[instrument(skip(self, form))]
    pub async fn add_weight(
        &self,
        user_id: &str,
        form: AddWeightForm,
        today: NaiveDate,
    ) -> Result<WeightEntry> {
        let user = self.current_user(user_id).await?;
        let value = parse_positive(form.weight.as_deref(), "Invalid weight input.")?;
        let unit = parse_weight_unit(form.unit.as_deref())?;

        let entry = WeightEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            weight_kg: convert_weight(value, unit, Unit::Kg)?,
            date: today,
        };
        self.records.add_weight_entry(entry.clone()).await?;

        info!(weight_kg = entry.weight_kg, date = %entry.date, "Weight entry added");
        Ok(entry)
    }

    #[instrument(skip(self, form))]
    pub async fn set_goal(&self, user_id: &str, form: SetGoalForm) -> Result<WeightGoal> {
        let user = self.current_user(user_id).await?;
        let value = parse_positive(form.goal_weight.as_deref(), "Invalid goal weight.")?;
        let unit = parse_weight_unit(form.unit.as_deref())?;
        let target_date = form
            .target_date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
            .ok_or_else(|| {
                DomainError::Validation("Invalid date format. Use YYYY-MM-DD.".to_string())
            })?;

        let goal = self
            .records
            .upsert_goal(WeightGoal {
                id: Uuid::new_v4().to_string(),
                user_id: user.id,
                goal_weight_kg: convert_weight(value, unit, Unit::Kg)?,
                target_date,
            })
            .await?;

        info!(
            goal_id = %goal.id,
            goal_weight_kg = goal.goal_weight_kg,
            target_date = %goal.target_date,
            "Goal updated"
        );
        Ok(goal)
    }

    /// Newest first.
    pub async fn weight_history(&self, user_id: &str) -> Result<WeightHistory> {
        let user = self.current_user(user_id).await?;
        let unit = user.unit_preference.weight_unit();
        let entries = self
            .records
            .weight_entries(&user.id, SortOrder::Descending)
            .await?
            .into_iter()
            .map(|e| -> Result<WeightHistoryItem> {
                Ok(WeightHistoryItem {
                    weight: convert_weight(e.weight_kg, Unit::Kg, unit)?,
                    id: e.id,
                    date: e.date,
                    weight_kg: e.weight_kg,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(WeightHistory { unit, entries })
    }

    /// Newest first.
    pub async fn bmi_history(&self, user_id: &str) -> Result<Vec<BmiEntry>> {
        let user = self.current_user(user_id).await?;
        self.records
            .bmi_entries(&user.id, SortOrder::Descending)
            .await
    }
}

fn parse_positive(raw: Option<&str>, message: &str) -> Result<f64, DomainError> {
    raw.map(str::trim)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| DomainError::Validation(message.to_string()))
}

fn parse_weight_unit(raw: Option<&str>) -> Result<Unit, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Unit::Kg),
        Some(raw) => match raw.parse::<Unit>() {
            Ok(unit @ (Unit::Kg | Unit::Lbs)) => Ok(unit),
            _ => Err(DomainError::Validation(
                "Invalid unit. Use kg or lbs.".to_string(),
            )),
        },
    }
}
