//! Dashboard orchestration.
//!
//! A dashboard render is a read phase followed by one explicit command:
//! [`TrackerService::record_bmi`] appends a BMI entry whenever the user has a
//! weight entry and a height. Viewing the dashboard therefore grows the BMI
//! log on every call; the entries are an audit trail, not a cache.

use crate::application::service::TrackerService;
use crate::domain::health::{BmiCategory, bmi_category, calculate_bmi, calculate_weekly_target};
use crate::domain::models::{BmiEntry, SortOrder, UnitPreference, WeightEntry, WeightGoal};
use crate::domain::units::{Unit, convert_height, convert_weight};
use crate::domain::user::User;
use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub mode: String,
    pub dashed: bool,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeightChart {
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub unit_preference: UnitPreference,
    pub height_cm: Option<f64>,
    pub height: Option<f64>,
    pub height_unit: Unit,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatestWeight {
    pub date: NaiveDate,
    pub weight_kg: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BmiView {
    pub value: f64,
    pub category: BmiCategory,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub goal_weight_kg: f64,
    pub goal_weight: f64,
    pub target_date: NaiveDate,
    /// Still to lose (positive) or gain (negative), in the display unit.
    pub remaining: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyTarget {
    pub kg_per_week: f64,
    pub per_week: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user: ProfileView,
    pub display_unit: Unit,
    pub latest_weight: Option<LatestWeight>,
    pub bmi: Option<BmiView>,
    /// As read before this render's BMI entry was appended.
    pub bmi_entries: Vec<BmiEntry>,
    pub goal: Option<GoalProgress>,
    pub weekly_target: Option<WeeklyTarget>,
    pub chart: WeightChart,
}

/// Everything the dashboard reads, before any write happens.
struct DashboardSnapshot {
    user: User,
    weight_entries: Vec<WeightEntry>,
    goal: Option<WeightGoal>,
    bmi_entries: Vec<BmiEntry>,
}

impl TrackerService {
    #[instrument(skip(self))]
    pub async fn dashboard(&self, user_id: &str, today: NaiveDate) -> Result<Dashboard> {
        let snapshot = self.load_dashboard(user_id).await?;
        let latest = snapshot.weight_entries.last();

        let recorded = self.record_bmi(&snapshot.user, latest, today).await?;

        let display_unit = snapshot.user.unit_preference.weight_unit();
        let chart = build_weight_chart(
            &snapshot.weight_entries,
            snapshot.goal.as_ref(),
            display_unit,
        )?;

        let weekly_target = match (latest, snapshot.goal.as_ref()) {
            (Some(latest), Some(goal)) => {
                let kg_per_week = calculate_weekly_target(
                    latest.weight_kg,
                    goal.goal_weight_kg,
                    today,
                    goal.target_date,
                );
                Some(WeeklyTarget {
                    kg_per_week,
                    per_week: convert_weight(kg_per_week, Unit::Kg, display_unit)?,
                })
            }
            _ => None,
        };

        let goal = match snapshot.goal.as_ref() {
            Some(goal) => Some(GoalProgress {
                goal_weight_kg: goal.goal_weight_kg,
                goal_weight: convert_weight(goal.goal_weight_kg, Unit::Kg, display_unit)?,
                target_date: goal.target_date,
                remaining: match latest {
                    Some(latest) => Some(convert_weight(
                        latest.weight_kg - goal.goal_weight_kg,
                        Unit::Kg,
                        display_unit,
                    )?),
                    None => None,
                },
            }),
            None => None,
        };

        let latest_weight = match latest {
            Some(entry) => Some(LatestWeight {
                date: entry.date,
                weight_kg: entry.weight_kg,
                weight: convert_weight(entry.weight_kg, Unit::Kg, display_unit)?,
            }),
            None => None,
        };

        let user = &snapshot.user;
        let height_unit = user.unit_preference.height_unit();
        let height = match user.height_cm {
            Some(cm) => Some(convert_height(cm, Unit::Cm, height_unit)?),
            None => None,
        };

        Ok(Dashboard {
            user: ProfileView {
                username: user.username.clone(),
                unit_preference: user.unit_preference,
                height_cm: user.height_cm,
                height,
                height_unit,
            },
            display_unit,
            latest_weight,
            bmi: recorded.map(|entry| BmiView {
                value: entry.bmi_value,
                category: entry.category,
            }),
            bmi_entries: snapshot.bmi_entries,
            goal,
            weekly_target,
            chart,
        })
    }

    async fn load_dashboard(&self, user_id: &str) -> Result<DashboardSnapshot> {
        let user = self.current_user(user_id).await?;
        let weight_entries = self
            .records
            .weight_entries(&user.id, SortOrder::Ascending)
            .await?;
        let goal = self.records.find_goal(&user.id).await?;
        let bmi_entries = self
            .records
            .bmi_entries(&user.id, SortOrder::Ascending)
            .await?;
        debug!(
            weight_entries = weight_entries.len(),
            bmi_entries = bmi_entries.len(),
            has_goal = goal.is_some(),
            "Dashboard data loaded"
        );
        Ok(DashboardSnapshot {
            user,
            weight_entries,
            goal,
            bmi_entries,
        })
    }

    /// Appends a BMI entry for `latest` when the user has a positive height.
    /// Without one there is nothing to record and `None` is returned.
    #[instrument(skip(self, user, latest), fields(user_id = %user.id))]
    pub async fn record_bmi(
        &self,
        user: &User,
        latest: Option<&WeightEntry>,
        today: NaiveDate,
    ) -> Result<Option<BmiEntry>> {
        let (latest, height_cm) = match (latest, user.height_cm) {
            (Some(latest), Some(height_cm)) if height_cm > 0.0 => (latest, height_cm),
            _ => {
                debug!("Skipping BMI, weight or height missing");
                return Ok(None);
            }
        };

        let bmi_value = calculate_bmi(latest.weight_kg, height_cm);
        let entry = BmiEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            bmi_value,
            category: bmi_category(bmi_value),
            date: today,
        };
        self.records.add_bmi_entry(entry.clone()).await?;

        info!(bmi = bmi_value, category = %entry.category, "BMI recorded");
        Ok(Some(entry))
    }
}

/// Weight series in the display unit plus, when a goal exists, a flat dashed
/// goal line over the same dates.
pub fn build_weight_chart(
    entries: &[WeightEntry],
    goal: Option<&WeightGoal>,
    display_unit: Unit,
) -> Result<WeightChart> {
    let points = entries
        .iter()
        .map(|e| -> Result<ChartPoint> {
            Ok(ChartPoint {
                date: e.date,
                value: convert_weight(e.weight_kg, Unit::Kg, display_unit)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut series = vec![ChartSeries {
        name: "Weight".to_string(),
        mode: "lines+markers".to_string(),
        dashed: false,
        points,
    }];

    if let Some(goal) = goal {
        if !entries.is_empty() {
            let goal_value = convert_weight(goal.goal_weight_kg, Unit::Kg, display_unit)?;
            series.push(ChartSeries {
                name: "Goal Weight".to_string(),
                mode: "lines".to_string(),
                dashed: true,
                points: entries
                    .iter()
                    .map(|e| ChartPoint {
                        date: e.date,
                        value: goal_value,
                    })
                    .collect(),
            });
        }
    }

    Ok(WeightChart {
        title: "Weight Trend".to_string(),
        x_axis: "Date".to_string(),
        y_axis: format!("Weight ({})", display_unit),
        series,
    })
}
