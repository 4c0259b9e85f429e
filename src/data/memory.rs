use crate::domain::models::{BmiEntry, SortOrder, WeightEntry, WeightGoal};
use crate::domain::repository::RecordRepository;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct InMemoryRecordRepository {
    weights: Arc<RwLock<Vec<WeightEntry>>>,
    goals: Arc<RwLock<HashMap<String, WeightGoal>>>,
    bmi: Arc<RwLock<Vec<BmiEntry>>>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self {
            weights: Arc::new(RwLock::new(Vec::new())),
            goals: Arc::new(RwLock::new(HashMap::new())),
            bmi: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryRecordRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable sort by date keeps insertion order for entries on the same day.
fn ordered<T: Clone>(
    items: &[T],
    keep: impl Fn(&T) -> bool,
    date: impl Fn(&T) -> chrono::NaiveDate,
    order: SortOrder,
) -> Vec<T> {
    let mut selected: Vec<T> = items.iter().filter(|item| keep(item)).cloned().collect();
    selected.sort_by_key(|item| date(item));
    if order == SortOrder::Descending {
        selected.reverse();
    }
    selected
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id))]
    async fn add_weight_entry(&self, entry: WeightEntry) -> Result<()> {
        let mut weights = self.weights.write().await;
        weights.push(entry);
        debug!(count = weights.len(), "Weight entry stored");
        Ok(())
    }

    async fn weight_entries(&self, user_id: &str, order: SortOrder) -> Result<Vec<WeightEntry>> {
        let weights = self.weights.read().await;
        Ok(ordered(&weights, |e| e.user_id == user_id, |e| e.date, order))
    }

    #[instrument(skip(self, goal), fields(user_id = %goal.user_id))]
    async fn upsert_goal(&self, goal: WeightGoal) -> Result<WeightGoal> {
        let mut goals = self.goals.write().await;
        let stored = match goals.get_mut(&goal.user_id) {
            Some(existing) => {
                existing.goal_weight_kg = goal.goal_weight_kg;
                existing.target_date = goal.target_date;
                debug!(goal_id = %existing.id, "Goal updated in place");
                existing.clone()
            }
            None => {
                debug!(goal_id = %goal.id, "Goal created");
                goals.insert(goal.user_id.clone(), goal.clone());
                goal
            }
        };
        Ok(stored)
    }

    async fn find_goal(&self, user_id: &str) -> Result<Option<WeightGoal>> {
        let goals = self.goals.read().await;
        Ok(goals.get(user_id).cloned())
    }

    #[instrument(skip(self, entry), fields(user_id = %entry.user_id, category = %entry.category))]
    async fn add_bmi_entry(&self, entry: BmiEntry) -> Result<()> {
        let mut bmi = self.bmi.write().await;
        bmi.push(entry);
        debug!(count = bmi.len(), "BMI entry stored");
        Ok(())
    }

    async fn bmi_entries(&self, user_id: &str, order: SortOrder) -> Result<Vec<BmiEntry>> {
        let bmi = self.bmi.read().await;
        Ok(ordered(&bmi, |e| e.user_id == user_id, |e| e.date, order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::BmiCategory;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weight(id: &str, user_id: &str, kg: f64, on: NaiveDate) -> WeightEntry {
        WeightEntry {
            id: id.to_string(),
            user_id: user_id.to_string(),
            weight_kg: kg,
            date: on,
        }
    }

    fn goal(id: &str, user_id: &str, kg: f64, target: NaiveDate) -> WeightGoal {
        WeightGoal {
            id: id.to_string(),
            user_id: user_id.to_string(),
            goal_weight_kg: kg,
            target_date: target,
        }
    }

    #[tokio::test]
    async fn test_weight_entries_sorted_by_date_then_insertion() {
        let repo = InMemoryRecordRepository::new();
        repo.add_weight_entry(weight("w1", "u1", 80.0, date(2025, 3, 1)))
            .await
            .unwrap();
        repo.add_weight_entry(weight("w2", "u1", 82.0, date(2025, 2, 1)))
            .await
            .unwrap();
        repo.add_weight_entry(weight("w3", "u1", 79.0, date(2025, 3, 1)))
            .await
            .unwrap();
        repo.add_weight_entry(weight("w4", "u2", 60.0, date(2025, 1, 1)))
            .await
            .unwrap();

        let asc: Vec<_> = repo
            .weight_entries("u1", SortOrder::Ascending)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(asc, vec!["w2", "w1", "w3"]);

        let desc: Vec<_> = repo
            .weight_entries("u1", SortOrder::Descending)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(desc, vec!["w3", "w1", "w2"]);
    }

    #[tokio::test]
    async fn test_upsert_goal_updates_in_place() {
        let repo = InMemoryRecordRepository::new();
        let first = repo
            .upsert_goal(goal("g1", "u1", 80.0, date(2025, 6, 1)))
            .await
            .unwrap();
        assert_eq!(first.id, "g1");

        let second = repo
            .upsert_goal(goal("g2", "u1", 75.0, date(2025, 9, 1)))
            .await
            .unwrap();
        assert_eq!(second.id, "g1");
        assert_eq!(second.goal_weight_kg, 75.0);
        assert_eq!(second.target_date, date(2025, 9, 1));

        let found = repo.find_goal("u1").await.unwrap().unwrap();
        assert_eq!(found, second);
        assert!(repo.find_goal("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_goal_submissions_keep_a_single_goal() {
        let repo = InMemoryRecordRepository::new();
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let repo_clone = repo.clone();
                tokio::spawn(async move {
                    repo_clone
                        .upsert_goal(goal(
                            &format!("g{}", i),
                            "u1",
                            70.0 + i as f64,
                            date(2025, 6, 1),
                        ))
                        .await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(repo.goals.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_bmi_entries_are_append_only() {
        let repo = InMemoryRecordRepository::new();
        for (i, value) in [32.6, 32.6, 22.9].iter().enumerate() {
            repo.add_bmi_entry(BmiEntry {
                id: format!("b{}", i),
                user_id: "u1".to_string(),
                bmi_value: *value,
                category: crate::domain::health::bmi_category(*value),
                date: date(2025, 1, 1),
            })
            .await
            .unwrap();
        }

        let entries = repo.bmi_entries("u1", SortOrder::Ascending).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].category, BmiCategory::Obesity);
        assert_eq!(entries[2].category, BmiCategory::NormalWeight);

        let desc = repo.bmi_entries("u1", SortOrder::Descending).await.unwrap();
        assert_eq!(desc[0].id, "b2");
    }
}
