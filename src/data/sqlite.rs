use crate::domain::error::DomainError;
use crate::domain::health::BmiCategory;
use crate::domain::models::{BmiEntry, SortOrder, UnitPreference, WeightEntry, WeightGoal};
use crate::domain::repository::{RecordRepository, UserRepository};
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Relational record store backed by a single SQLite connection.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        info!(path = %path.display(), "Opening SQLite store");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| DomainError::Internal("database mutex poisoned".to_string()))?;
        Ok(f(&conn)?)
    }
}

fn direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Ascending => "ASC",
        SortOrder::Descending => "DESC",
    }
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl ToSql for UnitPreference {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for UnitPreference {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for BmiCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for BmiCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        unit_preference: row.get(3)?,
        height_cm: row.get(4)?,
    })
}

fn row_to_weight(row: &Row<'_>) -> rusqlite::Result<WeightEntry> {
    Ok(WeightEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        weight_kg: row.get(2)?,
        date: row.get(3)?,
    })
}

fn row_to_goal(row: &Row<'_>) -> rusqlite::Result<WeightGoal> {
    Ok(WeightGoal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        goal_weight_kg: row.get(2)?,
        target_date: row.get(3)?,
    })
}

fn row_to_bmi(row: &Row<'_>) -> rusqlite::Result<BmiEntry> {
    Ok(BmiEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        bmi_value: row.get(2)?,
        category: row.get(3)?,
        date: row.get(4)?,
    })
}

#[async_trait]
impl UserRepository for SqliteStore {
    #[instrument(skip(self, user), fields(user_id = %user.id, username = %user.username))]
    async fn save_user(&self, user: User) -> Result<()> {
        let result = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password_hash, unit_preference, height_cm)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                   username = excluded.username,
                   password_hash = excluded.password_hash,
                   unit_preference = excluded.unit_preference,
                   height_cm = excluded.height_cm",
                params![
                    user.id,
                    user.username,
                    user.password_hash,
                    user.unit_preference,
                    user.height_cm
                ],
            )
        });
        match result {
            Ok(_) => {
                debug!("User saved to SQLite store");
                Ok(())
            }
            Err(err) if is_unique_violation(&err) => {
                warn!("Username already taken");
                Err(DomainError::Validation("Username already exists.".to_string()).into())
            }
            Err(err) => Err(err),
        }
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password_hash, unit_preference, height_cm
                 FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()
        })
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password_hash, unit_preference, height_cm
                 FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )
            .optional()
        })
    }
}

#[async_trait]
impl RecordRepository for SqliteStore {
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id))]
    async fn add_weight_entry(&self, entry: WeightEntry) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO weight_entries (id, user_id, weight_kg, date) VALUES (?1, ?2, ?3, ?4)",
                params![entry.id, entry.user_id, entry.weight_kg, entry.date],
            )
        })?;
        Ok(())
    }

    async fn weight_entries(&self, user_id: &str, order: SortOrder) -> Result<Vec<WeightEntry>> {
        let sql = format!(
            "SELECT id, user_id, weight_kg, date FROM weight_entries
             WHERE user_id = ?1 ORDER BY date {dir}, rowid {dir}",
            dir = direction(order)
        );
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user_id], row_to_weight)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
    }

    #[instrument(skip(self, goal), fields(user_id = %goal.user_id))]
    async fn upsert_goal(&self, goal: WeightGoal) -> Result<WeightGoal> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO weight_goals (id, user_id, goal_weight_kg, target_date)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                   goal_weight_kg = excluded.goal_weight_kg,
                   target_date = excluded.target_date",
                params![goal.id, goal.user_id, goal.goal_weight_kg, goal.target_date],
            )?;
            conn.query_row(
                "SELECT id, user_id, goal_weight_kg, target_date FROM weight_goals WHERE user_id = ?1",
                params![goal.user_id],
                row_to_goal,
            )
        })
    }

    async fn find_goal(&self, user_id: &str) -> Result<Option<WeightGoal>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, user_id, goal_weight_kg, target_date FROM weight_goals WHERE user_id = ?1",
                params![user_id],
                row_to_goal,
            )
            .optional()
        })
    }

    #[instrument(skip(self, entry), fields(user_id = %entry.user_id, category = %entry.category))]
    async fn add_bmi_entry(&self, entry: BmiEntry) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO bmi_entries (id, user_id, bmi_value, category, date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.id,
                    entry.user_id,
                    entry.bmi_value,
                    entry.category,
                    entry.date
                ],
            )
        })?;
        Ok(())
    }

    async fn bmi_entries(&self, user_id: &str, order: SortOrder) -> Result<Vec<BmiEntry>> {
        let sql = format!(
            "SELECT id, user_id, bmi_value, category, date FROM bmi_entries
             WHERE user_id = ?1 ORDER BY date {dir}, rowid {dir}",
            dir = direction(order)
        );
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![user_id], row_to_bmi)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn user(id: &str, username: &str) -> User {
        User {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            unit_preference: UnitPreference::Imperial,
            height_cm: Some(180.0),
        }
    }

    fn goal(id: &str, user_id: &str, kg: f64) -> WeightGoal {
        WeightGoal {
            id: id.to_string(),
            user_id: user_id.to_string(),
            goal_weight_kg: kg,
            target_date: date(2025, 12, 31),
        }
    }

    #[tokio::test]
    async fn test_user_round_trip_through_sqlite() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_user(user("u1", "alice")).await.unwrap();

        let by_name = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, "u1");
        assert_eq!(by_name.unit_preference, UnitPreference::Imperial);
        assert_eq!(by_name.height_cm, Some(180.0));

        assert!(store.find_user_by_id("u1").await.unwrap().is_some());
        assert!(store.find_user_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_maps_to_validation_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_user(user("u1", "alice")).await.unwrap();

        let err = store.save_user(user("u2", "alice")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_foreign_keys_are_enforced() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store
            .add_weight_entry(WeightEntry {
                id: "w1".to_string(),
                user_id: "ghost".to_string(),
                weight_kg: 80.0,
                date: date(2025, 1, 1),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_non_positive_weight_is_rejected_by_schema() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_user(user("u1", "alice")).await.unwrap();
        let result = store
            .add_weight_entry(WeightEntry {
                id: "w1".to_string(),
                user_id: "u1".to_string(),
                weight_kg: 0.0,
                date: date(2025, 1, 1),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_weight_entries_ordering() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_user(user("u1", "alice")).await.unwrap();
        for (id, kg, on) in [
            ("w1", 80.0, date(2025, 3, 1)),
            ("w2", 82.0, date(2025, 2, 1)),
            ("w3", 79.0, date(2025, 3, 1)),
        ] {
            store
                .add_weight_entry(WeightEntry {
                    id: id.to_string(),
                    user_id: "u1".to_string(),
                    weight_kg: kg,
                    date: on,
                })
                .await
                .unwrap();
        }

        let asc: Vec<_> = store
            .weight_entries("u1", SortOrder::Ascending)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(asc, vec!["w2", "w1", "w3"]);

        let desc: Vec<_> = store
            .weight_entries("u1", SortOrder::Descending)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(desc, vec!["w3", "w1", "w2"]);
    }

    #[tokio::test]
    async fn test_goal_upsert_keeps_one_row() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store.save_user(user("u1", "alice")).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .upsert_goal(goal(&format!("g{}", i), "u1", 70.0 + i as f64))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rows: i64 = store
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM weight_goals", [], |row| row.get(0))
            })
            .unwrap();
        assert_eq!(rows, 1);

        let first_id = store.find_goal("u1").await.unwrap().unwrap().id;
        let updated = store.upsert_goal(goal("other", "u1", 65.0)).await.unwrap();
        assert_eq!(updated.id, first_id);
        assert_eq!(updated.goal_weight_kg, 65.0);
    }

    #[tokio::test]
    async fn test_bmi_entries_persist_category_labels() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_user(user("u1", "alice")).await.unwrap();
        store
            .add_bmi_entry(BmiEntry {
                id: "b1".to_string(),
                user_id: "u1".to_string(),
                bmi_value: 22.9,
                category: BmiCategory::NormalWeight,
                date: date(2025, 1, 2),
            })
            .await
            .unwrap();

        let stored: String = store
            .with_conn(|conn| {
                conn.query_row("SELECT category FROM bmi_entries", [], |row| row.get(0))
            })
            .unwrap();
        assert_eq!(stored, "Normal weight");

        let entries = store.bmi_entries("u1", SortOrder::Descending).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, BmiCategory::NormalWeight);
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tracker.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.save_user(user("u1", "alice")).await.unwrap();
            store.upsert_goal(goal("g1", "u1", 72.5)).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let goal = store.find_goal("u1").await.unwrap().unwrap();
        assert_eq!(goal.goal_weight_kg, 72.5);
    }
}
