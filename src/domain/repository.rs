use crate::domain::models::{BmiEntry, SortOrder, WeightEntry, WeightGoal};
use crate::domain::user::{Session, User};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with a validation error when the username is taken.
    async fn save_user(&self, user: User) -> Result<()>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn add_weight_entry(&self, entry: WeightEntry) -> Result<()>;
    async fn weight_entries(&self, user_id: &str, order: SortOrder) -> Result<Vec<WeightEntry>>;
    /// Inserts the user's goal or overwrites the existing one in a single step.
    /// Returns the stored goal, which keeps the original id on update.
    async fn upsert_goal(&self, goal: WeightGoal) -> Result<WeightGoal>;
    async fn find_goal(&self, user_id: &str) -> Result<Option<WeightGoal>>;
    async fn add_bmi_entry(&self, entry: BmiEntry) -> Result<()>;
    async fn bmi_entries(&self, user_id: &str, order: SortOrder) -> Result<Vec<BmiEntry>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: Session) -> Result<()>;
    /// Expired sessions are never returned.
    async fn find_session(&self, id: &str) -> Result<Option<Session>>;
    async fn remove_session(&self, id: &str) -> Result<()>;
}
