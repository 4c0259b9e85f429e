use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::UnitPreference;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub unit_preference: UnitPreference,
    pub height_cm: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub unit_preference: Option<String>,
    pub height: Option<String>,
    pub height_unit: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Server-side record of a logged-in browser.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
