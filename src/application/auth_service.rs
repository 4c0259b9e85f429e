use crate::domain::error::DomainError;
use crate::domain::models::UnitPreference;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::units::{Unit, convert_height};
use crate::domain::user::{CreateUser, LoginRequest, Session, User};
use crate::infrastructure::security::{
    generate_session_token, hash_password, validate_session_token, verify_password,
};
use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// A login: the signed token for the client plus the session it names.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: String,
    pub session: Session,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    session_store: Arc<dyn SessionStore>,
    secret: String,
    session_ttl_secs: i64,
    // Verified against when the username is unknown, so both failures cost the same
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        session_store: Arc<dyn SessionStore>,
        secret: String,
        session_ttl_secs: i64,
    ) -> Self {
        let dummy_hash = hash_password("weight-tracker-dummy-password").unwrap_or_else(|e| {
            error!(error = %e, "Failed to prepare dummy password hash");
            String::new()
        });
        Self {
            user_repository,
            session_store,
            secret,
            session_ttl_secs,
            dummy_hash,
        }
    }

    #[instrument(skip(self, req), fields(username = %req.username))]
    pub async fn register_user(&self, req: CreateUser) -> Result<User> {
        trace!("Starting user registration");

        if req.username.is_empty() || req.password.is_empty() {
            return Err(
                DomainError::Validation("Username and password are required.".to_string()).into(),
            );
        }

        if self
            .user_repository
            .find_user_by_username(&req.username)
            .await?
            .is_some()
        {
            warn!(username = %req.username, "User already exists");
            return Err(DomainError::Validation("Username already exists.".to_string()).into());
        }

        let unit_preference = match req.unit_preference.as_deref().map(str::trim) {
            None | Some("") => UnitPreference::Metric,
            Some(raw) => raw.parse::<UnitPreference>()?,
        };
        let height_cm = parse_height(req.height.as_deref(), req.height_unit.as_deref())?;

        let password_hash = hash_password(&req.password).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            DomainError::Internal(format!("Failed to hash password: {}", e))
        })?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: req.username,
            password_hash,
            unit_preference,
            height_cm,
        };

        debug!(user_id = %user.id, "Saving user to repository");
        self.user_repository.save_user(user.clone()).await?;

        info!(
            user_id = %user.id,
            username = %user.username,
            unit_preference = user.unit_preference.as_str(),
            has_height = user.height_cm.is_some(),
            "User registered successfully"
        );

        Ok(user)
    }

    #[instrument(skip(self, req), fields(username = %req.username))]
    pub async fn login(&self, req: LoginRequest) -> Result<LoginSession> {
        trace!("Starting login");

        let user = match self
            .user_repository
            .find_user_by_username(&req.username)
            .await?
        {
            Some(user) => user,
            None => {
                let _ = verify_password(&req.password, &self.dummy_hash);
                warn!("User not found during login");
                return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
            }
        };

        let is_valid = verify_password(&req.password, &user.password_hash).map_err(|e| {
            error!(error = %e, "Failed to verify password");
            DomainError::Internal(format!("Failed to verify password: {}", e))
        })?;

        if !is_valid {
            warn!(user_id = %user.id, "Invalid password during login");
            return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
        }

        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            expires_at: Utc::now() + Duration::seconds(self.session_ttl_secs),
        };
        self.session_store.create_session(session.clone()).await?;

        let token = generate_session_token(
            &user.id,
            &session.id,
            &self.secret,
            self.session_ttl_secs,
        )
        .map_err(|e| {
            error!(error = %e, "Failed to generate session token");
            DomainError::Internal(format!("Failed to generate session token: {}", e))
        })?;

        info!(user_id = %user.id, session_id = %session.id, "Login successful");

        Ok(LoginSession { token, session })
    }

    /// Maps a presented token to a live session. Anything that does not check
    /// out (bad signature, expiry, revoked or foreign session) is `None`.
    #[instrument(skip(self, token))]
    pub async fn resolve_session(&self, token: &str) -> Result<Option<Session>> {
        let claims = match validate_session_token(token, &self.secret) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                return Ok(None);
            }
        };

        let session = self.session_store.find_session(&claims.session_id).await?;
        Ok(session.filter(|s| s.user_id == claims.user_id))
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.session_store.remove_session(session_id).await?;
        info!(session_id = session_id, "Logged out");
        Ok(())
    }
}

/// Missing, unparsable or non-positive heights are treated as absent.
fn parse_height(raw: Option<&str>, unit: Option<&str>) -> Result<Option<f64>> {
    let unit = match unit.map(str::trim) {
        None | Some("") => Unit::Cm,
        Some(raw_unit) => match raw_unit.parse::<Unit>() {
            Ok(unit @ (Unit::Cm | Unit::Inches)) => unit,
            _ => {
                return Err(
                    DomainError::Validation("Invalid height unit. Use cm or inches.".to_string())
                        .into(),
                );
            }
        },
    };

    let value = raw
        .map(str::trim)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0);

    match value {
        Some(v) => Ok(Some(convert_height(v, unit, Unit::Cm)?)),
        None => Ok(None),
    }
}
