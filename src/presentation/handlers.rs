use crate::application::auth_service::AuthService;
use crate::application::service::TrackerService;
use crate::domain::error::DomainError;
use crate::domain::models::{AddWeightForm, SetGoalForm};
use crate::presentation::flash::{redirect, redirect_with_flash, render_page};
use crate::presentation::middleware::AuthenticatedUser;
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::Serialize;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

pub const LOGIN_PATH: &str = "/auth/login";

pub struct AppState {
    pub tracker: TrackerService,
    pub auth_service: Arc<AuthService>,
}

// Uniform error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: serde_json::Value,
}

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Login required")]
    LoginRequired,
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for TrackerError {
    fn status_code(&self) -> StatusCode {
        match self {
            TrackerError::Validation(_) => StatusCode::BAD_REQUEST,
            TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            TrackerError::LoginRequired => StatusCode::FOUND,
            TrackerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TrackerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_msg = self.to_string();

        let message = match self {
            TrackerError::LoginRequired => return redirect(LOGIN_PATH),
            TrackerError::Validation(msg)
            | TrackerError::NotFound(msg)
            | TrackerError::Unauthorized(msg)
            | TrackerError::Database(msg)
            | TrackerError::Internal(msg) => msg.clone(),
        };

        // Log error based on severity
        if status.is_server_error() {
            error!(error = %error_msg, status = %status, "Request failed");
        } else {
            warn!(error = %error_msg, status = %status, "Request rejected");
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: error_msg,
            details: serde_json::json!({ "message": message }),
        })
    }
}

impl From<anyhow::Error> for TrackerError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::Validation(msg)) => TrackerError::Validation(msg.clone()),
            Some(DomainError::NotFound(msg)) => TrackerError::NotFound(msg.clone()),
            Some(DomainError::Unauthorized(msg)) => TrackerError::Unauthorized(msg.clone()),
            Some(DomainError::Internal(msg)) => TrackerError::Internal(msg.clone()),
            None => TrackerError::Database(err.to_string()),
        }
    }
}

/// Form problems go back to the form as a flash message; anything else is a real error.
pub(crate) fn flash_back(err: anyhow::Error, back: &str) -> Result<HttpResponse, TrackerError> {
    match err.downcast_ref::<DomainError>() {
        Some(DomainError::Validation(msg)) | Some(DomainError::Unauthorized(msg)) => {
            warn!(error = %msg, location = back, "Form rejected");
            Ok(redirect_with_flash(back, msg))
        }
        _ => Err(TrackerError::from(err)),
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = TrackerError;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();
        Box::pin(async move { user.ok_or(TrackerError::LoginRequired) })
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

#[derive(Serialize)]
pub struct FormPage {
    pub form: &'static str,
}

#[instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn dashboard(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: HttpRequest,
) -> Result<HttpResponse, TrackerError> {
    let today = Utc::now().date_naive();
    let view = state
        .tracker
        .dashboard(&user.user_id, today)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to build dashboard");
            TrackerError::from(e)
        })?;
    info!(
        has_bmi = view.bmi.is_some(),
        has_goal = view.goal.is_some(),
        "Dashboard rendered"
    );
    Ok(render_page(&req, view))
}

#[instrument(skip(req), fields(user_id = %_user.user_id))]
pub async fn add_weight_form(_user: AuthenticatedUser, req: HttpRequest) -> HttpResponse {
    render_page(&req, FormPage { form: "add_weight" })
}

#[instrument(skip(state, form), fields(user_id = %user.user_id))]
pub async fn add_weight(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    form: web::Form<AddWeightForm>,
) -> Result<HttpResponse, TrackerError> {
    let today = Utc::now().date_naive();
    match state
        .tracker
        .add_weight(&user.user_id, form.into_inner(), today)
        .await
    {
        Ok(entry) => {
            info!(entry_id = %entry.id, weight_kg = entry.weight_kg, "Weight entry added");
            Ok(redirect_with_flash("/", "Weight entry added successfully."))
        }
        Err(e) => flash_back(e, "/add_weight"),
    }
}

#[instrument(skip(req), fields(user_id = %_user.user_id))]
pub async fn set_goal_form(_user: AuthenticatedUser, req: HttpRequest) -> HttpResponse {
    render_page(&req, FormPage { form: "set_goal" })
}

#[instrument(skip(state, form), fields(user_id = %user.user_id))]
pub async fn set_goal(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    form: web::Form<SetGoalForm>,
) -> Result<HttpResponse, TrackerError> {
    match state.tracker.set_goal(&user.user_id, form.into_inner()).await {
        Ok(goal) => {
            info!(goal_id = %goal.id, "Goal saved");
            Ok(redirect_with_flash("/", "Goal updated successfully."))
        }
        Err(e) => flash_back(e, "/set_goal"),
    }
}

#[instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn weight_history(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: HttpRequest,
) -> Result<HttpResponse, TrackerError> {
    let history = state.tracker.weight_history(&user.user_id).await?;
    info!(entries = history.entries.len(), "Weight history listed");
    Ok(render_page(&req, history))
}

#[derive(Serialize)]
struct BmiHistoryPage {
    entries: Vec<crate::domain::models::BmiEntry>,
}

#[instrument(skip(state, req), fields(user_id = %user.user_id))]
pub async fn bmi_history(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: HttpRequest,
) -> Result<HttpResponse, TrackerError> {
    let entries = state.tracker.bmi_history(&user.user_id).await?;
    info!(entries = entries.len(), "BMI history listed");
    Ok(render_page(&req, BmiHistoryPage { entries }))
}

