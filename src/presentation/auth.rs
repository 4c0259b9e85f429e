use crate::domain::user::{CreateUser, LoginRequest};
use crate::presentation::flash::{redirect_with_flash, removal_cookie, render_page};
use crate::presentation::handlers::{AppState, FormPage, LOGIN_PATH, TrackerError, flash_back};
use crate::presentation::middleware::{AuthenticatedUser, SESSION_COOKIE};
use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{error, info, instrument};

const REGISTER_PATH: &str = "/auth/register";

#[instrument(skip(req))]
pub async fn register_form(req: HttpRequest) -> HttpResponse {
    render_page(&req, FormPage { form: "register" })
}

#[instrument(skip(req))]
pub async fn login_form(req: HttpRequest) -> HttpResponse {
    render_page(&req, FormPage { form: "login" })
}

#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<CreateUser>,
) -> Result<HttpResponse, TrackerError> {
    info!("Registration request received");

    match state.auth_service.register_user(form.into_inner()).await {
        Ok(user) => {
            info!(user_id = %user.id, "User registered successfully");
            Ok(redirect_with_flash(
                LOGIN_PATH,
                "Registration successful. Please login.",
            ))
        }
        Err(e) => flash_back(e, REGISTER_PATH),
    }
}

#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginRequest>,
) -> Result<HttpResponse, TrackerError> {
    info!("Login request received");

    let login = match state.auth_service.login(form.into_inner()).await {
        Ok(login) => login,
        Err(e) => return flash_back(e, LOGIN_PATH),
    };

    let max_age = (login.session.expires_at - chrono::Utc::now()).num_seconds().max(0);
    let cookie = Cookie::build(SESSION_COOKIE, login.token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age))
        .finish();

    info!(user_id = %login.session.user_id, "Login successful");
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(cookie)
        .finish())
}

/// Revokes the current session, if any, and always clears the cookie.
#[instrument(skip(state, user))]
pub async fn logout(
    state: web::Data<AppState>,
    user: Option<AuthenticatedUser>,
) -> Result<HttpResponse, TrackerError> {
    if let Some(user) = user {
        state
            .auth_service
            .logout(&user.session_id)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to revoke session");
                TrackerError::from(e)
            })?;
        info!(user_id = %user.user_id, "User logged out");
    }

    let mut response = redirect_with_flash(LOGIN_PATH, "Logged out successfully.");
    response
        .add_cookie(&removal_cookie(SESSION_COOKIE))
        .map_err(|e| TrackerError::Internal(e.to_string()))?;
    Ok(response)
}
