use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use serde::Serialize;

pub const FLASH_COOKIE: &str = "flash";

/// Body of every GET page: one-shot messages plus the page payload.
#[derive(Serialize)]
pub struct Page<T: Serialize> {
    pub messages: Vec<String>,
    #[serde(flatten)]
    pub body: T,
}

fn flash_cookie(message: &str) -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE, message.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name, "").path("/").finish();
    cookie.make_removal();
    cookie
}

pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

pub fn redirect_with_flash(location: &str, message: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_string()))
        .cookie(flash_cookie(message))
        .finish()
}

/// Renders `body` as JSON together with any pending flash message, and clears it.
pub fn render_page<T: Serialize>(req: &HttpRequest, body: T) -> HttpResponse {
    let pending = req.cookie(FLASH_COOKIE).map(|c| c.value().to_string());
    let mut response = HttpResponse::Ok();
    if pending.is_some() {
        response.cookie(removal_cookie(FLASH_COOKIE));
    }
    response.json(Page {
        messages: pending.into_iter().filter(|m| !m.is_empty()).collect(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use serde_json::json;

    #[test]
    fn test_redirect_with_flash_sets_location_and_cookie() {
        let resp = redirect_with_flash("/auth/login", "Logged out successfully.");
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/auth/login"
        );
        let cookie = resp.cookies().find(|c| c.name() == FLASH_COOKIE).unwrap();
        assert_eq!(cookie.value(), "Logged out successfully.");
    }

    #[actix_web::test]
    async fn test_render_page_consumes_flash() {
        let req = TestRequest::default()
            .cookie(Cookie::new(FLASH_COOKIE, "Goal updated successfully."))
            .to_http_request();
        let resp = render_page(&req, json!({ "form": "set_goal" }));

        let removal = resp.cookies().find(|c| c.name() == FLASH_COOKIE).unwrap();
        assert_eq!(removal.value(), "");

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let page: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(page["messages"], json!(["Goal updated successfully."]));
        assert_eq!(page["form"], "set_goal");
    }

    #[actix_web::test]
    async fn test_render_page_without_flash() {
        let req = TestRequest::default().to_http_request();
        let resp = render_page(&req, json!({ "form": "login" }));
        assert!(resp.cookies().next().is_none());

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let page: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(page["messages"], json!([]));
    }
}
