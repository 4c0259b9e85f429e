use crate::presentation::auth::{login, login_form, logout, register, register_form};
use crate::presentation::handlers::{
    add_weight, add_weight_form, bmi_history, dashboard, health_check, set_goal, set_goal_form,
    weight_history,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/register")
                        .route(web::get().to(register_form))
                        .route(web::post().to(register)),
                )
                .service(
                    web::resource("/login")
                        .route(web::get().to(login_form))
                        .route(web::post().to(login)),
                )
                .route("/logout", web::get().to(logout)),
        )
        .route("/", web::get().to(dashboard))
        .service(
            web::resource("/add_weight")
                .route(web::get().to(add_weight_form))
                .route(web::post().to(add_weight)),
        )
        .service(
            web::resource("/set_goal")
                .route(web::get().to(set_goal_form))
                .route(web::post().to(set_goal)),
        )
        .route("/weight_history", web::get().to(weight_history))
        .route("/bmi_history", web::get().to(bmi_history));
}
