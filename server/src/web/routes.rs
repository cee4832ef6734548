// calliope_server/src/web/routes.rs

use actix_web::{middleware::from_fn, web, HttpResponse};

use crate::errors::AppError;
use crate::web::extractors::resolve_bearer;
use crate::web::handlers::{admin_handlers, auth_handlers, cart_handlers, checkout_handlers, product_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Mounts every route under `/api`. Malformed bodies and path ids are
/// reported with the same `{"error": ...}` shape as every other failure,
/// and any bearer token sent is checked before routing.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(
      web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(format!("Invalid request body: {}", err)).into()),
    )
    .app_data(
      web::PathConfig::default()
        .error_handler(|err, _req| AppError::Validation(format!("Invalid path parameter: {}", err)).into()),
    )
    .service(
      web::scope("/api")
        .wrap(from_fn(resolve_bearer))
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/auth")
            .route("/register", web::post().to(auth_handlers::register_handler))
            .route("/login", web::post().to(auth_handlers::login_handler))
            .route("/logout", web::post().to(auth_handlers::logout_handler))
            .route("/me", web::get().to(auth_handlers::me_handler)),
        )
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
        )
        .service(
          web::scope("/cart")
            .route("", web::get().to(cart_handlers::get_cart_handler))
            .route("", web::post().to(cart_handlers::add_to_cart_handler))
            .route("/{cart_line_id}", web::put().to(cart_handlers::update_cart_line_handler))
            .route("/{cart_line_id}", web::delete().to(cart_handlers::remove_cart_line_handler)),
        )
        .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
        .route("/orders", web::get().to(checkout_handlers::order_history_handler))
        .service(
          web::scope("/admin")
            .route("/users", web::get().to(admin_handlers::list_users_handler))
            .route("/products", web::post().to(admin_handlers::create_product_handler))
            .route("/products/{product_id}", web::put().to(admin_handlers::update_product_handler))
            .route("/products/{product_id}", web::delete().to(admin_handlers::delete_product_handler)),
        ),
    );
}
