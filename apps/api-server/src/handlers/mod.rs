//! HTTP handlers and route configuration.

mod admin;
mod health;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Admin routes - role and permission management
            .service(
                web::scope("/admin/accounts/{address}")
                    .route("/role", web::get().to(admin::get_role))
                    .route("/role", web::put().to(admin::assign_role))
                    .route("/permissions", web::get().to(admin::get_permissions))
                    .route("/permissions", web::post().to(admin::grant_permission))
                    .route(
                        "/permissions/{permission}",
                        web::delete().to(admin::revoke_permission),
                    )
                    .route("", web::delete().to(admin::delete_account)),
            ),
    );
}
