//! Admin handlers - role and permission management.
//!
//! Every write path mutates the store and invalidates the authorization
//! cache before replying, so a follow-up request on this process observes
//! the change immediately.

use actix_web::{HttpResponse, web};

use palisade_core::domain::roles;
use palisade_shared::ApiResponse;
use palisade_shared::dto::{
    AssignRoleRequest, GrantPermissionRequest, PermissionsResponse, RoleResponse,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Gate an endpoint on the admin role, resolved through the cache.
async fn require_admin(state: &AppState, identity: &Identity) -> Result<(), AppError> {
    if state.authz.is_admin(&identity.address).await {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// GET /api/admin/accounts/{address}/role
pub async fn get_role(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    require_admin(&state, &identity).await?;
    let address = path.into_inner();

    let role = state.authz.role_for(&address).await;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(RoleResponse { address, role })))
}

/// PUT /api/admin/accounts/{address}/role
pub async fn assign_role(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<AssignRoleRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&state, &identity).await?;
    let address = path.into_inner();
    let req = body.into_inner();

    if !roles::ASSIGNABLE.contains(&req.role.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unknown role '{}'",
            req.role
        )));
    }

    state.authz.assign_role(&address, &req.role).await?;
    tracing::info!(address = %address, role = %req.role, "Role assigned");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(RoleResponse {
        address,
        role: req.role,
    })))
}

/// GET /api/admin/accounts/{address}/permissions
pub async fn get_permissions(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    require_admin(&state, &identity).await?;
    let address = path.into_inner();

    let permissions = state.authz.permissions_for(&address).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PermissionsResponse {
        address,
        permissions,
    })))
}

/// POST /api/admin/accounts/{address}/permissions
pub async fn grant_permission(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<GrantPermissionRequest>,
) -> AppResult<HttpResponse> {
    require_admin(&state, &identity).await?;
    let address = path.into_inner();
    let req = body.into_inner();

    if req.permission.trim().is_empty() {
        return Err(AppError::BadRequest("Permission must not be empty".to_string()));
    }

    state
        .authz
        .grant_permission(&address, &req.permission)
        .await?;
    tracing::info!(address = %address, permission = %req.permission, "Permission granted");

    let permissions = state.authz.permissions_for(&address).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(PermissionsResponse {
        address,
        permissions,
    })))
}

/// DELETE /api/admin/accounts/{address}/permissions/{permission}
pub async fn revoke_permission(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    require_admin(&state, &identity).await?;
    let (address, permission) = path.into_inner();

    state.authz.revoke_permission(&address, &permission).await?;
    tracing::info!(address = %address, permission = %permission, "Permission revoked");

    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /api/admin/accounts/{address}
pub async fn delete_account(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    require_admin(&state, &identity).await?;
    let address = path.into_inner();

    state.authz.delete_account(&address).await?;
    tracing::info!(address = %address, "Account deleted");

    Ok(HttpResponse::NoContent().finish())
}
