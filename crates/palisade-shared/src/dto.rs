//! Data Transfer Objects - request/response types for the admin API.

use serde::{Deserialize, Serialize};

/// Request to assign a role to an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignRoleRequest {
    pub role: String,
}

/// Response carrying an account's resolved role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    pub address: String,
    pub role: String,
}

/// Request to grant a permission to an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantPermissionRequest {
    pub permission: String,
}

/// Response carrying an account's permission grants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsResponse {
    pub address: String,
    pub permissions: Vec<String>,
}
