//! SeaORM entities.

pub mod account;
pub mod permission_grant;
