//! Authorization guards for the issue endpoints.
//!
//! `auth_middleware` attaches an `AuthenticatedUser` when a valid bearer
//! token is present. The guards below are the single place where the admin
//! capability is checked; handlers opt in by taking a guard as an argument.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for moderation endpoints.
///
/// Rejects anonymous requests with 401 and non-admin accounts with 403.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(admin): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        if !user.has_admin_access() {
            return Err(AppError::Forbidden(
                "Admin privileges required".to_string(),
            ));
        }

        Ok(RequireAdmin(user.clone()))
    }
}
