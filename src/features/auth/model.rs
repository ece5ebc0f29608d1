use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account identity carried by a validated bearer token.
///
/// Lives only in the extensions of the request it arrived with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub is_admin: bool,
}

impl AuthenticatedUser {
    /// Check if the account may moderate reports
    pub fn has_admin_access(&self) -> bool {
        self.is_admin
    }
}

/// Claims minted by the account service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    pub exp: u64,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            phone: claims.phone,
            is_admin: claims.is_admin,
        }
    }
}
