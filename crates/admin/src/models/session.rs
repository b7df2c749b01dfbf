//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};
use tidewater_api::User;
use tidewater_core::{UserId, UserRole};

/// Session-stored admin identity.
///
/// Copied from the backend's answer at login. Any later 401/419 from the
/// backend clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Backend user ID.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Account role; only admins get past [`RequireAdmin`].
    ///
    /// [`RequireAdmin`]: crate::middleware::RequireAdmin
    pub role: UserRole,
}

impl From<User> for CurrentAdmin {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the admin's backend cookie jar.
    pub const BACKEND_COOKIES: &str = "backend_cookies";

    /// Key for the pending flash message.
    pub const FLASH: &str = "flash";
}
