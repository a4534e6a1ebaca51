pub mod jwt;
pub mod middleware;
pub mod password;

use crate::auth::jwt::Claims;
use crate::error::AppError;

/// Authorization predicate: the caller must be the subject user themselves.
/// Admins get no exception on this path (profile edits stay self-only).
///
/// # Errors
///
/// Returns `AppError::Forbidden` when the IDs differ.
pub fn require_self(claims: &Claims, user_id: i32) -> Result<(), AppError> {
    if claims.user_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden("Unauthorized".to_string()))
    }
}

/// Authorization predicate: the caller must own the resource or be an admin.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when neither condition holds.
pub fn require_owner_or_admin(claims: &Claims, owner_id: i32) -> Result<(), AppError> {
    if claims.user_id == owner_id || claims.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Unauthorized".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(user_id: i32, is_admin: bool) -> Claims {
        Claims {
            user_id,
            is_admin,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn self_check_ignores_admin_flag() {
        assert!(require_self(&claims(1, false), 1).is_ok());
        assert!(require_self(&claims(2, true), 1).is_err());
    }

    #[test]
    fn owner_or_admin_allows_either() {
        assert!(require_owner_or_admin(&claims(1, false), 1).is_ok());
        assert!(require_owner_or_admin(&claims(2, true), 1).is_ok());
        assert!(require_owner_or_admin(&claims(2, false), 1).is_err());
    }
}
