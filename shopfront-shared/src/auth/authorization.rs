/// Role checks for handlers
///
/// Two rules cover the storefront:
///
/// 1. Catalogue mutations and everything under `/api/admin` need the admin role
/// 2. An order is visible to the customer who placed it and to admins
///
/// # Example
///
/// ```
/// use shopfront_shared::auth::authorization::{require_admin, require_owner_or_admin};
/// use shopfront_shared::auth::middleware::AuthContext;
/// use shopfront_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let customer = AuthContext::new(Uuid::new_v4(), UserRole::Customer);
/// assert!(require_admin(&customer).is_err());
/// assert!(require_owner_or_admin(&customer, customer.user_id).is_ok());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Admin role required
    #[error("Admin access required")]
    NotAdmin,

    /// User doesn't own the resource
    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Requires the caller to be an admin
///
/// # Errors
///
/// Returns `AuthzError::NotAdmin` for customers
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::NotAdmin)
    }
}

/// Requires the caller to own the resource or be an admin
///
/// # Errors
///
/// Returns `AuthzError::NotAuthorized` when a customer touches someone else's
/// resource
pub fn require_owner_or_admin(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id == owner_id || auth.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    #[test]
    fn test_require_admin() {
        let admin = AuthContext::new(Uuid::new_v4(), UserRole::Admin);
        let customer = AuthContext::new(Uuid::new_v4(), UserRole::Customer);

        assert!(require_admin(&admin).is_ok());
        assert!(matches!(require_admin(&customer), Err(AuthzError::NotAdmin)));
    }

    #[test]
    fn test_require_owner_or_admin() {
        let owner = AuthContext::new(Uuid::new_v4(), UserRole::Customer);
        let stranger = AuthContext::new(Uuid::new_v4(), UserRole::Customer);
        let admin = AuthContext::new(Uuid::new_v4(), UserRole::Admin);

        assert!(require_owner_or_admin(&owner, owner.user_id).is_ok());
        assert!(require_owner_or_admin(&admin, owner.user_id).is_ok());
        assert!(matches!(
            require_owner_or_admin(&stranger, owner.user_id),
            Err(AuthzError::NotAuthorized)
        ));
    }
}
