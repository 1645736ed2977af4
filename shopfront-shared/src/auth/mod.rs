/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: Access/refresh token issuing and validation
/// - [`middleware`]: The per-request [`middleware::AuthContext`]
/// - [`authorization`]: Role checks (admin gate, owner-or-admin)
///
/// # Example
///
/// ```no_run
/// use shopfront_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
/// use shopfront_shared::auth::password::{hash_password, verify_password};
/// use shopfront_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("S3cure!pass")?;
/// assert!(verify_password("S3cure!pass", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), UserRole::Customer, TokenType::Access);
/// let token = create_token(&claims, "a-secret-that-is-at-least-32-bytes")?;
/// let validated = validate_access_token(&token, "a-secret-that-is-at-least-32-bytes")?;
/// assert_eq!(validated.role, UserRole::Customer);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
