//! # Scribe Auth
//!
//! Bearer token handling for the Scribe API.
//!
//! Tokens are issued by the identity service (or by `scribe-cli` for
//! operators) and carry the user's id, email and role, so handlers can make
//! authorization decisions and build role-scoped cache keys without a
//! database lookup.
//!
//! # Example
//!
//! ```ignore
//! use scribe_auth::{UserRole, create_access_token, verify_token};
//! use scribe_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "ada@example.com", UserRole::Admin, &config)?;
//!
//! let claims = verify_token(&token, &config)?;
//! assert!(claims.role.is_admin());
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{Claims, UserRole};
pub use jwt::{create_access_token, verify_token};
