//! Request extractors for authentication and authorization.
//!
//! - [`auth::AuthUser`]: any valid bearer token. `Option<AuthUser>` accepts
//!   anonymous callers on public read routes.
//! - [`auth::RequireAdmin`]: valid token with the `admin` role.
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequireAdmin};
//!
//! async fn list_blogs(auth_user: Option<AuthUser>) -> impl IntoResponse {
//!     let role = requester_role(auth_user.as_ref());
//!     // ...
//! }
//!
//! async fn create_blog(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
//!     // Only executes for admins
//! }
//! ```

pub mod auth;
