//! # Scribe Config
//!
//! Configuration types for the Scribe API, loaded from environment variables:
//!
//! - [`jwt`]: Bearer token verification settings
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`rate_limit`]: Per-IP rate limiting
//! - [`server`]: Listen address
//!
//! Cache settings live next to the cache itself in `scribe-cache`.
//!
//! # Example
//!
//! ```ignore
//! use scribe_config::{CorsConfig, JwtConfig, RateLimitConfig, ServerConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! let server_config = ServerConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod server;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
