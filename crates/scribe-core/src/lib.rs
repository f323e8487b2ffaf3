//! # Scribe Core
//!
//! Core types and errors shared across the Scribe API.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Limit/offset pagination for list endpoints
//!
//! # Example
//!
//! ```ignore
//! use scribe_core::errors::AppError;
//! use scribe_core::pagination::PaginationParams;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Blog not found"));
//!
//! let params = PaginationParams::default();
//! assert_eq!(params.limit(), 20);
//! ```

pub mod errors;
pub mod pagination;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
