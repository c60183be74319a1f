//! Sqlkit-Common: shared error type and configuration.
//!
//! - **Error Handling**: [`Error`] and the [`Result`] alias used by every crate
//! - **Configuration**: [`config::Config`] with database and pagination sections
//!
//! # Examples
//!
//! ```
//! use sqlkit_common::{Config, Error, Result};
//!
//! let config = Config::from_json(r#"{"pagination": {"per_page": 20}}"#).unwrap();
//! assert_eq!(config.pagination.per_page, 20);
//!
//! fn lookup() -> Result<()> {
//!     Err(Error::not_found("user 1"))
//! }
//! assert!(lookup().is_err());
//! ```

pub mod config;
pub mod error;

pub use config::{Config, DatabaseConfig, PaginationConfig};
pub use error::{Error, Result};
