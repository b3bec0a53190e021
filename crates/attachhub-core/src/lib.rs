//! # attachhub-core
//!
//! Core crate for AttachHub. Contains the unified error system, the
//! configuration schemas, typed node identifiers, and the storage
//! provider trait implemented by `attachhub-storage`.
//!
//! This crate has **no** internal dependencies on other AttachHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
