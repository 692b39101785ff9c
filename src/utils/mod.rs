//! Shared utilities.
//!
//! - [`email`]: transactional email over SMTP
//! - [`errors`]: the application error type and HTTP mapping
//! - [`jwt`]: token creation and verification
//! - [`pagination`]: list pagination parameters and metadata
//! - [`password`]: bcrypt hashing and verification
//! - [`transfer`]: shared import/export report types

pub mod email;
pub mod errors;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod transfer;
