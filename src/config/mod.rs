//! Configuration modules for the LunchLit API.
//!
//! Each submodule handles a specific aspect of configuration, typically
//! loaded from environment variables with development-friendly defaults.
//!
//! # Modules
//!
//! - [`cache`]: Redis cache connection and TTLs
//! - [`chat`]: Upstream AI chat provider settings
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`database`]: PostgreSQL database connection pool initialization
//! - [`email`]: Email/SMTP configuration for sending notifications
//! - [`jwt`]: JWT authentication configuration
//! - [`rate_limit`]: API rate limiting configuration

pub mod cache;
pub mod chat;
pub mod cors;
pub mod database;
pub mod email;
pub mod jwt;
pub mod rate_limit;
