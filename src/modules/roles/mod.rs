//! Roles, permissions, and the hierarchy rules that gate who can manage whom.

pub mod controller;
pub mod hierarchy;
pub mod model;
pub mod permissions;
pub mod router;
pub mod service;
