//! Middleware modules for request processing.
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. `AuthUser` extractor validates the JWT and extracts claims
//! 3. Permission extractors check if the user has the required permission
//! 4. Handler executes if all checks pass
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequireManageMenus};
//!
//! // Basic authentication (any valid token)
//! async fn get_profile(auth_user: AuthUser) -> impl IntoResponse {
//!     let user_id = auth_user.user_id()?;
//!     // ...
//! }
//!
//! // Permission-based access control
//! async fn create_menu_item(
//!     RequireManageMenus(auth_user): RequireManageMenus,
//! ) -> impl IntoResponse {
//!     // Only executes if the user holds "manage_menus"
//! }
//! ```

pub mod auth;
