use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::modules::auth::model::Claims;
use crate::modules::roles::model::{BaseRole, Permission};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::verify_token;

/// Extractor that validates the bearer JWT and exposes the caller's claims.
/// Claims carry the role and permission snapshot resolved at login; live
/// checks re-resolve through the roles service.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.0
            .permissions
            .iter()
            .any(|p| p == permission.as_str())
    }

    /// True if the user holds at least one of the given permissions.
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(*p))
    }

    /// True if the user holds every one of the given permissions.
    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    pub fn has_base_role(&self, role: BaseRole) -> bool {
        self.0.roles.iter().any(|r| r == role.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.has_base_role(BaseRole::Admin)
    }

    /// Teachers and counselors verify brag-sheet entries.
    pub fn is_verifier(&self) -> bool {
        self.has_base_role(BaseRole::Teacher) || self.has_base_role(BaseRole::Counselor)
    }

    pub fn school_id(&self) -> Option<uuid::Uuid> {
        self.0.school_id
    }

    pub fn user_id(&self) -> Result<uuid::Uuid, AppError> {
        uuid::Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid user ID in token")))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AppError::unauthorized(anyhow::anyhow!("Missing or malformed bearer token"))
                })?;

        let claims = verify_token(bearer.token(), &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Creates a permission-gated extractor. Handlers take the generated type
/// as an argument and the check happens before the handler body runs.
#[macro_export]
macro_rules! require_permission {
    ($name:ident, $permission:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = $crate::utils::errors::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                if !auth_user.has_permission($permission) {
                    return Err($crate::utils::errors::AppError::forbidden(anyhow::anyhow!(
                        "Access denied. Missing required permission: {}",
                        $permission.as_str()
                    )));
                }

                Ok($name(auth_user))
            }
        }
    };
}

// One extractor per permission in the closed set.

require_permission!(RequireManageUsers, Permission::ManageUsers);
require_permission!(RequireManageSchools, Permission::ManageSchools);
require_permission!(RequireManageMenus, Permission::ManageMenus);
require_permission!(RequireManageStudyHalls, Permission::ManageStudyHalls);
require_permission!(RequireVerifyEntries, Permission::VerifyEntries);
require_permission!(RequireManageDiscussions, Permission::ManageDiscussions);
require_permission!(RequireViewAnalytics, Permission::ViewAnalytics);
require_permission!(RequireManageRoles, Permission::ManageRoles);
