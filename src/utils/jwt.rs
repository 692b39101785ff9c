use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::modules::auth::model::Claims;
use crate::modules::roles::permissions::ResolvedPermissions;
use crate::utils::errors::AppError;

/// Creates an access token carrying the user's resolved role and permission
/// snapshot. The snapshot is refreshed on the next login; live checks go
/// through `/api/me/permissions`.
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    school_id: Option<Uuid>,
    resolved: &ResolvedPermissions,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        school_id,
        roles: resolved.role_slugs(),
        permissions: resolved.permission_strings(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {}", e)))
}

pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid or expired token")))
}
