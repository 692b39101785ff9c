use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::modules::users::grades::GradeLevel;
use crate::modules::users::model::User;

/// JWT claims. Roles and permissions are a snapshot taken at login; live
/// checks go through the roles service instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    pub email: String,
    pub school_id: Option<Uuid>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequestDto {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub grade_level: Option<GradeLevel>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn register_dto_enforces_password_length() {
        let dto = RegisterRequestDto {
            first_name: "Sam".to_string(),
            last_name: "Rivera".to_string(),
            email: "sam@northside.edu".to_string(),
            password: "short".to_string(),
            grade_level: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn register_dto_accepts_optional_grade() {
        let json = r#"{"first_name":"Sam","last_name":"Rivera","email":"sam@northside.edu","password":"longenough1","grade_level":"freshman"}"#;
        let dto: RegisterRequestDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.grade_level, Some(GradeLevel::Freshman));
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn login_request_requires_valid_email() {
        let dto = LoginRequest {
            email: "not-an-email".to_string(),
            password: "whatever".to_string(),
        };
        assert!(dto.validate().is_err());
    }
}
