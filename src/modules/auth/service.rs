use anyhow::anyhow;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::cache::RedisCache;
use crate::config::jwt::JwtConfig;
use crate::metrics;
use crate::modules::roles::model::BaseRole;
use crate::modules::roles::service as roles_service;
use crate::modules::users::model::User;
use crate::utils::email::EmailService;
use crate::utils::errors::AppError;
use crate::utils::jwt::create_access_token;
use crate::utils::password::{hash_password, verify_password};

use super::model::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequestDto, ResetPasswordRequest,
};

fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub struct AuthService;

impl AuthService {
    /// Registers a new account. If the email's domain matches a school's
    /// signup domain, the account is linked to that school and given the
    /// student base role; otherwise it starts with no assignments.
    #[instrument(skip_all, fields(email = %dto.email))]
    pub async fn register_user(db: &PgPool, dto: RegisterRequestDto) -> Result<User, AppError> {
        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
            .bind(&dto.email)
            .fetch_optional(db)
            .await?;

        if existing.is_some() {
            return Err(AppError::bad_request(anyhow!("Email already exists")));
        }

        let domain = dto
            .email
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_lowercase());

        let school_id: Option<Uuid> = match &domain {
            Some(domain) => {
                sqlx::query_scalar("SELECT id FROM schools WHERE LOWER(signup_domain) = $1")
                    .bind(domain)
                    .fetch_optional(db)
                    .await?
            }
            None => None,
        };

        let hashed_password = hash_password(&dto.password)?;
        let grade_level = dto.grade_level.map(|g| g.as_str().to_string());

        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"INSERT INTO users
                (first_name, last_name, email, password, school_id, grade_level,
                 last_grade_progression)
            VALUES ($1, $2, $3, $4, $5, $6,
                    CASE WHEN $6::text IS NULL THEN NULL ELSE NOW() END)
            RETURNING id, first_name, last_name, email, school_id, grade_level,
                      last_grade_progression, created_at, updated_at"#,
        )
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.email)
        .bind(&hashed_password)
        .bind(school_id)
        .bind(&grade_level)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::bad_request(anyhow!("Email already exists"));
                }
            }
            AppError::from(e)
        })?;

        if let Some(school_id) = school_id {
            sqlx::query(
                "INSERT INTO role_assignments (user_id, base_role, school_id) VALUES ($1, $2, $3)",
            )
            .bind(user.id)
            .bind(BaseRole::Student.as_str())
            .bind(school_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        metrics::track_user_registered();

        Ok(user)
    }

    /// Verifies credentials and issues a JWT carrying the role and
    /// permission snapshot resolved at this moment.
    #[instrument(skip_all, fields(email = %dto.email))]
    pub async fn login_user(
        db: &PgPool,
        cache: Option<&RedisCache>,
        permissions_ttl: Duration,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        #[derive(sqlx::FromRow)]
        struct UserWithPassword {
            id: Uuid,
            first_name: String,
            last_name: String,
            email: String,
            password: String,
            school_id: Option<Uuid>,
            grade_level: Option<String>,
            last_grade_progression: Option<chrono::DateTime<chrono::Utc>>,
            created_at: chrono::DateTime<chrono::Utc>,
            updated_at: chrono::DateTime<chrono::Utc>,
        }

        let row = sqlx::query_as::<_, UserWithPassword>(
            r#"SELECT id, first_name, last_name, email, password, school_id, grade_level,
                      last_grade_progression, created_at, updated_at
            FROM users WHERE email = $1"#,
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            metrics::track_login_failure("unknown_email");
            AppError::unauthorized(anyhow!("Invalid email or password"))
        })?;

        let is_valid = verify_password(&dto.password, &row.password)?;
        if !is_valid {
            metrics::track_login_failure("bad_password");
            return Err(AppError::unauthorized(anyhow!("Invalid email or password")));
        }

        let resolved =
            roles_service::resolve_user_permissions(db, cache, permissions_ttl, row.id).await?;

        let access_token =
            create_access_token(row.id, &row.email, row.school_id, &resolved, jwt_config)?;

        let user = User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            school_id: row.school_id,
            grade_level: row.grade_level,
            last_grade_progression: row.last_grade_progression,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        metrics::track_login_success();

        Ok(LoginResponse { access_token, user })
    }

    /// Issues a single-use reset token. The response does not reveal
    /// whether the email belongs to an account.
    #[instrument(skip_all, fields(email = %dto.email))]
    pub async fn forgot_password(
        db: &PgPool,
        email: &EmailService,
        dto: ForgotPasswordRequest,
    ) -> Result<(), AppError> {
        let user = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT id, email, first_name FROM users WHERE email = $1",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await?;

        let Some((user_id, to_email, first_name)) = user else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        sqlx::query(
            r#"INSERT INTO password_resets (user_id, token_hash, expires_at)
            VALUES ($1, $2, NOW() + INTERVAL '1 hour')"#,
        )
        .bind(user_id)
        .bind(hash_reset_token(&token))
        .execute(db)
        .await?;

        if let Err(e) = email
            .send_password_reset_email(&to_email, &first_name, &token)
            .await
        {
            warn!(error = %e.error, user_id = %user_id, "Failed to send password reset email");
        }

        Ok(())
    }

    /// Consumes a reset token and replaces the password.
    #[instrument(skip_all)]
    pub async fn reset_password(
        db: &PgPool,
        email: &EmailService,
        dto: ResetPasswordRequest,
    ) -> Result<(), AppError> {
        let row = sqlx::query_as::<_, (Uuid, Uuid, String, String)>(
            r#"SELECT pr.id, pr.user_id, u.email, u.first_name
            FROM password_resets pr
            INNER JOIN users u ON u.id = pr.user_id
            WHERE pr.token_hash = $1 AND pr.used_at IS NULL AND pr.expires_at > NOW()"#,
        )
        .bind(hash_reset_token(&dto.token))
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::bad_request(anyhow!("Invalid or expired reset token")))?;

        let (reset_id, user_id, to_email, first_name) = row;
        let hashed_password = hash_password(&dto.new_password)?;

        let mut tx = db.begin().await?;

        sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
            .bind(&hashed_password)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE password_resets SET used_at = NOW() WHERE id = $1")
            .bind(reset_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if let Err(e) = email
            .send_password_reset_confirmation(&to_email, &first_name)
            .await
        {
            warn!(error = %e.error, user_id = %user_id, "Failed to send reset confirmation email");
        }

        Ok(())
    }
}
