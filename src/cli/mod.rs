use sqlx::PgPool;
use uuid::Uuid;

use crate::modules::roles::model::BaseRole;
use crate::utils::password::hash_password;

pub mod seeder;

/// Inserts a user with an `admin` base-role assignment. Admins carry no
/// school scope; the base role alone grants every permission.
pub async fn create_admin(
    db: &PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let hashed_password =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let mut tx = db.begin().await?;

    let user_id: Option<Uuid> = sqlx::query_scalar(
        "INSERT INTO users (first_name, last_name, email, password, school_id)
         VALUES ($1, $2, $3, $4, NULL)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(&hashed_password)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = user_id else {
        return Err("User with this email already exists".into());
    };

    sqlx::query("INSERT INTO role_assignments (user_id, base_role) VALUES ($1, $2)")
        .bind(user_id)
        .bind(BaseRole::Admin.as_str())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}
