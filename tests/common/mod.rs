use lunchlit::utils::password::hash_password;
#[allow(unused_imports)]
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub school_id: Option<Uuid>,
}

#[allow(dead_code)]
pub struct TestSchool {
    pub id: Uuid,
    pub name: String,
}

/// Create a test user with one base role assignment.
/// `base_role` should be one of: "admin", "teacher", "counselor", "student"
pub async fn create_test_user(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
    password: &str,
    base_role: &str,
    school_id: Option<Uuid>,
    grade_level: Option<&str>,
) -> TestUser {
    let hashed = hash_password(password).unwrap();

    // Seeding a grade also stamps the progression timestamp so the first
    // profile read doesn't advance it. Progression tests overwrite the
    // stamp with an old one explicitly.
    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (first_name, last_name, email, password, school_id, grade_level, last_grade_progression)
        VALUES ($1, $2, $3, $4, $5, $6, CASE WHEN $6::text IS NULL THEN NULL ELSE NOW() END)
        RETURNING id
        "#,
    )
    .bind("Test")
    .bind("User")
    .bind(email)
    .bind(&hashed)
    .bind(school_id)
    .bind(grade_level)
    .fetch_one(&mut **tx)
    .await
    .unwrap();

    assert!(
        matches!(base_role, "admin" | "teacher" | "counselor" | "student"),
        "Invalid base role: {}",
        base_role
    );

    sqlx::query(
        r#"
        INSERT INTO role_assignments (user_id, base_role, school_id)
        VALUES ($1, $2, $3)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(base_role)
    .bind(school_id)
    .execute(&mut **tx)
    .await
    .unwrap();

    TestUser {
        id: user_id,
        email: email.to_string(),
        password: password.to_string(),
        school_id,
    }
}

/// Add another base role to an existing user.
#[allow(dead_code)]
pub async fn add_base_role(tx: &mut Transaction<'_, Postgres>, user_id: Uuid, base_role: &str) {
    sqlx::query(
        r#"
        INSERT INTO role_assignments (user_id, base_role)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(base_role)
    .execute(&mut **tx)
    .await
    .unwrap();
}

#[allow(dead_code)]
pub async fn create_test_school(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    signup_domain: Option<&str>,
) -> TestSchool {
    let school_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO schools (name, address, signup_domain)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(Some("1 Test Street"))
    .bind(signup_domain)
    .fetch_one(&mut **tx)
    .await
    .unwrap();

    TestSchool {
        id: school_id,
        name: name.to_string(),
    }
}

#[allow(dead_code)]
pub async fn create_custom_role(
    tx: &mut Transaction<'_, Postgres>,
    school_id: Option<Uuid>,
    name: &str,
    permissions: &[&str],
    priority: i32,
    is_active: bool,
) -> Uuid {
    let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();

    sqlx::query_scalar(
        r#"
        INSERT INTO custom_roles (school_id, name, priority, is_active, permissions)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(school_id)
    .bind(name)
    .bind(priority)
    .bind(is_active)
    .bind(&permissions)
    .fetch_one(&mut **tx)
    .await
    .unwrap()
}

/// Attach a custom role to a user alongside a base role row.
#[allow(dead_code)]
pub async fn assign_custom_role(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    base_role: &str,
    custom_role_id: Uuid,
    school_id: Option<Uuid>,
) {
    sqlx::query(
        r#"
        INSERT INTO role_assignments (user_id, base_role, custom_role_id, school_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(base_role)
    .bind(custom_role_id)
    .bind(school_id)
    .execute(&mut **tx)
    .await
    .unwrap();
}

#[allow(dead_code)]
pub async fn create_study_hall(
    tx: &mut Transaction<'_, Postgres>,
    school_id: Uuid,
    name: &str,
    capacity: i32,
    is_open: bool,
) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO study_halls (school_id, name, room, capacity, is_open)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(school_id)
    .bind(name)
    .bind(Some("101"))
    .bind(capacity)
    .bind(is_open)
    .fetch_one(&mut **tx)
    .await
    .unwrap()
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

#[allow(dead_code)]
pub fn generate_unique_school_name() -> String {
    format!("Test School {}", Uuid::new_v4())
}
