use bcrypt::hash;
use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};
use fake::faker::address::en::*;
use fake::faker::name::en::*;
use fake::Fake;
use rayon::prelude::*;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;
use uuid::Uuid;

use crate::modules::roles::model::BaseRole;

/// Signup-domain suffix shared by every seeded school. `clear-seed` keys off
/// it, so seeded schools must never use anything else.
const SEED_DOMAIN_SUFFIX: &str = ".k12.example.org";

const SCHOOL_KINDS: [&str; 4] = ["High School", "Academy", "Preparatory School", "Charter School"];

const GRADES: [&str; 4] = ["freshman", "sophomore", "junior", "senior"];

const BREAKFAST_ITEMS: [&str; 6] = [
    "Blueberry Pancakes",
    "Egg & Cheese Biscuit",
    "Oatmeal Bar",
    "Yogurt Parfait",
    "Breakfast Burrito",
    "French Toast Sticks",
];

const LUNCH_MAINS: [&str; 8] = [
    "Crispy Chicken Sandwich",
    "Cheese Pizza",
    "Beef Tacos",
    "Mac & Cheese",
    "Turkey Club Wrap",
    "Veggie Stir Fry",
    "BBQ Pulled Pork",
    "Spaghetti & Meatballs",
];

const LUNCH_SIDES: [&str; 6] = [
    "Garden Salad",
    "Seasoned Fries",
    "Fruit Cup",
    "Steamed Broccoli",
    "Cornbread",
    "Carrot Sticks",
];

const STUDY_HALLS: [(&str, &str, i32); 2] =
    [("Library Commons", "LIB", 48), ("Quiet Study", "204", 24)];

pub struct SchoolSeed {
    pub name: String,
    pub address: String,
    pub signup_domain: String,
}

pub struct UserSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub base_role: BaseRole,
    pub school_id: Uuid,
    pub grade_level: Option<&'static str>,
}

pub struct UsersPerSchool {
    pub teachers: usize,
    pub counselors: usize,
    pub students: usize,
}

impl Default for UsersPerSchool {
    fn default() -> Self {
        Self {
            teachers: 5,
            counselors: 2,
            students: 40,
        }
    }
}

/// Seeds the database with fake schools, staff, students, menus for the
/// coming week, study halls, and one custom role per school.
///
/// Performance:
/// 1. Parallel data generation using Rayon across all CPU cores
/// 2. Batch inserts with multi-value INSERT statements
/// 3. Single bcrypt hash (cost 4) reused for all seeded users
pub async fn seed_database(
    db: &PgPool,
    num_schools: usize,
    users_per_school: UsersPerSchool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    println!("🌱 Starting database seeding...");
    println!("   - Schools: {}", num_schools);
    println!(
        "   - Users per school: {} teachers, {} counselors, {} students",
        users_per_school.teachers, users_per_school.counselors, users_per_school.students
    );

    println!("\n🔧 Generating fake data in parallel...");
    let gen_start = Instant::now();

    let schools = generate_schools_parallel(num_schools);

    let total_users_per_school =
        users_per_school.teachers + users_per_school.counselors + users_per_school.students;
    let total_users = num_schools * total_users_per_school;

    println!(
        "   ✓ Generated {} schools and prepared {} users in {:?}",
        schools.len(),
        total_users,
        gen_start.elapsed()
    );

    println!("\n🏫 Inserting schools in batch...");
    let school_start = Instant::now();

    let school_ids = insert_schools_batch(db, &schools).await?;

    println!(
        "   ✓ Inserted {} schools in {:?}",
        school_ids.len(),
        school_start.elapsed()
    );

    // bcrypt is CPU-intensive; seeded users share one low-cost hash. Real
    // signups still hash at the default cost.
    println!("\n🔐 Hashing password...");
    let hash_start = Instant::now();

    let password_hash =
        hash("password123", 4).map_err(|e| format!("Failed to hash password: {}", e))?;

    println!("   ✓ Hashed password in {:?}", hash_start.elapsed());

    println!("\n👥 Generating user data in parallel...");
    let user_gen_start = Instant::now();

    let users = generate_users_parallel(&school_ids, &users_per_school, &password_hash);

    println!(
        "   ✓ Generated {} users in {:?}",
        users.len(),
        user_gen_start.elapsed()
    );

    println!("\n💾 Inserting users in batches...");
    let user_insert_start = Instant::now();

    let inserted_users = insert_users_batch(db, &users).await?;

    println!(
        "   ✓ Inserted {} users in {:?}",
        inserted_users.len(),
        user_insert_start.elapsed()
    );

    println!("\n🔑 Assigning base roles...");
    let role_start = Instant::now();

    assign_roles_batch(db, &inserted_users).await?;

    println!(
        "   ✓ Assigned roles to {} users in {:?}",
        inserted_users.len(),
        role_start.elapsed()
    );

    println!("\n🎨 Creating a custom role per school...");
    let custom_roles = seed_custom_roles(db, &school_ids).await?;
    assign_custom_roles_to_first_teacher(db, &custom_roles, &inserted_users).await?;
    println!("   ✓ Created {} custom roles", custom_roles.len());

    println!("\n🍽️  Seeding menus for the coming week...");
    let menu_rows = seed_menus(db, &school_ids).await?;
    println!("   ✓ Inserted {} menu items", menu_rows);

    println!("\n📖 Seeding study halls...");
    let hall_rows = seed_study_halls(db, &school_ids).await?;
    println!("   ✓ Inserted {} study halls", hall_rows);

    println!(
        "\n✅ Seeding complete! Created {} schools and {} users in {:?}",
        num_schools,
        total_users,
        start_time.elapsed()
    );
    println!("\n📝 Default password for all users: password123");

    Ok(())
}

fn generate_schools_parallel(count: usize) -> Vec<SchoolSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let city: String = CityName().fake();
            let street: String = StreetName().fake();
            let building: String = BuildingNumber().fake();
            let state: String = StateAbbr().fake();
            let zip: String = ZipCode().fake();

            let slug: String = city
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect();

            SchoolSeed {
                name: format!("{} {}", city, SCHOOL_KINDS[idx % SCHOOL_KINDS.len()]),
                address: format!("{} {}, {}, {} {}", building, street, city, state, zip),
                // Index keeps domains unique when two fake cities collide.
                signup_domain: format!("{}{}{}", slug, idx, SEED_DOMAIN_SUFFIX),
            }
        })
        .collect()
}

fn generate_users_parallel(
    school_ids: &[Uuid],
    users_per_school: &UsersPerSchool,
    password_hash: &str,
) -> Vec<UserSeed> {
    let total_users = school_ids.len()
        * (users_per_school.teachers + users_per_school.counselors + users_per_school.students);

    let mut user_specs = Vec::with_capacity(total_users);

    for (school_idx, &school_id) in school_ids.iter().enumerate() {
        for user_idx in 0..users_per_school.teachers {
            user_specs.push((BaseRole::Teacher, school_id, school_idx, user_idx, None));
        }
        for user_idx in 0..users_per_school.counselors {
            user_specs.push((BaseRole::Counselor, school_id, school_idx, user_idx, None));
        }
        for user_idx in 0..users_per_school.students {
            let grade = GRADES[user_idx % GRADES.len()];
            user_specs.push((BaseRole::Student, school_id, school_idx, user_idx, Some(grade)));
        }
    }

    user_specs
        .into_par_iter()
        .map(|(base_role, school_id, school_idx, user_idx, grade_level)| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();

            let email = format!(
                "{}.{}+{}{}@example.com",
                first_name.to_lowercase(),
                last_name.to_lowercase(),
                base_role.as_str(),
                school_idx * 1000 + user_idx
            );

            UserSeed {
                first_name,
                last_name,
                email,
                password_hash: password_hash.to_string(),
                base_role,
                school_id,
                grade_level,
            }
        })
        .collect()
}

async fn insert_schools_batch(
    db: &PgPool,
    schools: &[SchoolSeed],
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    let mut tx = db.begin().await?;

    // 3 params per school; stay far under the ~32k parameter limit.
    const BATCH_SIZE: usize = 500;
    let mut all_ids = Vec::with_capacity(schools.len());

    for chunk in schools.chunks(BATCH_SIZE) {
        let ids = insert_schools_chunk(&mut tx, chunk).await?;
        all_ids.extend(ids);
    }

    tx.commit().await?;
    Ok(all_ids)
}

async fn insert_schools_chunk(
    tx: &mut Transaction<'_, Postgres>,
    schools: &[SchoolSeed],
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    if schools.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = String::from("INSERT INTO schools (name, address, signup_domain) VALUES ");

    for (i, _) in schools.iter().enumerate() {
        if i > 0 {
            query.push_str(", ");
        }
        let p = i * 3;
        query.push_str(&format!("(${}, ${}, ${})", p + 1, p + 2, p + 3));
    }

    query.push_str(" RETURNING id");

    let mut q = sqlx::query_scalar(&query);
    for school in schools {
        q = q
            .bind(&school.name)
            .bind(&school.address)
            .bind(&school.signup_domain);
    }

    let ids: Vec<Uuid> = q.fetch_all(&mut **tx).await?;
    Ok(ids)
}

/// Returns (user_id, base_role, school_id) tuples for role assignment.
async fn insert_users_batch(
    db: &PgPool,
    users: &[UserSeed],
) -> Result<Vec<(Uuid, BaseRole, Uuid)>, Box<dyn std::error::Error>> {
    let mut tx = db.begin().await?;

    // 6 params per user.
    const BATCH_SIZE: usize = 1000;

    let mut inserted = Vec::with_capacity(users.len());

    for chunk in users.chunks(BATCH_SIZE) {
        let user_ids = insert_users_chunk(&mut tx, chunk).await?;
        for (user_id, user_seed) in user_ids.iter().zip(chunk.iter()) {
            inserted.push((*user_id, user_seed.base_role, user_seed.school_id));
        }
    }

    tx.commit().await?;
    Ok(inserted)
}

async fn insert_users_chunk(
    tx: &mut Transaction<'_, Postgres>,
    users: &[UserSeed],
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    if users.is_empty() {
        return Ok(Vec::new());
    }

    // Seeded students get a progression stamp so their grade holds until the
    // next school year instead of advancing on first profile read.
    let mut query = String::from(
        "INSERT INTO users (first_name, last_name, email, password, school_id, grade_level, last_grade_progression) VALUES ",
    );

    for (i, _) in users.iter().enumerate() {
        if i > 0 {
            query.push_str(", ");
        }
        let p = i * 6;
        query.push_str(&format!(
            "(${}, ${}, ${}, ${}, ${}, ${}, CASE WHEN ${}::text IS NULL THEN NULL ELSE NOW() END)",
            p + 1,
            p + 2,
            p + 3,
            p + 4,
            p + 5,
            p + 6,
            p + 6
        ));
    }

    query.push_str(" RETURNING id");

    let mut q = sqlx::query_scalar(&query);
    for user in users {
        q = q
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.school_id)
            .bind(user.grade_level);
    }

    let ids: Vec<Uuid> = q.fetch_all(&mut **tx).await?;
    Ok(ids)
}

async fn assign_roles_batch(
    db: &PgPool,
    user_roles: &[(Uuid, BaseRole, Uuid)],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut tx = db.begin().await?;

    const BATCH_SIZE: usize = 2000;

    for chunk in user_roles.chunks(BATCH_SIZE) {
        assign_roles_chunk(&mut tx, chunk).await?;
    }

    tx.commit().await?;
    Ok(())
}

async fn assign_roles_chunk(
    tx: &mut Transaction<'_, Postgres>,
    user_roles: &[(Uuid, BaseRole, Uuid)],
) -> Result<(), Box<dyn std::error::Error>> {
    if user_roles.is_empty() {
        return Ok(());
    }

    let mut query = String::from("INSERT INTO role_assignments (user_id, base_role, school_id) VALUES ");

    for (i, _) in user_roles.iter().enumerate() {
        if i > 0 {
            query.push_str(", ");
        }
        let p = i * 3;
        query.push_str(&format!("(${}, ${}, ${})", p + 1, p + 2, p + 3));
    }

    query.push_str(" ON CONFLICT DO NOTHING");

    let mut q = sqlx::query(&query);
    for (user_id, base_role, school_id) in user_roles {
        q = q.bind(user_id).bind(base_role.as_str()).bind(school_id);
    }

    q.execute(&mut **tx).await?;
    Ok(())
}

/// One "Menu Crew" role per school, granting menu management.
async fn seed_custom_roles(
    db: &PgPool,
    school_ids: &[Uuid],
) -> Result<Vec<(Uuid, Uuid)>, Box<dyn std::error::Error>> {
    if school_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = String::from(
        "INSERT INTO custom_roles (school_id, name, color, icon, priority, permissions) VALUES ",
    );

    for (i, _) in school_ids.iter().enumerate() {
        if i > 0 {
            query.push_str(", ");
        }
        let p = i * 6;
        query.push_str(&format!(
            "(${}, ${}, ${}, ${}, ${}, ${})",
            p + 1,
            p + 2,
            p + 3,
            p + 4,
            p + 5,
            p + 6
        ));
    }

    query.push_str(" ON CONFLICT (school_id, name) DO NOTHING RETURNING school_id, id");

    let permissions = vec!["manage_menus".to_string()];

    let mut q = sqlx::query_as::<_, (Uuid, Uuid)>(&query);
    for school_id in school_ids {
        q = q
            .bind(school_id)
            .bind("Menu Crew")
            .bind("#38bdf8")
            .bind("utensils")
            .bind(2i32)
            .bind(&permissions);
    }

    let rows = q.fetch_all(db).await?;
    Ok(rows)
}

/// Gives each school's first seeded teacher its custom role, so resolved
/// permissions in seeded data exercise the base-plus-custom union.
async fn assign_custom_roles_to_first_teacher(
    db: &PgPool,
    custom_roles: &[(Uuid, Uuid)],
    users: &[(Uuid, BaseRole, Uuid)],
) -> Result<(), Box<dyn std::error::Error>> {
    for (school_id, custom_role_id) in custom_roles {
        let teacher = users
            .iter()
            .find(|(_, role, school)| *role == BaseRole::Teacher && school == school_id);

        let Some((user_id, base_role, _)) = teacher else {
            continue;
        };

        sqlx::query(
            "INSERT INTO role_assignments (user_id, base_role, custom_role_id, school_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(base_role.as_str())
        .bind(custom_role_id)
        .bind(school_id)
        .execute(db)
        .await?;
    }

    Ok(())
}

/// Breakfast and lunch items for each weekday of the coming week. Item pools
/// rotate by school and day so no two schools serve identical weeks.
async fn seed_menus(db: &PgPool, school_ids: &[Uuid]) -> Result<u64, Box<dyn std::error::Error>> {
    let today = Utc::now().date_naive();

    let mut rows: Vec<(Uuid, NaiveDate, &str, &str, &str)> = Vec::new();

    for (school_idx, &school_id) in school_ids.iter().enumerate() {
        for day in 0..7u64 {
            let Some(date) = today.checked_add_days(Days::new(day)) else {
                continue;
            };
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }

            let d = day as usize;
            rows.push((
                school_id,
                date,
                "breakfast",
                BREAKFAST_ITEMS[(school_idx + d) % BREAKFAST_ITEMS.len()],
                "Breakfast Bar",
            ));
            rows.push((
                school_id,
                date,
                "lunch",
                LUNCH_MAINS[(school_idx + d) % LUNCH_MAINS.len()],
                "Main Line",
            ));
            rows.push((
                school_id,
                date,
                "lunch",
                LUNCH_SIDES[(school_idx * 2 + d) % LUNCH_SIDES.len()],
                "Sides",
            ));
        }
    }

    let mut tx = db.begin().await?;

    // 5 params per row.
    const BATCH_SIZE: usize = 1000;
    let mut total = 0u64;

    for chunk in rows.chunks(BATCH_SIZE) {
        let mut query = String::from(
            "INSERT INTO menu_items (school_id, served_on, meal, name, station) VALUES ",
        );

        for (i, _) in chunk.iter().enumerate() {
            if i > 0 {
                query.push_str(", ");
            }
            let p = i * 5;
            query.push_str(&format!(
                "(${}, ${}, ${}, ${}, ${})",
                p + 1,
                p + 2,
                p + 3,
                p + 4,
                p + 5
            ));
        }

        query.push_str(" ON CONFLICT (school_id, served_on, meal, name) DO NOTHING");

        let mut q = sqlx::query(&query);
        for (school_id, date, meal, name, station) in chunk {
            q = q.bind(school_id).bind(date).bind(meal).bind(name).bind(station);
        }

        total += q.execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    Ok(total)
}

async fn seed_study_halls(
    db: &PgPool,
    school_ids: &[Uuid],
) -> Result<u64, Box<dyn std::error::Error>> {
    if school_ids.is_empty() {
        return Ok(0);
    }

    let mut query = String::from("INSERT INTO study_halls (school_id, name, room, capacity) VALUES ");

    let total_rows = school_ids.len() * STUDY_HALLS.len();
    for i in 0..total_rows {
        if i > 0 {
            query.push_str(", ");
        }
        let p = i * 4;
        query.push_str(&format!("(${}, ${}, ${}, ${})", p + 1, p + 2, p + 3, p + 4));
    }

    let mut q = sqlx::query(&query);
    for school_id in school_ids {
        for (name, room, capacity) in STUDY_HALLS {
            q = q.bind(school_id).bind(name).bind(room).bind(capacity);
        }
    }

    let inserted = q.execute(db).await?.rows_affected();
    Ok(inserted)
}

/// Clears seeded rows. Seeded users are matched by the seeded email domain,
/// seeded schools by the seeded signup-domain suffix; admins survive either
/// way. School deletes cascade to menus, study halls, and custom roles.
pub async fn clear_seeded_data(db: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let mut tx = db.begin().await?;

    let users_deleted = sqlx::query(
        r#"DELETE FROM users u
        WHERE u.email LIKE '%@example.com'
        AND NOT EXISTS (
            SELECT 1 FROM role_assignments ra
            WHERE ra.user_id = u.id
            AND ra.base_role = 'admin'
        )"#,
    )
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let schools_deleted = sqlx::query("DELETE FROM schools WHERE signup_domain LIKE $1")
        .bind(format!("%{}", SEED_DOMAIN_SUFFIX))
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    println!(
        "   ✓ Deleted {} users and {} schools in {:?}",
        users_deleted,
        schools_deleted,
        start_time.elapsed()
    );
    println!("✅ Seeded data cleared successfully!");

    Ok(())
}
