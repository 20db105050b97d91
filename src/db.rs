use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    parse_set, CheckIn, CheckInInput, HealthStatus, LifestyleCheck, Profile, Symptom,
};

const CHECK_IN_COLUMNS: &str = "id, user_id, hours_slept, stress_level, current_mood, \
     daily_activity_measure, num_of_water_glasses, current_health_status, \
     symptoms_today, lifestyle_checks, created_at";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let users = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "Avery Lee",
            "avery.lee@driftcare.app",
            Some(172.0),
            Some(68.0),
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Jules Moreno",
            "jules.moreno@driftcare.app",
            Some(165.0),
            Some(91.0),
        ),
    ];

    for (id, name, email, height_cm, weight_kg) in &users {
        upsert_user(pool, *id, name, email, *height_cm, *weight_kg).await?;
    }

    // Avery stays steady; Jules slides over the last week.
    let today = Utc::now();
    for day in 0..14i64 {
        let created_at = today - Duration::days(day);
        let steady = CheckInInput {
            hours_slept: 7.5 + (day % 3) as f64 * 0.5,
            stress_level: 3,
            current_mood: 7 + (day % 2) as i32,
            daily_activity_measure: 45.0,
            num_of_water_glasses: 7,
            current_health_status: HealthStatus::Good,
            symptoms_today: vec![],
            lifestyle_checks: vec![],
            created_at: Some(created_at),
        };
        let sliding = if day < 7 {
            CheckInInput {
                hours_slept: 5.0,
                stress_level: 8,
                current_mood: 4,
                daily_activity_measure: 10.0,
                num_of_water_glasses: 3,
                current_health_status: HealthStatus::Fair,
                symptoms_today: vec![Symptom::Fatigue, Symptom::Headache],
                lifestyle_checks: vec![LifestyleCheck::LateScreenTime],
                created_at: Some(created_at),
            }
        } else {
            CheckInInput {
                hours_slept: 7.5,
                stress_level: 4,
                current_mood: 7,
                daily_activity_measure: 40.0,
                num_of_water_glasses: 7,
                current_health_status: HealthStatus::Good,
                symptoms_today: vec![],
                lifestyle_checks: vec![],
                created_at: Some(created_at),
            }
        };

        for (user_id, input, tag) in [(users[0].0, steady, "avery"), (users[1].0, sliding, "jules")] {
            let check_in = CheckIn::from_input(user_id, input)?;
            let source_key = format!("seed-{tag}-{day:02}");
            insert_check_in(pool, &check_in, Some(&source_key)).await?;
        }
    }

    Ok(())
}

async fn upsert_user(
    pool: &PgPool,
    id: Uuid,
    full_name: &str,
    email: &str,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
) -> anyhow::Result<Uuid> {
    let user_id: Uuid = sqlx::query(
        r#"
        INSERT INTO driftcare.users (id, full_name, email, height_cm, weight_kg)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            height_cm = COALESCE(EXCLUDED.height_cm, driftcare.users.height_cm),
            weight_kg = COALESCE(EXCLUDED.weight_kg, driftcare.users.weight_kg)
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(email)
    .bind(height_cm)
    .bind(weight_kg)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(user_id)
}

pub async fn fetch_profile(pool: &PgPool, email: &str) -> anyhow::Result<Profile> {
    let row = sqlx::query(
        "SELECT id, full_name, email, height_cm, weight_kg, health_points \
         FROM driftcare.users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no user registered with email {email}"))?;

    Ok(Profile {
        user_id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        height_cm: row.get("height_cm"),
        weight_kg: row.get("weight_kg"),
        health_points: row.get("health_points"),
    })
}

/// A user's most recent check-ins, newest first.
pub async fn fetch_check_ins(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<CheckIn>> {
    let query = format!(
        "SELECT {CHECK_IN_COLUMNS} FROM driftcare.check_ins \
         WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2"
    );
    let rows = sqlx::query(&query)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    log::debug!("fetched {} check-ins for user {}", rows.len(), user_id);
    rows.iter().map(check_in_from_row).collect()
}

fn check_in_from_row(row: &PgRow) -> anyhow::Result<CheckIn> {
    let status: String = row.get("current_health_status");
    let symptoms: Vec<String> = row.get("symptoms_today");
    let lifestyle: Vec<String> = row.get("lifestyle_checks");

    Ok(CheckIn {
        id: row.get("id"),
        user_id: row.get("user_id"),
        hours_slept: row.get("hours_slept"),
        stress_level: row.get("stress_level"),
        current_mood: row.get("current_mood"),
        daily_activity_measure: row.get("daily_activity_measure"),
        num_of_water_glasses: row.get("num_of_water_glasses"),
        current_health_status: status.parse()?,
        symptoms_today: symptoms
            .iter()
            .map(|s| s.parse::<Symptom>())
            .collect::<Result<BTreeSet<_>, _>>()?,
        lifestyle_checks: lifestyle
            .iter()
            .map(|l| l.parse::<LifestyleCheck>())
            .collect::<Result<BTreeSet<_>, _>>()?,
        created_at: row.get("created_at"),
    })
}

/// Stores a check-in; returns `false` when `source_key` was already imported.
pub async fn insert_check_in(
    pool: &PgPool,
    check_in: &CheckIn,
    source_key: Option<&str>,
) -> anyhow::Result<bool> {
    let symptoms: Vec<String> = check_in.symptoms_today.iter().map(|s| s.to_string()).collect();
    let lifestyle: Vec<String> = check_in.lifestyle_checks.iter().map(|l| l.to_string()).collect();

    let result = sqlx::query(
        r#"
        INSERT INTO driftcare.check_ins
        (id, user_id, hours_slept, stress_level, current_mood, daily_activity_measure,
         num_of_water_glasses, current_health_status, symptoms_today, lifestyle_checks,
         created_at, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(check_in.id)
    .bind(check_in.user_id)
    .bind(check_in.hours_slept)
    .bind(check_in.stress_level)
    .bind(check_in.current_mood)
    .bind(check_in.daily_activity_measure)
    .bind(check_in.num_of_water_glasses)
    .bind(check_in.current_health_status.as_str())
    .bind(&symptoms)
    .bind(&lifestyle)
    .bind(check_in.created_at)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Credits health points to a user and returns the new balance.
pub async fn add_health_points(pool: &PgPool, user_id: Uuid, points: i32) -> anyhow::Result<i32> {
    let balance: i32 = sqlx::query(
        "UPDATE driftcare.users SET health_points = health_points + $2 \
         WHERE id = $1 RETURNING health_points",
    )
    .bind(user_id)
    .bind(points)
    .fetch_one(pool)
    .await?
    .get("health_points");

    Ok(balance)
}

pub async fn import_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        height_cm: Option<f64>,
        weight_kg: Option<f64>,
        date: NaiveDate,
        hours_slept: f64,
        stress_level: i32,
        current_mood: i32,
        daily_activity_measure: f64,
        num_of_water_glasses: i32,
        current_health_status: String,
        #[serde(default)]
        symptoms_today: String,
        #[serde(default)]
        lifestyle_checks: String,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let user_id = upsert_user(
            pool,
            Uuid::new_v4(),
            &row.full_name,
            &row.email,
            row.height_cm,
            row.weight_kg,
        )
        .await?;

        let created_at: DateTime<Utc> = row
            .date
            .and_hms_opt(12, 0, 0)
            .context("invalid check-in date")?
            .and_utc();
        let input = CheckInInput {
            hours_slept: row.hours_slept,
            stress_level: row.stress_level,
            current_mood: row.current_mood,
            daily_activity_measure: row.daily_activity_measure,
            num_of_water_glasses: row.num_of_water_glasses,
            current_health_status: row.current_health_status.parse()?,
            symptoms_today: parse_set::<Symptom>(&row.symptoms_today)?.into_iter().collect(),
            lifestyle_checks: parse_set::<LifestyleCheck>(&row.lifestyle_checks)?
                .into_iter()
                .collect(),
            created_at: Some(created_at),
        };

        let check_in = match CheckIn::from_input(user_id, input) {
            Ok(check_in) => check_in,
            Err(err) => {
                log::warn!("skipping row {} for {}: {}", line + 1, row.email, err);
                continue;
            }
        };

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}-{}", row.email, row.date));

        if insert_check_in(pool, &check_in, Some(&source_key)).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}
