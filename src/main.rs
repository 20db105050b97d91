use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

mod config;
mod db;
mod drift;
mod error;
mod models;
mod remedy;
mod report;
mod scoring;

use models::{parse_set, CheckIn, CheckInInput, HealthStatus, LifestyleCheck, Symptom};

/// Enough history for a 7-day window plus a 10-entry baseline, with room for repeat check-ins.
const HISTORY_LIMIT: i64 = 60;

#[derive(Parser)]
#[command(name = "driftcare")]
#[command(about = "Daily check-in scoring and drift detection for DriftCare", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo users and two weeks of check-ins
    Seed,
    /// Import check-ins from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Submit today's check-in and award health points
    CheckIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        hours_slept: f64,
        #[arg(long)]
        stress: i32,
        #[arg(long)]
        mood: i32,
        #[arg(long, default_value_t = 0.0)]
        activity: f64,
        #[arg(long, default_value_t = 0)]
        water: i32,
        #[arg(long, default_value = "GOOD")]
        status: HealthStatus,
        /// Comma or semicolon separated, e.g. HEADACHE,FATIGUE
        #[arg(long, default_value = "")]
        symptoms: String,
        /// Comma or semicolon separated, e.g. SMOKED_TODAY
        #[arg(long, default_value = "")]
        lifestyle: String,
    },
    /// Resilience score of the latest check-in
    Score {
        #[arg(long)]
        email: String,
    },
    /// Compare the last week against the personal baseline
    Drift {
        #[arg(long)]
        email: String,
    },
    /// Remedy tasks for a day (defaults to today)
    Tasks {
        #[arg(long)]
        email: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Dashboard metrics for a user
    Dashboard {
        #[arg(long)]
        email: String,
        #[arg(long)]
        json: bool,
    },
    /// Write an SBAR markdown summary
    Report {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "sbar.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = config::Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} check-ins from {}.", csv.display());
        }
        Commands::CheckIn {
            email,
            hours_slept,
            stress,
            mood,
            activity,
            water,
            status,
            symptoms,
            lifestyle,
        } => {
            let profile = db::fetch_profile(&pool, &email).await?;
            let input = CheckInInput {
                hours_slept,
                stress_level: stress,
                current_mood: mood,
                daily_activity_measure: activity,
                num_of_water_glasses: water,
                current_health_status: status,
                symptoms_today: parse_set::<Symptom>(&symptoms)?.into_iter().collect(),
                lifestyle_checks: parse_set::<LifestyleCheck>(&lifestyle)?.into_iter().collect(),
                created_at: None,
            };
            let check_in = CheckIn::from_input(profile.user_id, input)?;
            db::insert_check_in(&pool, &check_in, None).await?;

            let result = scoring::calculate_resilience(Some(&check_in));
            let points = scoring::award_health_points(result.resilience);
            let balance = db::add_health_points(&pool, profile.user_id, points).await?;
            log::info!(
                "check-in {} stored for {} (resilience {})",
                check_in.id,
                email,
                result.resilience
            );

            println!(
                "Check-in saved. Resilience {} ({}). +{points} health points, balance {balance}.",
                result.resilience,
                result
                    .drift_level
                    .map(|level| level.to_string())
                    .unwrap_or_default()
            );
        }
        Commands::Score { email } => {
            let profile = db::fetch_profile(&pool, &email).await?;
            let check_ins = db::fetch_check_ins(&pool, profile.user_id, 1).await?;
            let result = scoring::calculate_resilience(check_ins.first());

            let (Some(level), Some(breakdown)) = (result.drift_level, result.breakdown) else {
                println!("No check-ins recorded for {email}.");
                return Ok(());
            };

            println!("Resilience {} ({level}) for {}", result.resilience, profile.full_name);
            println!(
                "- sleep {} | stress {} | mood {} | activity {}",
                breakdown.sleep, breakdown.stress, breakdown.mood, breakdown.activity
            );
            println!(
                "- water {} | health status {} | symptoms {} | lifestyle {}",
                breakdown.water, breakdown.health_status, breakdown.symptoms, breakdown.lifestyle
            );
        }
        Commands::Drift { email } => {
            let profile = db::fetch_profile(&pool, &email).await?;
            let check_ins = db::fetch_check_ins(&pool, profile.user_id, HISTORY_LIMIT).await?;
            let (recent, baseline) = drift::split_windows(&check_ins, Utc::now());
            let percent = drift::calculate_drift(&recent, &baseline);
            let trend = drift::detect_drift(&check_ins, Some(&profile));

            println!(
                "Drift {percent}% across {} recent vs {} baseline check-ins.",
                recent.len(),
                baseline.len()
            );
            println!(
                "Trend level {} with quick score {}.",
                trend.drift_level, trend.resilience_score
            );
            for alert in trend.alerts {
                println!("- [{}] {}", alert.level, alert.message);
            }
        }
        Commands::Tasks { email, date } => {
            let profile = db::fetch_profile(&pool, &email).await?;
            let check_ins = db::fetch_check_ins(&pool, profile.user_id, HISTORY_LIMIT).await?;
            let date = date.unwrap_or_else(|| Utc::now().date_naive());

            let Some(check_in) = check_ins
                .iter()
                .find(|c| c.created_at.date_naive() == date)
            else {
                println!("No check-in recorded for {email} on {date}.");
                return Ok(());
            };

            let tasks = remedy::generate_remedy_tasks(check_in, Some(&profile), date, profile.user_id);
            println!("Tasks for {} on {date}:", profile.full_name);
            for task in tasks {
                println!(
                    "- [{}] {}: {} ({} pts)",
                    task.category, task.title, task.description, task.points
                );
            }
        }
        Commands::Dashboard { email, json } => {
            let profile = db::fetch_profile(&pool, &email).await?;
            let check_ins = db::fetch_check_ins(&pool, profile.user_id, HISTORY_LIMIT).await?;
            let dashboard = report::build_dashboard(&profile, &check_ins, Utc::now());

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
                return Ok(());
            }

            println!("{} ({} health points)", dashboard.full_name, dashboard.health_points);
            match dashboard.today.drift_level {
                Some(level) => println!("Today: resilience {} ({level})", dashboard.today.resilience),
                None => println!("Today: no check-in yet"),
            }
            println!("Drift from baseline: {}%", dashboard.drift_percent);
            println!("Trend: {}", dashboard.drift.drift_level);
            if let Some(week) = &dashboard.weekly {
                println!(
                    "7-day averages over {} check-ins: sleep {:.1}h, stress {:.1}, mood {:.1}",
                    week.check_in_count, week.hours_slept, week.stress_level, week.current_mood
                );
            }
            for task in &dashboard.tasks {
                println!("- {} ({} pts)", task.title, task.points);
            }
        }
        Commands::Report { email, out } => {
            let profile = db::fetch_profile(&pool, &email).await?;
            let check_ins = db::fetch_check_ins(&pool, profile.user_id, HISTORY_LIMIT).await?;
            let report = report::build_sbar_report(&profile, &check_ins, Utc::now());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
