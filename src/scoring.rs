use crate::models::{
    Breakdown, CheckIn, DriftLevel, HealthStatus, LifestyleCheck, ResilienceResult, Symptom,
};
use std::collections::BTreeSet;

/// Nominal daily targets each metric is scored against.
#[derive(Debug, Clone, Copy)]
pub struct Targets {
    pub sleep_hours: f64,
    pub stress_level: f64,
    pub mood: f64,
    pub activity_minutes: f64,
    pub water_glasses: f64,
}

pub const TARGETS: Targets = Targets {
    sleep_hours: 8.0,
    stress_level: 3.0,
    mood: 7.0,
    activity_minutes: 60.0,
    water_glasses: 8.0,
};

const SLEEP_PENALTY_PER_HOUR: f64 = 12.5;
const STRESS_PENALTY_PER_STEP: f64 = 11.1;
const SYMPTOM_PENALTY: f64 = 20.0;
const LIFESTYLE_PENALTY: f64 = 25.0;

// All scorers are total: out-of-range input is clamped, never rejected.

pub fn sleep_score(hours: f64) -> f64 {
    (100.0 - (hours - TARGETS.sleep_hours).abs() * SLEEP_PENALTY_PER_HOUR).clamp(0.0, 100.0)
}

/// Clamped at both ends so a stress level below 1 cannot push past 100.
pub fn stress_score(level: f64) -> f64 {
    (100.0 - (level - 1.0) * STRESS_PENALTY_PER_STEP).clamp(0.0, 100.0)
}

pub fn mood_score(mood: f64) -> f64 {
    ((mood / 10.0) * 100.0).clamp(0.0, 100.0)
}

pub fn activity_score(minutes: f64) -> f64 {
    ((minutes / TARGETS.activity_minutes) * 100.0).clamp(0.0, 100.0)
}

pub fn water_score(glasses: f64) -> f64 {
    ((glasses / TARGETS.water_glasses) * 100.0).clamp(0.0, 100.0)
}

pub fn health_status_score(status: Option<HealthStatus>) -> f64 {
    match status {
        Some(HealthStatus::Excellent) => 100.0,
        Some(HealthStatus::Good) => 80.0,
        Some(HealthStatus::Fair) => 50.0,
        None => 30.0,
    }
}

pub fn symptoms_score(symptoms: &BTreeSet<Symptom>) -> f64 {
    (100.0 - symptoms.len() as f64 * SYMPTOM_PENALTY).max(0.0)
}

pub fn lifestyle_score(checks: &BTreeSet<LifestyleCheck>) -> f64 {
    (100.0 - checks.len() as f64 * LIFESTYLE_PENALTY).max(0.0)
}

pub fn drift_level(resilience: u8) -> DriftLevel {
    match resilience {
        0..=39 => DriftLevel::Critical,
        40..=59 => DriftLevel::Concerning,
        60..=79 => DriftLevel::Nominal,
        _ => DriftLevel::Optimal,
    }
}

/// Unweighted mean of the eight sub-scores, bucketed into a drift level.
///
/// A missing check-in yields a zero score with no breakdown and no level.
pub fn calculate_resilience(check_in: Option<&CheckIn>) -> ResilienceResult {
    let Some(check_in) = check_in else {
        return ResilienceResult {
            resilience: 0,
            drift_level: None,
            breakdown: None,
        };
    };

    let scores = [
        sleep_score(check_in.hours_slept),
        stress_score(check_in.stress_level as f64),
        mood_score(check_in.current_mood as f64),
        activity_score(check_in.daily_activity_measure),
        water_score(check_in.num_of_water_glasses as f64),
        health_status_score(Some(check_in.current_health_status)),
        symptoms_score(&check_in.symptoms_today),
        lifestyle_score(&check_in.lifestyle_checks),
    ];

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let resilience = to_score(mean);

    ResilienceResult {
        resilience,
        drift_level: Some(drift_level(resilience)),
        breakdown: Some(Breakdown {
            sleep: to_score(scores[0]),
            stress: to_score(scores[1]),
            mood: to_score(scores[2]),
            activity: to_score(scores[3]),
            water: to_score(scores[4]),
            health_status: to_score(scores[5]),
            symptoms: to_score(scores[6]),
            lifestyle: to_score(scores[7]),
        }),
    }
}

/// Health points credited for a submitted check-in: one point per ten resilience.
pub fn award_health_points(resilience: u8) -> i32 {
    (resilience as f64 / 10.0).round() as i32
}

pub(crate) fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
