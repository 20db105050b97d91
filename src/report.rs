use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::drift;
use crate::models::{
    AlertLevel, Breakdown, CheckIn, DriftLevel, DriftReport, Profile, RemedyTask,
    ResilienceResult,
};
use crate::remedy;
use crate::scoring::{self, TARGETS};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAverages {
    pub check_in_count: usize,
    pub hours_slept: f64,
    pub stress_level: f64,
    pub current_mood: f64,
    pub daily_activity_measure: f64,
    pub num_of_water_glasses: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub full_name: String,
    pub health_points: i32,
    pub bmi: Option<f64>,
    pub today: ResilienceResult,
    pub drift_percent: u32,
    pub drift: DriftReport,
    pub weekly: Option<WeeklyAverages>,
    pub tasks: Vec<RemedyTask>,
}

pub fn summarize_week(recent: &[CheckIn]) -> Option<WeeklyAverages> {
    if recent.is_empty() {
        return None;
    }

    let count = recent.len() as f64;
    let avg = |field: fn(&CheckIn) -> f64| recent.iter().map(field).sum::<f64>() / count;

    Some(WeeklyAverages {
        check_in_count: recent.len(),
        hours_slept: avg(|c| c.hours_slept),
        stress_level: avg(|c| c.stress_level as f64),
        current_mood: avg(|c| c.current_mood as f64),
        daily_activity_measure: avg(|c| c.daily_activity_measure),
        num_of_water_glasses: avg(|c| c.num_of_water_glasses as f64),
    })
}

/// The check-in recorded on the same calendar day as `now`, if any.
pub fn todays_check_in(check_ins: &[CheckIn], now: DateTime<Utc>) -> Option<&CheckIn> {
    check_ins
        .iter()
        .filter(|c| c.created_at.date_naive() == now.date_naive())
        .max_by_key(|c| c.created_at)
}

pub fn build_dashboard(profile: &Profile, check_ins: &[CheckIn], now: DateTime<Utc>) -> Dashboard {
    let today = todays_check_in(check_ins, now);
    let (recent, baseline) = drift::split_windows(check_ins, now);

    let tasks = today
        .map(|c| remedy::generate_remedy_tasks(c, Some(profile), now.date_naive(), profile.user_id))
        .unwrap_or_default();

    Dashboard {
        full_name: profile.full_name.clone(),
        health_points: profile.health_points,
        bmi: profile.bmi(),
        today: scoring::calculate_resilience(today),
        drift_percent: drift::calculate_drift(&recent, &baseline),
        drift: drift::detect_drift(check_ins, Some(profile)),
        weekly: summarize_week(&recent),
        tasks,
    }
}

fn weakest_metrics(breakdown: &Breakdown) -> Vec<(&'static str, u8)> {
    let mut metrics = vec![
        ("sleep", breakdown.sleep),
        ("stress", breakdown.stress),
        ("mood", breakdown.mood),
        ("activity", breakdown.activity),
        ("hydration", breakdown.water),
        ("health status", breakdown.health_status),
        ("symptoms", breakdown.symptoms),
        ("lifestyle", breakdown.lifestyle),
    ];
    metrics.sort_by_key(|(_, score)| *score);
    metrics.into_iter().filter(|(_, score)| *score < 60).take(3).collect()
}

/// Situation / Background / Assessment / Recommendation summary for sharing with a clinician.
pub fn build_sbar_report(profile: &Profile, check_ins: &[CheckIn], now: DateTime<Utc>) -> String {
    let dashboard = build_dashboard(profile, check_ins, now);
    let latest = check_ins.iter().max_by_key(|c| c.created_at);
    let latest_result = scoring::calculate_resilience(latest);

    let mut output = String::new();

    let _ = writeln!(output, "# SBAR Summary: {}", profile.full_name);
    let _ = writeln!(output, "Generated {} for {}", now.date_naive(), profile.email);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Situation");
    match (latest, latest_result.drift_level) {
        (Some(check_in), Some(level)) => {
            let _ = writeln!(
                output,
                "- Latest check-in ({}) resilience {}/100, level {}",
                check_in.created_at.date_naive(),
                latest_result.resilience,
                level
            );
        }
        _ => {
            let _ = writeln!(output, "- No check-ins recorded.");
        }
    }
    let _ = writeln!(
        output,
        "- Drift from personal baseline: {}%",
        dashboard.drift_percent
    );
    let _ = writeln!(output, "- Trend level: {}", dashboard.drift.drift_level);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Background");
    match &dashboard.weekly {
        Some(week) => {
            let _ = writeln!(output, "- {} check-ins in the last 7 days", week.check_in_count);
            let _ = writeln!(
                output,
                "- Sleep {:.1}h (target {:.0}h), stress {:.1}/10 (target {:.0}), mood {:.1}/10 (target {:.0})",
                week.hours_slept,
                TARGETS.sleep_hours,
                week.stress_level,
                TARGETS.stress_level,
                week.current_mood,
                TARGETS.mood
            );
            let _ = writeln!(
                output,
                "- Activity {:.0} min (target {:.0}), water {:.1} glasses (target {:.0})",
                week.daily_activity_measure,
                TARGETS.activity_minutes,
                week.num_of_water_glasses,
                TARGETS.water_glasses
            );
        }
        None => {
            let _ = writeln!(output, "- No check-ins in the last 7 days.");
        }
    }
    if let Some(bmi) = dashboard.bmi {
        let _ = writeln!(output, "- BMI {bmi:.1}");
    }
    if let Some(check_in) = latest {
        if !check_in.symptoms_today.is_empty() {
            let symptoms: Vec<&str> = check_in.symptoms_today.iter().map(|s| s.as_str()).collect();
            let _ = writeln!(output, "- Reported symptoms: {}", symptoms.join(", "));
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Assessment");
    let weak = latest_result
        .breakdown
        .as_ref()
        .map(weakest_metrics)
        .unwrap_or_default();
    if weak.is_empty() {
        let _ = writeln!(output, "- No metric below 60.");
    } else {
        for (metric, score) in weak {
            let _ = writeln!(output, "- {metric}: {score}/100");
        }
    }
    for alert in &dashboard.drift.alerts {
        let _ = writeln!(output, "- [{}] {}", alert.level, alert.message);
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Recommendation");
    let escalate = dashboard.drift.drift_level >= AlertLevel::Concern
        || latest_result.drift_level == Some(DriftLevel::Critical);
    if escalate {
        let _ = writeln!(output, "- Book a consultation with a primary care doctor.");
    } else {
        let _ = writeln!(output, "- Continue daily check-ins and current routine.");
    }
    for task in &dashboard.tasks {
        let _ = writeln!(output, "- {}: {} ({} pts)", task.title, task.description, task.points);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fixtures, Symptom};

    #[test]
    fn weekly_summary_averages_fields() {
        let recent = vec![fixtures::check_in(0, 6.0, 4, 6), fixtures::check_in(1, 8.0, 2, 8)];
        let week = summarize_week(&recent).unwrap();
        assert_eq!(week.check_in_count, 2);
        assert_eq!(week.hours_slept, 7.0);
        assert_eq!(week.stress_level, 3.0);
        assert_eq!(week.current_mood, 7.0);
        assert!(summarize_week(&[]).is_none());
    }

    #[test]
    fn dashboard_without_today_has_no_tasks() {
        let profile = fixtures::profile(Some(180.0), Some(75.0));
        let history: Vec<CheckIn> = (1..5).map(|d| fixtures::check_in(d, 7.0, 3, 7)).collect();
        let dashboard = build_dashboard(&profile, &history, Utc::now());
        assert_eq!(dashboard.today.resilience, 0);
        assert!(dashboard.tasks.is_empty());
        assert_eq!(dashboard.weekly.unwrap().check_in_count, 4);
    }

    #[test]
    fn dashboard_scores_today_and_baseline() {
        let profile = fixtures::profile(None, None);
        let mut history: Vec<CheckIn> = (0..7).map(|d| fixtures::check_in(d, 6.0, 3, 7)).collect();
        history.extend((8..12).map(|d| fixtures::check_in(d, 8.0, 3, 7)));
        let now = history[0].created_at;

        let dashboard = build_dashboard(&profile, &history, now);
        assert_eq!(dashboard.tasks.len(), remedy::TASKS_PER_DAY);
        assert_eq!(dashboard.drift_percent, 8);
        assert!(dashboard.today.resilience > 0);
    }

    #[test]
    fn sbar_report_has_all_sections() {
        let profile = fixtures::profile(Some(170.0), Some(95.0));
        let mut latest = fixtures::check_in(0, 4.0, 9, 2);
        latest.symptoms_today.insert(Symptom::Fatigue);
        let history = vec![
            fixtures::check_in(3, 8.0, 2, 9),
            fixtures::check_in(2, 8.0, 2, 9),
            fixtures::check_in(1, 8.0, 2, 9),
            latest,
        ];
        let now = history[3].created_at;

        let report = build_sbar_report(&profile, &history, now);
        for heading in ["## Situation", "## Background", "## Assessment", "## Recommendation"] {
            assert!(report.contains(heading), "missing {heading}");
        }
        assert!(report.contains("Reported symptoms: FATIGUE"));
        assert!(report.contains("BMI 32.9"));
        assert!(report.contains("Book a consultation"));
    }

    #[test]
    fn sbar_report_handles_empty_history() {
        let profile = fixtures::profile(None, None);
        let report = build_sbar_report(&profile, &[], Utc::now());
        assert!(report.contains("No check-ins recorded."));
        assert!(report.contains("Drift from personal baseline: 0%"));
        assert!(report.contains("Continue daily check-ins"));
    }
}
