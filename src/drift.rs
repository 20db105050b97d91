use chrono::{DateTime, Duration, Utc};

use crate::models::{AlertLevel, CheckIn, DriftAlert, DriftReport, Profile};
use crate::scoring::to_score;

pub const RECENT_WINDOW_DAYS: i64 = 7;
pub const BASELINE_LIMIT: usize = 10;
const MOOD_WINDOW: usize = 3;
const BMI_ALERT_THRESHOLD: f64 = 30.0;

/// Splits a history into the last week and the baseline entries that precede it.
///
/// Both windows come back newest-first; the baseline holds at most [`BASELINE_LIMIT`] entries.
pub fn split_windows(check_ins: &[CheckIn], now: DateTime<Utc>) -> (Vec<CheckIn>, Vec<CheckIn>) {
    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let mut sorted = check_ins.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let (recent, older): (Vec<CheckIn>, Vec<CheckIn>) =
        sorted.into_iter().partition(|c| c.created_at >= cutoff);
    let baseline = older.into_iter().take(BASELINE_LIMIT).collect();
    (recent, baseline)
}

fn mean(check_ins: &[CheckIn], field: impl Fn(&CheckIn) -> f64) -> f64 {
    check_ins.iter().map(field).sum::<f64>() / check_ins.len() as f64
}

fn percent_change(from: f64, to: f64) -> f64 {
    if from > 0.0 {
        (to - from) / from * 100.0
    } else {
        0.0
    }
}

/// Percent drift of the recent window away from the baseline.
///
/// Averages the sleep decline, stress increase and mood decline (each as a
/// percentage of the baseline mean). Floored at zero with no upper bound.
pub fn calculate_drift(recent: &[CheckIn], baseline: &[CheckIn]) -> u32 {
    if recent.is_empty() || baseline.is_empty() {
        return 0;
    }

    let recent_sleep = mean(recent, |c| c.hours_slept);
    let recent_stress = mean(recent, |c| c.stress_level as f64);
    let recent_mood = mean(recent, |c| c.current_mood as f64);
    let baseline_sleep = mean(baseline, |c| c.hours_slept);
    let baseline_stress = mean(baseline, |c| c.stress_level as f64);
    let baseline_mood = mean(baseline, |c| c.current_mood as f64);

    let sleep_drift = -percent_change(baseline_sleep, recent_sleep);
    let stress_drift = percent_change(baseline_stress, recent_stress);
    let mood_drift = -percent_change(baseline_mood, recent_mood);

    let drift = ((sleep_drift + stress_drift + mood_drift) / 3.0).max(0.0);
    log::debug!(
        "drift sleep={:.1} stress={:.1} mood={:.1} overall={:.1}",
        sleep_drift,
        stress_drift,
        mood_drift,
        drift
    );
    drift.round() as u32
}

/// Five-factor quick score of a single check-in, each factor capped at 20.
pub fn quick_resilience(check_in: &CheckIn) -> u8 {
    let stress = ((10 - check_in.stress_level) as f64 * 2.0).clamp(0.0, 20.0);
    let mood = (check_in.current_mood as f64 * 2.0).clamp(0.0, 20.0);
    let sleep = (check_in.hours_slept / 8.0 * 20.0).min(20.0);
    let activity = (check_in.daily_activity_measure / 30.0 * 20.0).min(20.0);
    let hydration = (check_in.num_of_water_glasses as f64 / 8.0 * 20.0).min(20.0);
    to_score((stress + mood + sleep + activity + hydration).min(100.0))
}

fn average_mood(window: &[&CheckIn]) -> f64 {
    window.iter().map(|c| c.current_mood as f64).sum::<f64>() / window.len() as f64
}

/// History-based drift alerting over the latest check-ins.
///
/// Compares the three most recent moods against the three before them (or
/// the oldest entry when fewer than six exist). Fewer than three entries
/// always reads as optimal.
pub fn detect_drift(history: &[CheckIn], profile: Option<&Profile>) -> DriftReport {
    let mut ordered: Vec<&CheckIn> = history.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let resilience_score = ordered.last().map(|c| quick_resilience(c)).unwrap_or(0);
    let mut drift_level = AlertLevel::Optimal;
    let mut alerts = Vec::new();

    if ordered.len() >= MOOD_WINDOW {
        let split = ordered.len() - MOOD_WINDOW;
        let recent_avg = average_mood(&ordered[split..]);
        let previous_avg = if ordered.len() >= MOOD_WINDOW * 2 {
            average_mood(&ordered[split - MOOD_WINDOW..split])
        } else {
            average_mood(&ordered[..1])
        };
        let mood_drift = previous_avg - recent_avg;
        let score = resilience_score as f64;

        drift_level = if mood_drift > 2.0 || score < 40.0 {
            AlertLevel::Critical
        } else if mood_drift > 1.0 || score < 60.0 {
            AlertLevel::Concern
        } else if mood_drift > 0.5 || score < 80.0 {
            AlertLevel::Watch
        } else {
            AlertLevel::Optimal
        };

        if let Some(message) = drift_message(drift_level, mood_drift, resilience_score) {
            alerts.push(DriftAlert {
                level: drift_level,
                message,
            });
        }
    }

    if let Some(bmi) = profile.and_then(Profile::bmi) {
        if bmi > BMI_ALERT_THRESHOLD {
            alerts.push(DriftAlert {
                level: AlertLevel::Watch,
                message: format!(
                    "BMI of {bmi:.1} is above {BMI_ALERT_THRESHOLD:.0}; consider discussing weight management with a doctor."
                ),
            });
        }
    }

    DriftReport {
        drift_level,
        resilience_score,
        alerts,
    }
}

fn drift_message(level: AlertLevel, mood_drift: f64, score: u8) -> Option<String> {
    let message = match level {
        AlertLevel::Optimal => return None,
        AlertLevel::Watch => format!(
            "Slight drift detected: mood down {mood_drift:.1} points, resilience {score}. Keep an eye on your routine."
        ),
        AlertLevel::Concern => format!(
            "Noticeable drift: mood down {mood_drift:.1} points, resilience {score}. Prioritise rest and recovery this week."
        ),
        AlertLevel::Critical => format!(
            "Critical drift: mood down {mood_drift:.1} points, resilience {score}. Consider booking a medical consultation."
        ),
    };
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    #[test]
    fn empty_windows_yield_zero() {
        let any = vec![fixtures::check_in(1, 5.0, 9, 2)];
        assert_eq!(calculate_drift(&[], &any), 0);
        assert_eq!(calculate_drift(&any, &[]), 0);
    }

    #[test]
    fn sleep_decline_alone_averages_over_three() {
        let baseline = vec![fixtures::check_in(10, 8.0, 3, 7), fixtures::check_in(11, 8.0, 3, 7)];
        let recent = vec![fixtures::check_in(1, 6.0, 3, 7), fixtures::check_in(2, 6.0, 3, 7)];
        // sleep drift 25%, stress and mood unchanged
        assert_eq!(calculate_drift(&recent, &baseline), 8);
    }

    #[test]
    fn improvements_floor_at_zero() {
        let baseline = vec![fixtures::check_in(10, 6.0, 6, 5)];
        let recent = vec![fixtures::check_in(1, 8.0, 2, 8)];
        assert_eq!(calculate_drift(&recent, &baseline), 0);
    }

    #[test]
    fn drift_can_exceed_one_hundred() {
        let baseline = vec![fixtures::check_in(10, 8.0, 1, 10)];
        let recent = vec![fixtures::check_in(1, 2.0, 10, 1)];
        // (75 + 900 + 90) / 3 = 355
        assert_eq!(calculate_drift(&recent, &baseline), 355);
    }

    #[test]
    fn split_windows_respects_week_and_baseline_cap() {
        let history: Vec<CheckIn> = (0..20).map(|d| fixtures::check_in(d, 7.0, 3, 7)).collect();
        let (recent, baseline) = split_windows(&history, Utc::now());
        assert_eq!(recent.len(), 7);
        assert_eq!(baseline.len(), BASELINE_LIMIT);
        assert!(recent[0].created_at > recent[6].created_at);
        assert!(baseline.iter().all(|c| c.created_at < recent[6].created_at));
    }

    #[test]
    fn quick_resilience_caps_each_factor() {
        let mut check_in = fixtures::check_in(0, 12.0, 1, 10);
        check_in.daily_activity_measure = 90.0;
        check_in.num_of_water_glasses = 12;
        // stress factor is (10 - 1) * 2 = 18, everything else capped at 20
        assert_eq!(quick_resilience(&check_in), 98);

        let low = fixtures::check_in(0, 4.0, 10, 1);
        // 0 + 2 + 10 + 20 + 20
        assert_eq!(quick_resilience(&low), 52);
    }

    #[test]
    fn short_history_stays_optimal() {
        let history = vec![fixtures::check_in(1, 2.0, 10, 1), fixtures::check_in(0, 2.0, 10, 1)];
        let report = detect_drift(&history, None);
        assert_eq!(report.drift_level, AlertLevel::Optimal);
        assert!(report.alerts.is_empty());
        assert!(report.resilience_score < 60);
    }

    #[test]
    fn empty_history_is_neutral() {
        let report = detect_drift(&[], None);
        assert_eq!(report.drift_level, AlertLevel::Optimal);
        assert_eq!(report.resilience_score, 0);
    }

    #[test]
    fn mood_drop_against_previous_window_is_critical() {
        let history = vec![
            fixtures::check_in(5, 8.0, 2, 9),
            fixtures::check_in(4, 8.0, 2, 9),
            fixtures::check_in(3, 8.0, 2, 9),
            fixtures::check_in(2, 8.0, 2, 6),
            fixtures::check_in(1, 8.0, 2, 6),
            fixtures::check_in(0, 8.0, 2, 6),
        ];
        let report = detect_drift(&history, None);
        assert_eq!(report.drift_level, AlertLevel::Critical);
        assert_eq!(report.alerts.len(), 1);
        assert!(report.alerts[0].message.contains("3.0"));
    }

    #[test]
    fn short_history_compares_against_oldest_entry() {
        let history = vec![
            fixtures::check_in(3, 8.0, 2, 9),
            fixtures::check_in(2, 8.0, 2, 8),
            fixtures::check_in(1, 8.0, 2, 8),
            fixtures::check_in(0, 8.0, 2, 7),
        ];
        // oldest mood 9 vs recent average 7.67
        let report = detect_drift(&history, None);
        assert_eq!(report.drift_level, AlertLevel::Concern);
    }

    #[test]
    fn steady_history_with_high_score_is_optimal() {
        let history: Vec<CheckIn> = (0..4).map(|d| fixtures::check_in(d, 8.0, 1, 9)).collect();
        let report = detect_drift(&history, None);
        assert_eq!(report.drift_level, AlertLevel::Optimal);
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn high_bmi_alerts_regardless_of_level() {
        let profile = fixtures::profile(Some(170.0), Some(95.0));
        let report = detect_drift(&[], Some(&profile));
        assert_eq!(report.drift_level, AlertLevel::Optimal);
        assert_eq!(report.alerts.len(), 1);
        assert!(report.alerts[0].message.contains("BMI of 32.9"));
    }
}
