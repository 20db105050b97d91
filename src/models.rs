use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CheckInError;

/// Declares a closed vocabulary stored as SCREAMING_SNAKE_CASE text.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CheckInError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(CheckInError::UnknownValue {
                        kind: $kind,
                        value: value.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(HealthStatus, "health status", {
    Excellent => "EXCELLENT",
    Good => "GOOD",
    Fair => "FAIR",
});

text_enum!(Symptom, "symptom", {
    Headache => "HEADACHE",
    Fatigue => "FATIGUE",
    Nausea => "NAUSEA",
    Dizziness => "DIZZINESS",
    Fever => "FEVER",
    Cough => "COUGH",
    SoreThroat => "SORE_THROAT",
    MusclePain => "MUSCLE_PAIN",
});

text_enum!(LifestyleCheck, "lifestyle check", {
    DrankLastNight => "DRANK_LAST_NIGHT",
    SmokedToday => "SMOKED_TODAY",
    SkippedMeal => "SKIPPED_MEAL",
    LateScreenTime => "LATE_SCREEN_TIME",
    ExcessCaffeine => "EXCESS_CAFFEINE",
});

/// Parses a `;` or `,` separated list, dropping blanks and duplicates.
pub fn parse_set<T: FromStr<Err = CheckInError> + Ord>(raw: &str) -> Result<BTreeSet<T>, CheckInError> {
    raw.split([';', ','])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(T::from_str)
        .collect()
}

/// A check-in as submitted, before domain checks.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckInInput {
    pub hours_slept: f64,
    pub stress_level: i32,
    pub current_mood: i32,
    pub daily_activity_measure: f64,
    pub num_of_water_glasses: i32,
    pub current_health_status: HealthStatus,
    #[serde(default)]
    pub symptoms_today: Vec<Symptom>,
    #[serde(default)]
    pub lifestyle_checks: Vec<LifestyleCheck>,
    pub created_at: Option<DateTime<Utc>>,
}

/// One user's daily check-in. Every bounded field has been validated on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub hours_slept: f64,
    pub stress_level: i32,
    pub current_mood: i32,
    pub daily_activity_measure: f64,
    pub num_of_water_glasses: i32,
    pub current_health_status: HealthStatus,
    pub symptoms_today: BTreeSet<Symptom>,
    pub lifestyle_checks: BTreeSet<LifestyleCheck>,
    pub created_at: DateTime<Utc>,
}

impl CheckIn {
    pub fn from_input(user_id: Uuid, input: CheckInInput) -> Result<Self, CheckInError> {
        check_range("hoursSlept", input.hours_slept, 0.0, 24.0)?;
        check_range("stressLevel", input.stress_level as f64, 1.0, 10.0)?;
        check_range("currentMood", input.current_mood as f64, 1.0, 10.0)?;
        check_non_negative("dailyActivityMeasure", input.daily_activity_measure)?;
        check_non_negative("numOfWaterGlasses", input.num_of_water_glasses as f64)?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            hours_slept: input.hours_slept,
            stress_level: input.stress_level,
            current_mood: input.current_mood,
            daily_activity_measure: input.daily_activity_measure,
            num_of_water_glasses: input.num_of_water_glasses,
            current_health_status: input.current_health_status,
            symptoms_today: input.symptoms_today.into_iter().collect(),
            lifestyle_checks: input.lifestyle_checks.into_iter().collect(),
            created_at: input.created_at.unwrap_or_else(Utc::now),
        })
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), CheckInError> {
    if !value.is_finite() {
        return Err(CheckInError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(CheckInError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), CheckInError> {
    if !value.is_finite() {
        return Err(CheckInError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(CheckInError::Negative { field, value });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub health_points: i32,
}

impl Profile {
    /// Body mass index from height and weight; `None` when either is missing.
    pub fn bmi(&self) -> Option<f64> {
        let height_m = self.height_cm.filter(|h| *h > 0.0)? / 100.0;
        let weight = self.weight_kg.filter(|w| *w > 0.0)?;
        Some(weight / (height_m * height_m))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DriftLevel {
    Optimal,
    Nominal,
    Concerning,
    Critical,
}

impl fmt::Display for DriftLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DriftLevel::Optimal => "OPTIMAL",
            DriftLevel::Nominal => "NOMINAL",
            DriftLevel::Concerning => "CONCERNING",
            DriftLevel::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

/// Per-metric sub-scores, each rounded to an integer in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub sleep: u8,
    pub stress: u8,
    pub mood: u8,
    pub activity: u8,
    pub water: u8,
    pub health_status: u8,
    pub symptoms: u8,
    pub lifestyle: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResilienceResult {
    pub resilience: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_level: Option<DriftLevel>,
    #[serde(serialize_with = "serialize_breakdown")]
    pub breakdown: Option<Breakdown>,
}

fn serialize_breakdown<S: serde::Serializer>(
    breakdown: &Option<Breakdown>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeMap;
    match breakdown {
        Some(value) => value.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

/// Alert levels produced by the history-based drift detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Optimal,
    Watch,
    Concern,
    Critical,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlertLevel::Optimal => "OPTIMAL",
            AlertLevel::Watch => "WATCH",
            AlertLevel::Concern => "CONCERN",
            AlertLevel::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftAlert {
    pub level: AlertLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub drift_level: AlertLevel,
    pub resilience_score: u8,
    pub alerts: Vec<DriftAlert>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemedyTask {
    pub id: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub points: u32,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Duration;

    use super::*;

    pub fn check_in(days_ago: i64, hours_slept: f64, stress_level: i32, current_mood: i32) -> CheckIn {
        CheckIn {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            hours_slept,
            stress_level,
            current_mood,
            daily_activity_measure: 60.0,
            num_of_water_glasses: 8,
            current_health_status: HealthStatus::Good,
            symptoms_today: BTreeSet::new(),
            lifestyle_checks: BTreeSet::new(),
            created_at: Utc::now() - Duration::days(days_ago),
        }
    }

    pub fn profile(height_cm: Option<f64>, weight_kg: Option<f64>) -> Profile {
        Profile {
            user_id: Uuid::nil(),
            full_name: "Avery Lee".to_string(),
            email: "avery@example.com".to_string(),
            height_cm,
            weight_kg,
            health_points: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CheckInInput {
        CheckInInput {
            hours_slept: 8.0,
            stress_level: 3,
            current_mood: 7,
            daily_activity_measure: 60.0,
            num_of_water_glasses: 8,
            current_health_status: HealthStatus::Good,
            symptoms_today: vec![],
            lifestyle_checks: vec![],
            created_at: None,
        }
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let mut bad = input();
        bad.stress_level = 11;
        let err = CheckIn::from_input(Uuid::new_v4(), bad).unwrap_err();
        assert!(matches!(err, CheckInError::OutOfRange { field: "stressLevel", .. }));

        let mut bad = input();
        bad.hours_slept = f64::NAN;
        let err = CheckIn::from_input(Uuid::new_v4(), bad).unwrap_err();
        assert_eq!(err, CheckInError::NotFinite { field: "hoursSlept" });

        let mut bad = input();
        bad.num_of_water_glasses = -1;
        assert!(CheckIn::from_input(Uuid::new_v4(), bad).is_err());
    }

    #[test]
    fn duplicate_symptoms_collapse() {
        let mut raw = input();
        raw.symptoms_today = vec![Symptom::Headache, Symptom::Fever, Symptom::Headache];
        let check_in = CheckIn::from_input(Uuid::new_v4(), raw).unwrap();
        assert_eq!(check_in.symptoms_today.len(), 2);
    }

    #[test]
    fn parses_sets_case_insensitively() {
        let set: BTreeSet<LifestyleCheck> = parse_set("smoked_today; DRANK_LAST_NIGHT;;").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&LifestyleCheck::SmokedToday));

        let err = parse_set::<Symptom>("HEADACHE,GOUT").unwrap_err();
        assert!(matches!(err, CheckInError::UnknownValue { kind: "symptom", .. }));
    }

    #[test]
    fn bmi_requires_height_and_weight() {
        let mut profile = Profile {
            user_id: Uuid::new_v4(),
            full_name: "Avery Lee".to_string(),
            email: "avery@example.com".to_string(),
            height_cm: Some(180.0),
            weight_kg: Some(81.0),
            health_points: 0,
        };
        assert!((profile.bmi().unwrap() - 25.0).abs() < 1e-9);
        profile.height_cm = None;
        assert_eq!(profile.bmi(), None);
    }

    #[test]
    fn empty_breakdown_serializes_as_object() {
        let result = ResilienceResult {
            resilience: 0,
            drift_level: None,
            breakdown: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"resilience":0,"breakdown":{}}"#);
    }
}
