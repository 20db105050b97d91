use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{CheckIn, LifestyleCheck, Profile, RemedyTask, Symptom};

pub const TASKS_PER_DAY: usize = 4;
const SEED_MODULUS: u64 = 1 << 28;
const FALLBACK_SEED: u64 = 42;
const MIN_POINTS: u32 = 3;
const MAX_POINTS: u32 = 10;

/// Linear-congruential generator so that a day's tasks can be regenerated exactly.
#[derive(Debug, Clone)]
pub struct SeededRng {
    seed: u64,
}

impl SeededRng {
    const MULTIPLIER: u64 = 9301;
    const INCREMENT: u64 = 49297;
    const MODULUS: u64 = 233280;

    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed derived from the UTF-16 code units of `date` followed by `user_id`.
    pub fn for_day(date: NaiveDate, user_id: Uuid) -> Self {
        let key = format!("{}{}", date.format("%Y-%m-%d"), user_id);
        let sum = key.encode_utf16().map(u64::from).sum::<u64>() % SEED_MODULUS;
        Self::new(if sum == 0 { FALLBACK_SEED } else { sum })
    }

    /// Next value in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.seed = (self.seed * Self::MULTIPLIER + Self::INCREMENT) % Self::MODULUS;
        self.seed as f64 / Self::MODULUS as f64
    }

    /// Uniform integer in `[min, max]`.
    pub fn int_between(&mut self, min: u32, max: u32) -> u32 {
        (self.next_f64() * (max - min + 1) as f64).floor() as u32 + min
    }

    pub fn index(&mut self, len: usize) -> usize {
        ((self.next_f64() * len as f64).floor() as usize).min(len.saturating_sub(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    PoorSleep,
    HighStress,
    LowMood,
    LowActivity,
    Dehydration,
    Fatigue,
    Headache,
    Smoking,
    Alcohol,
    HighBmi,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::PoorSleep => "poor_sleep",
            Category::HighStress => "high_stress",
            Category::LowMood => "low_mood",
            Category::LowActivity => "low_activity",
            Category::Dehydration => "dehydration",
            Category::Fatigue => "fatigue",
            Category::Headache => "headache",
            Category::Smoking => "smoking",
            Category::Alcohol => "alcohol",
            Category::HighBmi => "high_bmi",
            Category::General => "general",
        }
    }

    fn templates(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Category::PoorSleep => &[
                ("Wind down early", "Put screens away 60 minutes before bed tonight."),
                ("Fixed bedtime", "Go to bed at the same time as yesterday, within 15 minutes."),
                ("Dark and cool room", "Drop the bedroom temperature and block out light before sleeping."),
            ],
            Category::HighStress => &[
                ("Box breathing", "Do four rounds of 4-4-4-4 box breathing."),
                ("Ten-minute walk", "Step outside for a ten-minute walk without your phone."),
                ("Brain dump", "Write down everything on your mind for five minutes."),
            ],
            Category::LowMood => &[
                ("Reach out", "Send a message to a friend or family member you trust."),
                ("Sunlight break", "Spend fifteen minutes outdoors in daylight."),
                ("Three good things", "Write down three things that went well today."),
            ],
            Category::LowActivity => &[
                ("Move for 20", "Take a brisk 20-minute walk."),
                ("Stretch session", "Do a ten-minute full-body stretch."),
                ("Take the stairs", "Use the stairs instead of the lift all day."),
            ],
            Category::Dehydration => &[
                ("Water on waking", "Drink a full glass of water first thing in the morning."),
                ("Bottle by your side", "Keep a filled water bottle within reach and finish it by noon."),
                ("Glass with every meal", "Have a glass of water with each meal today."),
            ],
            Category::Fatigue => &[
                ("Power nap", "Take a 20-minute nap before 3pm."),
                ("Balanced lunch", "Eat a lunch with protein and vegetables to avoid an energy crash."),
            ],
            Category::Headache => &[
                ("Screen break", "Look away from screens for 5 minutes every hour."),
                ("Rest in the dark", "Rest for 15 minutes in a quiet, dim room."),
            ],
            Category::Smoking => &[
                ("Delay one cigarette", "Push your next cigarette back by 30 minutes."),
                ("Craving plan", "When a craving hits, chew gum or drink water instead."),
            ],
            Category::Alcohol => &[
                ("Alcohol-free evening", "Skip alcohol tonight and choose a soft drink instead."),
                ("Rehydrate", "Drink two extra glasses of water to recover from last night."),
            ],
            Category::HighBmi => &[
                ("Swap a snack", "Replace one processed snack with fruit or nuts."),
                ("Walk after dinner", "Take a 15-minute walk after your evening meal."),
            ],
            Category::General => &[
                ("Gratitude note", "Write down one thing you are grateful for."),
                ("Posture check", "Check and reset your posture three times today."),
                ("Healthy breakfast", "Start the day with a breakfast that includes fruit."),
                ("Digital sunset", "Turn off notifications an hour before bed."),
                ("Mindful minute", "Sit quietly and focus on your breath for one minute."),
            ],
        }
    }
}

/// Urgency of each advice category for a check-in, in rule order.
pub fn rank_categories(check_in: &CheckIn, profile: Option<&Profile>) -> Vec<(Category, u32)> {
    let mut ranked = Vec::new();

    if check_in.hours_slept < 5.0 {
        ranked.push((Category::PoorSleep, 10));
    } else if check_in.hours_slept < 6.5 {
        ranked.push((Category::PoorSleep, 6));
    }

    if check_in.stress_level >= 8 {
        ranked.push((Category::HighStress, 9));
    } else if check_in.stress_level >= 6 {
        ranked.push((Category::HighStress, 5));
    }

    if check_in.current_mood <= 3 {
        ranked.push((Category::LowMood, 9));
    } else if check_in.current_mood <= 5 {
        ranked.push((Category::LowMood, 5));
    }

    if check_in.daily_activity_measure < 15.0 {
        ranked.push((Category::LowActivity, 6));
    } else if check_in.daily_activity_measure < 30.0 {
        ranked.push((Category::LowActivity, 3));
    }

    if check_in.num_of_water_glasses < 4 {
        ranked.push((Category::Dehydration, 7));
    } else if check_in.num_of_water_glasses < 6 {
        ranked.push((Category::Dehydration, 4));
    }

    if check_in.symptoms_today.contains(&Symptom::Fatigue) {
        ranked.push((Category::Fatigue, 7));
    }
    if check_in.symptoms_today.contains(&Symptom::Headache) {
        ranked.push((Category::Headache, 6));
    }
    if check_in.lifestyle_checks.contains(&LifestyleCheck::SmokedToday) {
        ranked.push((Category::Smoking, 8));
    }
    if check_in.lifestyle_checks.contains(&LifestyleCheck::DrankLastNight) {
        ranked.push((Category::Alcohol, 6));
    }

    match profile.and_then(Profile::bmi) {
        Some(bmi) if bmi > 30.0 => ranked.push((Category::HighBmi, 5)),
        Some(bmi) if bmi > 25.0 => ranked.push((Category::HighBmi, 3)),
        _ => {}
    }

    ranked.push((Category::General, 1));
    // Stable sort keeps rule order between equal scores.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Picks the day's four tasks. Identical inputs always produce identical output.
pub fn generate_remedy_tasks(
    check_in: &CheckIn,
    profile: Option<&Profile>,
    date: NaiveDate,
    user_id: Uuid,
) -> Vec<RemedyTask> {
    let mut selected: Vec<Category> = Vec::with_capacity(TASKS_PER_DAY);
    for (category, _) in rank_categories(check_in, profile) {
        if !selected.contains(&category) {
            selected.push(category);
        }
    }
    selected.truncate(TASKS_PER_DAY);
    while selected.len() < TASKS_PER_DAY {
        selected.push(Category::General);
    }

    let mut rng = SeededRng::for_day(date, user_id);
    let mut general_pool: Vec<usize> = (0..Category::General.templates().len()).collect();
    let day = date.format("%Y%m%d");

    selected
        .into_iter()
        .enumerate()
        .map(|(position, category)| {
            let templates = category.templates();
            let template_index = if category == Category::General && !general_pool.is_empty() {
                general_pool.remove(rng.index(general_pool.len()))
            } else {
                rng.index(templates.len())
            };
            let (title, description) = templates[template_index];
            let points = rng.int_between(MIN_POINTS, MAX_POINTS);

            RemedyTask {
                id: format!("{day}-{}-{position}", category.as_str()),
                category: category.as_str().to_string(),
                title: title.to_string(),
                description: description.to_string(),
                points,
            }
        })
        .collect()
}
