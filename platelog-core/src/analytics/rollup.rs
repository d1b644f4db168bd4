//! Per-day rollup engine
//!
//! Folds the grouped per-day nutrient sums from the database into the
//! weekly series and goal-adherence figures the dashboard renders. All
//! day boundaries are UTC calendar days.

use crate::db::DayNutrients;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Substitute daily calories for days with no logged meals
pub const FALLBACK_CALORIES: i64 = 1800;
/// Substitute daily protein (grams) for days with no logged meals
pub const FALLBACK_PROTEIN: i64 = 80;
/// Substitute daily carbs (grams) for days with no logged meals
pub const FALLBACK_CARBS: i64 = 210;
/// Substitute daily fat (grams) for days with no logged meals
pub const FALLBACK_FAT: i64 = 60;

/// A day is on track when actual calories land within this fraction of
/// the goal, inclusive on both edges.
pub const GOAL_TOLERANCE: f64 = 0.10;

/// Number of trailing days the goal-adherence window covers
pub const ADHERENCE_WINDOW_DAYS: i64 = 30;

/// Seven-day nutrient series, oldest day first, today last.
///
/// Days without logged meals carry the substitute baseline figures so
/// the chart never has gaps.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WeeklySeries {
    pub calories: [i64; 7],
    pub protein: [i64; 7],
    pub carbs: [i64; 7],
    pub fat: [i64; 7],
}

impl Default for WeeklySeries {
    fn default() -> Self {
        Self {
            calories: [FALLBACK_CALORIES; 7],
            protein: [FALLBACK_PROTEIN; 7],
            carbs: [FALLBACK_CARBS; 7],
            fat: [FALLBACK_FAT; 7],
        }
    }
}

/// Goal adherence over the trailing 30-day window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoalProgress {
    /// Days with logged calories that landed within tolerance of the goal
    pub days_on_track: i64,
    /// Days with any logged calories in the window
    pub days_total: i64,
    /// Consecutive on-track days ending today, walking backward
    pub streak: i64,
}

/// Whether a day's summed calories fall within tolerance of the goal.
///
/// The band is inclusive: exactly goal plus or minus 10% counts.
pub fn day_on_track(calories: f64, goal: i64) -> bool {
    let goal = goal as f64;
    (calories - goal).abs() <= GOAL_TOLERANCE * goal
}

/// Build the seven-day nutrient series ending on `now`'s UTC day.
pub fn weekly_series(
    days: &BTreeMap<NaiveDate, DayNutrients>,
    now: DateTime<Utc>,
) -> WeeklySeries {
    let mut series = WeeklySeries::default();
    let today = now.date_naive();

    for offset in 0..7 {
        // Index 0 is six days ago, index 6 is today
        let day = today - Duration::days(6 - offset);
        if let Some(nutrients) = days.get(&day) {
            if nutrients.meal_count > 0 {
                let i = offset as usize;
                series.calories[i] = nutrients.calories.round() as i64;
                series.protein[i] = nutrients.protein.round() as i64;
                series.carbs[i] = nutrients.carbs.round() as i64;
                series.fat[i] = nutrients.fat.round() as i64;
            }
        }
    }

    series
}

/// Compute goal adherence and the current streak over the trailing
/// 30-day window ending on `now`'s UTC day.
///
/// The streak walks backward from today and halts at the first day that
/// is not on track, including days with nothing logged; it never reaches
/// past the window.
pub fn goal_progress(
    days: &BTreeMap<NaiveDate, DayNutrients>,
    goal: i64,
    now: DateTime<Utc>,
) -> GoalProgress {
    let today = now.date_naive();
    let window_start = today - Duration::days(ADHERENCE_WINDOW_DAYS - 1);

    let mut progress = GoalProgress::default();
    for (day, nutrients) in days.range(window_start..=today) {
        if nutrients.meal_count == 0 {
            continue;
        }
        progress.days_total += 1;
        if day_on_track(nutrients.calories, goal) {
            progress.days_on_track += 1;
        }
    }

    for offset in 0..ADHERENCE_WINDOW_DAYS {
        let day = today - Duration::days(offset);
        let on_track = days
            .get(&day)
            .map(|n| n.meal_count > 0 && day_on_track(n.calories, goal))
            .unwrap_or(false);
        if !on_track {
            break;
        }
        progress.streak += 1;
    }

    progress
}
