//! Analytics report assembler
//!
//! Joins the per-user aggregate queries, the day rollups, and the
//! reference provider into the dashboard payload.

use crate::analytics::range::{month_start, AnalyticsRange};
use crate::analytics::reference::{NamedCount, ReferenceData};
use crate::analytics::rollup::{self, ADHERENCE_WINDOW_DAYS};
use crate::db::Database;
use crate::error::Result;
use crate::types::User;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// AI usage section of the analytics report.
#[derive(Debug, Clone, Serialize)]
pub struct AiUsageReport {
    pub total_requests: i64,
    pub requests_this_month: i64,
    pub gemini_requests: i64,
    pub openai_requests: i64,
    pub average_confidence: f64,
}

/// Nutrition section of the analytics report.
#[derive(Debug, Clone, Serialize)]
pub struct NutritionReport {
    pub total_meals_logged: i64,
    pub average_daily_calories: i64,
    pub calories_this_week: [i64; 7],
    pub protein_this_week: [i64; 7],
    pub carbs_this_week: [i64; 7],
    pub fat_this_week: [i64; 7],
}

/// Goal adherence section of the analytics report.
#[derive(Debug, Clone, Serialize)]
pub struct GoalsReport {
    pub daily_calorie_goal: i64,
    pub days_on_track: i64,
    pub days_total: i64,
    pub streak: i64,
}

/// Recipe section of the analytics report.
#[derive(Debug, Clone, Serialize)]
pub struct RecipesReport {
    pub total_saved: i64,
    pub favorite_cuisines: Vec<NamedCount>,
    pub most_cooked: Vec<NamedCount>,
}

/// Complete per-user analytics payload.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub range: String,
    pub ai_usage: AiUsageReport,
    pub nutrition: NutritionReport,
    pub goals: GoalsReport,
    pub recipes: RecipesReport,
}

/// Assemble the analytics report for a user.
///
/// The range scopes the scalar totals only. The weekly series always
/// covers the trailing seven days and goal adherence always covers the
/// trailing thirty, both ending on `now`'s UTC day.
pub fn build_report(
    db: &Database,
    reference: &dyn ReferenceData,
    user: &User,
    range: AnalyticsRange,
    now: DateTime<Utc>,
) -> Result<AnalyticsReport> {
    let since = range.start(now);

    let meal_totals = db.meal_totals(&user.id, since)?;
    let ai_totals = db.ai_usage_totals(&user.id, since)?;
    let requests_this_month = db.ai_requests_since(&user.id, month_start(now))?;

    // One grouped query feeds both the weekly series and goal adherence
    let rollup_start = now - Duration::days(ADHERENCE_WINDOW_DAYS);
    let days = db.daily_nutrient_totals(&user.id, rollup_start)?;
    let series = rollup::weekly_series(&days, now);

    let goal = user.settings.daily_calorie_goal();
    let progress = rollup::goal_progress(&days, goal, now);

    let total_saved = db.recipe_favorite_count(&user.id)?;

    Ok(AnalyticsReport {
        range: range.as_str().to_string(),
        ai_usage: AiUsageReport {
            total_requests: ai_totals.total_requests,
            requests_this_month,
            gemini_requests: ai_totals.gemini_requests,
            openai_requests: ai_totals.openai_requests,
            average_confidence: round2(ai_totals.avg_confidence),
        },
        nutrition: NutritionReport {
            total_meals_logged: meal_totals.meal_count,
            average_daily_calories: meal_totals.avg_calories.round() as i64,
            calories_this_week: series.calories,
            protein_this_week: series.protein,
            carbs_this_week: series.carbs,
            fat_this_week: series.fat,
        },
        goals: GoalsReport {
            daily_calorie_goal: goal,
            days_on_track: progress.days_on_track,
            // Display clamp only; adherence math above uses the raw count
            days_total: progress.days_total.max(1),
            streak: progress.streak,
        },
        recipes: RecipesReport {
            total_saved,
            favorite_cuisines: reference.favorite_cuisines(&user.id),
            most_cooked: reference.most_cooked(&user.id),
        },
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
