//! Database repository layer
//!
//! Provides the read-side aggregate queries the analytics assemblers are
//! built from, plus the insert operations owned by the logging subsystems.

use crate::analytics::rollup::FALLBACK_CALORIES;
use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Scalar aggregates over a user's meals in a time window.
#[derive(Debug, Clone, Default)]
pub struct MealTotals {
    /// Number of meals logged in the window
    pub meal_count: i64,
    /// Average calories per logged meal; baseline fallback when empty
    pub avg_calories: f64,
}

/// Scalar aggregates over a user's AI requests in a time window.
#[derive(Debug, Clone, Default)]
pub struct AiUsageTotals {
    /// Total requests in the window
    pub total_requests: i64,
    /// Requests served by Gemini
    pub gemini_requests: i64,
    /// Requests served by OpenAI
    pub openai_requests: i64,
    /// Average confidence over requests that reported one; 0.0 when empty
    pub avg_confidence: f64,
}

/// Summed nutrients for one calendar day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayNutrients {
    /// Summed calories (kcal)
    pub calories: f64,
    /// Summed protein (grams)
    pub protein: f64,
    /// Summed carbs (grams)
    pub carbs: f64,
    /// Summed fat (grams)
    pub fat: f64,
    /// Number of meals logged that day
    pub meal_count: i64,
}

/// Platform-wide AI request counts for the admin dashboard.
#[derive(Debug, Clone, Default)]
pub struct PlatformAiUsage {
    /// All requests ever recorded
    pub total_requests: i64,
    /// Requests since the first of the current month
    pub requests_this_month: i64,
    /// Gemini requests this month (for cost estimation)
    pub gemini_this_month: i64,
    /// OpenAI requests this month (for cost estimation)
    pub openai_this_month: i64,
}

/// One row of the paginated admin user list.
///
/// Pre-joined with the current-month AI request count to avoid an N+1
/// query per listed user.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AdminUserRow {
    /// User ID
    pub id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub full_name: Option<String>,
    /// Subscription tier
    pub subscription_tier: SubscriptionTier,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Most recent login
    pub last_login: Option<DateTime<Utc>>,
    /// AI requests since the first of the current month
    pub ai_requests_this_month: i64,
}

/// Per-provider AI usage breakdown for one user (admin detail view).
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct UserAiBreakdown {
    /// All requests ever recorded for the user
    pub total_requests: i64,
    /// Requests served by Gemini
    pub gemini_requests: i64,
    /// Requests served by OpenAI
    pub openai_requests: i64,
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // User operations
    // ============================================

    /// Insert or update a user
    pub fn upsert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO users (id, email, full_name, subscription_tier, is_admin,
                               settings, created_at, last_login)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                full_name = excluded.full_name,
                subscription_tier = excluded.subscription_tier,
                is_admin = excluded.is_admin,
                settings = excluded.settings,
                last_login = excluded.last_login
            "#,
            params![
                user.id,
                user.email,
                user.full_name,
                user.subscription_tier.as_str(),
                user.is_admin,
                serde_json::to_string(&user.settings)?,
                user.created_at.to_rfc3339(),
                user.last_login.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Get a user by ID
    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM users WHERE id = ?", [id], Self::row_to_user)
            .optional()
            .map_err(Error::from)
    }

    /// Record a login timestamp for a user
    pub fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![at.to_rfc3339(), id],
        )?;
        if updated == 0 {
            return Err(Error::UserNotFound(id.to_string()));
        }
        Ok(())
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        let tier_str: String = row.get("subscription_tier")?;
        let settings_str: String = row.get("settings")?;
        let created_at_str: String = row.get("created_at")?;
        let last_login_str: Option<String> = row.get("last_login")?;

        Ok(User {
            id: row.get("id")?,
            email: row.get("email")?,
            full_name: row.get("full_name")?,
            subscription_tier: SubscriptionTier::from_storage(&tier_str),
            is_admin: row.get("is_admin")?,
            settings: serde_json::from_str(&settings_str).unwrap_or_default(),
            created_at: parse_ts(&created_at_str),
            last_login: last_login_str.as_deref().map(parse_ts),
        })
    }

    // ============================================
    // Meal operations
    // ============================================

    /// Insert a meal record
    pub fn insert_meal(&self, meal: &Meal) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO meals (id, user_id, name, calories, protein, carbs, fat, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                meal.id,
                meal.user_id,
                meal.name,
                meal.calories,
                meal.protein,
                meal.carbs,
                meal.fat,
                meal.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List all meals for a user, oldest first (export path)
    pub fn list_meals(&self, user_id: &str) -> Result<Vec<Meal>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM meals WHERE user_id = ? ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map([user_id], Self::row_to_meal)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn row_to_meal(row: &Row) -> rusqlite::Result<Meal> {
        let created_at_str: String = row.get("created_at")?;
        Ok(Meal {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            calories: row.get("calories")?,
            protein: row.get("protein")?,
            carbs: row.get("carbs")?,
            fat: row.get("fat")?,
            created_at: parse_ts(&created_at_str),
        })
    }

    // ============================================
    // AI request operations
    // ============================================

    /// Insert an AI request record
    pub fn insert_ai_request(&self, request: &AiRequest) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO ai_requests (id, user_id, provider, confidence, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                request.id,
                request.user_id,
                request.provider.as_str(),
                request.confidence,
                request.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List all AI requests for a user, oldest first (export path)
    pub fn list_ai_requests(&self, user_id: &str) -> Result<Vec<AiRequest>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM ai_requests WHERE user_id = ? ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map([user_id], Self::row_to_ai_request)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn row_to_ai_request(row: &Row) -> rusqlite::Result<AiRequest> {
        let provider_str: String = row.get("provider")?;
        let created_at_str: String = row.get("created_at")?;
        Ok(AiRequest {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            // Provider passed the CHECK constraint on insert
            provider: AiProvider::from_storage(&provider_str).unwrap_or(AiProvider::Gemini),
            confidence: row.get("confidence")?,
            created_at: parse_ts(&created_at_str),
        })
    }

    // ============================================
    // Recipe favorite operations
    // ============================================

    /// Insert a recipe favorite (idempotent per user/recipe pair)
    pub fn insert_recipe_favorite(&self, favorite: &RecipeFavorite) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO recipe_favorites (user_id, recipe_id, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, recipe_id) DO NOTHING
            "#,
            params![
                favorite.user_id,
                favorite.recipe_id,
                favorite.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Count saved recipes for a user
    pub fn recipe_favorite_count(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM recipe_favorites WHERE user_id = ?",
            [user_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    // ============================================
    // Per-user aggregate queries (analytics read path)
    // ============================================

    /// Meal count and average calories for a user since a timestamp.
    ///
    /// An empty window yields the baseline calorie figure rather than an
    /// absent value; the dashboard renders it directly.
    pub fn meal_totals(&self, user_id: &str, since: DateTime<Utc>) -> Result<MealTotals> {
        let conn = self.conn.lock().unwrap();
        let (meal_count, avg_calories): (i64, Option<f64>) = conn.query_row(
            r#"
            SELECT COUNT(*), AVG(calories)
            FROM meals
            WHERE user_id = ?1 AND created_at >= ?2
            "#,
            params![user_id, since.to_rfc3339()],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        Ok(MealTotals {
            meal_count,
            avg_calories: avg_calories.unwrap_or(FALLBACK_CALORIES as f64),
        })
    }

    /// AI request totals, per-provider counts, and average confidence for a
    /// user since a timestamp.
    pub fn ai_usage_totals(&self, user_id: &str, since: DateTime<Utc>) -> Result<AiUsageTotals> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN provider = 'gemini' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN provider = 'openai' THEN 1 ELSE 0 END), 0),
                COALESCE(AVG(confidence), 0.0)
            FROM ai_requests
            WHERE user_id = ?1 AND created_at >= ?2
            "#,
            params![user_id, since.to_rfc3339()],
            |r| {
                Ok(AiUsageTotals {
                    total_requests: r.get(0)?,
                    gemini_requests: r.get(1)?,
                    openai_requests: r.get(2)?,
                    avg_confidence: r.get(3)?,
                })
            },
        )
        .map_err(Error::from)
    }

    /// AI request count for a user since the given calendar-month start.
    ///
    /// Computed independently of the selected analytics range.
    pub fn ai_requests_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM ai_requests WHERE user_id = ?1 AND created_at >= ?2",
            params![user_id, since.to_rfc3339()],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Per-calendar-day nutrient sums for a user since a timestamp.
    ///
    /// One grouped query over the full window instead of a round trip per
    /// day; the rollup engine consumes the resulting day map.
    pub fn daily_nutrient_totals(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<BTreeMap<NaiveDate, DayNutrients>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT
                date(created_at) AS day,
                COALESCE(SUM(calories), 0),
                COALESCE(SUM(protein), 0),
                COALESCE(SUM(carbs), 0),
                COALESCE(SUM(fat), 0),
                COUNT(*)
            FROM meals
            WHERE user_id = ?1 AND created_at >= ?2
            GROUP BY day
            ORDER BY day
            "#,
        )?;

        let mut days = BTreeMap::new();
        let rows = stmt.query_map(params![user_id, since.to_rfc3339()], |row| {
            let day: String = row.get(0)?;
            Ok((
                day,
                DayNutrients {
                    calories: row.get(1)?,
                    protein: row.get(2)?,
                    carbs: row.get(3)?,
                    fat: row.get(4)?,
                    meal_count: row.get(5)?,
                },
            ))
        })?;

        for row in rows {
            let (day_str, nutrients) = row?;
            if let Ok(day) = NaiveDate::parse_from_str(&day_str, "%Y-%m-%d") {
                days.insert(day, nutrients);
            }
        }

        Ok(days)
    }

    // ============================================
    // Platform-wide aggregate queries (admin read path)
    // ============================================

    /// Total registered users
    pub fn count_users(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
        Ok(count)
    }

    /// Users whose last login is at or after the given timestamp
    pub fn count_users_active_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE last_login >= ?",
            [since.to_rfc3339()],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Users on a given subscription tier
    pub fn count_users_by_tier(&self, tier: SubscriptionTier) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE subscription_tier = ?",
            [tier.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Users created at or after the given timestamp
    pub fn count_users_created_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE created_at >= ?",
            [since.to_rfc3339()],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Platform-wide AI request counts, split by provider for the month
    /// window used in cost estimation.
    pub fn platform_ai_usage(&self, month_start: DateTime<Utc>) -> Result<PlatformAiUsage> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN created_at >= ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN created_at >= ?1 AND provider = 'gemini' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN created_at >= ?1 AND provider = 'openai' THEN 1 ELSE 0 END), 0)
            FROM ai_requests
            "#,
            [month_start.to_rfc3339()],
            |r| {
                Ok(PlatformAiUsage {
                    total_requests: r.get(0)?,
                    requests_this_month: r.get(1)?,
                    gemini_this_month: r.get(2)?,
                    openai_this_month: r.get(3)?,
                })
            },
        )
        .map_err(Error::from)
    }

    /// Paginated user list, newest accounts first, each row annotated with
    /// its current-month AI request count.
    pub fn list_users_with_ai_counts(
        &self,
        month_start: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AdminUserRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT
                u.id,
                u.email,
                u.full_name,
                u.subscription_tier,
                u.created_at,
                u.last_login,
                COALESCE(a.cnt, 0) AS ai_requests_this_month
            FROM users u
            LEFT JOIN (
                SELECT user_id, COUNT(*) AS cnt
                FROM ai_requests
                WHERE created_at >= ?1
                GROUP BY user_id
            ) a ON a.user_id = u.id
            ORDER BY u.created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )?;

        let rows = stmt
            .query_map(
                params![month_start.to_rfc3339(), limit, offset],
                |row| {
                    let tier_str: String = row.get(3)?;
                    let created_at_str: String = row.get(4)?;
                    let last_login_str: Option<String> = row.get(5)?;
                    Ok(AdminUserRow {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        full_name: row.get(2)?,
                        subscription_tier: SubscriptionTier::from_storage(&tier_str),
                        created_at: parse_ts(&created_at_str),
                        last_login: last_login_str.as_deref().map(parse_ts),
                        ai_requests_this_month: row.get(6)?,
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Lifetime AI usage for one user, broken down by provider.
    pub fn user_ai_breakdown(&self, user_id: &str) -> Result<UserAiBreakdown> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN provider = 'gemini' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN provider = 'openai' THEN 1 ELSE 0 END), 0)
            FROM ai_requests
            WHERE user_id = ?
            "#,
            [user_id],
            |r| {
                Ok(UserAiBreakdown {
                    total_requests: r.get(0)?,
                    gemini_requests: r.get(1)?,
                    openai_requests: r.get(2)?,
                })
            },
        )
        .map_err(Error::from)
    }
}

/// Parse an RFC 3339 timestamp from storage, tolerating malformed rows.
fn parse_ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
