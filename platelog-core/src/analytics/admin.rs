//! Admin metrics assembler
//!
//! Platform-wide statistics, the paginated user list, and the per-user
//! detail view behind the admin dashboard.

use crate::analytics::range::month_start;
use crate::analytics::reference::{ReferenceData, SystemHealth};
use crate::db::{AdminUserRow, Database, UserAiBreakdown};
use crate::error::{Error, Result};
use crate::types::{AiProvider, SubscriptionTier, User};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Monthly price of the premium tier in USD
pub const PREMIUM_MONTHLY_PRICE: f64 = 9.99;
/// Monthly price of the pro tier in USD
pub const PRO_MONTHLY_PRICE: f64 = 19.99;

/// Upper bound on the admin user list page size
pub const MAX_PAGE_LIMIT: i64 = 100;
/// Page size used when the caller does not supply one
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// User counts section of the admin stats payload.
#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total: i64,
    pub active_last_30_days: i64,
    pub new_this_month: i64,
    pub premium: i64,
    pub pro: i64,
}

/// Revenue estimates derived from tier counts.
///
/// A rough approximation from flat tier prices, not a billing ledger;
/// annualized is simply monthly times twelve.
#[derive(Debug, Clone, Serialize)]
pub struct RevenueStats {
    pub monthly: f64,
    pub annualized: f64,
    pub paid_conversion_rate: f64,
}

/// Platform AI usage section of the admin stats payload.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformAiStats {
    pub total_requests: i64,
    pub requests_this_month: i64,
    pub estimated_cost_this_month: f64,
}

/// Complete admin dashboard payload.
#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub users: UserStats,
    pub revenue: RevenueStats,
    pub ai_usage: PlatformAiStats,
    pub system: SystemHealth,
}

/// Validated pagination parameters for the admin user list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageParams {
    /// Clamp raw query values into the accepted ranges.
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// One page of the admin user list.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUserPage {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub users: Vec<AdminUserRow>,
}

/// Per-user detail for the admin view.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUserDetail {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub subscription_tier: SubscriptionTier,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub total_meals: i64,
    pub saved_recipes: i64,
    pub ai_usage: UserAiBreakdown,
}

/// Assemble platform-wide statistics for the admin dashboard.
pub fn build_admin_stats(
    db: &Database,
    reference: &dyn ReferenceData,
    now: DateTime<Utc>,
) -> Result<AdminStats> {
    let total = db.count_users()?;
    let active = db.count_users_active_since(now - Duration::days(30))?;
    let new_this_month = db.count_users_created_since(month_start(now))?;
    let premium = db.count_users_by_tier(SubscriptionTier::Premium)?;
    let pro = db.count_users_by_tier(SubscriptionTier::Pro)?;

    let monthly = premium as f64 * PREMIUM_MONTHLY_PRICE + pro as f64 * PRO_MONTHLY_PRICE;
    // Denominator clamp keeps an empty platform from dividing by zero
    let paid_conversion_rate = (premium + pro) as f64 / total.max(1) as f64;

    let usage = db.platform_ai_usage(month_start(now))?;
    let estimated_cost_this_month = usage.gemini_this_month as f64
        * AiProvider::Gemini.cost_per_request()
        + usage.openai_this_month as f64 * AiProvider::OpenAi.cost_per_request();

    Ok(AdminStats {
        users: UserStats {
            total,
            active_last_30_days: active,
            new_this_month,
            premium,
            pro,
        },
        revenue: RevenueStats {
            monthly: round2(monthly),
            annualized: round2(monthly * 12.0),
            paid_conversion_rate: round2(paid_conversion_rate),
        },
        ai_usage: PlatformAiStats {
            total_requests: usage.total_requests,
            requests_this_month: usage.requests_this_month,
            estimated_cost_this_month: round2(estimated_cost_this_month),
        },
        system: reference.system_health(),
    })
}

/// Fetch one page of the admin user list, newest accounts first.
pub fn build_admin_user_page(
    db: &Database,
    params: PageParams,
    now: DateTime<Utc>,
) -> Result<AdminUserPage> {
    let total = db.count_users()?;
    let users = db.list_users_with_ai_counts(month_start(now), params.limit, params.offset())?;
    Ok(AdminUserPage {
        page: params.page,
        limit: params.limit,
        total,
        users,
    })
}

/// Assemble the admin detail view for one user.
pub fn build_admin_user_detail(db: &Database, user_id: &str) -> Result<AdminUserDetail> {
    let user: User = db
        .get_user(user_id)?
        .ok_or_else(|| Error::UserNotFound(user_id.to_string()))?;

    let meals = db.meal_totals(&user.id, DateTime::<Utc>::MIN_UTC)?;
    let saved_recipes = db.recipe_favorite_count(&user.id)?;
    let ai_usage = db.user_ai_breakdown(&user.id)?;

    Ok(AdminUserDetail {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        subscription_tier: user.subscription_tier,
        is_admin: user.is_admin,
        created_at: user.created_at,
        last_login: user.last_login,
        total_meals: meals.meal_count,
        saved_recipes,
        ai_usage,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
