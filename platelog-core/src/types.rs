//! Core domain types for platelog
//!
//! These types represent the canonical data model that the analytics layer
//! aggregates over. All four entities are created and mutated by other
//! subsystems (meal logging, AI invocation, recipe browsing); the analytics
//! layer only reads them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **User** | An account holder with a subscription tier and settings blob |
//! | **Meal** | A single logged meal with four nutrient fields |
//! | **AiRequest** | One call to an AI provider, tracked for usage/cost reporting |
//! | **RecipeFavorite** | A user-to-recipe bookmark; analytics reads only its count |
//! | **Tier** | Subscription level (free/premium/pro) governing feature limits |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Subscription tier
// ============================================

/// Subscription level for a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Premium,
    Pro,
}

impl SubscriptionTier {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Premium => "premium",
            SubscriptionTier::Pro => "pro",
        }
    }

    /// Parse tier string from storage. Unknown values map to Free.
    pub fn from_storage(value: &str) -> Self {
        match value {
            "premium" => SubscriptionTier::Premium,
            "pro" => SubscriptionTier::Pro,
            _ => SubscriptionTier::Free,
        }
    }

    /// Whether this tier is a paid plan.
    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }
}

// ============================================
// AI provider
// ============================================

/// Supported AI providers for meal analysis and recipe generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    Gemini,
    OpenAi,
}

impl AiProvider {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini",
            AiProvider::OpenAi => "openai",
        }
    }

    /// Parse provider string from storage.
    pub fn from_storage(value: &str) -> Option<Self> {
        match value {
            "gemini" => Some(AiProvider::Gemini),
            "openai" => Some(AiProvider::OpenAi),
            _ => None,
        }
    }

    /// Flat per-request cost in USD used for platform cost estimates.
    ///
    /// These are deliberately simplified constants, not a billing ledger.
    pub fn cost_per_request(&self) -> f64 {
        match self {
            AiProvider::Gemini => 0.001,
            AiProvider::OpenAi => 0.02,
        }
    }
}

// ============================================
// User and settings
// ============================================

/// Default daily calorie goal when the user has not configured one.
pub const DEFAULT_DAILY_CALORIE_GOAL: i64 = 2000;

/// Nested health goals inside the user settings blob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthGoals {
    /// Target daily calorie intake
    #[serde(default)]
    pub daily_calories: Option<i64>,
}

/// User settings blob, stored as JSON on the user row.
///
/// Only the fields the analytics layer reads are modeled here; the blob is
/// round-tripped losslessly by the settings subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSettings {
    /// Health goal configuration
    #[serde(default)]
    pub health_goals: HealthGoals,
}

impl UserSettings {
    /// The configured daily calorie goal, or the platform default.
    pub fn daily_calorie_goal(&self) -> i64 {
        self.health_goals
            .daily_calories
            .unwrap_or(DEFAULT_DAILY_CALORIE_GOAL)
    }
}

/// An account holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUID)
    pub id: String,
    /// Email address (unique)
    pub email: String,
    /// Display name (optional)
    pub full_name: Option<String>,
    /// Subscription tier
    pub subscription_tier: SubscriptionTier,
    /// Whether this user may call admin endpoints
    pub is_admin: bool,
    /// Settings blob with nested health goals
    pub settings: UserSettings,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Most recent login timestamp
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new free-tier user with default settings.
    pub fn new(email: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            full_name: None,
            subscription_tier: SubscriptionTier::Free,
            is_admin: false,
            settings: UserSettings::default(),
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

// ============================================
// Meal
// ============================================

/// A single logged meal.
///
/// Nutrient fields are nullable: a meal logged without analysis data
/// contributes nothing to sums, which is expected rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    /// Unique identifier (UUID)
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Meal name
    pub name: String,
    /// Calories (kcal)
    pub calories: Option<f64>,
    /// Protein (grams)
    pub protein: Option<f64>,
    /// Carbohydrates (grams)
    pub carbs: Option<f64>,
    /// Fat (grams)
    pub fat: Option<f64>,
    /// When the meal was logged
    pub created_at: DateTime<Utc>,
}

impl Meal {
    /// Create a meal with the given nutrients, logged now.
    pub fn new(user_id: &str, name: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            calories: None,
            protein: None,
            carbs: None,
            fat: None,
            created_at: Utc::now(),
        }
    }
}

// ============================================
// AI request
// ============================================

/// One tracked call to an AI provider.
///
/// Used only for counting and averaging; never mutated by analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiRequest {
    /// Unique identifier (UUID)
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Which provider served the request
    pub provider: AiProvider,
    /// Model confidence score in [0.0, 1.0], if reported
    pub confidence: Option<f64>,
    /// When the request was made
    pub created_at: DateTime<Utc>,
}

impl AiRequest {
    /// Create a request record stamped now.
    pub fn new(user_id: &str, provider: AiProvider) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            provider,
            confidence: None,
            created_at: Utc::now(),
        }
    }
}

// ============================================
// Recipe favorite
// ============================================

/// A user-to-recipe bookmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeFavorite {
    /// Owning user
    pub user_id: String,
    /// The bookmarked recipe
    pub recipe_id: String,
    /// When the bookmark was created
    pub created_at: DateTime<Utc>,
}
