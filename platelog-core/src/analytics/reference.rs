//! Reference data sources for report sections that are not yet backed
//! by storage.
//!
//! Recipe insights and system health come from an injectable provider so
//! the assemblers stay testable and the placeholder can be swapped for a
//! real source without touching report construction.

use serde::Serialize;

/// A labeled occurrence count, used for cuisine and recipe rankings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: i64,
}

impl NamedCount {
    pub fn new(name: impl Into<String>, count: i64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Operational status block for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemHealth {
    pub status: String,
    pub database: String,
    pub ai_service: String,
}

/// Supplies the report sections that have no storage backing yet.
pub trait ReferenceData: Send + Sync {
    /// Top cuisines among a user's saved recipes, most frequent first
    fn favorite_cuisines(&self, user_id: &str) -> Vec<NamedCount>;

    /// Most-cooked recipes for a user, most frequent first
    fn most_cooked(&self, user_id: &str) -> Vec<NamedCount>;

    /// Current operational status of the platform
    fn system_health(&self) -> SystemHealth;
}

/// Static placeholder provider used until recipe metadata and health
/// probes land.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderReference;

impl ReferenceData for PlaceholderReference {
    fn favorite_cuisines(&self, _user_id: &str) -> Vec<NamedCount> {
        vec![
            NamedCount::new("Italian", 12),
            NamedCount::new("Mexican", 8),
            NamedCount::new("Thai", 5),
        ]
    }

    fn most_cooked(&self, _user_id: &str) -> Vec<NamedCount> {
        vec![
            NamedCount::new("Chicken Stir Fry", 6),
            NamedCount::new("Pasta Primavera", 4),
            NamedCount::new("Veggie Tacos", 3),
        ]
    }

    fn system_health(&self) -> SystemHealth {
        SystemHealth {
            status: "healthy".to_string(),
            database: "connected".to_string(),
            ai_service: "operational".to_string(),
        }
    }
}
