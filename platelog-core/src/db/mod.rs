//! Database layer: SQLite storage, schema migrations, and the aggregate
//! queries the analytics assemblers read from.

mod repo;
mod schema;

pub use repo::{
    AdminUserRow, AiUsageTotals, Database, DayNutrients, MealTotals, PlatformAiUsage,
    UserAiBreakdown,
};
pub use schema::SCHEMA_VERSION;
