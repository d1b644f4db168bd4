//! Analytics engine: time ranges, per-day rollups, and the report
//! assemblers for the user dashboard and the admin views.

pub mod admin;
pub mod export;
pub mod range;
pub mod reference;
pub mod report;
pub mod rollup;

pub use admin::{
    build_admin_stats, build_admin_user_detail, build_admin_user_page, AdminStats,
    AdminUserDetail, AdminUserPage, PageParams, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use export::{export_user_data, Export, ExportFormat};
pub use range::AnalyticsRange;
pub use reference::{NamedCount, PlaceholderReference, ReferenceData, SystemHealth};
pub use report::{build_report, AnalyticsReport};
