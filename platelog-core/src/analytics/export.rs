//! User data export
//!
//! Produces a downloadable snapshot of a user's logged meals and AI
//! requests as either CSV or JSON.

use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{AiRequest, Meal, User};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Output format for the data export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    Csv,
    #[default]
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(Error::InvalidParameter(format!(
                "unknown export format '{}', expected csv or json",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A rendered export ready to hand to the HTTP layer.
#[derive(Debug, Clone)]
pub struct Export {
    pub format: ExportFormat,
    pub filename: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
struct JsonExport<'a> {
    user_id: &'a str,
    email: &'a str,
    exported_at: DateTime<Utc>,
    meals: &'a [Meal],
    ai_requests: &'a [AiRequest],
}

/// Render a user's full meal and AI request history in the requested
/// format.
pub fn export_user_data(
    db: &Database,
    user: &User,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> Result<Export> {
    let meals = db.list_meals(&user.id)?;
    let requests = db.list_ai_requests(&user.id)?;

    let body = match format {
        ExportFormat::Json => {
            let payload = JsonExport {
                user_id: &user.id,
                email: &user.email,
                exported_at: now,
                meals: &meals,
                ai_requests: &requests,
            };
            serde_json::to_string_pretty(&payload)?
        }
        ExportFormat::Csv => render_csv(&meals),
    };

    let filename = format!(
        "platelog-export-{}.{}",
        now.format("%Y%m%d"),
        format.extension()
    );

    Ok(Export {
        format,
        filename,
        body,
    })
}

fn render_csv(meals: &[Meal]) -> String {
    let mut out = String::from("date,name,calories,protein,carbs,fat\n");
    for meal in meals {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            meal.created_at.to_rfc3339(),
            csv_field(&meal.name),
            csv_number(meal.calories),
            csv_number(meal.protein),
            csv_number(meal.carbs),
            csv_number(meal.fat),
        ));
    }
    out
}

/// Quote a field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
