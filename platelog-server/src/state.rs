//! Shared application state for the HTTP layer.

use platelog_core::analytics::ReferenceData;
use platelog_core::Database;
use std::sync::Arc;

/// State handed to every handler: the database plus the reference
/// provider backing the not-yet-stored report sections.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub reference: Arc<dyn ReferenceData>,
}

impl AppState {
    pub fn new(db: Database, reference: impl ReferenceData + 'static) -> Self {
        Self {
            db: Arc::new(db),
            reference: Arc::new(reference),
        }
    }
}
