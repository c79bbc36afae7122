use std::sync::Arc;

use axum::{Router, routing::get};
use tax_core::TaxRepository;
use tax_core::calculations::TaxCalculator;
use tax_core::db::{MemoryRepositoryFactory, RepositoryRegistry};
use tax_db_sqlite::SqliteRepositoryFactory;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub calculator: TaxCalculator,
}

impl AppState {
    pub fn new(repo: Arc<dyn TaxRepository>, default_currency: &str) -> Self {
        Self {
            calculator: TaxCalculator::new(repo, default_currency),
        }
    }
}

/// All storage backends the server can be started with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(MemoryRepositoryFactory));
    registry
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/v1/tax_calculation", get(handlers::tax_calculation))
        .route("/api/v1/tax_brackets", get(handlers::tax_brackets))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
