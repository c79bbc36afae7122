use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Currency, NewTaxBracket, TaxBracket, ValidationError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Read and write access to currency and bracket configuration.
///
/// The calculation path only reads (`get_currency`, `get_tax_brackets`);
/// the write methods exist for loaders and seeding.
#[async_trait]
pub trait TaxRepository: Send + Sync {
    // Currencies
    async fn get_currency(&self, code: &str) -> Result<Currency, RepositoryError>;
    async fn list_currencies(&self) -> Result<Vec<Currency>, RepositoryError>;

    /// Inserts or updates the currency keyed by its code.
    async fn save_currency(&self, currency: &Currency) -> Result<(), RepositoryError>;

    /// Fails with [`RepositoryError::Constraint`] while brackets reference
    /// the currency.
    async fn delete_currency(&self, code: &str) -> Result<(), RepositoryError>;

    // Tax brackets

    /// Brackets for one currency, ascending by `lower_cents`. An empty
    /// result is not an error.
    async fn get_tax_brackets(
        &self,
        currency_code: &str,
    ) -> Result<Vec<TaxBracket>, RepositoryError>;

    /// Brackets for every currency, ascending by `lower_cents`.
    async fn list_tax_brackets(&self) -> Result<Vec<TaxBracket>, RepositoryError>;

    async fn insert_tax_bracket(
        &self,
        bracket: &NewTaxBracket,
    ) -> Result<TaxBracket, RepositoryError>;

    /// Returns the number of brackets removed.
    async fn delete_tax_brackets(&self, currency_code: &str) -> Result<u64, RepositoryError>;
}
