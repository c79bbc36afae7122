//! In-process repository backend.
//!
//! Holds currencies and brackets behind a lock with the same rules the SQLite
//! schema enforces: unique `(currency_code, lower_cents)`, brackets must
//! reference an existing currency, and a referenced currency cannot be
//! deleted. Used by tests and as the `memory` server backend.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{RepositoryError, TaxRepository};
use crate::models::defaults::{nzd, nzd_brackets};
use crate::models::{Currency, NewTaxBracket, TaxBracket};

#[derive(Debug, Default)]
struct State {
    currencies: BTreeMap<String, Currency>,
    brackets: Vec<TaxBracket>,
    next_id: i64,
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
}

impl InMemoryRepository {
    /// An empty store with no currencies.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the built-in NZD currency and brackets.
    pub fn with_defaults() -> Result<Self, RepositoryError> {
        let repo = Self::new();
        {
            let mut state = repo.write()?;
            let currency = nzd();
            state.currencies.insert(currency.code.clone(), currency);
            for bracket in nzd_brackets() {
                insert_bracket(&mut state, &bracket)?;
            }
        }
        Ok(repo)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, RepositoryError> {
        self.state
            .read()
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, RepositoryError> {
        self.state
            .write()
            .map_err(|e| RepositoryError::Database(e.to_string()))
    }
}

fn insert_bracket(
    state: &mut State,
    bracket: &NewTaxBracket,
) -> Result<TaxBracket, RepositoryError> {
    bracket.validate()?;

    if !state.currencies.contains_key(&bracket.currency_code) {
        return Err(RepositoryError::Constraint(format!(
            "currency '{}' does not exist",
            bracket.currency_code
        )));
    }
    let duplicate = state.brackets.iter().any(|b| {
        b.currency_code == bracket.currency_code && b.lower_cents == bracket.lower_cents
    });
    if duplicate {
        return Err(RepositoryError::Constraint(format!(
            "bracket for {} at lower_cents {} already exists",
            bracket.currency_code, bracket.lower_cents
        )));
    }

    state.next_id += 1;
    let saved = bracket.clone().with_id(state.next_id);
    state.brackets.push(saved.clone());
    Ok(saved)
}

fn sorted(mut brackets: Vec<TaxBracket>) -> Vec<TaxBracket> {
    brackets.sort_by(|a, b| {
        a.lower_cents
            .cmp(&b.lower_cents)
            .then_with(|| a.currency_code.cmp(&b.currency_code))
    });
    brackets
}

#[async_trait]
impl TaxRepository for InMemoryRepository {
    async fn get_currency(&self, code: &str) -> Result<Currency, RepositoryError> {
        self.read()?
            .currencies
            .get(code)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_currencies(&self) -> Result<Vec<Currency>, RepositoryError> {
        Ok(self.read()?.currencies.values().cloned().collect())
    }

    async fn save_currency(&self, currency: &Currency) -> Result<(), RepositoryError> {
        currency.validate()?;
        self.write()?
            .currencies
            .insert(currency.code.clone(), currency.clone());
        Ok(())
    }

    async fn delete_currency(&self, code: &str) -> Result<(), RepositoryError> {
        let mut state = self.write()?;
        if state.brackets.iter().any(|b| b.currency_code == code) {
            return Err(RepositoryError::Constraint(format!(
                "currency '{code}' is referenced by tax brackets"
            )));
        }
        state
            .currencies
            .remove(code)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_tax_brackets(
        &self,
        currency_code: &str,
    ) -> Result<Vec<TaxBracket>, RepositoryError> {
        let brackets = self
            .read()?
            .brackets
            .iter()
            .filter(|b| b.currency_code == currency_code)
            .cloned()
            .collect();
        Ok(sorted(brackets))
    }

    async fn list_tax_brackets(&self) -> Result<Vec<TaxBracket>, RepositoryError> {
        Ok(sorted(self.read()?.brackets.clone()))
    }

    async fn insert_tax_bracket(
        &self,
        bracket: &NewTaxBracket,
    ) -> Result<TaxBracket, RepositoryError> {
        insert_bracket(&mut *self.write()?, bracket)
    }

    async fn delete_tax_brackets(&self, currency_code: &str) -> Result<u64, RepositoryError> {
        let mut state = self.write()?;
        let before = state.brackets.len();
        state.brackets.retain(|b| b.currency_code != currency_code);
        Ok((before - state.brackets.len()) as u64)
    }
}

/// Factory for the `memory` backend. The store starts with the built-in
/// defaults; `connection_string` is ignored.
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, _config: &DbConfig) -> Result<Box<dyn TaxRepository>, RepositoryError> {
        Ok(Box::new(InMemoryRepository::with_defaults()?))
    }
}
