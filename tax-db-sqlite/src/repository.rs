use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tax_core::{Currency, NewTaxBracket, RepositoryError, TaxBracket, TaxRepository};

use crate::decimal::{decimal_to_text, get_decimal};

const MEMORY: &str = ":memory:";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open a database.
    ///
    /// `connection` is a bare file path (created if missing), a
    /// `sqlite:` URL, or `:memory:` for a private in-memory database.
    pub async fn new(connection: &str) -> Result<Self> {
        let (options, max_connections) = if connection == MEMORY {
            // Every connection to :memory: is a separate database.
            (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
        } else if connection.starts_with("sqlite:") {
            let options = SqliteConnectOptions::from_str(connection)
                .with_context(|| format!("Invalid database URL: {}", connection))?;
            (options.create_if_missing(true), 5)
        } else {
            let options = SqliteConnectOptions::new()
                .filename(connection)
                .create_if_missing(true);
            (options, 5)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options.foreign_keys(true))
            .await
            .with_context(|| format!("Failed to connect to database: {}", connection))?;
        tracing::debug!(connection, "opened sqlite database");
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            tracing::info!(file = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Unique, foreign-key and check violations are reported as constraint
/// errors; everything else is a database error.
fn map_db_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation()
            || db_err.is_foreign_key_violation()
            || db_err.is_check_violation()
        {
            return RepositoryError::Constraint(db_err.message().to_string());
        }
    }
    RepositoryError::Database(e.to_string())
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {}: {}", name, e)))
}

fn row_to_currency(row: &SqliteRow) -> Result<Currency, RepositoryError> {
    Ok(Currency {
        code: column(row, "code")?,
        name: column(row, "name")?,
        symbol: column(row, "symbol")?,
        divisor: column(row, "divisor")?,
    })
}

fn row_to_tax_bracket(row: &SqliteRow) -> Result<TaxBracket, RepositoryError> {
    Ok(TaxBracket {
        id: column(row, "id")?,
        currency_code: column(row, "currency_code")?,
        lower_cents: column(row, "lower_cents")?,
        upper_cents: column(row, "upper_cents")?,
        rate: get_decimal(row, "rate")?,
    })
}

#[async_trait]
impl TaxRepository for SqliteRepository {
    async fn get_currency(&self, code: &str) -> Result<Currency, RepositoryError> {
        let row = sqlx::query("SELECT code, name, symbol, divisor FROM currencies WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_currency(&row)
    }

    async fn list_currencies(&self) -> Result<Vec<Currency>, RepositoryError> {
        let rows = sqlx::query("SELECT code, name, symbol, divisor FROM currencies ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.iter().map(row_to_currency).collect()
    }

    async fn save_currency(&self, currency: &Currency) -> Result<(), RepositoryError> {
        currency.validate()?;
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO currencies (code, name, symbol, divisor, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (code) DO UPDATE SET
                name = excluded.name,
                symbol = excluded.symbol,
                divisor = excluded.divisor,
                updated_at = excluded.updated_at",
        )
        .bind(&currency.code)
        .bind(&currency.name)
        .bind(&currency.symbol)
        .bind(currency.divisor)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn delete_currency(&self, code: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM currencies WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn get_tax_brackets(
        &self,
        currency_code: &str,
    ) -> Result<Vec<TaxBracket>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, currency_code, lower_cents, upper_cents, rate
             FROM tax_brackets
             WHERE currency_code = ?
             ORDER BY lower_cents",
        )
        .bind(currency_code)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.iter().map(row_to_tax_bracket).collect()
    }

    async fn list_tax_brackets(&self) -> Result<Vec<TaxBracket>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, currency_code, lower_cents, upper_cents, rate
             FROM tax_brackets
             ORDER BY lower_cents, currency_code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.iter().map(row_to_tax_bracket).collect()
    }

    async fn insert_tax_bracket(
        &self,
        bracket: &NewTaxBracket,
    ) -> Result<TaxBracket, RepositoryError> {
        bracket.validate()?;
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO tax_brackets
                (currency_code, lower_cents, upper_cents, rate, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&bracket.currency_code)
        .bind(bracket.lower_cents)
        .bind(bracket.upper_cents)
        .bind(decimal_to_text(bracket.rate))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(bracket.clone().with_id(result.last_insert_rowid()))
    }

    async fn delete_tax_brackets(&self, currency_code: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM tax_brackets WHERE currency_code = ?")
            .bind(currency_code)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
