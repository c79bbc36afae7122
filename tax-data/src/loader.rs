use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{Currency, NewTaxBracket, RepositoryError, TaxRepository, ValidationError};
use thiserror::Error;

/// Errors that can occur when loading currency and tax bracket data.
#[derive(Debug, Error, PartialEq)]
pub enum TaxBracketLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Currency '{0}' not found in database (have you loaded currencies or run the seeds?)")]
    CurrencyNotFound(String),

    #[error("Invalid {currency} bracket at lower_cents {lower_cents}: {source}")]
    InvalidBracket {
        currency: String,
        lower_cents: i64,
        source: ValidationError,
    },

    #[error(
        "Overlapping {currency} brackets: bracket starting at {lower_cents} runs to {}, \
         next starts at {next_lower_cents}",
        .upper_cents.map_or_else(|| "unbounded".to_string(), |u| u.to_string())
    )]
    OverlappingBrackets {
        currency: String,
        lower_cents: i64,
        upper_cents: Option<i64>,
        next_lower_cents: i64,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for TaxBracketLoaderError {
    fn from(err: csv::Error) -> Self {
        TaxBracketLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the currencies CSV file.
///
/// Columns: `code,name,symbol,divisor`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CurrencyRecord {
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub divisor: i64,
}

impl From<&CurrencyRecord> for Currency {
    fn from(record: &CurrencyRecord) -> Self {
        Currency {
            code: Currency::normalize_code(&record.code),
            name: record.name.trim().to_string(),
            symbol: record.symbol.trim().to_string(),
            divisor: record.divisor,
        }
    }
}

/// A single record from the tax brackets CSV file.
///
/// - `currency`: owning currency code (e.g. `NZD`)
/// - `lower_cents`: inclusive lower bound in minor units
/// - `upper_cents`: upper bound in minor units (empty for "and over")
/// - `rate`: the marginal tax rate as a decimal (e.g., 0.105 for 10.5%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaxBracketRecord {
    pub currency: String,
    pub lower_cents: i64,
    #[serde(deserialize_with = "deserialize_optional_cents")]
    pub upper_cents: Option<i64>,
    pub rate: Decimal,
}

fn deserialize_optional_cents<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn parse_records<R: Read, T: for<'de> Deserialize<'de>>(
    reader: R,
) -> Result<Vec<T>, TaxBracketLoaderError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        let record: T = result?;
        records.push(record);
    }

    Ok(records)
}

/// Loader for currency data from CSV files.
pub struct CurrencyLoader;

impl CurrencyLoader {
    /// Parse currency records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CurrencyRecord>, TaxBracketLoaderError> {
        parse_records(reader)
    }

    /// Insert or update every currency. Returns the number of records saved.
    pub async fn load<R: TaxRepository + ?Sized>(
        repo: &R,
        records: &[CurrencyRecord],
    ) -> Result<usize, TaxBracketLoaderError> {
        for record in records {
            let currency = Currency::from(record);
            repo.save_currency(&currency).await?;
            tracing::debug!(code = %currency.code, "saved currency");
        }
        Ok(records.len())
    }
}

/// Loader for tax bracket data from CSV files.
///
/// This loader reads CSV data and inserts it into the database via the
/// `TaxRepository` trait, allowing it to work with any database backend.
pub struct TaxBracketLoader;

impl TaxBracketLoader {
    /// Parse tax bracket records from a CSV reader.
    ///
    /// Returns a vector of parsed records. The reader can be any type that
    /// implements `Read`, such as a file or a string slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBracketRecord>, TaxBracketLoaderError> {
        parse_records(reader)
    }

    /// Load tax bracket records into the database.
    ///
    /// For each currency in the records, this method will:
    /// 1. Validate each bracket and reject overlapping ranges
    /// 2. Check that the currency exists
    /// 3. Delete any existing brackets for that currency
    /// 4. Insert all new brackets for that currency
    ///
    /// Every currency is validated before anything is written, so a bad file
    /// leaves the database untouched. Loading the same file twice produces
    /// the same result.
    pub async fn load<R: TaxRepository + ?Sized>(
        repo: &R,
        records: &[TaxBracketRecord],
    ) -> Result<usize, TaxBracketLoaderError> {
        let mut groups: BTreeMap<String, Vec<NewTaxBracket>> = BTreeMap::new();

        for record in records {
            let currency = Currency::normalize_code(&record.currency);
            groups
                .entry(currency.clone())
                .or_default()
                .push(NewTaxBracket {
                    currency_code: currency,
                    lower_cents: record.lower_cents,
                    upper_cents: record.upper_cents,
                    rate: record.rate,
                });
        }

        let mut currencies = BTreeMap::new();
        for (currency, brackets) in groups.iter_mut() {
            brackets.sort_by_key(|b| b.lower_cents);
            check_schedule(currency, brackets)?;

            let found = repo.get_currency(currency).await.map_err(|e| match e {
                RepositoryError::NotFound => {
                    TaxBracketLoaderError::CurrencyNotFound(currency.clone())
                }
                other => TaxBracketLoaderError::Repository(other),
            })?;
            currencies.insert(currency.clone(), found);
        }

        let mut inserted = 0;
        for (currency, brackets) in &groups {
            let removed = repo.delete_tax_brackets(currency).await?;

            for bracket in brackets {
                let saved = repo.insert_tax_bracket(bracket).await?;
                if let Some(found) = currencies.get(currency) {
                    tracing::debug!(
                        id = saved.id,
                        bracket = %saved.label(found, ","),
                        rate = %saved.rate,
                        "inserted tax bracket"
                    );
                }
                inserted += 1;
            }

            tracing::info!(
                currency = %currency,
                removed,
                loaded = brackets.len(),
                "replaced tax brackets"
            );
        }

        Ok(inserted)
    }
}

/// Validates a currency's brackets, sorted by `lower_cents`.
///
/// Adjacent brackets may share a bound or sit one minor unit apart; a wider
/// gap is logged but accepted.
fn check_schedule(
    currency: &str,
    brackets: &[NewTaxBracket],
) -> Result<(), TaxBracketLoaderError> {
    for bracket in brackets {
        bracket
            .validate()
            .map_err(|source| TaxBracketLoaderError::InvalidBracket {
                currency: currency.to_string(),
                lower_cents: bracket.lower_cents,
                source,
            })?;
    }

    for pair in brackets.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        match current.upper_cents {
            Some(upper) if upper <= next.lower_cents => {
                if next.lower_cents - upper > 1 {
                    tracing::warn!(
                        currency,
                        from = upper,
                        to = next.lower_cents,
                        "gap between tax brackets"
                    );
                }
            }
            upper_cents => {
                return Err(TaxBracketLoaderError::OverlappingBrackets {
                    currency: currency.to_string(),
                    lower_cents: current.lower_cents,
                    upper_cents,
                    next_lower_cents: next.lower_cents,
                });
            }
        }
    }

    Ok(())
}
