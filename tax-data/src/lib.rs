//! CSV loaders for currency and tax bracket configuration.

mod loader;

pub use loader::{
    CurrencyLoader, CurrencyRecord, TaxBracketLoader, TaxBracketLoaderError, TaxBracketRecord,
};
