mod currency;
pub mod defaults;
mod error;
mod tax_bracket;

pub use currency::Currency;
pub use error::ValidationError;
pub use tax_bracket::{NewTaxBracket, TaxBracket};
