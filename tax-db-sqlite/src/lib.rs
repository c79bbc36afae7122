//! SQLite storage backend for currencies and tax brackets.
//!
//! Register [`SqliteRepositoryFactory`] with a
//! [`tax_core::db::RepositoryRegistry`] to make the `sqlite` backend
//! available, or construct a [`SqliteRepository`] directly.

pub mod decimal;
mod factory;
mod repository;

pub use factory::{SqliteRepositoryFactory, seeds_dir};
pub use repository::SqliteRepository;
