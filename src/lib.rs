//! Tally: an income/expense ledger with durable storage and summary statistics.
//!
//! Records live in a [`store::Store`] (SQLite or a JSON file), category names
//! in a [`store::CategoryRegistry`], and [`aggregate`] computes totals over a
//! snapshot returned by [`store::Store::get_all`].

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod file;
pub mod models;
pub mod store;

pub use error::{LedgerError, Result};
