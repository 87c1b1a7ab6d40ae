//! Cloud spreadsheet catalogue client

pub mod client;
pub mod error;
pub mod records;

pub use client::AirtableCatalogue;
pub use error::CatalogueError;
