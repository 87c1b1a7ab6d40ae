//! Service implementations

pub mod approvals;
pub mod batch;
pub mod cache;
pub mod duplicates;
pub mod idempotency;
pub mod stock;
pub mod stocktake;
pub mod transport;

#[cfg(test)]
mod batch_tests;
#[cfg(test)]
mod duplicates_tests;
#[cfg(test)]
mod mocks;
#[cfg(test)]
mod stock_tests;

pub use approvals::ApprovalServiceImpl;
pub use batch::BatchStockServiceImpl;
pub use cache::InMemoryItemCache;
pub use duplicates::DuplicateServiceImpl;
pub use idempotency::InMemoryIdempotencyService;
pub use stock::StockServiceImpl;
pub use stocktake::StocktakeServiceImpl;
pub use transport::TelegramTransport;
