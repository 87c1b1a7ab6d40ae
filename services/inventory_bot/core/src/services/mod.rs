//! Service and store trait definitions (no implementations)

pub mod approvals;
pub mod batch;
pub mod cache;
pub mod catalogue;
pub mod duplicates;
pub mod idempotency;
pub mod stock;
pub mod stocktake;
pub mod transport;

pub use approvals::ApprovalService;
pub use batch::BatchStockService;
pub use cache::ItemCacheService;
pub use catalogue::CatalogueStore;
pub use duplicates::DuplicateService;
pub use idempotency::IdempotencyService;
pub use stock::StockService;
pub use stocktake::StocktakeService;
pub use transport::ChatTransport;
