//! Inventory Bot Infrastructure
//!
//! Implementations of the core trait seams: the cloud-spreadsheet catalogue
//! client, the in-process interaction state (pending approvals, duplicate
//! dialogues, idempotency keys), the catalogue snapshot cache, the movement
//! executor, batch processor, approval controller, duplicate engine,
//! stocktake service, and the chat transport.

pub mod catalogue;
pub mod services;
pub mod state;

pub use catalogue::client::AirtableCatalogue;
pub use state::InteractionStore;
