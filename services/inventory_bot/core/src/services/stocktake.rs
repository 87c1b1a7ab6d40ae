//! Stocktake service trait

use async_trait::async_trait;

use crate::domains::user::Requester;
use crate::dto::stocktake::{StocktakeOptions, StocktakeOutcome};
use shared_error::AppError;

/// Runs cumulative stocktakes: each counted quantity is added to the
/// existing on-hand level, and every applied entry leaves an audit record.
#[async_trait]
pub trait StocktakeService: Send + Sync {
    /// Parse and apply (or validate) a stocktake command. When potential
    /// duplicates are found and confirmation is required, the dialogue is
    /// parked for the chat and no writes happen.
    async fn process(
        &self,
        command_text: &str,
        requester: &Requester,
        options: StocktakeOptions,
    ) -> Result<StocktakeOutcome, AppError>;
}
