//! Catalogue store implementation over the Airtable REST API

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;

use inventory_bot_core::domains::item::Item;
use inventory_bot_core::domains::movement::{MovementStatus, StockMovement};
use inventory_bot_core::domains::stocktake::StocktakeRecord;
use inventory_bot_core::domains::user::UserRole;
use inventory_bot_core::services::catalogue::CatalogueStore;
use inventory_bot_core::similarity;
use shared_error::AppError;

use super::error::{CatalogueError, Result};
use super::records::{
    ItemFields, MovementFields, Record, RecordList, StocktakeFields, UserFields, ITEMS_TABLE,
    MOVEMENTS_TABLE, STOCKTAKES_TABLE, USERS_TABLE,
};

/// How long to wait before the single retry of a transient failure
const RETRY_DELAY_MS: u64 = 500;

/// Minimum score for fuzzy catalogue search results
const SEARCH_THRESHOLD: f64 = 0.5;

/// Client for the spreadsheet-style catalogue store
pub struct AirtableCatalogue {
    http: Client,
    base_url: String,
    base_id: String,
    api_key: String,
}

impl AirtableCatalogue {
    pub fn new(
        base_url: impl Into<String>,
        base_id: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogueError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            base_id: base_id.into(),
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.base_id, table.replace(' ', "%20"))
    }

    /// One bounded retry on transient failures (timeouts, rate limits, 5xx)
    async fn with_retry<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let strategy = FixedInterval::from_millis(RETRY_DELAY_MS).take(1);
        RetryIf::spawn(strategy, operation, CatalogueError::is_transient).await
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(CatalogueError::ApiError {
            status: status.as_u16(),
            message,
        })
    }

    /// Fetch every record of a table, following pagination offsets
    async fn list_records<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<Record<T>>> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let url = self.table_url(table);
            let page: RecordList<T> = self
                .with_retry(|| {
                    let mut request = self.http.get(&url).bearer_auth(&self.api_key);
                    for (key, value) in params {
                        request = request.query(&[(*key, value.as_str())]);
                    }
                    if let Some(offset) = &offset {
                        request = request.query(&[("offset", offset.as_str())]);
                    }
                    async move {
                        let response = Self::check_status(request.send().await?).await?;
                        Ok(response.json().await?)
                    }
                })
                .await?;

            records.extend(page.records);
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    async fn create_record<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        fields: &T,
    ) -> Result<Record<T>> {
        let url = self.table_url(table);
        self.with_retry(|| {
            let body = serde_json::json!({ "fields": fields });
            let request = self.http.post(&url).bearer_auth(&self.api_key).json(&body);
            async move {
                let response = Self::check_status(request.send().await?).await?;
                Ok(response.json().await?)
            }
        })
        .await
    }

    async fn patch_record<T: Serialize>(
        &self,
        table: &str,
        record_id: &str,
        fields: &T,
    ) -> Result<()> {
        let url = format!("{}/{}", self.table_url(table), record_id);
        self.with_retry(|| {
            let body = serde_json::json!({ "fields": fields });
            let request = self.http.patch(&url).bearer_auth(&self.api_key).json(&body);
            async move {
                Self::check_status(request.send().await?).await?;
                Ok(())
            }
        })
        .await
    }

    /// Locate an item row by its case-insensitive name
    async fn find_item_record(&self, name: &str) -> Result<Option<Record<ItemFields>>> {
        let escaped = name.to_lowercase().replace('\'', "\\'");
        let formula = format!("LOWER({{Name}}) = '{}'", escaped);
        let params = [
            ("filterByFormula", formula),
            ("maxRecords", "1".to_string()),
        ];
        let mut records: Vec<Record<ItemFields>> = self.list_records(ITEMS_TABLE, &params).await?;
        Ok(if records.is_empty() {
            None
        } else {
            Some(records.swap_remove(0))
        })
    }

    async fn require_item_record(&self, name: &str) -> Result<Record<ItemFields>> {
        self.find_item_record(name)
            .await?
            .ok_or_else(|| CatalogueError::NotFound(format!("Item '{}' not found", name)))
    }
}

#[async_trait]
impl CatalogueStore for AirtableCatalogue {
    async fn get_item(&self, name: &str) -> std::result::Result<Option<Item>, AppError> {
        let record = self.find_item_record(name).await?;
        match record {
            Some(record) => Ok(Some(record.fields.into_item()?)),
            None => Ok(None),
        }
    }

    async fn get_all_items(&self) -> std::result::Result<Vec<Item>, AppError> {
        let records: Vec<Record<ItemFields>> = self.list_records(ITEMS_TABLE, &[]).await?;
        let mut items = Vec::with_capacity(records.len());
        for record in records {
            match record.fields.into_item() {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!("Skipping malformed item row: {}", e),
            }
        }
        Ok(items)
    }

    async fn create_item(&self, item: &Item) -> std::result::Result<String, AppError> {
        let fields = ItemFields::from_item(item);
        let record = self.create_record(ITEMS_TABLE, &fields).await?;
        record
            .id
            .ok_or_else(|| AppError::Database("item create returned no record id".to_string()))
    }

    async fn update_item_stock(&self, name: &str, delta: f64) -> std::result::Result<(), AppError> {
        let record = self.require_item_record(name).await?;
        let record_id = record
            .id
            .ok_or_else(|| AppError::Database("item row without record id".to_string()))?;
        let new_level = record.fields.on_hand.unwrap_or(0.0) + delta;
        let patch = ItemFields {
            on_hand: Some(new_level),
            ..Default::default()
        };
        self.patch_record(ITEMS_TABLE, &record_id, &patch).await?;
        Ok(())
    }

    async fn update_item_project(
        &self,
        name: &str,
        project: &str,
    ) -> std::result::Result<(), AppError> {
        let record = self.require_item_record(name).await?;
        let record_id = record
            .id
            .ok_or_else(|| AppError::Database("item row without record id".to_string()))?;
        let patch = ItemFields {
            project: Some(project.to_string()),
            ..Default::default()
        };
        self.patch_record(ITEMS_TABLE, &record_id, &patch).await?;
        Ok(())
    }

    async fn update_item_category(
        &self,
        name: &str,
        category: &str,
    ) -> std::result::Result<(), AppError> {
        let record = self.require_item_record(name).await?;
        let record_id = record
            .id
            .ok_or_else(|| AppError::Database("item row without record id".to_string()))?;
        let patch = ItemFields {
            category: Some(category.to_string()),
            ..Default::default()
        };
        self.patch_record(ITEMS_TABLE, &record_id, &patch).await?;
        Ok(())
    }

    async fn update_item_provenance(
        &self,
        name: &str,
        date: NaiveDate,
        logged_by: &str,
    ) -> std::result::Result<(), AppError> {
        let record = self.require_item_record(name).await?;
        let record_id = record
            .id
            .ok_or_else(|| AppError::Database("item row without record id".to_string()))?;
        let patch = ItemFields {
            last_stocktake_date: Some(date),
            last_stocktake_by: Some(logged_by.to_string()),
            ..Default::default()
        };
        self.patch_record(ITEMS_TABLE, &record_id, &patch).await?;
        Ok(())
    }

    async fn create_movement(
        &self,
        movement: &StockMovement,
    ) -> std::result::Result<String, AppError> {
        let fields = MovementFields::from_movement(movement);
        let record = self.create_record(MOVEMENTS_TABLE, &fields).await?;
        record
            .id
            .ok_or_else(|| AppError::Database("movement create returned no record id".to_string()))
    }

    async fn update_movement_status(
        &self,
        movement_id: &str,
        status: MovementStatus,
        actor: &str,
    ) -> std::result::Result<(), AppError> {
        let patch = MovementFields {
            status: Some(status.to_string()),
            approved_by: Some(actor.to_string()),
            ..Default::default()
        };
        self.patch_record(MOVEMENTS_TABLE, movement_id, &patch).await?;
        Ok(())
    }

    async fn create_stocktake(
        &self,
        record: &StocktakeRecord,
    ) -> std::result::Result<String, AppError> {
        let fields = StocktakeFields::from_record(record);
        let created = self.create_record(STOCKTAKES_TABLE, &fields).await?;
        created
            .id
            .ok_or_else(|| AppError::Database("stocktake create returned no record id".to_string()))
    }

    async fn get_user_role(&self, user_id: i64) -> std::result::Result<UserRole, AppError> {
        let formula = format!("{{User Id}} = {}", user_id);
        let params = [
            ("filterByFormula", formula),
            ("maxRecords", "1".to_string()),
        ];
        let records: Vec<Record<UserFields>> = self.list_records(USERS_TABLE, &params).await?;

        let role = records
            .first()
            .and_then(|record| record.fields.role.as_deref())
            .and_then(|role| role.parse().ok())
            .unwrap_or(UserRole::Viewer);
        Ok(role)
    }

    async fn search_items(&self, query: &str) -> std::result::Result<Vec<Item>, AppError> {
        let items = self.get_all_items().await?;
        let query_lower = query.to_lowercase();

        let mut scored: Vec<(f64, Item)> = items
            .into_iter()
            .filter_map(|item| {
                let name_lower = item.name.to_lowercase();
                let score = similarity::score(query, &item.name);
                if name_lower.contains(&query_lower) || score >= SEARCH_THRESHOLD {
                    Some((score.max(if name_lower.contains(&query_lower) { SEARCH_THRESHOLD } else { 0.0 }), item))
                } else {
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().map(|(_, item)| item).collect())
    }
}
