//! Wire record layouts for the spreadsheet tables
//!
//! One row per StockMovement in the "Stock Movements" table, one row per
//! Item in "Items", one audit row per count in "Stocktakes", and the role
//! table in "Telegram Users".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use inventory_bot_core::domains::item::Item;
use inventory_bot_core::domains::movement::StockMovement;
use inventory_bot_core::domains::stocktake::StocktakeRecord;

use super::error::CatalogueError;

pub const ITEMS_TABLE: &str = "Items";
pub const MOVEMENTS_TABLE: &str = "Stock Movements";
pub const STOCKTAKES_TABLE: &str = "Stocktakes";
pub const USERS_TABLE: &str = "Telegram Users";

/// Generic record envelope: `{"id": "...", "fields": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub fields: T,
}

/// List response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct RecordList<T> {
    pub records: Vec<Record<T>>,
    #[serde(default)]
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemFields {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "On Hand", skip_serializing_if = "Option::is_none")]
    pub on_hand: Option<f64>,
    #[serde(rename = "Unit Size", skip_serializing_if = "Option::is_none")]
    pub unit_size: Option<f64>,
    #[serde(rename = "Unit Type", skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<String>,
    #[serde(rename = "Category", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "Location", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "Project", skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(rename = "Reorder Threshold", skip_serializing_if = "Option::is_none")]
    pub reorder_threshold: Option<f64>,
    #[serde(rename = "Large Qty Threshold", skip_serializing_if = "Option::is_none")]
    pub large_qty_threshold: Option<f64>,
    #[serde(rename = "Is Active", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(rename = "Last Stocktake Date", skip_serializing_if = "Option::is_none")]
    pub last_stocktake_date: Option<NaiveDate>,
    #[serde(rename = "Last Stocktake By", skip_serializing_if = "Option::is_none")]
    pub last_stocktake_by: Option<String>,
}

impl ItemFields {
    pub fn into_item(self) -> Result<Item, CatalogueError> {
        let name = self
            .name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CatalogueError::MalformedRecord("item row without a Name".into()))?;
        Ok(Item {
            name,
            on_hand: self.on_hand.unwrap_or(0.0),
            unit_size: self.unit_size.unwrap_or(1.0),
            unit_type: self.unit_type.unwrap_or_else(|| "piece".to_string()),
            category: self.category,
            location: self.location,
            project: self.project,
            reorder_threshold: self.reorder_threshold,
            large_qty_threshold: self.large_qty_threshold,
            is_active: self.is_active.unwrap_or(true),
            last_stocktake_date: self.last_stocktake_date,
            last_stocktake_by: self.last_stocktake_by,
        })
    }

    pub fn from_item(item: &Item) -> Self {
        Self {
            name: Some(item.name.clone()),
            on_hand: Some(item.on_hand),
            unit_size: Some(item.unit_size),
            unit_type: Some(item.unit_type.clone()),
            category: item.category.clone(),
            location: item.location.clone(),
            project: item.project.clone(),
            reorder_threshold: item.reorder_threshold,
            large_qty_threshold: item.large_qty_threshold,
            is_active: Some(item.is_active),
            last_stocktake_date: item.last_stocktake_date,
            last_stocktake_by: item.last_stocktake_by.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementFields {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub movement_type: Option<String>,
    #[serde(rename = "Quantity", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(rename = "Unit", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "Signed Base Quantity", skip_serializing_if = "Option::is_none")]
    pub signed_base_quantity: Option<f64>,
    #[serde(rename = "Status", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "Requested By", skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
    #[serde(rename = "Approved By", skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(rename = "Telegram Users", skip_serializing_if = "Option::is_none")]
    pub telegram_user: Option<String>,
    #[serde(rename = "Source", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "Created At", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "Reason", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "Category", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "Driver Name", skip_serializing_if = "Option::is_none")]
    pub driver_name: Option<String>,
    #[serde(rename = "From Location", skip_serializing_if = "Option::is_none")]
    pub from_location: Option<String>,
    #[serde(rename = "To Location", skip_serializing_if = "Option::is_none")]
    pub to_location: Option<String>,
    #[serde(rename = "Project", skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(rename = "Note", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(rename = "Batch Id", skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

impl MovementFields {
    pub fn from_movement(movement: &StockMovement) -> Self {
        Self {
            name: Some(movement.item_name.clone()),
            movement_type: Some(movement.movement_type.to_string()),
            quantity: Some(movement.quantity),
            unit: Some(movement.unit.clone()),
            signed_base_quantity: Some(movement.signed_base_quantity),
            status: Some(movement.status.to_string()),
            requested_by: Some(movement.user_name.clone()),
            approved_by: None,
            telegram_user: Some(movement.user_id.clone()),
            source: Some(movement.source.clone()),
            created_at: Some(movement.timestamp.date_naive().to_string()),
            reason: Some(movement.reason.to_string()),
            category: movement.category.clone(),
            driver_name: movement.driver_name.clone(),
            from_location: movement.from_location.clone(),
            to_location: movement.to_location.clone(),
            project: movement.project.clone(),
            note: movement.note.clone(),
            batch_id: movement.batch_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StocktakeFields {
    #[serde(rename = "Batch Id", skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(rename = "Date", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "Item Name", skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(rename = "Counted Qty", skip_serializing_if = "Option::is_none")]
    pub counted_qty: Option<f64>,
    #[serde(rename = "Previous On Hand", skip_serializing_if = "Option::is_none")]
    pub previous_on_hand: Option<f64>,
    #[serde(rename = "New On Hand", skip_serializing_if = "Option::is_none")]
    pub new_on_hand: Option<f64>,
    #[serde(rename = "Discrepancy", skip_serializing_if = "Option::is_none")]
    pub discrepancy: Option<f64>,
    #[serde(rename = "Applied At", skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<String>,
    #[serde(rename = "Applied By", skip_serializing_if = "Option::is_none")]
    pub applied_by: Option<String>,
}

impl StocktakeFields {
    pub fn from_record(record: &StocktakeRecord) -> Self {
        Self {
            batch_id: Some(record.batch_id.clone()),
            date: Some(record.date),
            item_name: Some(record.item_name.clone()),
            counted_qty: Some(record.counted_qty),
            previous_on_hand: Some(record.previous_on_hand),
            new_on_hand: Some(record.new_on_hand),
            discrepancy: record.discrepancy,
            applied_at: Some(record.applied_at.to_rfc3339()),
            applied_by: Some(record.applied_by.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFields {
    #[serde(rename = "User Id", default)]
    pub user_id: Option<i64>,
    #[serde(rename = "Role", default)]
    pub role: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_round_trip_keeps_defaults() {
        let fields = ItemFields {
            name: Some("Cement 50kg".to_string()),
            ..Default::default()
        };
        let item = fields.into_item().unwrap();
        assert_eq!(item.on_hand, 0.0);
        assert_eq!(item.unit_size, 1.0);
        assert_eq!(item.unit_type, "piece");
        assert!(item.is_active);
    }

    #[test]
    fn item_without_name_is_malformed() {
        assert!(ItemFields::default().into_item().is_err());
    }

    #[test]
    fn movement_fields_use_persisted_vocabulary() {
        use inventory_bot_core::domains::movement::{MovementType, StockMovement};
        use inventory_bot_core::domains::user::{Requester, UserRole};

        let requester = Requester {
            user_id: 5,
            user_name: "Dani".to_string(),
            chat_id: 1,
            role: UserRole::Staff,
        };
        let movement = StockMovement::new("cement", MovementType::Out, 4.0, "bag", &requester);
        let fields = MovementFields::from_movement(&movement);

        assert_eq!(fields.movement_type.as_deref(), Some("Out"));
        assert_eq!(fields.status.as_deref(), Some("Requested"));
        assert_eq!(fields.reason.as_deref(), Some("Issue"));
        assert_eq!(fields.source.as_deref(), Some("Telegram"));
        assert_eq!(fields.signed_base_quantity, Some(-4.0));
    }
}
