//! Unit tests for the movement executor using a mocked catalogue

use mockall::predicate::*;
use std::sync::Arc;

use inventory_bot_core::domains::item::Item;
use inventory_bot_core::domains::movement::{MovementStatus, MovementType, StockMovement};
use inventory_bot_core::domains::user::UserRole;
use inventory_bot_core::services::stock::StockService;
use shared_error::AppError;

use super::mocks::{staff_requester, MockCatalogue};
use super::stock::StockServiceImpl;

fn service(catalogue: MockCatalogue) -> StockServiceImpl {
    StockServiceImpl::new(Arc::new(catalogue), 100.0)
}

fn movement(name: &str, movement_type: MovementType, quantity: f64, unit: &str) -> StockMovement {
    StockMovement::new(name, movement_type, quantity, unit, &staff_requester())
}

fn item(name: &str, on_hand: f64, unit_size: f64, unit_type: &str) -> Item {
    let mut item = Item::new(name);
    item.on_hand = on_hand;
    item.unit_size = unit_size;
    item.unit_type = unit_type.to_string();
    item.category = Some("Cement".to_string());
    item
}

#[tokio::test]
async fn stock_in_auto_creates_missing_item_with_extracted_units() {
    let mut catalogue = MockCatalogue::new();
    catalogue
        .expect_get_item()
        .with(eq("cement 50kg"))
        .returning(|_| Ok(None));
    catalogue
        .expect_create_item()
        .withf(|item: &Item| {
            item.name == "cement 50kg"
                && item.unit_size == 50.0
                && item.unit_type == "kg"
                && item.category.as_deref() == Some("Cement")
        })
        .returning(|_| Ok("recItem".to_string()));
    catalogue
        .expect_create_movement()
        .withf(|movement: &StockMovement| {
            movement.status == MovementStatus::Posted
                && movement.signed_base_quantity == 10.0
                && movement.unit_size == Some(50.0)
        })
        .returning(|_| Ok("recMove".to_string()));
    catalogue
        .expect_update_item_stock()
        .with(eq("cement 50kg"), eq(10.0))
        .returning(|_, _| Ok(()));

    let result = service(catalogue)
        .stock_in(&movement("cement 50kg", MovementType::In, 10.0, "bag"))
        .await
        .unwrap();

    assert_eq!(result.before_level, 0.0);
    assert_eq!(result.after_level, 10.0);
    assert_eq!(result.movement_id.as_deref(), Some("recMove"));
}

#[tokio::test]
async fn stock_in_adds_to_existing_level() {
    let mut catalogue = MockCatalogue::new();
    catalogue
        .expect_get_item()
        .returning(|_| Ok(Some(item("Cement 50kg", 25.0, 50.0, "kg"))));
    catalogue
        .expect_create_movement()
        .returning(|_| Ok("recMove".to_string()));
    catalogue
        .expect_update_item_stock()
        .with(eq("Cement 50kg"), eq(10.0))
        .returning(|_, _| Ok(()));

    let result = service(catalogue)
        .stock_in(&movement("Cement 50kg", MovementType::In, 10.0, "bag"))
        .await
        .unwrap();

    assert_eq!(result.before_level, 25.0);
    assert_eq!(result.after_level, 35.0);
}

#[tokio::test]
async fn stock_out_rejects_insufficient_stock_for_staff() {
    let mut catalogue = MockCatalogue::new();
    catalogue
        .expect_get_item()
        .returning(|_| Ok(Some(item("Steel 12mm", 5.0, 1.0, "piece"))));
    // no create_movement / update_item_stock expectations: the executor
    // must not write anything

    let result = service(catalogue)
        .stock_out(
            &movement("Steel 12mm", MovementType::Out, 20.0, "piece"),
            UserRole::Staff,
        )
        .await;

    match result {
        Err(AppError::ValidationError(message)) => {
            assert!(message.contains("Insufficient stock"), "{}", message);
        },
        other => panic!("expected insufficient-stock error, got {:?}", other.map(|o| o.message)),
    }
}

#[tokio::test]
async fn stock_out_admin_can_go_negative() {
    let mut catalogue = MockCatalogue::new();
    catalogue
        .expect_get_item()
        .returning(|_| Ok(Some(item("Steel 12mm", 5.0, 1.0, "piece"))));
    catalogue
        .expect_create_movement()
        .withf(|movement: &StockMovement| movement.signed_base_quantity == -20.0)
        .returning(|_| Ok("recMove".to_string()));
    catalogue
        .expect_update_item_stock()
        .with(eq("Steel 12mm"), eq(-20.0))
        .returning(|_, _| Ok(()));

    let result = service(catalogue)
        .stock_out(
            &movement("Steel 12mm", MovementType::Out, 20.0, "piece"),
            UserRole::Admin,
        )
        .await
        .unwrap();

    assert_eq!(result.before_level, 5.0);
    assert_eq!(result.after_level, -15.0);
}

#[tokio::test]
async fn stock_out_requires_existing_item() {
    let mut catalogue = MockCatalogue::new();
    catalogue.expect_get_item().returning(|_| Ok(None));

    let result = service(catalogue)
        .stock_out(
            &movement("Ghost item", MovementType::Out, 1.0, "piece"),
            UserRole::Staff,
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn stock_adjust_applies_signed_quantity() {
    let mut catalogue = MockCatalogue::new();
    catalogue
        .expect_get_item()
        .returning(|_| Ok(Some(item("Cement 50kg", 25.0, 50.0, "kg"))));
    catalogue
        .expect_create_movement()
        .withf(|movement: &StockMovement| movement.signed_base_quantity == -3.0)
        .returning(|_| Ok("recMove".to_string()));
    catalogue
        .expect_update_item_stock()
        .with(eq("Cement 50kg"), eq(-3.0))
        .returning(|_, _| Ok(()));

    let result = service(catalogue)
        .stock_adjust(&movement("Cement 50kg", MovementType::Adjust, -3.0, "bag"))
        .await
        .unwrap();

    assert_eq!(result.before_level, 25.0);
    assert_eq!(result.after_level, 22.0);
}

#[tokio::test]
async fn low_stock_warning_fires_below_reorder_threshold() {
    let mut catalogue = MockCatalogue::new();
    let mut stocked = item("Nails", 10.0, 1.0, "piece");
    stocked.reorder_threshold = Some(8.0);
    catalogue.expect_get_item().returning(move |_| Ok(Some(stocked.clone())));
    catalogue
        .expect_create_movement()
        .returning(|_| Ok("recMove".to_string()));
    catalogue
        .expect_update_item_stock()
        .returning(|_, _| Ok(()));

    let result = service(catalogue)
        .stock_out(&movement("Nails", MovementType::Out, 5.0, "piece"), UserRole::Staff)
        .await
        .unwrap();

    let warning = result.low_stock_warning.expect("low stock warning");
    assert!(warning.contains("below its reorder threshold"), "{}", warning);
}
