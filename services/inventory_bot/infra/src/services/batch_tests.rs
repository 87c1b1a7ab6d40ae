//! Unit tests for the batch processor using mocked seams

use mockall::predicate::*;
use std::sync::Arc;

use inventory_bot_core::domains::batch::GlobalParams;
use inventory_bot_core::domains::item::Item;
use inventory_bot_core::domains::movement::{MovementType, StockMovement};
use inventory_bot_core::domains::user::UserRole;
use inventory_bot_core::errors::ErrorSeverity;
use inventory_bot_core::services::batch::BatchStockService;
use shared_error::AppError;

use super::batch::BatchStockServiceImpl;
use super::mocks::{outcome, staff_requester, MockCatalogue, MockStock};
use crate::state::InteractionStore;

fn movement(name: &str, movement_type: MovementType, quantity: f64) -> StockMovement {
    StockMovement::new(name, movement_type, quantity, "bag", &staff_requester())
}

fn service(
    catalogue: MockCatalogue,
    stock: MockStock,
) -> (BatchStockServiceImpl, Arc<InteractionStore>) {
    let state = Arc::new(InteractionStore::new());
    let service = BatchStockServiceImpl::new(Arc::new(catalogue), Arc::new(stock), state.clone());
    (service, state)
}

#[tokio::test]
async fn all_entries_successful() {
    let catalogue = MockCatalogue::new();
    let mut stock = MockStock::new();
    stock
        .expect_stock_in()
        .times(2)
        .returning(|movement| Ok(outcome("m", 0.0, movement.quantity)));

    let (service, _) = service(catalogue, stock);
    let movements = vec![
        movement("cement", MovementType::In, 5.0),
        movement("sand", MovementType::In, 2.0),
    ];

    let result = service.process_batch_movements(&movements, UserRole::Staff).await;

    assert_eq!(result.total_entries, 2);
    assert_eq!(result.successful_entries, 2);
    assert_eq!(result.failed_entries, 0);
    assert_eq!(result.success_rate, 100.0);
    assert!(!result.rollback_performed);
    assert!(result.summary_message.contains("All 2 entries processed successfully"));
}

#[tokio::test]
async fn totals_always_reconcile() {
    let catalogue = MockCatalogue::new();
    let mut stock = MockStock::new();
    let mut call = 0;
    stock.expect_stock_in().times(3).returning(move |movement| {
        call += 1;
        if call == 2 {
            Err(AppError::ValidationError("missing project".to_string()))
        } else {
            Ok(outcome("m", 0.0, movement.quantity))
        }
    });

    let (service, _) = service(catalogue, stock);
    let movements = vec![
        movement("a", MovementType::In, 1.0),
        movement("b", MovementType::In, 1.0),
        movement("c", MovementType::In, 1.0),
    ];

    let result = service.process_batch_movements(&movements, UserRole::Staff).await;

    assert_eq!(result.total_entries, result.successful_entries + result.failed_entries);
    assert_eq!(result.successful_entries, 2);
    assert!((result.success_rate - 200.0 / 3.0).abs() < 1e-9);
    assert!(!result.rollback_performed);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].severity, ErrorSeverity::Error);
    assert_eq!(result.errors[0].entry_index, Some(1));
}

#[tokio::test]
async fn critical_failure_rolls_back_applied_movements() {
    let mut catalogue = MockCatalogue::new();
    // Compensating delta for the applied inflow, plus the void of its record
    catalogue
        .expect_update_item_stock()
        .with(eq("cement"), eq(-10.0))
        .times(1)
        .returning(|_, _| Ok(()));
    catalogue
        .expect_update_movement_status()
        .returning(|_, _, _| Ok(()));

    let mut stock = MockStock::new();
    let mut call = 0;
    stock.expect_stock_in().times(2).returning(move |_| {
        call += 1;
        if call == 1 {
            Ok(outcome("m1", 0.0, 10.0))
        } else {
            Err(AppError::Database("connection reset".to_string()))
        }
    });

    let (service, _) = service(catalogue, stock);
    let movements = vec![
        movement("cement", MovementType::In, 10.0),
        movement("sand", MovementType::In, 2.0),
    ];

    let result = service.process_batch_movements(&movements, UserRole::Staff).await;

    assert!(result.rollback_performed);
    assert_eq!(result.successful_entries, 0);
    assert_eq!(result.failed_entries, 2);
    assert_eq!(result.total_entries, 2);
    assert!(result.summary_message.contains("rolled back"));
}

#[tokio::test]
async fn rollback_failure_is_escalated() {
    let mut catalogue = MockCatalogue::new();
    catalogue
        .expect_update_item_stock()
        .returning(|_, _| Err(AppError::Database("still down".to_string())));

    let mut stock = MockStock::new();
    let mut call = 0;
    stock.expect_stock_in().times(2).returning(move |_| {
        call += 1;
        if call == 1 {
            Ok(outcome("m1", 0.0, 10.0))
        } else {
            Err(AppError::Database("connection reset".to_string()))
        }
    });

    let (service, _) = service(catalogue, stock);
    let movements = vec![
        movement("cement", MovementType::In, 10.0),
        movement("sand", MovementType::In, 2.0),
    ];

    let result = service.process_batch_movements(&movements, UserRole::Staff).await;

    assert!(!result.rollback_performed);
    // The applied movement stays posted and an escalation error is added
    assert_eq!(result.successful_entries, 1);
    assert!(result
        .errors
        .iter()
        .any(|e| e.severity == ErrorSeverity::Critical
            && e.message.contains("Failed to rollback")));
}

#[tokio::test]
async fn out_movements_use_the_given_role() {
    let catalogue = MockCatalogue::new();
    let mut stock = MockStock::new();
    stock
        .expect_stock_out()
        .withf(|_, role| *role == UserRole::Staff)
        .returning(|movement, _| Ok(outcome("m", 20.0, 20.0 - movement.quantity)));

    let (service, _) = service(catalogue, stock);
    let movements = vec![movement("cement", MovementType::Out, 5.0)];

    let result = service.process_batch_movements(&movements, UserRole::Staff).await;
    assert_eq!(result.successful_entries, 1);
}

#[tokio::test]
async fn prepare_snapshots_before_levels_and_stages_the_batch() {
    let mut catalogue = MockCatalogue::new();
    catalogue.expect_get_item().with(eq("Cement 50kg")).returning(|_| {
        let mut item = Item::new("Cement 50kg");
        item.on_hand = 25.0;
        item.unit_size = 50.0;
        item.unit_type = "kg".to_string();
        Ok(Some(item))
    });
    catalogue
        .expect_get_item()
        .with(eq("Brand new thing"))
        .returning(|_| Ok(None));

    let (service, state) = service(catalogue, MockStock::new());
    let movements = vec![
        movement("Cement 50kg", MovementType::In, 10.0),
        movement("Brand new thing", MovementType::In, 1.0),
    ];
    let globals = GlobalParams {
        project: Some("Bridge".to_string()),
        ..Default::default()
    };

    let approval = service
        .prepare_batch_approval(movements, &staff_requester(), globals)
        .await
        .unwrap();

    assert_eq!(approval.before_levels.get("Cement 50kg"), Some(&25.0));
    assert_eq!(approval.before_levels.get("Brand new thing"), Some(&0.0));
    assert_eq!(approval.movements[0].unit_size, Some(50.0));
    assert_eq!(approval.movements[0].project.as_deref(), Some("Bridge"));
    assert_eq!(approval.movements[0].batch_id.as_deref(), Some(approval.batch_id.as_str()));
    assert_eq!(approval.submitter_role, UserRole::Staff);

    // Staged under its batch id in the pending set
    assert!(state.get_approval(&approval.batch_id).await.is_some());
    assert_eq!(service.pending_summary().await.total_pending_batches, 1);

    assert!(service.remove_batch_approval(&approval.batch_id).await);
    assert!(state.get_approval(&approval.batch_id).await.is_none());
}
