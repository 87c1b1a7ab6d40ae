//! Unit tests for the duplicate engine using mocked seams

use std::sync::Arc;

use inventory_bot_core::domains::duplicate::{DuplicateAction, DuplicatePolicy, MatchKind};
use inventory_bot_core::domains::item::Item;
use inventory_bot_core::domains::movement::{MovementType, StockMovement};
use inventory_bot_core::services::duplicates::DuplicateService;
use shared_error::AppError;

use super::duplicates::DuplicateServiceImpl;
use super::mocks::{outcome, staff_requester, MockCache, MockCatalogue, MockStock};
use crate::state::InteractionStore;

fn catalogue_items() -> Vec<Item> {
    let mut cement = Item::new("Cement 50kg");
    cement.on_hand = 25.0;
    cement.unit_size = 50.0;
    cement.unit_type = "kg".to_string();

    let mut steel = Item::new("Steel bar 12mm");
    steel.on_hand = 5.0;

    vec![cement, steel]
}

fn service_with(
    cache: MockCache,
    catalogue: MockCatalogue,
    stock: MockStock,
) -> (DuplicateServiceImpl, Arc<InteractionStore>) {
    let state = Arc::new(InteractionStore::new());
    let service = DuplicateServiceImpl::new(
        Arc::new(cache),
        Arc::new(catalogue),
        Arc::new(stock),
        state.clone(),
    );
    (service, state)
}

fn movement(name: &str, movement_type: MovementType, quantity: f64) -> StockMovement {
    StockMovement::new(name, movement_type, quantity, "bag", &staff_requester())
}

#[tokio::test]
async fn analysis_classifies_matches_and_finds_shortfalls() {
    let mut cache = MockCache::new();
    cache.expect_get_all_items().returning(|| Ok(catalogue_items()));
    cache.expect_invalidate().returning(|| ());

    let (service, _) = service_with(cache, MockCatalogue::new(), MockStock::new());

    let movements = vec![
        movement("Cement 50kg", MovementType::Out, 10.0),
        movement("Steel bars 12mm", MovementType::Out, 20.0),
        movement("Completely new thing", MovementType::Out, 1.0),
    ];

    let analysis = service.analyze_movements(&movements).await.unwrap();

    assert_eq!(analysis.total_items, 3);
    assert_eq!(analysis.duplicates.len(), 2);
    assert_eq!(analysis.non_duplicate_indexes, vec![2]);

    let exact = &analysis.duplicates[0];
    assert_eq!(exact.kind, MatchKind::Exact);
    assert_eq!(exact.existing.name, "Cement 50kg");

    let similar = &analysis.duplicates[1];
    assert!(similar.kind == MatchKind::Similar || similar.kind == MatchKind::Exact);
    assert_eq!(similar.existing.name, "Steel bar 12mm");

    // 20 requested against 5 on hand; the cement outflow is covered
    assert_eq!(analysis.shortfalls.len(), 1);
    assert_eq!(analysis.shortfalls[0].item_name, "Steel bar 12mm");
    assert_eq!(analysis.shortfalls[0].shortfall, 15.0);
}

#[tokio::test]
async fn exact_inflow_matches_are_auto_merged() {
    let mut cache = MockCache::new();
    cache.expect_get_all_items().returning(|| Ok(catalogue_items()));
    cache.expect_invalidate().returning(|| ());

    let mut stock = MockStock::new();
    stock
        .expect_stock_in()
        .withf(|movement: &StockMovement| movement.item_name == "Cement 50kg")
        .times(1)
        .returning(|movement| Ok(outcome("recMove", 25.0, 25.0 + movement.quantity)));

    let (service, state) = service_with(cache, MockCatalogue::new(), stock);

    let movements = vec![
        movement("cement 50 kg", MovementType::In, 10.0),
        movement("Completely new thing", MovementType::In, 1.0),
    ];
    let analysis = service.analyze_movements(&movements).await.unwrap();

    let processing = service
        .process(movements, analysis, DuplicatePolicy::default(), &staff_requester())
        .await
        .unwrap();

    assert_eq!(processing.merged_items, vec!["Cement 50kg".to_string()]);
    assert_eq!(processing.success_count, 1);
    // The unmatched movement proceeds through normal staging
    assert_eq!(processing.remaining.len(), 1);
    assert_eq!(processing.remaining[0].item_name, "Completely new thing");
    assert!(!processing.requires_confirmation);
    assert!(state.get_duplicates(staff_requester().chat_id).await.is_none());
}

#[tokio::test]
async fn merge_appends_conflicting_project() {
    let mut cache = MockCache::new();
    cache.expect_invalidate().returning(|| ());
    cache.expect_get_all_items().returning(|| {
        let mut cement = Item::new("Cement 50kg");
        cement.on_hand = 25.0;
        cement.project = Some("Bridge".to_string());
        Ok(vec![cement])
    });

    let mut stock = MockStock::new();
    stock
        .expect_stock_in()
        .returning(|movement| Ok(outcome("recMove", 25.0, 25.0 + movement.quantity)));

    let mut catalogue = MockCatalogue::new();
    catalogue
        .expect_update_item_project()
        .withf(|name, project| name == "Cement 50kg" && project == "Bridge, Dam")
        .times(1)
        .returning(|_, _| Ok(()));

    let (service, _) = service_with(cache, catalogue, stock);

    let mut candidate = movement("Cement 50kg", MovementType::In, 10.0);
    candidate.project = Some("Dam".to_string());
    let movements = vec![candidate];
    let analysis = service.analyze_movements(&movements).await.unwrap();

    let processing = service
        .process(movements, analysis, DuplicatePolicy::default(), &staff_requester())
        .await
        .unwrap();
    assert_eq!(processing.success_count, 1);
}

#[tokio::test]
async fn similar_matches_are_parked_for_confirmation() {
    let mut cache = MockCache::new();
    cache.expect_get_all_items().returning(|| Ok(catalogue_items()));
    cache.expect_invalidate().returning(|| ());

    let (service, state) = service_with(cache, MockCatalogue::new(), MockStock::new());

    // Shares two of three keywords with "Steel bar 12mm" but leads with a
    // different one, so it lands in the similar band
    let movements = vec![movement("galvanized steel 12mm", MovementType::In, 5.0)];
    let analysis = service.analyze_movements(&movements).await.unwrap();
    assert_eq!(analysis.duplicates.len(), 1);
    assert_eq!(analysis.duplicates[0].kind, MatchKind::Similar);

    let processing = service
        .process(movements, analysis, DuplicatePolicy::default(), &staff_requester())
        .await
        .unwrap();

    assert!(processing.requires_confirmation);
    assert!(processing.remaining.is_empty());

    let pending = state.get_duplicates(staff_requester().chat_id).await.expect("parked");
    assert_eq!(pending.matches.len(), 1);
    assert_eq!(pending.matches[0].existing.name, "Steel bar 12mm");
}

#[tokio::test]
async fn confirm_all_applies_merges_and_clears_the_dialogue() {
    let mut cache = MockCache::new();
    cache.expect_get_all_items().returning(|| Ok(catalogue_items()));
    cache.expect_invalidate().returning(|| ());

    let mut stock = MockStock::new();
    stock
        .expect_stock_in()
        .withf(|movement: &StockMovement| movement.item_name == "Steel bar 12mm")
        .times(1)
        .returning(|movement| Ok(outcome("recMove", 5.0, 5.0 + movement.quantity)));

    let (service, state) = service_with(cache, MockCatalogue::new(), stock);
    let chat_id = staff_requester().chat_id;

    let movements = vec![movement("galvanized steel 12mm", MovementType::In, 5.0)];
    let analysis = service.analyze_movements(&movements).await.unwrap();
    service
        .process(movements, analysis, DuplicatePolicy::default(), &staff_requester())
        .await
        .unwrap();

    let resolution = service
        .resolve(chat_id, DuplicateAction::ConfirmAll, None)
        .await
        .unwrap();

    assert!(resolution.all_processed);
    assert_eq!(resolution.confirmed_count, 1);
    assert_eq!(resolution.remaining, 0);
    assert!(state.get_duplicates(chat_id).await.is_none());
}

#[tokio::test]
async fn individual_cancel_keeps_the_dialogue_until_resolved() {
    let mut cache = MockCache::new();
    cache.expect_invalidate().returning(|| ());
    cache.expect_get_all_items().returning(|| {
        let mut bar = Item::new("Steel bar 12mm");
        bar.on_hand = 5.0;
        let mut rod = Item::new("Roof sheet 3m");
        rod.on_hand = 2.0;
        Ok(vec![bar, rod])
    });

    let (service, state) = service_with(cache, MockCatalogue::new(), MockStock::new());
    let chat_id = staff_requester().chat_id;

    let movements = vec![
        movement("galvanized steel 12mm", MovementType::In, 5.0),
        movement("blue roof sheet 3m", MovementType::In, 1.0),
    ];
    let analysis = service.analyze_movements(&movements).await.unwrap();
    assert_eq!(analysis.duplicates.len(), 2);
    service
        .process(movements, analysis, DuplicatePolicy::default(), &staff_requester())
        .await
        .unwrap();

    let first = service
        .resolve(chat_id, DuplicateAction::Cancel, Some(0))
        .await
        .unwrap();
    assert!(!first.all_processed);
    assert_eq!(first.remaining, 1);
    assert!(state.get_duplicates(chat_id).await.is_some());

    // Deciding the same index twice is rejected
    let again = service.resolve(chat_id, DuplicateAction::Cancel, Some(0)).await;
    assert!(matches!(again, Err(AppError::ValidationError(_))));

    let second = service
        .resolve(chat_id, DuplicateAction::Cancel, Some(1))
        .await
        .unwrap();
    assert!(second.all_processed);
    assert!(state.get_duplicates(chat_id).await.is_none());
}

#[tokio::test]
async fn resolving_without_a_dialogue_is_not_found() {
    let (service, _) = service_with(MockCache::new(), MockCatalogue::new(), MockStock::new());
    let result = service.resolve(99, DuplicateAction::ConfirmAll, None).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
