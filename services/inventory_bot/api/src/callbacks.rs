//! Callback-token dispatch
//!
//! The transport returns button tokens verbatim; this module routes them to
//! the approval controller, the duplicate dialogues, and the search pager.

use inventory_bot_core::domains::duplicate::DuplicateAction;
use inventory_bot_core::domains::user::Requester;
use inventory_bot_core::dto::reply::Reply;
use inventory_bot_core::dto::stocktake::{StocktakeOptions, StocktakeOutcome};

use crate::commands::error_text;
use crate::format;
use crate::state::AppState;

/// Route one button press
pub async fn dispatch_callback(
    state: &AppState,
    user_id: i64,
    user_name: &str,
    chat_id: i64,
    token: &str,
) -> Vec<Reply> {
    if let Some(batch_id) = token.strip_prefix("approvebatch:") {
        let role = state.auth.get_user_role(user_id).await;
        return match state.approval_service.approve_batch(batch_id, user_name, role).await {
            Ok(approved) => vec![Reply::text(approved.message)],
            Err(e) => vec![Reply::text(error_text(&e))],
        };
    }

    if let Some(batch_id) = token.strip_prefix("rejectbatch:") {
        let role = state.auth.get_user_role(user_id).await;
        return match state.approval_service.reject_batch(batch_id, user_name, role).await {
            Ok(message) => vec![Reply::text(message)],
            Err(e) => vec![Reply::text(error_text(&e))],
        };
    }

    if let Some(index) = token.strip_prefix("confirm_individual_") {
        return resolve_individual(state, chat_id, DuplicateAction::Confirm, index).await;
    }
    if let Some(index) = token.strip_prefix("cancel_individual_") {
        return resolve_individual(state, chat_id, DuplicateAction::Cancel, index).await;
    }

    match token {
        "confirm_all_duplicates" => confirm_all(state, user_id, user_name, chat_id).await,
        "cancel_all_duplicates" => cancel_all(state, chat_id).await,
        "show_all_duplicates" => match state.duplicate_service.pending_for_chat(chat_id).await {
            Some(pending) => vec![Reply::text(format::all_matches(&pending))],
            None => vec![Reply::text("No pending duplicate confirmations found".to_string())],
        },
        _ => {
            if let Some(rest) = token.strip_prefix("stock_item_") {
                return stock_item(state, chat_id, rest).await;
            }
            if let Some(rest) = token.strip_prefix("stock_page_prev_") {
                return stock_page(state, chat_id, rest, -1).await;
            }
            if let Some(rest) = token.strip_prefix("stock_page_next_") {
                return stock_page(state, chat_id, rest, 1).await;
            }
            tracing::debug!("Ignoring unknown callback token: {}", token);
            Vec::new()
        },
    }
}

async fn resolve_individual(
    state: &AppState,
    chat_id: i64,
    action: DuplicateAction,
    index: &str,
) -> Vec<Reply> {
    let Ok(index) = index.parse::<usize>() else {
        return vec![Reply::text("Invalid item index".to_string())];
    };
    match state.duplicate_service.resolve(chat_id, action, Some(index)).await {
        Ok(resolution) => {
            let mut message = resolution.message;
            if resolution.all_processed {
                message.push_str(&format!(
                    "\nAll duplicates resolved: {} confirmed, {} cancelled.",
                    resolution.confirmed_count, resolution.cancelled_count
                ));
            } else {
                message.push_str(&format!("\n{} item(s) still pending.", resolution.remaining));
            }
            vec![Reply::text(message)]
        },
        Err(e) => vec![Reply::text(error_text(&e))],
    }
}

/// `confirm_all` resolves a movement dialogue, or re-runs a stashed
/// stocktake with the duplicate scan skipped
async fn confirm_all(
    state: &AppState,
    user_id: i64,
    user_name: &str,
    chat_id: i64,
) -> Vec<Reply> {
    let Some(pending) = state.duplicate_service.pending_for_chat(chat_id).await else {
        return vec![Reply::text("No pending duplicate confirmations found".to_string())];
    };

    if let Some(stashed) = pending.stashed_stocktake.clone() {
        state.duplicate_service.remove_pending(chat_id).await;
        let requester = Requester {
            user_id,
            user_name: user_name.to_string(),
            chat_id,
            role: state.auth.get_user_role(user_id).await,
        };
        let options = StocktakeOptions {
            validate_only: false,
            skip_duplicate_check: true,
        };
        return match state.stocktake_service.process(&stashed, &requester, options).await {
            Ok(StocktakeOutcome::Applied(summary)) => vec![Reply::text(summary.message)],
            Ok(_) => vec![Reply::text("Stocktake applied.".to_string())],
            Err(e) => vec![Reply::text(error_text(&e))],
        };
    }

    match state
        .duplicate_service
        .resolve(chat_id, DuplicateAction::ConfirmAll, None)
        .await
    {
        Ok(resolution) => vec![Reply::text(format!(
            "{}\n{} confirmed, {} cancelled.",
            resolution.message, resolution.confirmed_count, resolution.cancelled_count
        ))],
        Err(e) => vec![Reply::text(error_text(&e))],
    }
}

async fn cancel_all(state: &AppState, chat_id: i64) -> Vec<Reply> {
    let Some(pending) = state.duplicate_service.pending_for_chat(chat_id).await else {
        return vec![Reply::text("No pending duplicate confirmations found".to_string())];
    };

    if pending.stashed_stocktake.is_some() {
        state.duplicate_service.remove_pending(chat_id).await;
        return vec![Reply::text(
            "Stocktake cancelled; no changes were applied.".to_string(),
        )];
    }

    match state
        .duplicate_service
        .resolve(chat_id, DuplicateAction::CancelAll, None)
        .await
    {
        Ok(resolution) => vec![Reply::text(format!(
            "{}\n{} confirmed, {} cancelled.",
            resolution.message, resolution.confirmed_count, resolution.cancelled_count
        ))],
        Err(e) => vec![Reply::text(error_text(&e))],
    }
}

/// `stock_item_<i>_<slug>` resolves against the chat's last search session
async fn stock_item(state: &AppState, chat_id: i64, rest: &str) -> Vec<Reply> {
    let Some((index, _slug)) = rest.split_once('_') else {
        return vec![Reply::text("Invalid item reference".to_string())];
    };
    let Ok(index) = index.parse::<usize>() else {
        return vec![Reply::text("Invalid item reference".to_string())];
    };

    let sessions = state.search_sessions.read().await;
    let Some(name) = sessions
        .get(&chat_id)
        .and_then(|session| session.item_names.get(index))
        .cloned()
    else {
        return vec![Reply::text(
            "Search results expired. Please search again.".to_string(),
        )];
    };
    drop(sessions);

    match state.stock_service.current_stock(&name).await {
        Ok(item) => vec![Reply::text(format::item_detail(&item))],
        Err(e) => vec![Reply::text(error_text(&e))],
    }
}

/// `stock_page_{prev,next}_<qhash>_<page>` re-runs the cached search
async fn stock_page(state: &AppState, chat_id: i64, rest: &str, direction: i64) -> Vec<Reply> {
    let Some((query_hash, page)) = rest.rsplit_once('_') else {
        return vec![Reply::text("Invalid page reference".to_string())];
    };
    let Ok(page) = page.parse::<i64>() else {
        return vec![Reply::text("Invalid page reference".to_string())];
    };

    let session = state.search_sessions.read().await.get(&chat_id).cloned();
    let Some(session) = session.filter(|session| session.query_hash == query_hash) else {
        return vec![Reply::text(
            "Search results expired. Please search again.".to_string(),
        )];
    };

    let items = match state.catalogue.search_items(&session.query).await {
        Ok(items) => items,
        Err(e) => return vec![Reply::text(error_text(&e))],
    };
    if items.is_empty() {
        return vec![Reply::text(format!("No items found matching '{}'", session.query))];
    }

    let target = (page + direction).max(0) as usize;
    vec![format::search_page(&session, &items, target)]
}
