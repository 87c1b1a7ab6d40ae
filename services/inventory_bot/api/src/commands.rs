//! Verb-first command router
//!
//! Inbound text is dispatched on its first word. Movement and stocktake
//! commands run through the idempotency gate, the duplicate engine, and the
//! approval pipeline; queries are answered directly.

use inventory_bot_core::domains::duplicate::DuplicatePolicy;
use inventory_bot_core::domains::user::Requester;
use inventory_bot_core::dto::reply::Reply;
use inventory_bot_core::dto::stocktake::{StocktakeOptions, StocktakeOutcome};
use inventory_bot_core::parser::MovementParser;
use shared_error::AppError;

use crate::format;
use crate::state::{AppState, SearchSession};

const KNOWN_VERBS: &[&str] = &[
    "in",
    "out",
    "adjust",
    "inventory",
    "stock",
    "preview",
    "approve",
    "reject",
    "void",
    "help",
    "whoami",
];

/// Route one inbound message. An empty reply list means silence (idempotent
/// duplicates are acknowledged and dropped).
pub async fn dispatch_message(
    state: &AppState,
    user_id: i64,
    user_name: &str,
    chat_id: i64,
    text: &str,
) -> Vec<Reply> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let (verb, rest) = split_verb(trimmed);
    if !KNOWN_VERBS.contains(&verb.as_str()) {
        return vec![Reply::text(format!(
            "Unknown command '{}'. Send 'help' for the command list.",
            verb
        ))];
    }

    let role = match state.auth.validate_access(user_id, chat_id, &verb).await {
        Ok(role) => role,
        Err(e) => return vec![Reply::text(error_text(&e))],
    };
    let requester = Requester {
        user_id,
        user_name: user_name.to_string(),
        chat_id,
        role,
    };

    match verb.as_str() {
        "in" | "out" | "adjust" => movement_command(state, &requester, trimmed).await,
        "inventory" => stocktake_command(state, &requester, trimmed, rest).await,
        "stock" => search_command(state, chat_id, rest).await,
        "preview" => preview_command(state, &requester, rest).await,
        "approve" => approve_command(state, &requester, rest).await,
        "reject" => reject_command(state, &requester, rest).await,
        "void" => void_command(state, &requester, rest).await,
        "whoami" => vec![Reply::text(format!("{} ({})", requester.user_name, requester.role))],
        "help" => {
            let topic = rest.split_whitespace().next();
            vec![Reply::text(format::help(topic))]
        },
        _ => Vec::new(),
    }
}

/// First whitespace-delimited word, lowercased, leading slash stripped
fn split_verb(text: &str) -> (String, &str) {
    let stripped = text.strip_prefix('/').unwrap_or(text);
    match stripped.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb.to_ascii_lowercase(), rest.trim_start()),
        None => (stripped.to_ascii_lowercase(), ""),
    }
}

/// Prefer the inner message for user-visible errors
pub fn error_text(error: &AppError) -> String {
    match error {
        AppError::ValidationError(msg)
        | AppError::NotFound(msg)
        | AppError::Forbidden(msg)
        | AppError::Conflict(msg)
        | AppError::ParseError(msg)
        | AppError::ServiceUnavailable(msg) => msg.clone(),
        other => other.to_string(),
    }
}

async fn movement_command(state: &AppState, requester: &Requester, text: &str) -> Vec<Reply> {
    // Duplicate submissions within the TTL are silently dropped
    if state.idempotency.is_duplicate(text).await {
        tracing::info!("Dropping duplicate submission from chat {}", requester.chat_id);
        return Vec::new();
    }

    let parse = MovementParser::new().parse(text, requester);
    if !parse.is_valid {
        let mut message = String::from("Could not process your command:\n");
        message.push_str(&parse.errors.join("\n"));
        return vec![Reply::text(message)];
    }

    let analysis = match state.duplicate_service.analyze_movements(&parse.movements).await {
        Ok(analysis) => analysis,
        Err(e) => return vec![Reply::text(error_text(&e))],
    };

    let mut notes: Vec<String> = parse.warnings.clone();
    for shortfall in &analysis.shortfalls {
        notes.push(format!(
            "Insufficient stock for {}: need {}, have {} (short {})",
            shortfall.item_name, shortfall.requested, shortfall.on_hand, shortfall.shortfall
        ));
    }

    let processing = match state
        .duplicate_service
        .process(parse.movements, analysis, DuplicatePolicy::default(), requester)
        .await
    {
        Ok(processing) => processing,
        Err(e) => return vec![Reply::text(error_text(&e))],
    };

    if !processing.merged_items.is_empty() {
        notes.push(format!(
            "Merged into existing items (quantities added): {}",
            processing.merged_items.join(", ")
        ));
    }
    for error in &processing.errors {
        notes.push(error.format());
    }

    let mut replies = Vec::new();
    let mut handled = false;

    if !processing.remaining.is_empty() {
        match state
            .batch_service
            .prepare_batch_approval(processing.remaining, requester, parse.global_params.clone())
            .await
        {
            Ok(approval) => {
                replies.push(format::approval_prompt(&approval, &notes));
                notes.clear();
                handled = true;
            },
            Err(e) => replies.push(Reply::text(error_text(&e))),
        }
    }

    if processing.requires_confirmation {
        if let Some(pending) = state.duplicate_service.pending_for_chat(requester.chat_id).await {
            replies.push(format::duplicate_prompt(&pending));
            handled = true;
        }
    }

    if !notes.is_empty() {
        replies.push(Reply::text(notes.join("\n")));
        if !processing.merged_items.is_empty() {
            handled = true;
        }
    }

    if handled {
        state.idempotency.store_key(text, None).await;
    }
    if replies.is_empty() {
        replies.push(Reply::text("Nothing to process.".to_string()));
    }
    replies
}

async fn stocktake_command(
    state: &AppState,
    requester: &Requester,
    full_text: &str,
    rest: &str,
) -> Vec<Reply> {
    let (body, validate_only) = match rest.strip_prefix("validate") {
        Some(stripped) => (stripped.trim_start(), true),
        None => (rest, false),
    };

    if body.trim().is_empty() {
        return vec![Reply::text(format::help(Some("stocktake")))];
    }

    if !validate_only && state.idempotency.is_duplicate(full_text).await {
        tracing::info!("Dropping duplicate stocktake from chat {}", requester.chat_id);
        return Vec::new();
    }

    let options = StocktakeOptions {
        validate_only,
        skip_duplicate_check: false,
    };
    match state.stocktake_service.process(body, requester, options).await {
        Ok(StocktakeOutcome::Validated(report)) => vec![Reply::text(report)],
        Ok(StocktakeOutcome::Applied(summary)) => {
            state.idempotency.store_key(full_text, None).await;
            vec![Reply::text(summary.message)]
        },
        Ok(StocktakeOutcome::NeedsConfirmation { prompt, .. }) => {
            vec![format::stocktake_confirmation(&prompt)]
        },
        Err(e) => vec![Reply::text(error_text(&e))],
    }
}

async fn search_command(state: &AppState, chat_id: i64, query: &str) -> Vec<Reply> {
    let query = query.trim();
    if query.is_empty() {
        return vec![Reply::text("Usage: stock QUERY".to_string())];
    }

    let items = match state.catalogue.search_items(query).await {
        Ok(items) => items,
        Err(e) => return vec![Reply::text(error_text(&e))],
    };
    if items.is_empty() {
        return vec![Reply::text(format!("No items found matching '{}'", query))];
    }

    let query_hash = state.idempotency.generate_key(query)[..8].to_string();
    let session = SearchSession {
        query: query.to_string(),
        query_hash,
        item_names: items.iter().map(|item| item.name.clone()).collect(),
    };
    let reply = format::search_page(&session, &items, 0);
    state.search_sessions.write().await.insert(chat_id, session);
    vec![reply]
}

async fn preview_command(state: &AppState, requester: &Requester, rest: &str) -> Vec<Reply> {
    let parse = MovementParser::new().parse(rest, requester);
    if !parse.is_valid {
        let mut message = String::from("Could not parse the command for preview:\n");
        message.push_str(&parse.errors.join("\n"));
        return vec![Reply::text(message)];
    }

    match state.duplicate_service.analyze_movements(&parse.movements).await {
        Ok(analysis) => vec![Reply::text(format::preview_summary(&analysis))],
        Err(e) => vec![Reply::text(error_text(&e))],
    }
}

async fn approve_command(state: &AppState, requester: &Requester, rest: &str) -> Vec<Reply> {
    let batch_id = rest.trim();
    if batch_id.is_empty() {
        // Bare `approve` lists what is waiting
        let summary = state.batch_service.pending_summary().await;
        if summary.total_pending_batches == 0 {
            return vec![Reply::text("No pending batches.".to_string())];
        }
        let mut text = format!(
            "{} pending batch(es) with {} movement(s):",
            summary.total_pending_batches, summary.total_pending_movements
        );
        for batch_id in &summary.batch_ids {
            text.push_str(&format!("\n- {}", batch_id));
        }
        if let Some(oldest) = summary.oldest_pending {
            text.push_str(&format!("\nOldest staged at {}", oldest));
        }
        return vec![Reply::text(text)];
    }
    match state
        .approval_service
        .approve_batch(batch_id, &requester.user_name, requester.role)
        .await
    {
        Ok(approved) => vec![Reply::text(approved.message)],
        Err(e) => vec![Reply::text(error_text(&e))],
    }
}

async fn reject_command(state: &AppState, requester: &Requester, rest: &str) -> Vec<Reply> {
    let batch_id = rest.trim();
    if batch_id.is_empty() {
        return vec![Reply::text("Usage: reject BATCH_ID".to_string())];
    }
    match state
        .approval_service
        .reject_batch(batch_id, &requester.user_name, requester.role)
        .await
    {
        Ok(message) => vec![Reply::text(message)],
        Err(e) => vec![Reply::text(error_text(&e))],
    }
}

async fn void_command(state: &AppState, requester: &Requester, rest: &str) -> Vec<Reply> {
    let movement_id = rest.trim();
    if movement_id.is_empty() {
        return vec![Reply::text("Usage: void MOVEMENT_ID".to_string())];
    }
    match state
        .approval_service
        .void_movement(movement_id, &requester.user_name, requester.role)
        .await
    {
        Ok(message) => vec![Reply::text(message)],
        Err(e) => vec![Reply::text(error_text(&e))],
    }
}
