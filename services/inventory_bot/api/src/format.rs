//! Outbound reply formatting
//!
//! Everything here is transport-agnostic text plus rows of
//! `{label, callback token}` buttons; the transport renders them.

use inventory_bot_core::domains::batch::BatchApproval;
use inventory_bot_core::domains::duplicate::{DuplicateAnalysis, PendingDuplicates};
use inventory_bot_core::domains::item::Item;
use inventory_bot_core::dto::reply::{Button, Reply};

use crate::state::SearchSession;

/// Items shown per page of stock search results
pub const SEARCH_PAGE_SIZE: usize = 5;

/// How many duplicate rows get individual buttons before the dialogue
/// falls back to bulk actions only
const MAX_INDIVIDUAL_BUTTONS: usize = 5;

pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// The staged-batch confirmation prompt with approve/reject buttons
pub fn approval_prompt(approval: &BatchApproval, warnings: &[String]) -> Reply {
    let mut text = format!(
        "Batch {} staged by {} with {} movement(s), awaiting approval.\n",
        approval.batch_id,
        approval.user_name,
        approval.movements.len()
    );

    for movement in &approval.movements {
        let mut line = format!(
            "- {} {}: {} {}",
            movement.movement_type,
            movement.item_name,
            movement.quantity,
            movement.unit
        );
        if let Some(project) = &movement.project {
            line.push_str(&format!(" (project: {})", project));
        }
        text.push_str(&line);
        text.push('\n');
    }

    if !approval.before_levels.is_empty() {
        text.push_str("Current levels:\n");
        let mut levels: Vec<_> = approval.before_levels.iter().collect();
        levels.sort_by(|a, b| a.0.cmp(b.0));
        for (item_name, level) in levels {
            text.push_str(&format!("- {}: {}\n", item_name, level));
        }
    }

    for warning in warnings {
        text.push_str(&format!("Warning: {}\n", warning));
    }

    text.push_str("An administrator must approve or reject this batch.");

    Reply::with_buttons(
        text,
        vec![vec![
            Button::new("Approve", format!("approvebatch:{}", approval.batch_id)),
            Button::new("Reject", format!("rejectbatch:{}", approval.batch_id)),
        ]],
    )
}

/// The duplicate confirmation dialogue with per-item and bulk actions
pub fn duplicate_prompt(pending: &PendingDuplicates) -> Reply {
    let mut text = format!(
        "Found {} potential duplicate(s) in your submission:\n",
        pending.matches.len()
    );
    for (i, matched) in pending.matches.iter().enumerate() {
        text.push_str(&format!(
            "{}. '{}' looks like existing item '{}' ({:.0}% match, {} on hand)\n",
            i + 1,
            matched.item_name,
            matched.existing.name,
            matched.score * 100.0,
            matched.existing.on_hand
        ));
    }
    text.push_str(
        "Confirm merges the quantity into the existing item; cancel skips the entry.",
    );

    let mut buttons: Vec<Vec<Button>> = Vec::new();
    for (i, matched) in pending.matches.iter().take(MAX_INDIVIDUAL_BUTTONS).enumerate() {
        if pending.is_decided(i) {
            continue;
        }
        buttons.push(vec![
            Button::new(
                format!("Merge {}", matched.existing.name),
                format!("confirm_individual_{}", i),
            ),
            Button::new(format!("Skip {}", matched.item_name), format!("cancel_individual_{}", i)),
        ]);
    }
    buttons.push(vec![
        Button::new("Confirm All", "confirm_all_duplicates"),
        Button::new("Cancel All", "cancel_all_duplicates"),
    ]);
    buttons.push(vec![Button::new("Show All Matches", "show_all_duplicates")]);

    Reply::with_buttons(text, buttons)
}

/// Stocktake duplicate dialogue: the whole count is confirmed or cancelled
pub fn stocktake_confirmation(prompt: &str) -> Reply {
    Reply::with_buttons(
        prompt.to_string(),
        vec![vec![
            Button::new("Confirm & Apply", "confirm_all_duplicates"),
            Button::new("Cancel", "cancel_all_duplicates"),
        ]],
    )
}

/// The full match list for a pending dialogue
pub fn all_matches(pending: &PendingDuplicates) -> String {
    let mut text = String::from("All potential matches:\n");
    for (i, matched) in pending.matches.iter().enumerate() {
        let state = if pending.confirmed.contains(&i) {
            " [confirmed]"
        } else if pending.cancelled.contains(&i) {
            " [cancelled]"
        } else {
            ""
        };
        text.push_str(&format!(
            "{}. '{}' -> '{}' ({:.0}%, kind: {}){}\n",
            i + 1,
            matched.item_name,
            matched.existing.name,
            matched.score * 100.0,
            matched.kind,
            state
        ));
    }
    text
}

/// One page of stock search results with item buttons and pagination
pub fn search_page(session: &SearchSession, items: &[Item], page: usize) -> Reply {
    let total_pages = items.len().div_ceil(SEARCH_PAGE_SIZE).max(1);
    let page = page.min(total_pages - 1);
    let start = page * SEARCH_PAGE_SIZE;
    let page_items = &items[start..(start + SEARCH_PAGE_SIZE).min(items.len())];

    let mut text = format!(
        "Found {} item(s) matching '{}' (page {}/{}):\n",
        items.len(),
        session.query,
        page + 1,
        total_pages
    );
    let mut buttons: Vec<Vec<Button>> = Vec::new();

    for (offset, item) in page_items.iter().enumerate() {
        let index = start + offset;
        if item.has_unit_spec() {
            text.push_str(&format!(
                "- {}: {} units x {} {} = {} {}\n",
                item.name,
                item.on_hand,
                item.unit_size,
                item.unit_type,
                item.total_volume(),
                item.unit_type
            ));
        } else {
            text.push_str(&format!("- {}: {} {}\n", item.name, item.on_hand, item.unit_type));
        }
        buttons.push(vec![Button::new(
            item.name.clone(),
            format!("stock_item_{}_{}", index, slugify(&item.name)),
        )]);
    }

    let mut nav = Vec::new();
    if page > 0 {
        nav.push(Button::new(
            "Prev",
            format!("stock_page_prev_{}_{}", session.query_hash, page),
        ));
    }
    if page + 1 < total_pages {
        nav.push(Button::new(
            "Next",
            format!("stock_page_next_{}_{}", session.query_hash, page),
        ));
    }
    if !nav.is_empty() {
        buttons.push(nav);
    }

    Reply::with_buttons(text, buttons)
}

/// Detail card for a single item
pub fn item_detail(item: &Item) -> String {
    let mut text = format!("{}\n", item.name);
    if item.has_unit_spec() {
        text.push_str(&format!(
            "On hand: {} units x {} {} = {} {}\n",
            item.on_hand,
            item.unit_size,
            item.unit_type,
            item.total_volume(),
            item.unit_type
        ));
    } else {
        text.push_str(&format!("On hand: {} {}\n", item.on_hand, item.unit_type));
    }
    if let Some(category) = &item.category {
        text.push_str(&format!("Category: {}\n", category));
    }
    if let Some(location) = &item.location {
        text.push_str(&format!("Location: {}\n", location));
    }
    if let Some(project) = &item.project {
        text.push_str(&format!("Projects: {}\n", project));
    }
    if let Some(threshold) = item.reorder_threshold {
        text.push_str(&format!("Reorder threshold: {}\n", threshold));
        if item.is_below_reorder_threshold() {
            text.push_str("Below reorder threshold.\n");
        }
    }
    if let Some(date) = item.last_stocktake_date {
        text.push_str(&format!(
            "Last stocktake: {} by {}\n",
            date,
            item.last_stocktake_by.as_deref().unwrap_or("unknown")
        ));
    }
    text
}

/// Duplicate analysis preview, no writes
pub fn preview_summary(analysis: &DuplicateAnalysis) -> String {
    let mut text = format!(
        "Duplicate analysis: {} item(s), {} potential duplicate(s), {} new.\n",
        analysis.total_items,
        analysis.duplicates.len(),
        analysis.non_duplicate_indexes.len()
    );
    text.push_str(&format!(
        "Exact matches: {}, similar: {}\n",
        analysis.exact_count(),
        analysis.similar_count()
    ));
    for matched in &analysis.duplicates {
        text.push_str(&format!(
            "- '{}' -> '{}' ({:.0}%, {}; batch {}, item {})\n",
            matched.item_name,
            matched.existing.name,
            matched.score * 100.0,
            matched.kind,
            matched.batch_number,
            matched.item_index + 1
        ));
    }
    for shortfall in &analysis.shortfalls {
        text.push_str(&format!(
            "Warning: insufficient stock for {}: need {}, have {} (short {})\n",
            shortfall.item_name, shortfall.requested, shortfall.on_hand, shortfall.shortfall
        ));
    }
    text
}

/// Structured help, optionally narrowed to one topic
pub fn help(topic: Option<&str>) -> String {
    match topic {
        Some("movements") => "Stock movements:\n\
             in project: NAME, item, quantity unit - record an inflow\n\
             out project: NAME, item, quantity unit - request an outflow\n\
             adjust project: NAME, item, +/-quantity unit - adjust stock (admin)\n\
             All movements are staged and need admin approval."
            .to_string(),
        Some("batches") => "Batch commands:\n\
             Separate entries with newlines or semicolons, or use segments:\n\
             out\n\
             -batch 1-\n\
             project: siteA, driver: Dani\n\
             Cement 50kg, 10 bags\n\
             -batch 2-\n\
             project: siteB\n\
             Cable 2.5sqmm, 100 m\n\
             Global parameters (project:, driver:, from:, to:) at the head are \
             inherited by every entry. Maximum 40 entries per batch."
            .to_string(),
        Some("stocktake") => "Stocktake:\n\
             inventory logged by: NAME1,NAME2 [date:DD/MM/YY] [category: CAT]\n\
             Item Name, Quantity\n\
             Counts are cumulative (added to current stock). Lines starting \
             with # and blank lines are ignored. Maximum 50 entries.\n\
             Use 'inventory validate' to check a count without applying it."
            .to_string(),
        Some("duplicates") => "Duplicate detection:\n\
             Submissions are compared with the catalogue. Exact matches are \
             merged automatically; similar items ask for confirmation with \
             merge/skip buttons. Use 'preview in ...' or 'preview out ...' \
             to see the analysis without writing anything."
            .to_string(),
        Some("approvals") => "Approvals (admin):\n\
             approve BATCH_ID - apply a staged batch\n\
             reject BATCH_ID - discard a staged batch\n\
             Batches can also be resolved with the buttons on the approval \
             prompt."
            .to_string(),
        _ => "Inventory bot commands:\n\
             in / out / adjust - record stock movements (staged for approval)\n\
             inventory - cumulative stocktake; 'inventory validate' to dry-run\n\
             stock QUERY - fuzzy-search the catalogue\n\
             preview in|out - duplicate analysis only\n\
             approve / reject BATCH_ID - admin actions\n\
             help TOPIC - more detail (movements, batches, stocktake, \
             duplicates, approvals)"
            .to_string(),
    }
}
