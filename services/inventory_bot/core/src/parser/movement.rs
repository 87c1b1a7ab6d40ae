//! Movement command parser
//!
//! Turns free-form text into a normalized batch of typed movements. Three
//! shapes are recognized, in priority order: segmented (`-batch N-`
//! headers), free batch (newlines and/or semicolons), and single entry.
//! Global parameters at the head of a batch are inherited by every entry
//! that does not override them.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domains::batch::{
    BatchEntry, BatchFormat, BatchSection, GlobalParams, MovementParse,
};
use crate::domains::movement::{MovementType, StockMovement};
use crate::domains::user::Requester;
use crate::parser::tokens::{self, LineEvent, ParamKey};
use crate::parser::{LARGE_QUANTITY_WARNING, MAX_MOVEMENT_ENTRIES};
use crate::similarity;

/// `item name, quantity [unit phrase]` — the fallback entry pattern when no
/// spaced quantity-unit token is present
static ITEM_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?),\s*(-?\d+(?:\.\d+)?)\s*(.*)$").expect("item line pattern"));

#[derive(Debug, Default)]
pub struct MovementParser;

impl MovementParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a movement command into a normalized batch
    pub fn parse(&self, text: &str, requester: &Requester) -> MovementParse {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let text = text.trim();

        let Some((movement_type, rest)) = extract_movement_type(text) else {
            return MovementParse::invalid(
                BatchFormat::Single,
                1,
                vec![
                    "Could not determine movement type. Please start with in, out, or adjust."
                        .to_string(),
                ],
            );
        };

        let is_segmented = rest
            .lines()
            .any(|line| matches!(tokens::classify_line(line), LineEvent::BatchHeader(_)));

        if is_segmented {
            self.parse_segmented(rest, movement_type, requester)
        } else {
            self.parse_free(rest, movement_type, requester)
        }
    }

    /// Parse a `-batch N-` delimited command. Each segment carries its own
    /// metadata block followed by item lines.
    fn parse_segmented(
        &self,
        text: &str,
        movement_type: MovementType,
        requester: &Requester,
    ) -> MovementParse {
        let mut sections: Vec<(u32, Vec<(ParamKey, String)>, Vec<String>)> = Vec::new();
        let mut preamble_params: Vec<(ParamKey, String)> = Vec::new();
        let mut errors = Vec::new();

        for line in text.lines() {
            match tokens::classify_line(line) {
                LineEvent::Blank | LineEvent::Comment(_) => {},
                LineEvent::BatchHeader(number) => {
                    sections.push((number, Vec::new(), Vec::new()));
                },
                LineEvent::Params(params) => match sections.last_mut() {
                    Some((_, metadata, items)) if items.is_empty() => metadata.extend(params),
                    Some((number, _, _)) => {
                        errors.push(format!(
                            "Batch {}: metadata must come before item lines",
                            number
                        ));
                    },
                    None => preamble_params.extend(params),
                },
                LineEvent::ItemLine(line) => match sections.last_mut() {
                    Some((_, _, items)) => items.push(line.to_string()),
                    None => errors.push(format!(
                        "Item line before the first batch header: '{}'",
                        line
                    )),
                },
                LineEvent::Other(line) => {
                    errors.push(format!("Unrecognized line: '{}'", line));
                },
            }
        }

        let global_params = params_to_globals(&preamble_params);

        let mut batch_sections = Vec::new();
        let mut total_items = 0usize;
        for (number, metadata, item_lines) in sections {
            let mut section = build_section(number, &metadata, movement_type);

            for (i, line) in item_lines.iter().enumerate() {
                match parse_section_item(line) {
                    Some(entry) => {
                        if entry.quantity <= 0.0 && movement_type != MovementType::Adjust {
                            errors.push(format!(
                                "Batch {}, Item {}: Quantity must be greater than 0",
                                number,
                                i + 1
                            ));
                        } else if entry.item_name.trim().is_empty() {
                            errors.push(format!(
                                "Batch {}, Item {}: Item name is required",
                                number,
                                i + 1
                            ));
                        } else {
                            section.entries.push(entry);
                        }
                    },
                    None => errors.push(format!(
                        "Batch {}: could not parse item line '{}'",
                        number, line
                    )),
                }
            }

            if section.entries.is_empty() {
                errors.push(format!("Batch {}: No items found", number));
            }
            total_items += section.entries.len();
            batch_sections.push(section);
        }

        if total_items > MAX_MOVEMENT_ENTRIES {
            return MovementParse::invalid(
                BatchFormat::Segmented,
                total_items,
                vec![
                    format!(
                        "Batch size {} exceeds maximum limit of {}.",
                        total_items, MAX_MOVEMENT_ENTRIES
                    ),
                    "Please split into smaller batches or process fewer items at once.".to_string(),
                ],
            );
        }

        let mut movements = Vec::new();
        for section in &batch_sections {
            for entry in &section.entries {
                let mut movement = StockMovement::new(
                    entry.item_name.clone(),
                    movement_type,
                    entry.quantity,
                    entry.unit.clone().unwrap_or_else(|| "piece".to_string()),
                    requester,
                );
                movement.project = Some(section.project.clone());
                movement.driver_name = Some(section.driver.clone());
                movement.from_location = section.from_location.clone();
                movement.to_location = section.to_location.clone();
                movement.batch_number = Some(section.batch_number);
                movements.push(movement);
            }
        }

        let is_valid = errors.is_empty() && !movements.is_empty();
        MovementParse {
            format: BatchFormat::Segmented,
            valid_entries: movements.len(),
            movements,
            sections: batch_sections,
            total_entries: total_items,
            errors,
            warnings: Vec::new(),
            is_valid,
            global_params,
        }
    }

    /// Parse a free-format batch: optional global parameters at the head,
    /// then entries separated by newlines and/or semicolons.
    fn parse_free(
        &self,
        text: &str,
        movement_type: MovementType,
        requester: &Requester,
    ) -> MovementParse {
        let (global_params, remainder) = extract_globals(text);

        let format = detect_format(&remainder);

        let raw_entries = split_entries(&remainder);
        let total_entries = raw_entries.len();

        if total_entries > MAX_MOVEMENT_ENTRIES {
            return MovementParse::invalid(
                format,
                total_entries,
                vec![
                    format!(
                        "Batch size {} exceeds maximum limit of {}.",
                        total_entries, MAX_MOVEMENT_ENTRIES
                    ),
                    "Please split into smaller batches or process fewer items at once.".to_string(),
                ],
            );
        }

        let mut movements = Vec::new();
        let mut errors = Vec::new();

        for (i, entry) in raw_entries.iter().enumerate() {
            // Entries restating a different verb make the batch mixed-type
            if let Some((entry_type, _)) = extract_movement_type(entry) {
                if entry_type != movement_type {
                    errors.push(format!(
                        "Entry #{}: Movement type {} differs from first entry type {}. \
                         All entries must use the same movement type.",
                        i + 1,
                        entry_type,
                        movement_type
                    ));
                    continue;
                }
            }

            match parse_entry(entry, movement_type, requester) {
                Some(movement) => movements.push(movement),
                None => errors.push(format!(
                    "Entry #{}: Could not parse '{}'. Check format: item, quantity unit, \
                     [field: value]",
                    i + 1,
                    entry.trim()
                )),
            }
        }

        for movement in &mut movements {
            global_params.apply_to(movement);
            apply_defaults(movement, movement_type);
        }

        let mut warnings = Vec::new();
        validate_consistency(&movements, movement_type, &mut errors, &mut warnings);

        if !errors.is_empty() {
            append_guidance(&mut errors, format, total_entries, &global_params, &movements);
        }

        let is_valid = errors.is_empty() && !movements.is_empty();
        MovementParse {
            format,
            valid_entries: movements.len(),
            movements,
            sections: Vec::new(),
            total_entries,
            errors,
            warnings,
            is_valid,
            global_params,
        }
    }
}

/// Strip a leading `in`/`out`/`adjust` verb (with optional slash) and
/// return the remaining payload
fn extract_movement_type(text: &str) -> Option<(MovementType, &str)> {
    let trimmed = text.trim_start();
    let stripped = trimmed.strip_prefix('/').unwrap_or(trimmed);

    for (word, movement_type) in [
        ("in", MovementType::In),
        ("out", MovementType::Out),
        ("adjust", MovementType::Adjust),
    ] {
        if stripped.len() > word.len()
            && stripped.is_char_boundary(word.len())
            && stripped[..word.len()].eq_ignore_ascii_case(word)
            && stripped.as_bytes()[word.len()].is_ascii_whitespace()
        {
            return Some((movement_type, stripped[word.len()..].trim_start()));
        }
    }
    None
}

/// Pull global parameters off the head of the command: fragments of the
/// first line (values stop at the next comma) plus any following lines that
/// are purely metadata.
fn extract_globals(text: &str) -> (GlobalParams, String) {
    let mut lines = text.lines();
    let first_line = lines.next().unwrap_or_default();

    let mut params: Vec<(ParamKey, String)> = Vec::new();
    let mut kept_fragments: Vec<&str> = Vec::new();

    for fragment in first_line.split(',') {
        let trimmed = fragment.trim();
        let lowered = trimmed.to_ascii_lowercase();
        let key = ParamKey::ALL
            .iter()
            .find(|key| lowered.starts_with(key.token()))
            .copied();
        match key {
            Some(key) => {
                let value = trimmed[key.token().len()..].trim().to_string();
                if !value.is_empty() {
                    params.push((key, value));
                }
            },
            None => {
                if !trimmed.is_empty() {
                    kept_fragments.push(trimmed);
                }
            },
        }
    }

    let mut remainder_lines: Vec<String> = Vec::new();
    let first_remainder = kept_fragments.join(", ");
    if !first_remainder.is_empty() {
        remainder_lines.push(first_remainder);
    }

    // Subsequent lines that are purely metadata extend the globals until the
    // first entry line
    let mut consuming_metadata = true;
    for line in lines {
        if consuming_metadata {
            if let LineEvent::Params(line_params) = tokens::classify_line(line) {
                params.extend(line_params);
                continue;
            }
            consuming_metadata = false;
        }
        remainder_lines.push(line.to_string());
    }

    (params_to_globals(&params), remainder_lines.join("\n"))
}

fn params_to_globals(params: &[(ParamKey, String)]) -> GlobalParams {
    let mut globals = GlobalParams::default();
    for (key, value) in params {
        match key {
            ParamKey::Project => globals.project = Some(value.clone()),
            ParamKey::Driver => globals.driver = Some(value.clone()),
            ParamKey::From => globals.from_location = Some(value.clone()),
            ParamKey::To => globals.to_location = Some(value.clone()),
        }
    }
    globals
}

fn detect_format(text: &str) -> BatchFormat {
    let non_empty_lines = text.lines().filter(|line| !line.trim().is_empty()).count();
    let has_newlines = non_empty_lines > 1;
    let has_semicolons = text.contains(';');

    match (has_newlines, has_semicolons) {
        (true, true) => BatchFormat::Mixed,
        (true, false) => BatchFormat::Newline,
        (false, true) => BatchFormat::Semicolon,
        (false, false) => BatchFormat::Single,
    }
}

/// Split into individual entries by newlines first, then semicolons
fn split_entries(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(|line| line.split(';'))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse one free-format entry into a movement
fn parse_entry(
    entry: &str,
    movement_type: MovementType,
    requester: &Requester,
) -> Option<StockMovement> {
    let entry = match extract_movement_type(entry) {
        Some((_, rest)) => rest,
        None => entry,
    }
    .trim();

    let (item_name, quantity, unit, remaining) = match tokens::find_quantity_unit(entry) {
        Some(token) => {
            let name = entry[..token.start].trim().trim_end_matches(',').trim();
            let remaining = entry[token.end..].trim().to_string();
            (name.to_string(), token.quantity, token.unit, remaining)
        },
        None => {
            // No spaced quantity-unit token; fall back to `name, qty [unit]`
            let captures = ITEM_LINE_RE.captures(entry)?;
            let name = captures[1].trim().to_string();
            let quantity: f64 = captures[2].parse().ok()?;
            let rest = captures[3].trim();

            let (unit, remaining) = match rest.split_whitespace().next() {
                Some(word) => {
                    let singular = similarity::canonical_unit(word);
                    if similarity::is_quantity_unit(&singular) {
                        (singular, rest[word.len()..].trim().to_string())
                    } else {
                        ("piece".to_string(), rest.to_string())
                    }
                },
                None => ("piece".to_string(), String::new()),
            };
            (name, quantity, unit, remaining)
        },
    };

    if item_name.is_empty() {
        return None;
    }

    let mut movement = StockMovement::new(item_name, movement_type, quantity, unit, requester);
    apply_entry_fields(&mut movement, &remaining);
    Some(movement)
}

/// Trailing comma-separated fragments of an entry: `key: value` pairs
/// override the inherited globals, anything else is collected into the note.
fn apply_entry_fields(movement: &mut StockMovement, remaining: &str) {
    let mut notes = Vec::new();
    for fragment in remaining.split(',') {
        let trimmed = fragment.trim().trim_start_matches(|c| c == ',' || c == ';').trim();
        if trimmed.is_empty() {
            continue;
        }
        let lowered = trimmed.to_ascii_lowercase();
        let key = ParamKey::ALL
            .iter()
            .find(|key| lowered.starts_with(key.token()))
            .copied();
        match key {
            Some(key) => {
                let value = trimmed[key.token().len()..].trim().to_string();
                if value.is_empty() {
                    continue;
                }
                match key {
                    ParamKey::Project => movement.project = Some(value),
                    ParamKey::Driver => movement.driver_name = Some(value),
                    ParamKey::From => movement.from_location = Some(value),
                    ParamKey::To => movement.to_location = Some(value),
                }
            },
            None => notes.push(trimmed.to_string()),
        }
    }
    if !notes.is_empty() {
        movement.note = Some(notes.join(" - "));
    }
}

/// Fill the free-format defaults: driver "not described", and the
/// movement-direction location ("external" destination for outflows,
/// "not described" source for inflows). Project is deliberately left
/// unset so the required-project validation can fire.
fn apply_defaults(movement: &mut StockMovement, movement_type: MovementType) {
    if movement.driver_name.is_none() {
        movement.driver_name = Some("not described".to_string());
    }
    match movement_type {
        MovementType::Out => {
            if movement.to_location.is_none() {
                movement.to_location = Some("external".to_string());
            }
        },
        MovementType::In => {
            if movement.from_location.is_none() {
                movement.from_location = Some("not described".to_string());
            }
        },
        MovementType::Adjust => {},
    }
}

fn validate_consistency(
    movements: &[StockMovement],
    movement_type: MovementType,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    if movements.is_empty() {
        errors.push("No valid movements to process. Please check your input format.".to_string());
        return;
    }

    for (i, movement) in movements.iter().enumerate() {
        if movement.quantity <= 0.0 && movement_type != MovementType::Adjust {
            errors.push(format!(
                "Entry #{}: Quantity must be positive for {} movements. \
                 Only adjust movements can have negative quantities.",
                i + 1,
                movement_type
            ));
        }
        if movement.quantity == 0.0 && movement_type == MovementType::Adjust {
            errors.push(format!("Entry #{}: Adjustment quantity cannot be zero.", i + 1));
        }
        if movement.project.is_none() {
            errors.push(format!(
                "Entry #{}: Missing project name. Please specify a project using 'project:' \
                 parameter at the beginning of your command.",
                i + 1
            ));
        }
        if movement.quantity.abs() > LARGE_QUANTITY_WARNING {
            warnings.push(format!(
                "Entry #{}: Very large quantity detected ({}). Please verify this is correct.",
                i + 1,
                movement.quantity
            ));
        }
    }

    // Repeated items are allowed but probably unintended
    let mut counts: Vec<(String, usize)> = Vec::new();
    for movement in movements {
        let lowered = movement.item_name.to_lowercase();
        match counts.iter_mut().find(|(name, _)| *name == lowered) {
            Some((_, count)) => *count += 1,
            None => counts.push((lowered, 1)),
        }
    }
    for (name, count) in counts {
        if count > 1 {
            warnings.push(format!(
                "Item '{}' appears {} times in your batch. \
                 Consider combining these entries if they are duplicates.",
                name, count
            ));
        }
    }
}

/// Format-specific tips appended to a failing parse
fn append_guidance(
    errors: &mut Vec<String>,
    format: BatchFormat,
    total_entries: usize,
    global_params: &GlobalParams,
    movements: &[StockMovement],
) {
    if movements.is_empty() {
        errors.push("No valid entries found. Please check the format and try again.".to_string());
    }

    match format {
        BatchFormat::Mixed => errors.push(
            "Tip: For clearer batch commands, try using either all newlines or all semicolons, \
             not mixed format."
                .to_string(),
        ),
        BatchFormat::Newline if total_entries > 1 => errors.push(
            "Tip: For newline format, make sure each entry is on a separate line and follows \
             the pattern: item, quantity unit, [field: value]"
                .to_string(),
        ),
        BatchFormat::Semicolon if total_entries > 1 => errors.push(
            "Tip: For semicolon format, separate entries with semicolons and follow the \
             pattern: item, quantity unit; item2, quantity2 unit2"
                .to_string(),
        ),
        _ => {},
    }

    if !global_params.is_empty() {
        errors.push(format!(
            "Note: Global parameters were detected ({}) and will be applied to all entries \
             unless overridden in specific entries.",
            global_params.describe()
        ));
    } else if movements.iter().all(|m| m.project.is_none()) {
        errors.push(
            "Tip: You must specify a project using 'project:' parameter at the beginning of \
             your command. Example: in project: Bridge Construction, cement, 50 bags"
                .to_string(),
        );
    }
}

fn build_section(
    number: u32,
    metadata: &[(ParamKey, String)],
    movement_type: MovementType,
) -> BatchSection {
    let globals = params_to_globals(metadata);
    let (from_location, to_location) = match movement_type {
        MovementType::Out => (None, Some(globals.to_location.unwrap_or_else(|| "external".to_string()))),
        MovementType::In => (
            Some(globals.from_location.unwrap_or_else(|| "not described".to_string())),
            None,
        ),
        MovementType::Adjust => (globals.from_location, globals.to_location),
    };
    BatchSection {
        batch_number: number,
        project: globals.project.unwrap_or_else(|| "not described".to_string()),
        driver: globals.driver.unwrap_or_else(|| "not described".to_string()),
        from_location,
        to_location,
        entries: Vec::new(),
    }
}

/// Parse a segmented item line: `name, qty [unit]`
fn parse_section_item(line: &str) -> Option<BatchEntry> {
    let captures = ITEM_LINE_RE.captures(line.trim())?;
    let item_name = captures[1].trim().to_string();
    let quantity: f64 = captures[2].parse().ok()?;
    let unit_text = captures[3].trim();
    let unit = if unit_text.is_empty() {
        None
    } else {
        Some(similarity::canonical_unit(unit_text.split_whitespace().next().unwrap_or(unit_text)))
    };
    Some(BatchEntry {
        item_name,
        quantity,
        unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::user::UserRole;

    fn requester() -> Requester {
        Requester {
            user_id: 99,
            user_name: "Trevor".to_string(),
            chat_id: 5,
            role: UserRole::Staff,
        }
    }

    fn parse(text: &str) -> MovementParse {
        MovementParser::new().parse(text, &requester())
    }

    #[test]
    fn single_inflow_with_project() {
        let result = parse("in project: Bridge, cement 50kg, 10 bags");

        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(result.movements.len(), 1);
        let movement = &result.movements[0];
        assert_eq!(movement.item_name, "cement 50kg");
        assert_eq!(movement.quantity, 10.0);
        assert_eq!(movement.unit, "bag");
        assert_eq!(movement.movement_type, MovementType::In);
        assert_eq!(movement.project.as_deref(), Some("Bridge"));
        assert_eq!(movement.from_location.as_deref(), Some("not described"));
    }

    #[test]
    fn newline_batch_inherits_globals() {
        let result = parse(
            "out project: mzuzu, driver: Dani\nCement 50kg, 10 bags\nSteel bar 12mm, 20 pieces",
        );

        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(result.format, BatchFormat::Newline);
        assert_eq!(result.movements.len(), 2);
        for movement in &result.movements {
            assert_eq!(movement.project.as_deref(), Some("mzuzu"));
            assert_eq!(movement.driver_name.as_deref(), Some("Dani"));
            assert_eq!(movement.to_location.as_deref(), Some("external"));
        }
        assert_eq!(result.movements[1].quantity, 20.0);
        assert_eq!(result.movements[1].unit, "piece");
    }

    #[test]
    fn per_entry_override_beats_global() {
        let result = parse(
            "out project: mzuzu\nCement 50kg, 5 bags, to: siteB\nSteel bar 12mm, 2 pieces",
        );

        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(result.movements[0].to_location.as_deref(), Some("siteB"));
        assert_eq!(result.movements[1].to_location.as_deref(), Some("external"));
    }

    #[test]
    fn semicolon_batch() {
        let result = parse("in project: X, cement, 5 bags; sand, 2 bags");

        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(result.format, BatchFormat::Semicolon);
        assert_eq!(result.movements.len(), 2);
        assert_eq!(result.movements[1].item_name, "sand");
    }

    #[test]
    fn mixed_movement_types_rejected() {
        let result = parse("in project: X, cement, 5 bags\nout steel, 2 pieces");

        assert!(!result.is_valid);
        assert!(
            result.errors.iter().any(|e| e.contains("differs from first entry type")),
            "errors: {:?}",
            result.errors
        );
    }

    #[test]
    fn unknown_verb_is_rejected() {
        let result = parse("transfer cement, 5 bags");
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("Could not determine movement type"));
    }

    #[test]
    fn batch_size_limit_enforced() {
        let entries: Vec<String> =
            (0..41).map(|i| format!("item {}, 1 piece", i)).collect();
        let text = format!("in project: X\n{}", entries.join("\n"));
        let result = parse(&text);

        assert!(!result.is_valid);
        assert!(result.errors[0].contains("exceeds maximum limit of 40"));
        assert!(result.movements.is_empty());
    }

    #[test]
    fn missing_project_is_an_error() {
        let result = parse("in cement, 5 bags");
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("Missing project name")));
    }

    #[test]
    fn negative_quantity_only_for_adjust() {
        let result = parse("out project: X, cement, -5 bags");
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("must be positive")));

        let result = parse("adjust project: X, cement, -5 bags");
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(result.movements[0].quantity, -5.0);
        assert_eq!(result.movements[0].signed_base_quantity, -5.0);
    }

    #[test]
    fn large_quantity_is_a_soft_warning() {
        let result = parse("in project: X, sand, 20000 bags");
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert!(result.warnings.iter().any(|w| w.contains("Very large quantity")));
    }

    #[test]
    fn duplicate_items_are_a_soft_warning() {
        let result = parse("in project: X, cement, 5 bags\ncement, 3 bags");
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert!(result.warnings.iter().any(|w| w.contains("appears 2 times")));
    }

    #[test]
    fn segmented_batches_keep_their_own_metadata() {
        let text = "out\n-batch 1-\nproject: mzuzu, driver: Dani\nCement 50kg, 10 bags\n\
                    -batch 2-\nproject: lilongwe, driver: John\nCable 2.5sqmm, 100 m";
        let result = parse(text);

        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(result.format, BatchFormat::Segmented);
        assert_eq!(result.sections.len(), 2);
        assert_eq!(result.movements.len(), 2);

        let first = &result.movements[0];
        assert_eq!(first.project.as_deref(), Some("mzuzu"));
        assert_eq!(first.driver_name.as_deref(), Some("Dani"));
        assert_eq!(first.batch_number, Some(1));
        assert_eq!(first.to_location.as_deref(), Some("external"));

        let second = &result.movements[1];
        assert_eq!(second.item_name, "Cable 2.5sqmm");
        assert_eq!(second.quantity, 100.0);
        assert_eq!(second.unit, "m");
        assert_eq!(second.project.as_deref(), Some("lilongwe"));
        assert_eq!(second.batch_number, Some(2));
    }

    #[test]
    fn segmented_defaults_fill_missing_metadata() {
        let text = "in\n-batch 1-\nSolar floodlight panel FS-SFL800, 4";
        let result = parse(text);

        assert!(result.is_valid, "errors: {:?}", result.errors);
        let movement = &result.movements[0];
        assert_eq!(movement.item_name, "Solar floodlight panel FS-SFL800");
        assert_eq!(movement.quantity, 4.0);
        assert_eq!(movement.unit, "piece");
        assert_eq!(movement.project.as_deref(), Some("not described"));
        assert_eq!(movement.from_location.as_deref(), Some("not described"));
    }

    #[test]
    fn entry_note_collected_from_plain_fragments() {
        let result = parse("in project: X, cement, 5 bags, urgent delivery");
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(result.movements[0].note.as_deref(), Some("urgent delivery"));
    }
}
