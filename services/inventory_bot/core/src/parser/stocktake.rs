//! Stocktake command parser
//!
//! Format:
//! ```text
//! logged by: NAME1,NAME2 [date:DD/MM/YY] [category: CATEGORY]
//! Item Name, Quantity
//! # comment lines and blanks are skipped
//! Item Name, Quantity
//! ```
//!
//! Dates are DD/MM/YY with the century rule `yy < 50 -> 20yy, else 19yy`;
//! when omitted the stocktake is dated today. Lines naming the same item
//! are combined by summing their quantities.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domains::stocktake::{StocktakeEntry, StocktakeHeader, StocktakeParse};
use crate::parser::tokens::{classify_line, LineEvent};
use crate::parser::MAX_STOCKTAKE_ENTRIES;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)date:\s*(\d{1,2}/\d{1,2}/\d{2})").expect("date pattern"));

static CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)category:\s*(\S+)").expect("category pattern"));

static LOGGED_BY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:logged\s+by|logged_by):\s*(.+)").expect("logged-by pattern"));

static QUANTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("quantity pattern"));

#[derive(Debug)]
pub struct StocktakeParser {
    max_entries: usize,
}

impl Default for StocktakeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StocktakeParser {
    pub fn new() -> Self {
        Self {
            max_entries: MAX_STOCKTAKE_ENTRIES,
        }
    }

    /// Parse a stocktake command: header line plus entry lines
    pub fn parse(&self, command_text: &str) -> StocktakeParse {
        let text = command_text.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = text.split('\n').collect();

        if lines.len() < 2 {
            return StocktakeParse {
                header: None,
                entries: Vec::new(),
                total_lines: lines.len(),
                valid_entries: 0,
                errors: vec![
                    "Command must have at least a header and one entry line".to_string()
                ],
                is_valid: false,
                blank_lines: 0,
                comment_lines: 0,
                skipped_lines: 0,
            };
        }

        let header = parse_header(lines[0]);
        if header.is_none() {
            return StocktakeParse {
                header: None,
                entries: Vec::new(),
                total_lines: lines.len(),
                valid_entries: 0,
                errors: vec![
                    "Invalid header format. Expected: logged by: NAME1,NAME2 [date:DD/MM/YY] \
                     [category: CATEGORY]"
                        .to_string(),
                ],
                is_valid: false,
                blank_lines: 0,
                comment_lines: 0,
                skipped_lines: 0,
            };
        }

        let mut entries: Vec<StocktakeEntry> = Vec::new();
        let mut errors = Vec::new();
        let mut blank_lines = 0;
        let mut comment_lines = 0;
        let mut skipped_lines = 0;

        // Header is line 1; entries are numbered from 2
        for (line_number, line) in lines.iter().enumerate().skip(1) {
            let line_number = line_number + 1;
            match classify_line(line) {
                LineEvent::Blank => {
                    blank_lines += 1;
                    continue;
                },
                LineEvent::Comment(_) => {
                    comment_lines += 1;
                    continue;
                },
                _ => {},
            }

            if entries.len() >= self.max_entries {
                errors.push(format!(
                    "Line {}: Maximum of {} entries exceeded",
                    line_number, self.max_entries
                ));
                break;
            }

            match parse_entry_line(line, line_number) {
                Some(entry) => {
                    // Combine repeated items by summing their counts
                    let lowered = entry.item_name.to_lowercase();
                    match entries.iter_mut().find(|e| e.item_name.to_lowercase() == lowered) {
                        Some(existing) => existing.quantity += entry.quantity,
                        None => entries.push(entry),
                    }
                },
                None => {
                    errors.push(format!(
                        "Line {}: Invalid format. Expected: Item Name, Quantity",
                        line_number
                    ));
                    skipped_lines += 1;
                },
            }
        }

        if entries.is_empty() && errors.is_empty() {
            errors.push("Command must have at least a header and one entry line".to_string());
        }

        let is_valid = errors.is_empty() && !entries.is_empty();
        StocktakeParse {
            header,
            valid_entries: entries.len(),
            entries,
            total_lines: lines.len(),
            errors,
            is_valid,
            blank_lines,
            comment_lines,
            skipped_lines,
        }
    }

    /// Generate a corrected template when parsing fails
    pub fn corrected_template(&self, command_text: &str) -> Option<String> {
        let lines: Vec<&str> = command_text.lines().collect();
        if lines.len() < 2 {
            return None;
        }

        let header_line = lines[0].trim();
        if !header_line.to_lowercase().contains("logged") {
            return Some(
                "inventory logged by: YourName\nItem Name, Quantity\nItem Name, Quantity"
                    .to_string(),
            );
        }
        Some(format!("{}\nItem Name, Quantity\nItem Name, Quantity", header_line))
    }
}

/// Parse the header line: `logged by:` is required, `date:` and `category:`
/// are optional and may appear anywhere on the line.
fn parse_header(header_line: &str) -> Option<StocktakeHeader> {
    let mut working = header_line.trim().to_string();

    // Accept the command verb on the header line
    for prefix in ["/inventory", "inventory"] {
        if working.len() > prefix.len()
            && working.is_char_boundary(prefix.len())
            && working[..prefix.len()].eq_ignore_ascii_case(prefix)
            && working.as_bytes()[prefix.len()].is_ascii_whitespace()
        {
            working = working[prefix.len()..].trim_start().to_string();
            break;
        }
    }

    let date_capture = DATE_RE
        .captures(&working)
        .map(|captures| (captures[1].to_string(), captures.get(0).expect("full match").range()));
    let date_str = match date_capture {
        Some((date, span)) => {
            working.replace_range(span, "");
            date
        },
        None => Utc::now().date_naive().format("%d/%m/%y").to_string(),
    };

    let category_capture = CATEGORY_RE
        .captures(&working)
        .map(|captures| (captures[1].to_string(), captures.get(0).expect("full match").range()));
    let category = category_capture.map(|(value, span)| {
        working.replace_range(span, "");
        value
    });

    let logged_by_text = LOGGED_BY_RE.captures(&working)?.get(1)?.as_str().trim().to_string();

    let logged_by: Vec<String> = logged_by_text
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if logged_by.is_empty() {
        return None;
    }

    let normalized_date = normalize_date(&date_str)?;

    Some(StocktakeHeader {
        date: date_str,
        normalized_date,
        logged_by,
        category,
    })
}

/// Convert DD/MM/YY to a validated date with the century rule
/// `yy < 50 -> 2000 + yy, else 1900 + yy`. Month lengths and leap years
/// are enforced.
pub fn normalize_date(date_str: &str) -> Option<NaiveDate> {
    let mut parts = date_str.split('/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || !(0..=99).contains(&year) {
        return None;
    }

    let full_year = if year < 50 { 2000 + year } else { 1900 + year };
    NaiveDate::from_ymd_opt(full_year, month, day)
}

/// Parse `Item Name, Quantity [unit phrase]`. Negative, NaN and infinite
/// counts are rejected; the unit phrase after the number is ignored
/// ("5 cans" counts 5).
fn parse_entry_line(line: &str, line_number: usize) -> Option<StocktakeEntry> {
    let trimmed = line.trim();
    let (item_name, quantity_str) = trimmed.split_once(',')?;

    let item_name = item_name.trim();
    if item_name.is_empty() {
        return None;
    }

    let quantity_str = quantity_str.trim();
    if quantity_str.starts_with('-') {
        return None;
    }

    let quantity: f64 = QUANTITY_RE.find(quantity_str)?.as_str().parse().ok()?;
    if !quantity.is_finite() {
        return None;
    }

    Some(StocktakeEntry {
        item_name: item_name.to_string(),
        quantity,
        line_number,
        raw_text: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> StocktakeParse {
        StocktakeParser::new().parse(text)
    }

    #[test]
    fn parses_header_entries_and_counts() {
        let result = parse(
            "logged by: Trevor, Dani date:15/03/25\n\
             Paint 20ltrs, 15\n\
             # counted in the yard\n\
             \n\
             Cement 50kg, 30 bags",
        );

        assert!(result.is_valid, "errors: {:?}", result.errors);
        let header = result.header.as_ref().expect("header");
        assert_eq!(header.logged_by, vec!["Trevor".to_string(), "Dani".to_string()]);
        assert_eq!(header.normalized_date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[1].quantity, 30.0);
        assert_eq!(result.comment_lines, 1);
        assert_eq!(result.blank_lines, 1);
    }

    #[test]
    fn date_defaults_to_today() {
        let result = parse("logged by: Trevor\nPaint 20ltrs, 15");
        assert!(result.is_valid, "errors: {:?}", result.errors);
        let header = result.header.expect("header");
        assert_eq!(header.normalized_date, Utc::now().date_naive());
    }

    #[test]
    fn century_rule_applies() {
        assert_eq!(normalize_date("1/2/49"), NaiveDate::from_ymd_opt(2049, 2, 1));
        assert_eq!(normalize_date("1/2/50"), NaiveDate::from_ymd_opt(1950, 2, 1));
        assert_eq!(normalize_date("31/12/99"), NaiveDate::from_ymd_opt(1999, 12, 31));
    }

    #[test]
    fn invalid_dates_are_rejected() {
        assert!(normalize_date("31/4/25").is_none()); // April has 30 days
        assert!(normalize_date("29/2/25").is_none()); // 2025 is not a leap year
        assert!(normalize_date("29/2/24").is_some()); // 2024 is
        assert!(normalize_date("0/1/25").is_none());
        assert!(normalize_date("1/13/25").is_none());
    }

    #[test]
    fn header_without_logged_by_is_invalid() {
        let result = parse("date:15/03/25\nPaint, 5");
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("Invalid header format"));
    }

    #[test]
    fn category_override_is_extracted() {
        let result = parse("logged by: Trevor category: Paint\n20l PVA primer, 4");
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(result.header.unwrap().category.as_deref(), Some("Paint"));
    }

    #[test]
    fn repeated_items_are_combined() {
        let result = parse("logged by: Trevor\nPaint 20ltrs, 5\npaint 20ltrs, 3");
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].quantity, 8.0);
    }

    #[test]
    fn negative_counts_are_rejected() {
        let result = parse("logged by: Trevor\nPaint, -5");
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("Invalid format"));
        assert_eq!(result.skipped_lines, 1);
    }

    #[test]
    fn unit_phrases_after_the_count_are_ignored() {
        let result = parse("logged by: Trevor\nWood glue, 5 cans");
        assert!(result.is_valid, "errors: {:?}", result.errors);
        assert_eq!(result.entries[0].quantity, 5.0);
    }

    #[test]
    fn entry_limit_is_enforced() {
        let mut text = String::from("logged by: Trevor\n");
        for i in 0..51 {
            text.push_str(&format!("item {}, 1\n", i));
        }
        let result = parse(&text);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.contains("Maximum of 50 entries exceeded")));
        assert_eq!(result.entries.len(), 50);
    }

    #[test]
    fn verb_prefix_on_header_is_accepted() {
        let result = parse("inventory logged by: Trevor\nPaint, 5");
        assert!(result.is_valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn corrected_template_suggests_logged_by() {
        let parser = StocktakeParser::new();
        let template = parser.corrected_template("date:1/1/25\nPaint, 5").unwrap();
        assert!(template.contains("logged by: YourName"));
    }
}
