//! Similarity kernel for duplicate detection
//!
//! Construction catalogues routinely reorder descriptors ("cement 50kg bags"
//! vs "50kg cement bags"), so matching is a bag-of-keywords comparison with a
//! quantity guard rather than edit distance or substring matching.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Words ignored during keyword extraction
const STOPWORDS: &[&str] = &[
    "the", "and", "or", "of", "in", "on", "at", "to", "for", "with", "by", "a", "an", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should",
];

/// Units that pair with a number to form a quantity token. These are removed
/// from keywords and drive quantity extraction.
const QUANTITY_UNITS: &[&str] = &[
    "piece", "pieces", "bag", "bags", "box", "boxes", "meter", "meters", "metre", "metres", "m",
    "liter", "liters", "litre", "litres", "ltr", "ltrs", "l", "kg", "kgs", "kilo", "kilos", "ton",
    "tons", "tonne", "tonnes", "roll", "rolls", "bundle", "bundles", "carton", "cartons", "set",
    "sets", "pair", "pairs", "unit", "units", "can", "cans", "bottle", "bottles", "sheet",
    "sheets", "gallon", "gallons", "dozen", "dozens", "ft", "feet", "foot",
];

/// Thickness and cross-section units. A number carrying one of these is a
/// descriptor that stays in the item name; it never becomes the base
/// quantity and the effective unit remains "piece".
const DIMENSION_UNITS: &[&str] = &["mm", "cm", "inch", "inches", "sqmm", "sqm"];

/// Relative tolerance within which two quantities count as the same
const QUANTITY_TOLERANCE: f64 = 0.1;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z0-9]+(?:\.[a-z0-9]+)?").expect("token pattern"));

static NUMBER_UNIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*([a-z]*)").expect("number-unit pattern"));

pub fn is_quantity_unit(word: &str) -> bool {
    QUANTITY_UNITS.contains(&word)
}

pub fn is_dimension_unit(word: &str) -> bool {
    DIMENSION_UNITS.contains(&word)
}

/// Canonical singular form of a unit word ("bags" -> "bag", "kgs" -> "kg")
pub fn canonical_unit(unit: &str) -> String {
    let lowered = unit.to_lowercase();
    if let Some(stripped) = lowered.strip_suffix('s') {
        if QUANTITY_UNITS.contains(&stripped) || DIMENSION_UNITS.contains(&stripped) {
            return stripped.to_string();
        }
    }
    lowered
}

/// Lowercase, trim, turn `-`/`_` into spaces, collapse whitespace
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the first quantity token from an item name.
///
/// The first `<number>[<unit>]` occurrence wins, where the unit is drawn
/// from the closed quantity vocabulary or absent (bare number defaults to
/// "piece"). Numbers attached to dimension units and numbers attached to
/// unknown words (model codes) are skipped as descriptors.
pub fn extract_quantity(text: &str) -> (f64, String) {
    let normalized = normalize(text);

    for captures in NUMBER_UNIT_RE.captures_iter(&normalized) {
        let number: f64 = match captures[1].parse() {
            Ok(value) => value,
            Err(_) => continue,
        };
        let unit = &captures[2];

        if unit.is_empty() {
            return (number, "piece".to_string());
        }
        if is_dimension_unit(unit) {
            continue;
        }
        if is_quantity_unit(unit) {
            return (number, canonical_unit(unit));
        }
        // Unknown suffix (e.g. a model code): not a quantity token
    }

    (0.0, "piece".to_string())
}

/// Tokenize a normalized name, keeping embedded decimals as one token
fn tokenize(normalized: &str) -> Vec<String> {
    TOKEN_RE
        .find_iter(normalized)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Split a fused token like "50kg" into its number and unit parts
fn split_number_unit(token: &str) -> Option<(&str, &str)> {
    let split_at = token.find(|c: char| c.is_ascii_alphabetic())?;
    let (number, unit) = token.split_at(split_at);
    if is_number(number) && !unit.is_empty() {
        Some((number, unit))
    } else {
        None
    }
}

/// Extract keywords from an item name: stopwords, single characters, and
/// quantity tokens (number + quantity-unit pairs, fused or spaced) are
/// dropped. Dimension descriptors such as "12mm" survive as keywords.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let tokens = tokenize(&normalized);

    let mut keywords = Vec::new();
    let mut skip_next = false;
    for (i, token) in tokens.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }

        // Fused quantity token: "50kg"
        if let Some((_, unit)) = split_number_unit(token) {
            if is_quantity_unit(unit) {
                continue;
            }
        }

        // Spaced quantity token: "50 kg"
        if is_number(token) {
            if let Some(next) = tokens.get(i + 1) {
                if is_quantity_unit(next) {
                    skip_next = true;
                    continue;
                }
            }
        }

        if token.len() > 1 && !STOPWORDS.contains(&token.as_str()) {
            keywords.push(token.clone());
        }
    }

    keywords
}

/// Whether two extracted quantities are close enough to be the same stock
/// item: both zero, or relative difference within 10% of the larger.
pub fn quantities_similar(q1: f64, q2: f64) -> bool {
    if q1 == 0.0 && q2 == 0.0 {
        return true;
    }
    if q1 == 0.0 || q2 == 0.0 {
        return false;
    }
    let diff = (q1 - q2).abs() / q1.abs().max(q2.abs());
    diff <= QUANTITY_TOLERANCE
}

/// Similarity score between two item names, in [0, 1].
///
/// Keyword sets must overlap in all but at most one keyword
/// (order-independent); quantity agreement then lifts the score into the
/// 0.7..=1.0 band, quantity divergence caps it at 0.6.
pub fn score(a: &str, b: &str) -> f64 {
    let keywords_a = extract_keywords(a);
    let keywords_b = extract_keywords(b);

    if keywords_a.is_empty() || keywords_b.is_empty() {
        return 0.0;
    }

    let set_a: HashSet<&str> = keywords_a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = keywords_b.iter().map(String::as_str).collect();

    let exact = set_a.intersection(&set_b).count();
    let total = set_a.len().max(set_b.len());

    // Allow at most one missing keyword, and require at least one to match
    if exact < 1 || exact + 1 < total {
        return 0.0;
    }

    let (qty_a, _) = extract_quantity(a);
    let (qty_b, _) = extract_quantity(b);

    if !quantities_similar(qty_a, qty_b) {
        return 0.6;
    }

    let normalized_a = normalize(a);
    let normalized_b = normalize(b);
    if normalized_a == normalized_b {
        return 1.0;
    }

    let mut base = 0.7 + 0.3 * (exact as f64 / total as f64);
    if keywords_a.first() == keywords_b.first() {
        base += 0.1;
    }
    base.min(1.0)
}

/// Extract the unit specification embedded in an item name for auto-created
/// items: the trailing `<number><unit>` pattern wins ("Paint 20ltrs" ->
/// (20, "ltrs")). Defaults to (1, "piece").
pub fn extract_unit_spec(item_name: &str) -> (f64, String) {
    let normalized = normalize(item_name);

    let mut spec: Option<(f64, String)> = None;
    for captures in NUMBER_UNIT_RE.captures_iter(&normalized) {
        let unit = captures[2].to_string();
        if unit.is_empty() || (!is_quantity_unit(&unit) && !is_dimension_unit(&unit)) {
            continue;
        }
        if let Ok(number) = captures[1].parse::<f64>() {
            if number > 0.0 {
                spec = Some((number, unit));
            }
        }
    }

    spec.unwrap_or((1.0, "piece".to_string()))
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn score_stays_in_unit_range(a in "[a-z0-9 ]{0,40}", b in "[a-z0-9 ]{0,40}") {
            let s = score(&a, &b);
            prop_assert!((0.0..=1.0).contains(&s), "score({:?}, {:?}) = {}", a, b, s);
        }

        #[test]
        fn score_is_symmetric_for_arbitrary_names(a in "[a-z0-9 ]{0,40}", b in "[a-z0-9 ]{0,40}") {
            prop_assert_eq!(score(&a, &b), score(&b, &a));
        }

        #[test]
        fn keywords_never_contain_stopwords(name in "[a-z0-9 ]{0,40}") {
            for keyword in extract_keywords(&name) {
                prop_assert!(!STOPWORDS.contains(&keyword.as_str()));
                prop_assert!(keyword.len() > 1);
            }
        }
    }
}
