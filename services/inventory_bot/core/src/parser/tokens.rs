//! Line tokenizer shared by the movement and stocktake parsers

use once_cell::sync::Lazy;
use regex::Regex;

use crate::similarity;

/// Keys recognized in metadata blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKey {
    Project,
    Driver,
    From,
    To,
}

impl ParamKey {
    pub const ALL: [ParamKey; 4] = [ParamKey::Project, ParamKey::Driver, ParamKey::From, ParamKey::To];

    pub fn token(&self) -> &'static str {
        match self {
            ParamKey::Project => "project:",
            ParamKey::Driver => "driver:",
            ParamKey::From => "from:",
            ParamKey::To => "to:",
        }
    }
}

/// One classified input line
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent<'a> {
    /// `-batch N-` segment header
    BatchHeader(u32),
    /// A metadata line carrying one or more `key: value` parameters
    Params(Vec<(ParamKey, String)>),
    /// A line that looks like an item entry (comma followed by a number)
    ItemLine(&'a str),
    /// `# ...`
    Comment(&'a str),
    Blank,
    /// Anything else
    Other(&'a str),
}

static BATCH_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-batch\s+(\d+)-$").expect("batch header pattern"));

static HAS_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number pattern"));

/// First `<sign><number> <unit-from-vocab>` occurrence in an entry; the
/// unit must be separated by whitespace so dimensions fused to descriptors
/// ("12mm", "2.5sqmm") stay part of the item name.
static QTY_UNIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s+([a-z]+)(?:\s|$|,|;)").expect("quantity-unit pattern")
});

/// Classify one line of input
pub fn classify_line(line: &str) -> LineEvent<'_> {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return LineEvent::Blank;
    }
    if trimmed.starts_with('#') {
        return LineEvent::Comment(trimmed);
    }
    if let Some(captures) = BATCH_HEADER_RE.captures(trimmed) {
        if let Ok(number) = captures[1].parse::<u32>() {
            return LineEvent::BatchHeader(number);
        }
    }
    if starts_with_param(trimmed) {
        let params = parse_params(trimmed);
        if !params.is_empty() {
            return LineEvent::Params(params);
        }
    }
    if is_item_line(trimmed) {
        return LineEvent::ItemLine(trimmed);
    }
    LineEvent::Other(trimmed)
}

fn starts_with_param(line: &str) -> bool {
    let lowered = line.to_ascii_lowercase();
    ParamKey::ALL.iter().any(|key| lowered.starts_with(key.token()))
}

/// Item lines contain a comma followed somewhere by a number
pub fn is_item_line(line: &str) -> bool {
    line.contains(',') && HAS_NUMBER_RE.is_match(line)
}

/// Scan a metadata line for `key: value` pairs. Values run until the next
/// key or the end of the line, with trailing commas trimmed, so commas
/// inside values survive.
pub fn parse_params(text: &str) -> Vec<(ParamKey, String)> {
    // Byte-preserving lowering keeps the offsets valid for slicing `text`
    let lowered = text.to_ascii_lowercase();

    // Locate every key occurrence, then slice values between them
    let mut positions: Vec<(usize, ParamKey)> = Vec::new();
    for key in ParamKey::ALL {
        let mut search_from = 0;
        while let Some(found) = lowered[search_from..].find(key.token()) {
            let at = search_from + found;
            // Keys must start a line or follow a separator, so "to:" inside
            // a word is not a key
            let at_boundary = at == 0
                || matches!(lowered.as_bytes()[at - 1], b' ' | b',' | b';' | b'\t');
            if at_boundary {
                positions.push((at, key));
            }
            search_from = at + key.token().len();
        }
    }
    positions.sort_by_key(|(at, _)| *at);

    let mut params = Vec::new();
    for (i, (at, key)) in positions.iter().enumerate() {
        let value_start = at + key.token().len();
        let value_end = positions.get(i + 1).map(|(next, _)| *next).unwrap_or(text.len());
        let value = text[value_start..value_end]
            .trim()
            .trim_end_matches(',')
            .trim()
            .to_string();
        if !value.is_empty() {
            params.push((*key, value));
        }
    }
    params
}

/// A quantity-unit token located inside an entry
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityToken {
    pub quantity: f64,
    pub unit: String,
    /// Byte offset where the token starts
    pub start: usize,
    /// Byte offset just past the unit word
    pub end: usize,
}

/// Find the first `<number> <unit>` token in an entry, where the unit word
/// belongs to the closed unit vocabulary.
pub fn find_quantity_unit(entry: &str) -> Option<QuantityToken> {
    for captures in QTY_UNIT_RE.captures_iter(entry) {
        let unit_match = captures.get(2).expect("unit group");
        let unit_word = unit_match.as_str().to_lowercase();
        let singular = similarity::canonical_unit(&unit_word);
        if !similarity::is_quantity_unit(singular.as_str())
            && !similarity::is_quantity_unit(unit_word.as_str())
        {
            continue;
        }
        let quantity: f64 = captures[1].parse().ok()?;
        let number_match = captures.get(1).expect("number group");
        return Some(QuantityToken {
            quantity,
            unit: singular,
            start: number_match.start(),
            end: unit_match.end(),
        });
    }
    None
}

/// First bare number in a fragment (used when no unit word is present)
pub fn find_bare_quantity(fragment: &str) -> Option<f64> {
    let m = HAS_NUMBER_RE.find(fragment)?;
    // Re-attach a leading minus sign if one directly precedes the number
    let with_sign = if m.start() > 0 && fragment.as_bytes()[m.start() - 1] == b'-' {
        &fragment[m.start() - 1..m.end()]
    } else {
        m.as_str()
    };
    with_sign.parse().ok()
}
