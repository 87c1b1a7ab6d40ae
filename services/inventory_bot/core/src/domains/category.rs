//! Category heuristics for auto-created items
//!
//! The catalogue carries a closed category set. New items are routed into it
//! by keyword-matching the lowercased item name; unknown names land in
//! "General".

/// The closed category set accepted by the catalogue
pub const VALID_CATEGORIES: &[&str] = &[
    "Cement",
    "Steel",
    "Electrical",
    "Paint",
    "Plumbing",
    "Construction Materials",
    "General",
];

/// Keyword routes checked in order; first hit wins
const KEYWORD_ROUTES: &[(&str, &str)] = &[
    ("cement", "Cement"),
    ("concrete", "Cement"),
    ("mortar", "Cement"),
    ("paint", "Paint"),
    ("primer", "Paint"),
    ("varnish", "Paint"),
    ("bitumec", "Paint"),
    ("thinners", "Paint"),
    ("wire", "Electrical"),
    ("cable", "Electrical"),
    ("socket", "Electrical"),
    ("switch", "Electrical"),
    ("bulb", "Electrical"),
    ("breaker", "Electrical"),
    ("conduit", "Electrical"),
    ("floodlight", "Electrical"),
    ("solar", "Electrical"),
    ("steel", "Steel"),
    ("beam", "Steel"),
    ("rebar", "Steel"),
    ("rod", "Steel"),
    ("angle", "Steel"),
    ("nail", "Steel"),
    ("sheet", "Steel"),
    ("pipe", "Plumbing"),
    ("valve", "Plumbing"),
    ("tap", "Plumbing"),
    ("elbow", "Plumbing"),
    ("coupling", "Plumbing"),
    ("brick", "Construction Materials"),
    ("block", "Construction Materials"),
    ("sand", "Construction Materials"),
    ("gravel", "Construction Materials"),
    ("timber", "Construction Materials"),
    ("plywood", "Construction Materials"),
];

/// Detect the catalogue category for an item name
pub fn detect(item_name: &str) -> &'static str {
    let lowered = item_name.to_lowercase();
    for (keyword, category) in KEYWORD_ROUTES {
        if lowered.contains(keyword) {
            return category;
        }
    }
    "General"
}

/// Map a user-supplied category override onto the closed catalogue set.
/// Unknown overrides are routed through keyword detection of the override
/// text itself, falling back to "General".
pub fn normalize_override(raw: &str) -> &'static str {
    let trimmed = raw.trim();
    for category in VALID_CATEGORIES {
        if category.eq_ignore_ascii_case(trimmed) {
            return category;
        }
    }
    detect(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_common_materials() {
        assert_eq!(detect("Cement 50kg"), "Cement");
        assert_eq!(detect("Cable 2.5sqmm black"), "Electrical");
        assert_eq!(detect("Steel beam 6m"), "Steel");
        assert_eq!(detect("20l PVA plascon plaster primer"), "Paint");
        assert_eq!(detect("PVC pipe 110mm"), "Plumbing");
    }

    #[test]
    fn unknown_names_default_to_general() {
        assert_eq!(detect("Mystery widget"), "General");
    }

    #[test]
    fn override_accepts_closed_set_case_insensitively() {
        assert_eq!(normalize_override("paint"), "Paint");
        assert_eq!(normalize_override("ELECTRICAL"), "Electrical");
        assert_eq!(normalize_override("stuff"), "General");
    }
}
