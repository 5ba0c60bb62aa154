//! Vendor label normalization
//!
//! The remote classifier speaks its own vocabulary ("Food and Drink",
//! "Auto & Transport", "Shops", ...). Labels are normalized (case, separators,
//! "and" and "/" vs "&") and then looked up here.

use crate::models::Category;

const LABEL_ALIASES: &[(&str, Category)] = &[
    // Groceries
    ("groceries", Category::Groceries),
    ("grocery", Category::Groceries),
    ("supermarket", Category::Groceries),
    ("supermarkets", Category::Groceries),
    ("food & groceries", Category::Groceries),
    // Dining
    ("dining", Category::Dining),
    ("food", Category::Dining),
    ("food & drink", Category::Dining),
    ("restaurant", Category::Dining),
    ("restaurants", Category::Dining),
    ("fast food", Category::Dining),
    ("coffee shop", Category::Dining),
    ("coffee shops", Category::Dining),
    ("bars", Category::Dining),
    ("dining out", Category::Dining),
    // Utilities
    ("utilities", Category::Utilities),
    ("utility", Category::Utilities),
    ("bills", Category::Utilities),
    ("bills & utilities", Category::Utilities),
    ("phone", Category::Utilities),
    ("internet", Category::Utilities),
    ("telecommunication", Category::Utilities),
    // Transportation
    ("transportation", Category::Transportation),
    ("transport", Category::Transportation),
    ("travel", Category::Transportation),
    ("auto & transport", Category::Transportation),
    ("gas", Category::Transportation),
    ("gas stations", Category::Transportation),
    ("fuel", Category::Transportation),
    ("taxi", Category::Transportation),
    ("ride share", Category::Transportation),
    ("public transportation", Category::Transportation),
    ("airlines", Category::Transportation),
    // Entertainment
    ("entertainment", Category::Entertainment),
    ("arts & entertainment", Category::Entertainment),
    ("recreation", Category::Entertainment),
    ("movies", Category::Entertainment),
    ("music", Category::Entertainment),
    ("streaming", Category::Entertainment),
    ("subscriptions", Category::Entertainment),
    ("games", Category::Entertainment),
    // Shopping
    ("shopping", Category::Shopping),
    ("shops", Category::Shopping),
    ("merchandise", Category::Shopping),
    ("general merchandise", Category::Shopping),
    ("retail", Category::Shopping),
    ("clothing", Category::Shopping),
    ("electronics", Category::Shopping),
    // Healthcare
    ("healthcare", Category::Healthcare),
    ("health", Category::Healthcare),
    ("health & fitness", Category::Healthcare),
    ("medical", Category::Healthcare),
    ("pharmacy", Category::Healthcare),
    ("doctor", Category::Healthcare),
    // Housing
    ("housing", Category::Housing),
    ("home", Category::Housing),
    ("rent", Category::Housing),
    ("mortgage", Category::Housing),
    ("rent & mortgage", Category::Housing),
    // Education
    ("education", Category::Education),
    ("tuition", Category::Education),
    ("school", Category::Education),
    // Transfers
    ("transfers", Category::Transfers),
    ("transfer", Category::Transfers),
    ("payment", Category::Transfers),
    ("payments", Category::Transfers),
    ("p2p", Category::Transfers),
    // Explicit "no category" answers
    ("uncategorized", Category::Uncategorized),
    ("other", Category::Uncategorized),
    ("misc", Category::Uncategorized),
    ("miscellaneous", Category::Uncategorized),
    ("general", Category::Uncategorized),
    ("unknown", Category::Uncategorized),
];

/// Canonical form of a vendor label
pub fn normalize_label(label: &str) -> String {
    let lowered = label
        .trim()
        .to_lowercase()
        .replace('/', " & ")
        .replace(['_', '-'], " ");
    lowered
        .split_whitespace()
        .map(|word| if word == "and" { "&" } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look up a vendor label, `None` when it is not in the table
pub fn lookup_label(label: &str) -> Option<Category> {
    let normalized = normalize_label(label);
    LABEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, category)| *category)
}

/// Map a vendor label onto the local enumeration
///
/// Unrecognized labels become `uncategorized` and are logged, never dropped.
pub fn map_label(label: &str) -> Category {
    lookup_label(label).unwrap_or_else(|| {
        tracing::warn!(label = %label, "Unrecognized remote category label, using uncategorized");
        Category::Uncategorized
    })
}
