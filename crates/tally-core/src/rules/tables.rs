//! Static merchant and pattern database for the rule engine
//!
//! Every table is scanned top to bottom and the first hit wins, so the order of
//! entries (and of categories inside a table) is part of the behavior. All
//! strings are lowercase; descriptions are lowercased before matching.

use crate::models::Category;

/// Phrases that mark money moving between accounts rather than spending.
///
/// Kept as multi-word phrases: bare "ach" or "wire" would hit "coach" or
/// "wireless".
pub const FINANCIAL_MOVEMENT_MARKERS: &[&str] = &[
    "ach electronic",
    "ach debit",
    "ach credit",
    "ach pmt",
    "ach payment",
    "ach transfer",
    "wire transfer",
    "wire trf",
    "incoming wire",
    "outgoing wire",
    "direct deposit",
    "mobile deposit",
    "deposit",
];

/// Peer-to-peer payment services, always `transfers`
pub const P2P_MARKERS: &[&str] = &[
    "venmo",
    "zelle",
    "cash app",
    "square cash",
    "paypal transfer",
    "apple cash",
];

/// Brand that is either a ride or a food delivery
pub const RIDESHARE_BRAND: &str = "uber";

/// Sub-tokens that turn the rideshare brand into a food order
pub const DELIVERY_SUBTOKENS: &[&str] = &["eats", "eat ", "food"];

/// Known merchants by category (exact-name stage)
pub const MERCHANTS: &[(Category, &[&str])] = &[
    (
        Category::Groceries,
        &[
            "whole foods",
            "wholefds",
            "trader joe",
            "safeway",
            "kroger",
            "publix",
            "aldi",
            "wegmans",
            "sprouts",
            "h-e-b",
            "food lion",
            "instacart",
            "albertsons",
            "giant eagle",
        ],
    ),
    (
        Category::Dining,
        &[
            "starbucks",
            "mcdonald",
            "chipotle",
            "doordash",
            "grubhub",
            "dunkin",
            "subway",
            "domino",
            "taco bell",
            "panera",
            "chick-fil-a",
            "wendy's",
            "burger king",
            "applebee",
        ],
    ),
    (
        Category::Utilities,
        &[
            "comcast",
            "xfinity",
            "verizon",
            "at&t",
            "t-mobile",
            "pg&e",
            "duke energy",
            "con edison",
            "spectrum",
            "waste management",
        ],
    ),
    (
        Category::Transportation,
        &[
            "lyft",
            "shell oil",
            "chevron",
            "exxonmobil",
            "mobil gas",
            "delta air",
            "united airlines",
            "southwest air",
            "amtrak",
            "hertz",
            "enterprise rent",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "netflix",
            "spotify",
            "hulu",
            "disney plus",
            "disney+",
            "hbo max",
            "steam games",
            "playstation",
            "xbox",
            "amc theatres",
            "ticketmaster",
            "regal cinemas",
        ],
    ),
    (
        Category::Shopping,
        &[
            "walmart",
            "target",
            "costco",
            "best buy",
            "home depot",
            "lowe's",
            "ikea",
            "etsy",
            "ebay",
            "macy's",
            "nordstrom",
            "tj maxx",
        ],
    ),
    (
        Category::Healthcare,
        &[
            "cvs",
            "walgreens",
            "rite aid",
            "kaiser",
            "labcorp",
            "quest diagnostics",
            "one medical",
        ],
    ),
    (
        Category::Housing,
        &["zillow", "greystar", "avalon communities", "equity residential"],
    ),
    (
        Category::Education,
        &["coursera", "udemy", "chegg", "khan academy", "pearson", "edx.org"],
    ),
];

/// Terms that move the e-commerce brand into entertainment
pub const ECOMMERCE_BRANDS: &[&str] = &["amazon", "amzn"];
pub const ECOMMERCE_MEDIA_TERMS: &[&str] = &[
    "prime video",
    "primevideo",
    "prime membership",
    "kindle unlimited",
    "audible",
    "music",
];

pub const VIDEO_BRAND: &str = "youtube";
pub const VIDEO_PREMIUM_TERMS: &[&str] = &["premium", "tv"];

pub const APPLE_BRAND: &str = "apple";
pub const APPLE_MEDIA_TERMS: &[&str] = &["apple.com/bill", "itunes", "apple music", "apple tv"];
pub const APPLE_RETAIL_TERMS: &[&str] = &["apple store", "apple online"];

pub const GOOGLE_BRAND: &str = "google";
pub const GOOGLE_STORAGE_TERMS: &[&str] = &["google storage", "google one"];
pub const GOOGLE_MEDIA_TERMS: &[&str] = &["google play"];

/// Generic keywords by category with the confidence of a hit
pub const KEYWORDS: &[(Category, f64, &[&str])] = &[
    (
        Category::Healthcare,
        0.90,
        &[
            "pharmacy",
            "medical",
            "dental",
            "clinic",
            "hospital",
            "doctor",
            "urgent care",
            "optometr",
            "health",
        ],
    ),
    (
        Category::Education,
        0.92,
        &[
            "tuition",
            "university",
            "college",
            "school",
            "textbook",
            "academy",
        ],
    ),
    (
        Category::Housing,
        0.90,
        &[
            "rent payment",
            "rent pmt",
            "mortgage",
            "hoa dues",
            "landlord",
            "property mgmt",
            "property management",
            "apartment",
        ],
    ),
    (
        Category::Utilities,
        0.88,
        &[
            "electric",
            "power co",
            "water bill",
            "utility",
            "internet",
            "wireless",
            "broadband",
            "sewer",
        ],
    ),
    (
        Category::Groceries,
        0.85,
        &[
            "grocery",
            "supermarket",
            "farmers market",
            "produce",
            "butcher",
        ],
    ),
    (
        Category::Dining,
        0.82,
        &[
            "restaurant",
            "pizza",
            "sushi",
            "burger",
            "taqueria",
            "bistro",
            "diner",
            "bakery",
            "grill",
            "coffee",
        ],
    ),
    (
        Category::Transportation,
        0.85,
        &[
            "fuel",
            "gas station",
            "parking",
            "toll",
            "taxi",
            "airline",
            "transit",
            "metro",
        ],
    ),
    (
        Category::Entertainment,
        0.80,
        &[
            "cinema",
            "theater",
            "theatre",
            "concert",
            "tickets",
            "museum",
            "bowling",
            "arcade",
        ],
    ),
    (
        Category::Shopping,
        0.78,
        &["store", "outlet", "mall", "boutique", "retail", "shop"],
    ),
];

/// Movement language that forces `uncategorized` in the pattern stage
pub const MOVEMENT_PHRASES: &[&str] = &[
    "withdrawal",
    "transfer",
    "xfer",
    "card payment",
    "payment with card",
];

/// Short movement tokens that only count as whole words ("atm" lives inside
/// "treatment")
pub const MOVEMENT_WORDS: &[&str] = &["atm"];

/// Ceiling for the "small recurring charge" heuristic
pub const SUBSCRIPTION_MAX_AMOUNT: f64 = 30.0;

pub const SUBSCRIPTION_TERMS: &[&str] = &[
    "subscription",
    "monthly",
    "membership",
    "recurring",
    "renewal",
];
pub const SUBSCRIPTION_MEDIA_TERMS: &[&str] =
    &["stream", "video", "music", "tv", "plus", "premium", "games"];
pub const SUBSCRIPTION_SERVICE_TERMS: &[&str] =
    &["phone", "internet", "cloud", "storage", "wireless", "mobile"];
pub const SUBSCRIPTION_FITNESS_TERMS: &[&str] = &["gym", "fitness"];

/// Point-of-sale aggregator prefixes
pub const POS_PREFIXES: &[(&str, Category, f64)] = &[
    ("tst*", Category::Dining, 0.75),
    ("sq *", Category::Shopping, 0.60),
];

/// Large lease-style charges
pub const LEASE_MIN_AMOUNT: f64 = 800.0;
pub const LEASE_TERMS: &[&str] = &["lease", "property"];

/// Amount buckets for the smart default stage: (minimum amount, category, confidence)
///
/// Scanned top to bottom, the first bucket whose minimum is reached wins.
pub const AMOUNT_BUCKETS: &[(f64, Category, f64)] = &[
    (1000.0, Category::Housing, 0.45),
    (200.0, Category::Shopping, 0.30),
    (50.0, Category::Groceries, 0.35),
    (15.0, Category::Shopping, 0.25),
    (0.01, Category::Dining, 0.40),
];
