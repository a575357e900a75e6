//! Category tables and the keyword classifier.
//!
//! No LLM needed — substring matching against a fixed table covers the
//! common merchants and bank-export descriptions.

use crate::transaction::TxKind;

/// The closed set of expense category labels.
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Food & Dining",
    "Groceries",
    "Coffee & Cafe",
    "Fast Food",
    "Restaurant",
    "Transport",
    "Gas & Fuel",
    "Public Transit",
    "Rideshare",
    "Shopping",
    "Clothing",
    "Electronics",
    "Home & Garden",
    "Bills & Utilities",
    "Electricity",
    "Water",
    "Internet",
    "Phone",
    "Entertainment",
    "Movies & Shows",
    "Gaming",
    "Streaming Services",
    "Health & Wellness",
    "Pharmacy",
    "Medical",
    "Fitness",
    "Education",
    "Books",
    "Courses",
    "Travel",
    "Hotels",
    "Flights",
    "Personal Care",
    "Beauty",
    "Haircare",
    "Pets",
    "Insurance",
    "Subscriptions",
    "Gifts",
    "Charity",
    "Other",
];

/// Income category labels.
pub const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Freelance",
    "Investment",
    "Gift",
    "Refund",
    "Other",
];

/// Keyword table for category detection. Declaration order is match priority:
/// the first category whose keyword list hits wins.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Food & Dining", &["food", "restaurant", "dining", "meal", "lunch", "dinner", "breakfast"]),
    ("Groceries", &["grocery", "supermarket", "market", "whole foods", "trader joe", "costco", "walmart"]),
    ("Coffee & Cafe", &["coffee", "cafe", "starbucks", "dunkin", "tea"]),
    ("Fast Food", &["mcdonald", "burger", "kfc", "taco bell", "wendy", "pizza", "subway"]),
    ("Transport", &["transport", "transit", "bus", "train", "metro"]),
    ("Gas & Fuel", &["gas", "fuel", "shell", "chevron", "exxon", "bp", "petrol"]),
    ("Rideshare", &["uber", "lyft", "grab", "taxi", "cab"]),
    ("Shopping", &["shopping", "retail", "store", "amazon", "target", "purchase"]),
    ("Clothing", &["clothing", "clothes", "apparel", "fashion", "nike", "adidas", "h&m", "zara"]),
    ("Electronics", &["electronic", "tech", "apple", "best buy", "computer", "phone"]),
    ("Bills & Utilities", &["bill", "utility", "utilities"]),
    ("Electricity", &["electric", "power", "energy"]),
    ("Water", &["water"]),
    ("Internet", &["internet", "wifi", "broadband", "isp"]),
    ("Phone", &["phone", "mobile", "cellular", "verizon", "at&t", "t-mobile"]),
    ("Entertainment", &["entertainment", "fun", "leisure"]),
    ("Movies & Shows", &["movie", "cinema", "theater", "netflix", "hulu"]),
    ("Streaming Services", &["spotify", "netflix", "disney", "hbo", "streaming", "subscription"]),
    ("Health & Wellness", &["health", "wellness", "medical", "doctor", "hospital"]),
    ("Pharmacy", &["pharmacy", "cvs", "walgreens", "medicine", "drug"]),
    ("Fitness", &["gym", "fitness", "workout", "exercise"]),
    ("Education", &["education", "school", "university", "college", "course", "tuition"]),
    ("Books", &["book", "kindle", "reading"]),
    ("Travel", &["travel", "trip", "vacation"]),
    ("Hotels", &["hotel", "airbnb", "lodging", "accommodation"]),
    ("Flights", &["flight", "airline", "airport", "aviation"]),
    ("Personal Care", &["personal care", "grooming"]),
    ("Beauty", &["beauty", "cosmetic", "makeup", "skincare"]),
    ("Haircare", &["hair", "salon", "barber", "haircut"]),
    ("Pets", &["pet", "vet", "veterinary", "dog", "cat"]),
    ("Insurance", &["insurance"]),
    ("Salary", &["salary", "payroll", "wage", "income", "paycheck"]),
    ("Freelance", &["freelance", "consulting", "contract"]),
    ("Investment", &["investment", "dividend", "stock", "interest"]),
    ("Gift", &["gift", "present"]),
    ("Refund", &["refund", "return", "cashback"]),
];

const INCOME_KEYWORDS: &[&str] = &[
    "salary",
    "income",
    "deposit",
    "transfer in",
    "refund",
    "cashback",
    "dividend",
    "interest",
    "payment received",
];

/// Map free text (note + merchant) to a category label. Returns the first
/// category in table order with a keyword hit, else `Other`.
pub fn detect_category(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| lower.contains(k)) {
            return category;
        }
    }
    "Other"
}

/// Infer expense vs. income from free text.
///
/// The amount's sign is deliberately not consulted: bank exports disagree on
/// whether charges are positive or negative, so only keyword evidence flips
/// a row to income.
pub fn detect_kind(_amount: f64, text: &str) -> TxKind {
    let lower = text.to_lowercase();
    if INCOME_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return TxKind::Income;
    }
    TxKind::Expense
}
