//! Keyword tables shared read-only by every resolver.

use serde::{Deserialize, Serialize};

/// A keyword and the description label it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLabel {
    pub keyword: String,
    pub label: String,
}

impl TypeLabel {
    fn new(keyword: &str, label: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            label: label.to_string(),
        }
    }
}

/// Keyword configuration for amount, description and type resolution.
///
/// Built once at startup (defaults or JSON config), normalized once with
/// [`KeywordTables::normalized`], then passed by reference. Matching is
/// case-insensitive substring matching against lower-cased text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTables {
    /// Terms marking a line as carrying the payable total.
    pub total: Vec<String>,

    /// Terms that boost a total line to the highest priority.
    pub grand_total: Vec<String>,

    /// Terms marking a line as a decoy (tax, fee, item price, contact info).
    pub ignore: Vec<String>,

    /// Well-known merchants, matched anywhere in the text and returned verbatim.
    pub known_merchants: Vec<String>,

    /// Income indicators.
    pub income: Vec<String>,

    /// Expense indicators.
    pub expense: Vec<String>,

    /// Fallback description labels, in priority order.
    pub transaction_labels: Vec<TypeLabel>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            total: strings(&[
                "total", "grand total", "net amount", "amount due", "amount payable",
                "bill amount", "final amount", "total amount", "total payable",
                "you paid", "paid amount", "payment", "balance", "net total",
                "amount paid", "total paid", "invoice total", "order total",
                "charged", "debit", "credit", "paid",
                "transferred", "received", "deposited", "withdrawn",
            ]),
            grand_total: strings(&["grand total", "net amount"]),
            ignore: strings(&[
                "subtotal", "sub total", "sub-total",
                "cgst", "sgst", "igst", "gst", "tax", "vat", "service charge",
                "delivery charge", "discount", "offer", "saved", "savings",
                "tip", "cashback", "wallet", "points", "rewards",
                "packing charge", "convenience fee", "handling charge",
                "item", "qty", "quantity", "price", "rate", "mrp",
                "phone", "mobile", "email", "address", "pincode", "gstin",
            ]),
            known_merchants: strings(&[
                "Zomato", "Swiggy", "Uber", "Ola", "Amazon", "Flipkart", "Myntra", "Ajio",
                "Starbucks", "McDonalds", "KFC", "Dominos", "Pizza Hut", "Burger King",
                "Subway", "Dmart", "BigBasket", "Blinkit", "Zepto", "Dunzo",
            ]),
            income: strings(&[
                "credit", "credited", "received", "deposit", "deposited",
                "salary", "payment received", "refund", "cashback",
                "transferred to your account", "added to", "income",
            ]),
            expense: strings(&[
                "debit", "debited", "paid", "payment", "purchase",
                "withdrawn", "transferred from your account", "expense",
                "bill", "invoice", "order", "booking",
            ]),
            transaction_labels: vec![
                TypeLabel::new("payment", "Payment Transaction"),
                TypeLabel::new("transfer", "Fund Transfer"),
                TypeLabel::new("deposit", "Deposit"),
                TypeLabel::new("withdrawal", "Withdrawal"),
                TypeLabel::new("purchase", "Purchase"),
                TypeLabel::new("refund", "Refund"),
                TypeLabel::new("food", "Food Order"),
                TypeLabel::new("cab", "Cab Service"),
                TypeLabel::new("trip", "Trip"),
                TypeLabel::new("ride", "Ride"),
            ],
        }
    }
}

impl KeywordTables {
    /// Trim every entry, lower-case matching keywords and drop empty entries.
    ///
    /// Merchant names and labels keep their casing; they are returned as
    /// descriptions.
    pub fn normalized(mut self) -> Self {
        for list in [
            &mut self.total,
            &mut self.grand_total,
            &mut self.ignore,
            &mut self.income,
            &mut self.expense,
        ] {
            lowercase_all(list);
        }
        for merchant in &mut self.known_merchants {
            *merchant = merchant.trim().to_string();
        }
        self.known_merchants.retain(|m| !m.is_empty());
        for entry in &mut self.transaction_labels {
            entry.keyword = entry.keyword.trim().to_lowercase();
            entry.label = entry.label.trim().to_string();
        }
        self.transaction_labels
            .retain(|e| !e.keyword.is_empty() && !e.label.is_empty());
        self
    }

    /// `line_lower` contains a total keyword.
    pub fn has_total(&self, line_lower: &str) -> bool {
        contains_any(line_lower, &self.total)
    }

    /// `line_lower` contains a grand-total marker.
    pub fn has_grand_total(&self, line_lower: &str) -> bool {
        contains_any(line_lower, &self.grand_total)
    }

    /// `line_lower` contains an ignore keyword.
    pub fn is_ignored(&self, line_lower: &str) -> bool {
        contains_any(line_lower, &self.ignore)
    }
}

fn lowercase_all(list: &mut Vec<String>) {
    for item in list.iter_mut() {
        *item = item.trim().to_lowercase();
    }
    list.retain(|s| !s.is_empty());
}

pub(crate) fn contains_any(haystack_lower: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| haystack_lower.contains(k.as_str()))
}
