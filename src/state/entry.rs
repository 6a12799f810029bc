use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier assigned by the backend on insert. Never reused.
pub type EntryId = i64;

pub const DEFAULT_CURRENCY: &str = "USD";

/// A single banana index record: one country's price/ripeness snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: EntryId,
    pub country: String,
    pub price_per_kg: f64,
    pub average_ripeness: f64,
    pub currency: String,
    pub last_updated: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Fully resolved record handed to a backend for insertion.
///
/// Everything except the id is decided by the service before the
/// backend sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub country: String,
    pub price_per_kg: f64,
    pub average_ripeness: f64,
    pub currency: String,
    pub last_updated: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Validated partial update. `None` fields are left untouched;
/// `last_updated` is always written.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPatch {
    pub country: Option<String>,
    pub price_per_kg: Option<f64>,
    pub average_ripeness: Option<f64>,
    pub currency: Option<String>,
    pub last_updated: NaiveDate,
}

impl EntryPatch {
    /// Merge the patch into an existing entry in place.
    pub fn apply(&self, entry: &mut IndexEntry) {
        if let Some(country) = &self.country {
            entry.country = country.clone();
        }
        if let Some(price) = self.price_per_kg {
            entry.price_per_kg = price;
        }
        if let Some(ripeness) = self.average_ripeness {
            entry.average_ripeness = ripeness;
        }
        if let Some(currency) = &self.currency {
            entry.currency = currency.clone();
        }
        entry.last_updated = self.last_updated;
    }
}

/// Raw request body for POST and PUT.
///
/// Numeric fields stay as JSON values so that both `1.3` and `"1.3"`
/// are accepted; coercion happens in the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFields {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub price_per_kg: Option<Value>,
    #[serde(default)]
    pub average_ripeness: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// The five countries the service starts with when seeding is enabled.
pub fn demo_entries() -> Vec<NewEntry> {
    const ROWS: [(&str, f64, f64, (i32, u32, u32)); 5] = [
        ("Ecuador", 1.2, 7.5, (2024, 1, 15)),
        ("Philippines", 0.85, 6.8, (2024, 1, 14)),
        ("Costa Rica", 1.45, 8.2, (2024, 1, 13)),
        ("India", 0.65, 6.5, (2024, 1, 12)),
        ("Brazil", 1.1, 7.8, (2024, 1, 11)),
    ];

    ROWS.iter()
        .filter_map(|&(country, price, ripeness, (y, m, d))| {
            let day = NaiveDate::from_ymd_opt(y, m, d)?;
            let created_at = day.and_hms_opt(0, 0, 0)?.and_utc();
            Some(NewEntry {
                country: country.to_string(),
                price_per_kg: price,
                average_ripeness: ripeness,
                currency: DEFAULT_CURRENCY.to_string(),
                last_updated: day,
                created_at,
            })
        })
        .collect()
}
