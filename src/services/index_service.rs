use chrono::Utc;
use serde_json::Value;

use crate::errors::{IndexError, IndexResult};
use crate::persistence::Backend;
use crate::state::entry::{
    EntryFields, EntryId, EntryPatch, IndexEntry, NewEntry, DEFAULT_CURRENCY,
};

const REQUIRED_FIELDS: &str = "Country, price per kg, and average ripeness are required";
const MAX_COUNTRY_LEN: usize = 100;

/// Decimal places kept for price and ripeness, same as the table columns.
const PRICE_SCALE: i32 = 2;
const RIPENESS_SCALE: i32 = 1;

// A field counts as supplied when it is present, not null, and not an empty
// or blank string. Numeric zero is supplied; the domain checks decide if it
// is valid. Presence is settled before any value is parsed.

/// Return every entry, oldest first.
pub async fn list(store: &dyn Backend) -> IndexResult<Vec<IndexEntry>> {
    store.list().await
}

/// Validate `fields`, stamp the dates, and store a new entry.
pub async fn create(store: &dyn Backend, fields: EntryFields) -> IndexResult<IndexEntry> {
    let (Some(country), Some(price), Some(ripeness)) = (
        supplied_text(fields.country),
        supplied_value(fields.price_per_kg),
        supplied_value(fields.average_ripeness),
    ) else {
        return Err(IndexError::Validation(REQUIRED_FIELDS.to_string()));
    };

    let currency = match supplied_text(fields.currency) {
        Some(code) => check_currency(code)?,
        None => DEFAULT_CURRENCY.to_string(),
    };

    let now = Utc::now();
    let entry = NewEntry {
        country: check_country(country)?,
        price_per_kg: check_price(parse_number("Price per kg", price)?)?,
        average_ripeness: check_ripeness(parse_number("Average ripeness", ripeness)?)?,
        currency,
        last_updated: now.date_naive(),
        created_at: now,
    };

    let created = store.insert(entry).await?;
    tracing::info!("Created entry {} ({})", created.id, created.country);
    Ok(created)
}

/// Look up one entry by the id segment of the path.
pub async fn get(store: &dyn Backend, raw_id: &str) -> IndexResult<IndexEntry> {
    let id = parse_id(raw_id)?;
    store
        .get(id)
        .await?
        .ok_or_else(|| IndexError::NotFound(raw_id.to_string()))
}

/// Overwrite the supplied fields and refresh `lastUpdated`.
///
/// An unknown id is reported before the body is looked at.
pub async fn update(
    store: &dyn Backend,
    raw_id: &str,
    fields: EntryFields,
) -> IndexResult<IndexEntry> {
    let id = parse_id(raw_id)?;
    if store.get(id).await?.is_none() {
        return Err(IndexError::NotFound(raw_id.to_string()));
    }

    let patch = EntryPatch {
        country: supplied_text(fields.country).map(check_country).transpose()?,
        price_per_kg: supplied_value(fields.price_per_kg)
            .map(|v| parse_number("Price per kg", v).and_then(check_price))
            .transpose()?,
        average_ripeness: supplied_value(fields.average_ripeness)
            .map(|v| parse_number("Average ripeness", v).and_then(check_ripeness))
            .transpose()?,
        currency: supplied_text(fields.currency).map(check_currency).transpose()?,
        last_updated: Utc::now().date_naive(),
    };

    // A delete can land between the lookup and the write.
    let updated = store
        .update(id, patch)
        .await?
        .ok_or_else(|| IndexError::NotFound(raw_id.to_string()))?;

    tracing::info!("Updated entry {}", updated.id);
    Ok(updated)
}

/// Remove one entry and hand it back.
pub async fn delete(store: &dyn Backend, raw_id: &str) -> IndexResult<IndexEntry> {
    let id = parse_id(raw_id)?;

    let removed = store
        .delete(id)
        .await?
        .ok_or_else(|| IndexError::NotFound(raw_id.to_string()))?;

    tracing::info!("Deleted entry {} ({})", removed.id, removed.country);
    Ok(removed)
}

/// An id that is not an integer cannot match anything.
fn parse_id(raw: &str) -> IndexResult<EntryId> {
    raw.trim()
        .parse()
        .map_err(|_| IndexError::NotFound(raw.to_string()))
}

fn supplied_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn supplied_value(value: Option<Value>) -> Option<Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        other => other,
    }
}

fn parse_number(label: &str, value: Value) -> IndexResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(IndexError::Validation(format!("{label} must be a number"))),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn check_country(country: String) -> IndexResult<String> {
    if country.chars().count() > MAX_COUNTRY_LEN {
        return Err(IndexError::Validation(format!(
            "Country must be at most {MAX_COUNTRY_LEN} characters"
        )));
    }
    Ok(country)
}

/// Rounded first, so a price that would be stored as 0.00 is refused.
fn check_price(price: f64) -> IndexResult<f64> {
    let price = round_to(price, PRICE_SCALE);
    if price <= 0.0 {
        return Err(IndexError::Validation(
            "Price per kg must be at least 0.01".to_string(),
        ));
    }
    Ok(price)
}

fn check_ripeness(ripeness: f64) -> IndexResult<f64> {
    let ripeness = round_to(ripeness, RIPENESS_SCALE);
    if !(0.0..=10.0).contains(&ripeness) {
        return Err(IndexError::Validation(
            "Average ripeness must be between 0 and 10".to_string(),
        ));
    }
    Ok(ripeness)
}

fn check_currency(code: String) -> IndexResult<String> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(IndexError::Validation(
            "Currency must be a 3-letter code".to_string(),
        ));
    }
    Ok(code.to_ascii_uppercase())
}
