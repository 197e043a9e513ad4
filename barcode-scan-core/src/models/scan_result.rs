use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a barcode reached the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanSource {
    Camera,
    Manual,
}

/// A decoded barcode, produced at most once per activation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    text: String,
    captured_at: DateTime<Utc>,
    source: ScanSource,
}

impl ScanResult {
    pub fn new(text: impl Into<String>, source: ScanSource) -> Self {
        Self {
            text: text.into(),
            captured_at: Utc::now(),
            source,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn source(&self) -> ScanSource {
        self.source
    }
}

/// Inventory record as stored under the `inventoryItems` key.
///
/// Field names follow the stored JSON (camelCase), so records written by the
/// web intake form load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedItem {
    pub id: String,
    pub full_barcode: String,
    pub last_six_digits: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toy_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub scanned_at: String,
}

impl ScannedItem {
    /// Starts a record for a freshly scanned barcode. The remaining product
    /// fields are filled in by the intake form.
    pub fn from_scan(result: &ScanResult, name: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            full_barcode: result.text().to_string(),
            last_six_digits: last_six_digits(result.text()),
            name: name.trim().to_string(),
            site_description: None,
            brand: None,
            price: None,
            weight: None,
            unit: Some("UN".into()),
            age_range: None,
            category: None,
            toy_type: None,
            photo: None,
            scanned_at: result.captured_at().to_rfc3339(),
        }
    }
}

/// Final six characters of a barcode (the whole code when shorter).
pub fn last_six_digits(barcode: &str) -> String {
    let count = barcode.chars().count();
    barcode.chars().skip(count.saturating_sub(6)).collect()
}
