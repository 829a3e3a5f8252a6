//! Provider record and field-level comparison types

use serde::{Deserialize, Serialize};

/// Fields compared between the database and scraped records, in report order
pub const COMPARED_FIELDS: [&str; 9] = [
    "name",
    "specialty",
    "phone",
    "address",
    "city",
    "state",
    "zip",
    "license_number",
    "npi",
];

/// A healthcare provider directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub license_number: String,
    pub npi: String,
}

impl ProviderRecord {
    /// Value of a compared field by name
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "id" => &self.id,
            "name" => &self.name,
            "specialty" => &self.specialty,
            "phone" => &self.phone,
            "address" => &self.address,
            "city" => &self.city,
            "state" => &self.state,
            "zip" => &self.zip,
            "license_number" => &self.license_number,
            "npi" => &self.npi,
            _ => return None,
        };
        Some(value.as_str())
    }
}

/// A field where the database and scraped records disagree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub field: String,
    pub db_value: String,
    pub scraped_value: String,
}

/// Lowercase and trim for comparison
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Whether two values of `field` describe the same fact.
///
/// Containment in either direction counts as a minor variation, as does an
/// address whose scraped form has exactly one extra word.
pub fn values_match(field: &str, db_value: &str, scraped_value: &str) -> bool {
    let db = normalize(db_value);
    let scraped = normalize(scraped_value);

    if db == scraped || scraped.contains(&db) || db.contains(&scraped) {
        return true;
    }

    field == "address" && db.split_whitespace().count() + 1 == scraped.split_whitespace().count()
}

/// Field-by-field comparison over [`COMPARED_FIELDS`]
pub fn diff_records(db: &ProviderRecord, scraped: &ProviderRecord) -> Vec<Discrepancy> {
    COMPARED_FIELDS
        .iter()
        .filter_map(|&field| {
            let db_value = db.field(field).unwrap_or_default();
            let scraped_value = scraped.field(field).unwrap_or_default();
            if values_match(field, db_value, scraped_value) {
                None
            } else {
                Some(Discrepancy {
                    field: field.to_string(),
                    db_value: db_value.to_string(),
                    scraped_value: scraped_value.to_string(),
                })
            }
        })
        .collect()
}
