//! Lookup entities fetched from the API: categories and payment types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Transaction category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Payment method (card, account, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentType {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    pub description: String,
    /// Last four digits of the card, if any
    #[serde(default)]
    pub last_card_number: Option<u32>,
    #[serde(default)]
    pub card_brand_name: Option<String>,
    #[serde(default)]
    pub card_bank_name: Option<String>,
}

impl PaymentType {
    /// Display label, e.g. `Visa Gold (*0042)`
    pub fn label(&self) -> String {
        match self.last_card_number {
            Some(last4) => format!("{} (*{:04})", self.description, last4),
            None => self.description.clone(),
        }
    }

    /// Names a user may type for this payment type
    ///
    /// The bare description, and the description with the card suffix both
    /// zero-padded and as stored.
    pub fn names(&self) -> Vec<String> {
        let mut names = vec![self.description.clone()];
        if let Some(last4) = self.last_card_number {
            names.push(format!("{} (*{:04})", self.description, last4));
            names.push(format!("{} (*{})", self.description, last4));
        }
        names
    }
}

/// Read-only snapshot of the lookup lists for one import session
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lookups {
    pub categories: Vec<Category>,
    pub payment_types: Vec<PaymentType>,
}

impl Lookups {
    pub fn new(categories: Vec<Category>, payment_types: Vec<PaymentType>) -> Self {
        Self {
            categories,
            payment_types,
        }
    }
}

/// Deserialize an ID that may arrive as a number or a numeric string
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("id out of range: {}", n))),
        JsonValue::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("non-numeric id: {}", s))),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}
