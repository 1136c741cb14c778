use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "PEN";

/// Snapshot of a rental unit as returned by `GET /units/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub address: Option<String>,
    pub nightly_rate: BigDecimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub max_guests: Option<u32>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_property_defaults_currency_to_soles() {
        let json = r#"{"id":"unit-7","title":"Loft Miraflores","nightlyRate":"120.50"}"#;
        let property: Property = serde_json::from_str(json).unwrap();

        assert_eq!(property.currency, "PEN");
        assert_eq!(property.nightly_rate, BigDecimal::from_str("120.50").unwrap());
        assert!(property.max_guests.is_none());
        assert!(property.address.is_none());
    }
}
