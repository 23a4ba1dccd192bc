//! Strongly-typed identifiers used across the engine.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Identifier of an inventory record.
///
/// Ingestion decides the format (spreadsheet codes, API keys, UUIDs), so the
/// engine treats it as an opaque non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl FromStr for ItemId {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AnalyticsError::invalid_parameter("ItemId: empty identifier"));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_rejects_blank() {
        let id: ItemId = "  MED-001 ".parse().unwrap();
        assert_eq!(id.as_str(), "MED-001");
        assert!(matches!(
            "   ".parse::<ItemId>(),
            Err(AnalyticsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn ids_come_from_the_payload_as_plain_strings() {
        let id: ItemId = serde_json::from_str("\"DIP-500\"").unwrap();
        assert_eq!(id, ItemId::from("DIP-500"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"DIP-500\"");
    }
}
