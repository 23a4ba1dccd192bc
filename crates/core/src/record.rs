//! Inventory records as seen by the analytics engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::entity::Entity;
use crate::id::ItemId;

/// Attribute key holding the clinical criticality of an item.
pub const CLINICAL_CRITICALITY: &str = "clinicalCriticality";

/// ABC class (financial priority tier).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    pub const ALL: [AbcClass; 3] = [AbcClass::A, AbcClass::B, AbcClass::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            AbcClass::A => "A",
            AbcClass::B => "B",
            AbcClass::C => "C",
        }
    }
}

impl core::fmt::Display for AbcClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clinical criticality of a medicine/material.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClinicalCriticality {
    #[serde(rename = "alta")]
    High,
    #[serde(rename = "média", alias = "media")]
    Medium,
    #[serde(rename = "baixa")]
    Low,
}

impl ClinicalCriticality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicalCriticality::High => "alta",
            ClinicalCriticality::Medium => "média",
            ClinicalCriticality::Low => "baixa",
        }
    }

    /// Lenient parse used for attribute bags filled by spreadsheets.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "alta" | "high" => Some(Self::High),
            "média" | "media" | "medium" => Some(Self::Medium),
            "baixa" | "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// A single inventory line (medicine or material) in a batch.
///
/// `id`, `name`, `quantity` and `unit_price` come from ingestion and never
/// change. `percentage`, `accumulated_percentage` and `classification` belong
/// to the engine and are overwritten on every classification run. Anything
/// else ingestion knows about the item lands in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    id: ItemId,
    name: String,
    quantity: f64,
    unit_price: f64,
    #[serde(default)]
    percentage: f64,
    #[serde(default)]
    accumulated_percentage: f64,
    #[serde(default)]
    classification: Option<AbcClass>,
    #[serde(flatten)]
    attributes: Map<String, JsonValue>,
}

impl InventoryRecord {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity,
            unit_price,
            percentage: 0.0,
            accumulated_percentage: 0.0,
            classification: None,
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_clinical_criticality(self, criticality: ClinicalCriticality) -> Self {
        self.with_attribute(CLINICAL_CRITICALITY, criticality.as_str())
    }

    /// Pre-assign a class, e.g. when the batch was classified upstream.
    pub fn with_classification(mut self, class: AbcClass) -> Self {
        self.classification = Some(class);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    pub fn total_value(&self) -> f64 {
        self.quantity * self.unit_price
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn accumulated_percentage(&self) -> f64 {
        self.accumulated_percentage
    }

    pub fn classification(&self) -> Option<AbcClass> {
        self.classification
    }

    pub fn attributes(&self) -> &Map<String, JsonValue> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&JsonValue> {
        self.attributes.get(key)
    }

    /// Clinical criticality from the attribute bag; unknown values read as `None`.
    pub fn clinical_criticality(&self) -> Option<ClinicalCriticality> {
        self.attribute(CLINICAL_CRITICALITY)
            .and_then(JsonValue::as_str)
            .and_then(ClinicalCriticality::parse)
    }

    /// Overwrite the engine-owned ABC fields.
    pub fn assign_abc(&mut self, percentage: f64, accumulated_percentage: f64, class: AbcClass) {
        self.percentage = percentage;
        self.accumulated_percentage = accumulated_percentage;
        self.classification = Some(class);
    }

    /// Copy with a different unit price; identity and attributes are kept.
    pub fn repriced(&self, unit_price: f64) -> Self {
        Self {
            unit_price,
            ..self.clone()
        }
    }
}

impl Entity for InventoryRecord {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn total_value_is_quantity_times_price() {
        let r = InventoryRecord::new("MED-1", "Dipirona 500mg", 120.0, 0.35);
        assert!((r.total_value() - 42.0).abs() < 1e-12);
        assert_eq!(r.classification(), None);
    }

    #[test]
    fn deserializes_dashboard_payload_with_extra_fields() {
        let raw = json!({
            "id": "MAT-77",
            "name": "Seringa 10ml",
            "quantity": 500.0,
            "unitPrice": 0.9,
            "clinicalCriticality": "alta",
            "supplier": "Acme Hospitalar"
        });

        let r: InventoryRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(r.id().as_str(), "MAT-77");
        assert_eq!(r.clinical_criticality(), Some(ClinicalCriticality::High));
        assert_eq!(r.attribute("supplier"), Some(&json!("Acme Hospitalar")));
        assert_eq!(r.percentage(), 0.0);
    }

    #[test]
    fn criticality_parse_is_lenient() {
        assert_eq!(ClinicalCriticality::parse(" Média "), Some(ClinicalCriticality::Medium));
        assert_eq!(ClinicalCriticality::parse("media"), Some(ClinicalCriticality::Medium));
        assert_eq!(ClinicalCriticality::parse("BAIXA"), Some(ClinicalCriticality::Low));
        assert_eq!(ClinicalCriticality::parse("urgente"), None);
    }

    #[test]
    fn assign_abc_overwrites_previous_annotation() {
        let mut r = InventoryRecord::new("MED-1", "Soro", 10.0, 2.0).with_classification(AbcClass::A);
        r.assign_abc(12.5, 99.0, AbcClass::C);
        assert_eq!(r.classification(), Some(AbcClass::C));
        assert_eq!(r.percentage(), 12.5);
        assert_eq!(r.accumulated_percentage(), 99.0);
    }
}
