//! Conversion between the canonical kilogram values and the display unit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const KG_TO_LBS: f64 = 2.20462;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lbs,
}

impl WeightUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lbs => "lbs",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for WeightUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kg" => Ok(WeightUnit::Kg),
            "lbs" | "lb" => Ok(WeightUnit::Lbs),
            other => Err(format!("unknown weight unit: {other}")),
        }
    }
}

/// Convert a weight between units. No rounding; NaN propagates.
pub fn convert(weight: f64, from: WeightUnit, to: WeightUnit) -> f64 {
    match (from, to) {
        (WeightUnit::Kg, WeightUnit::Lbs) => weight * KG_TO_LBS,
        (WeightUnit::Lbs, WeightUnit::Kg) => weight / KG_TO_LBS,
        _ => weight,
    }
}

/// Round half away from zero to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Format a weight already expressed in `unit`, e.g. `"80.0 kg"`.
pub fn format(weight: f64, unit: WeightUnit) -> String {
    // + 0.0 folds -0.0 into 0.0
    format!("{:.1} {}", round1(weight) + 0.0, unit.suffix())
}

/// Format a signed difference, e.g. `"+1.2 kg"` or `"No change"`.
pub fn format_change(delta: f64, unit: WeightUnit) -> String {
    let rounded = round1(delta);
    if rounded == 0.0 {
        return "No change".to_string();
    }
    let sign = if rounded > 0.0 { '+' } else { '-' };
    format!("{}{:.1} {}", sign, rounded.abs(), unit.suffix())
}

/// Read/write port for the persisted unit choice.
pub trait UnitStore {
    fn load(&self) -> Option<WeightUnit>;
    fn save(&mut self, unit: WeightUnit);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryUnitStore {
    unit: Option<WeightUnit>,
}

impl UnitStore for MemoryUnitStore {
    fn load(&self) -> Option<WeightUnit> {
        self.unit
    }

    fn save(&mut self, unit: WeightUnit) {
        self.unit = Some(unit);
    }
}

/// The unit a user has chosen to see weights in.
///
/// Passed explicitly to whatever renders weights; storage is always kg.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPreference {
    pub unit: WeightUnit,
}

impl UnitPreference {
    pub fn new(unit: WeightUnit) -> Self {
        Self { unit }
    }

    /// Load from the store, defaulting to kilograms.
    pub fn load(store: &impl UnitStore) -> Self {
        Self::new(store.load().unwrap_or_default())
    }

    pub fn set(&mut self, unit: WeightUnit, store: &mut impl UnitStore) {
        self.unit = unit;
        store.save(unit);
    }

    pub fn to_display(&self, weight_kg: f64) -> f64 {
        convert(weight_kg, WeightUnit::Kg, self.unit)
    }

    pub fn to_storage(&self, weight: f64) -> f64 {
        convert(weight, self.unit, WeightUnit::Kg)
    }

    /// Format a canonical kg value in the preferred unit.
    pub fn format(&self, weight_kg: f64) -> String {
        format(self.to_display(weight_kg), self.unit)
    }

    /// Format a canonical kg difference in the preferred unit.
    pub fn format_change(&self, delta_kg: f64) -> String {
        format_change(self.to_display(delta_kg), self.unit)
    }
}
