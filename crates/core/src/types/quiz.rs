//! Vehicle quiz answers and their checkout-session metadata form.
//!
//! Buyers may answer a short quiz before checkout. The answers travel to the
//! gateway as session metadata (the only durable copy) and come back when the
//! session is retrieved. Metadata values are short strings, so answers are
//! normalized on the way in and parsed leniently on the way out.
//!
//! # Normalization
//!
//! | Field | Metadata key | Rule |
//! |---|---|---|
//! | `brand` | `vehicle_brand` | first 50 characters, omitted if empty |
//! | `year` | `vehicle_year` | first 10 characters, omitted if empty |
//! | `enginePowerHp` | `engine_power_hp` | decimal string |
//! | `moreTorque` | `pref_more_torque` | `"true"` / `"false"` |
//! | `throttleResponse` | `pref_throttle_response` | `"true"` / `"false"` |
//! | `reduceLag` | `pref_reduce_lag` | `"true"` / `"false"` |
//!
//! Absent answers produce no key. On reconstruction a flag is `true` only when
//! its value is exactly `"true"`; a missing flag reads back as `false`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Maximum stored length of the vehicle brand, in characters.
pub const MAX_BRAND_CHARS: usize = 50;

/// Maximum stored length of the vehicle year, in characters.
pub const MAX_YEAR_CHARS: usize = 10;

/// Session metadata derived from quiz answers (at most six entries).
pub type QuizMetadata = BTreeMap<String, String>;

/// Metadata key names attached to checkout sessions.
pub mod metadata_keys {
    pub const VEHICLE_BRAND: &str = "vehicle_brand";
    pub const VEHICLE_YEAR: &str = "vehicle_year";
    pub const ENGINE_POWER_HP: &str = "engine_power_hp";
    pub const PREF_MORE_TORQUE: &str = "pref_more_torque";
    pub const PREF_THROTTLE_RESPONSE: &str = "pref_throttle_response";
    pub const PREF_REDUCE_LAG: &str = "pref_reduce_lag";
}

use metadata_keys as keys;

/// Quiz answers, as submitted with a checkout or reconstructed from a session.
///
/// Every field is optional on input. `brand` and `year` accept JSON strings or
/// numbers (the frontend sends the year as either).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswers {
    #[serde(default, deserialize_with = "string_or_number")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub engine_power_hp: Option<f64>,
    #[serde(default)]
    pub more_torque: Option<bool>,
    #[serde(default)]
    pub throttle_response: Option<bool>,
    #[serde(default)]
    pub reduce_lag: Option<bool>,
}

impl QuizAnswers {
    /// Normalize the answers into session metadata.
    ///
    /// Returns an empty map when no answer is present; callers must then omit
    /// metadata entirely rather than attach an empty mapping.
    #[must_use]
    pub fn to_metadata(&self) -> QuizMetadata {
        let mut meta = QuizMetadata::new();

        if let Some(brand) = self.brand.as_deref().filter(|b| !b.is_empty()) {
            meta.insert(
                keys::VEHICLE_BRAND.to_string(),
                truncate_chars(brand, MAX_BRAND_CHARS),
            );
        }
        if let Some(year) = self.year.as_deref().filter(|y| !y.is_empty()) {
            meta.insert(
                keys::VEHICLE_YEAR.to_string(),
                truncate_chars(year, MAX_YEAR_CHARS),
            );
        }
        if let Some(hp) = self.engine_power_hp {
            meta.insert(keys::ENGINE_POWER_HP.to_string(), hp.to_string());
        }

        let flags = [
            (keys::PREF_MORE_TORQUE, self.more_torque),
            (keys::PREF_THROTTLE_RESPONSE, self.throttle_response),
            (keys::PREF_REDUCE_LAG, self.reduce_lag),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                meta.insert(key.to_string(), value.to_string());
            }
        }

        meta
    }

    /// Reconstruct answers from session metadata.
    ///
    /// Never fails: unknown keys are ignored, an unparsable power reads back
    /// as `None`, and flags default to `false`.
    #[must_use]
    pub fn from_metadata(meta: &QuizMetadata) -> Self {
        let text = |key: &str| meta.get(key).filter(|v| !v.is_empty()).cloned();
        let flag = |key: &str| Some(meta.get(key).is_some_and(|v| v == "true"));

        Self {
            brand: text(keys::VEHICLE_BRAND),
            year: text(keys::VEHICLE_YEAR),
            engine_power_hp: meta
                .get(keys::ENGINE_POWER_HP)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|hp| hp.is_finite()),
            more_torque: flag(keys::PREF_MORE_TORQUE),
            throttle_response: flag(keys::PREF_THROTTLE_RESPONSE),
            reduce_lag: flag(keys::PREF_REDUCE_LAG),
        }
    }
}

/// Keep at most `max` Unicode scalar values.
fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    }))
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StringOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrNumber::Number(n)) => Ok(n.as_f64()),
        Some(StringOrNumber::String(s)) if s.trim().is_empty() => Ok(None),
        Some(StringOrNumber::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid engine power: {s}"))),
    }
}
