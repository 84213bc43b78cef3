//! Host-persisted flags.
//!
//! Hosts save a small JSON object per module. Loading is forgiving: a
//! missing key or a value of the wrong type falls back to the documented
//! default instead of failing, so patches saved by older or damaged hosts
//! still open. Only input that is not JSON at all, or not a JSON object,
//! is reported as an error, and only by the `try_` constructors.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::elastika::ElastikaEngine;
use crate::mute::{MuteBank, MUTE_CONTROLLERS};

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Persisted state is not a JSON object")]
    NotAnObject,
}

fn parse_object<T: for<'de> Deserialize<'de>>(json: &str) -> Result<T, PersistError> {
    let value: Value = serde_json::from_str(json)?;
    if !value.is_object() {
        return Err(PersistError::NotAnObject);
    }
    Ok(serde_json::from_value(value)?)
}

fn parse_or_default<T: for<'de> Deserialize<'de> + Default>(json: &str, what: &str) -> T {
    match parse_object(json) {
        Ok(settings) => settings,
        Err(err) => {
            warn!(%err, what, "unreadable persisted state, using defaults");
            T::default()
        }
    }
}

fn default_true() -> bool {
    true
}

/// `false` only for a literal JSON `false`.
fn true_unless_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(flag) => flag,
        other => {
            warn!(value = %other, "expected a boolean flag, using true");
            true
        }
    })
}

/// `true` only for a literal JSON `true`.
fn false_unless_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(flag) => flag,
        other => {
            warn!(value = %other, "expected a boolean flag, using false");
            false
        }
    })
}

/// An array of exactly five entries; anything else means "no opinion".
fn slew_flags<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<[Option<bool>; MUTE_CONTROLLERS], D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(items) if items.len() == MUTE_CONTROLLERS => {
            Ok(std::array::from_fn(|i| items[i].as_bool()))
        }
        other => {
            warn!(value = %other, "ignoring malformed slew flags");
            Ok([None; MUTE_CONTROLLERS])
        }
    }
}

// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElastikaSettings {
    #[serde(rename = "agc", default = "default_true", deserialize_with = "true_unless_false")]
    pub agc_enabled: bool,
}

impl ElastikaSettings {
    pub fn try_from_json(json: &str) -> Result<Self, PersistError> {
        parse_object(json)
    }

    pub fn from_json(json: &str) -> Self {
        parse_or_default(json, "elastika")
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn apply_to(&self, engine: &mut ElastikaEngine) {
        engine.set_agc_enabled(self.agc_enabled);
    }
}

impl Default for ElastikaSettings {
    fn default() -> Self {
        Self { agc_enabled: true }
    }
}

impl From<&ElastikaEngine> for ElastikaSettings {
    fn from(engine: &ElastikaEngine) -> Self {
        Self {
            agc_enabled: engine.agc_enabled(),
        }
    }
}

// ---------------------------------------------------------------------------

/// Host flags for the TubeUnit panel. The engines do not hold these; the
/// host passes `inverted_vent` to [`TubeBank::vent_quiet`](crate::tube::TubeBank::vent_quiet)
/// and uses `limiter_warning` to decide whether to show the limiter light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TubeUnitSettings {
    #[serde(
        rename = "limiterWarningLight",
        default = "default_true",
        deserialize_with = "true_unless_false"
    )]
    pub limiter_warning: bool,
    #[serde(rename = "toggleVentPort", default, deserialize_with = "false_unless_true")]
    pub inverted_vent: bool,
}

impl TubeUnitSettings {
    pub fn try_from_json(json: &str) -> Result<Self, PersistError> {
        parse_object(json)
    }

    pub fn from_json(json: &str) -> Self {
        parse_or_default(json, "tube unit")
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for TubeUnitSettings {
    fn default() -> Self {
        Self {
            limiter_warning: true,
            inverted_vent: false,
        }
    }
}

// ---------------------------------------------------------------------------

/// Anti-click ramping per mute controller. `None` leaves a controller as it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteBankSettings {
    #[serde(default = "no_slew_opinion", deserialize_with = "slew_flags")]
    pub slew: [Option<bool>; MUTE_CONTROLLERS],
}

fn no_slew_opinion() -> [Option<bool>; MUTE_CONTROLLERS] {
    [None; MUTE_CONTROLLERS]
}

impl MuteBankSettings {
    pub fn try_from_json(json: &str) -> Result<Self, PersistError> {
        parse_object(json)
    }

    pub fn from_json(json: &str) -> Self {
        parse_or_default(json, "mute bank")
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn apply_to(&self, bank: &mut MuteBank) {
        for (index, flag) in self.slew.iter().enumerate() {
            if let Some(enabled) = *flag {
                bank.set_slew_enabled(index, enabled);
            }
        }
    }
}

impl Default for MuteBankSettings {
    fn default() -> Self {
        Self {
            slew: [Some(false); MUTE_CONTROLLERS],
        }
    }
}

impl From<&MuteBank> for MuteBankSettings {
    fn from(bank: &MuteBank) -> Self {
        Self {
            slew: bank.slew_flags().map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elastika_agc_flag() {
        assert!(!ElastikaSettings::from_json(r#"{"agc": false}"#).agc_enabled);
        assert!(ElastikaSettings::from_json(r#"{"agc": true}"#).agc_enabled);
        assert!(ElastikaSettings::from_json("{}").agc_enabled);
        assert!(ElastikaSettings::from_json(r#"{"agc": "off"}"#).agc_enabled);
        assert!(ElastikaSettings::from_json("not json").agc_enabled);

        let mut engine = ElastikaEngine::default();
        ElastikaSettings { agc_enabled: false }.apply_to(&mut engine);
        assert!(!engine.agc_enabled());
        assert_eq!(ElastikaSettings::from(&engine), ElastikaSettings { agc_enabled: false });
    }

    #[test]
    fn test_tube_unit_flags() {
        let settings = TubeUnitSettings::from_json("{}");
        assert_eq!(settings, TubeUnitSettings::default());
        assert!(settings.limiter_warning);
        assert!(!settings.inverted_vent);

        let json = r#"{"limiterWarningLight": 0, "toggleVentPort": 1}"#;
        let settings = TubeUnitSettings::from_json(json);
        assert!(settings.limiter_warning);
        assert!(!settings.inverted_vent);

        let json = r#"{"limiterWarningLight": false, "toggleVentPort": true}"#;
        let settings = TubeUnitSettings::from_json(json);
        assert!(!settings.limiter_warning);
        assert!(settings.inverted_vent);
    }

    #[test]
    fn test_to_json_writes_every_key() {
        let json = TubeUnitSettings::default().to_json().unwrap_or_default();
        let value: Value = serde_json::from_str(&json).unwrap_or(Value::Null);
        assert_eq!(value["limiterWarningLight"], Value::Bool(true));
        assert_eq!(value["toggleVentPort"], Value::Bool(false));

        let json = ElastikaSettings::default().to_json().unwrap_or_default();
        assert_eq!(json, r#"{"agc":true}"#);
    }

    #[test]
    fn test_strict_parse_errors() {
        assert!(matches!(
            ElastikaSettings::try_from_json("[true]"),
            Err(PersistError::NotAnObject)
        ));
        assert!(matches!(
            TubeUnitSettings::try_from_json("{"),
            Err(PersistError::Json(_))
        ));
        assert!(MuteBankSettings::try_from_json(r#"{"slew": 3}"#).is_ok());
    }

    #[test]
    fn test_mute_slew_flags() {
        let mut bank = MuteBank::default();
        MuteBankSettings { slew: [Some(true); MUTE_CONTROLLERS] }.apply_to(&mut bank);
        assert_eq!(bank.slew_flags(), [true; MUTE_CONTROLLERS]);

        let json = r#"{"slew": [false, true, "x", false, null]}"#;
        MuteBankSettings::from_json(json).apply_to(&mut bank);
        assert_eq!(bank.slew_flags(), [false, true, true, false, true]);

        // Wrong length: ignored entirely.
        MuteBankSettings::from_json(r#"{"slew": [true, true]}"#).apply_to(&mut bank);
        assert_eq!(bank.slew_flags(), [false, true, true, false, true]);

        let saved = MuteBankSettings::from(&bank).to_json().unwrap_or_default();
        assert_eq!(saved, r#"{"slew":[false,true,true,false,true]}"#);
        let mut restored = MuteBank::default();
        MuteBankSettings::from_json(&saved).apply_to(&mut restored);
        assert_eq!(restored.slew_flags(), bank.slew_flags());
    }
}
