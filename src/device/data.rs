//! Data structures for Herpstat status readings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// `safetyrelay` value reported while the relay is in its normal state.
pub const SAFETY_RELAY_OFF: &str = "OFF (NORMAL OPERATION)";

/// `ramping` value reported while an output has no ramp in progress.
pub const RAMPING_OFF: &str = "Not In Session";

/// The complete decoded state of one poll cycle.
///
/// Built in one piece by the decoder and replaced wholesale in the
/// [`SnapshotCache`](super::SnapshotCache); never mutated once published.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// When the snapshot was committed to the cache (`None` until then)
    pub fetched_at: Option<DateTime<Utc>>,
    /// Information about the controller itself
    pub system: SystemInfo,
    /// One entry per declared output, `outputs[i].id == i + 1` for every
    /// output the device reported
    pub outputs: Vec<OutputInfo>,
}

/// Information about the Herpstat unit itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Device nickname
    #[serde(rename(deserialize = "nickname"), default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Device IP address as reported by the device
    #[serde(default, deserialize_with = "null_as_default")]
    pub ip: String,
    /// Device MAC address
    #[serde(default, deserialize_with = "null_as_default")]
    pub mac: String,
    /// Firmware identifier, kept as whatever JSON value the device sent
    #[serde(default)]
    pub firmware: serde_json::Value,
    /// Raw safety relay status string
    #[serde(rename(deserialize = "safetyrelay"), default, deserialize_with = "null_as_default")]
    pub safety_relay: String,
    /// Number of outputs the device declares
    #[serde(rename(deserialize = "numberofoutputs"), default, deserialize_with = "null_as_default")]
    pub output_count: f64,
    /// Number of times the device has reset
    #[serde(rename(deserialize = "powerresets"), default, deserialize_with = "null_as_default")]
    pub power_resets: f64,
    /// Internal temperature
    #[serde(rename(deserialize = "internaltemp"), default, deserialize_with = "null_as_default")]
    pub temp: f64,
}

/// One physical output channel (heater, light, mister...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputInfo {
    /// 1-based position of the output, assigned while decoding. Empty for
    /// declared outputs the device did not report.
    #[serde(skip_deserializing)]
    pub id: String,
    #[serde(rename(deserialize = "outputnickname"), default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename(deserialize = "outputmode"), default, deserialize_with = "null_as_default")]
    pub mode: String,
    /// Raw ramping status string
    #[serde(default, deserialize_with = "null_as_default")]
    pub ramping: String,
    #[serde(rename(deserialize = "errorcodedescription"), default, deserialize_with = "null_as_default")]
    pub error_description: String,
    #[serde(rename(deserialize = "poweroutput"), default, deserialize_with = "null_as_default")]
    pub power: f64,
    #[serde(rename(deserialize = "poweroutputLIMIT"), default, deserialize_with = "null_as_default")]
    pub power_limit: f64,
    #[serde(rename(deserialize = "probereadingTEMP"), default, deserialize_with = "null_as_default")]
    pub probe_temp: f64,
    #[serde(rename(deserialize = "probereadingRH"), default, deserialize_with = "null_as_default")]
    pub probe_humidity: f64,
    #[serde(rename(deserialize = "enablehighlowalarm"), default, deserialize_with = "null_as_default")]
    pub alarm_enabled: f64,
    #[serde(rename(deserialize = "highalarm"), default, deserialize_with = "null_as_default")]
    pub alarm_high: f64,
    #[serde(rename(deserialize = "lowalarm"), default, deserialize_with = "null_as_default")]
    pub alarm_low: f64,
    #[serde(rename(deserialize = "endoframpsetting"), default, deserialize_with = "null_as_default")]
    pub ramp_end: f64,
    #[serde(rename(deserialize = "errorcode"), default, deserialize_with = "null_as_default")]
    pub error_code: f64,
}

/// The device sends `null` for fields it has no value for; treat that like
/// an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Snapshot {
    /// Whether this snapshot came from the device rather than being the
    /// empty placeholder the cache starts with.
    pub fn is_populated(&self) -> bool {
        self.fetched_at.is_some()
    }

    /// Outputs the device actually reported, in id order.
    pub fn reported_outputs(&self) -> impl Iterator<Item = &OutputInfo> {
        self.outputs.iter().filter(|output| output.is_reported())
    }
}

impl SystemInfo {
    /// Whether the safety relay has tripped.
    pub fn safety_relay_tripped(&self) -> bool {
        self.safety_relay != SAFETY_RELAY_OFF
    }

    /// Firmware rendered as a label: strings as-is, anything else as JSON.
    pub fn firmware_label(&self) -> String {
        match &self.firmware {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl OutputInfo {
    /// Whether a ramp is in progress on this output.
    pub fn is_ramping(&self) -> bool {
        self.ramping != RAMPING_OFF
    }

    /// Declared-but-unreported outputs stay zero-valued and have no id.
    pub fn is_reported(&self) -> bool {
        !self.id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_relay_states() {
        let mut system = SystemInfo {
            safety_relay: SAFETY_RELAY_OFF.to_string(),
            ..Default::default()
        };
        assert!(!system.safety_relay_tripped());

        system.safety_relay = "ON (TRIPPED)".to_string();
        assert!(system.safety_relay_tripped());

        system.safety_relay.clear();
        assert!(system.safety_relay_tripped());
    }

    #[test]
    fn test_ramping_states() {
        let mut output = OutputInfo {
            ramping: RAMPING_OFF.to_string(),
            ..Default::default()
        };
        assert!(!output.is_ramping());

        output.ramping = "Ramping Up".to_string();
        assert!(output.is_ramping());
    }

    #[test]
    fn test_firmware_label() {
        let mut system = SystemInfo::default();
        assert_eq!(system.firmware_label(), "");

        system.firmware = serde_json::json!("5.2");
        assert_eq!(system.firmware_label(), "5.2");

        system.firmware = serde_json::json!(5.2);
        assert_eq!(system.firmware_label(), "5.2");
    }

    #[test]
    fn test_null_fields_fall_back_to_defaults() {
        let output: OutputInfo = serde_json::from_str(
            r#"{"outputnickname": null, "poweroutput": null, "probereadingTEMP": 80.5}"#,
        )
        .unwrap();

        assert_eq!(output.name, "");
        assert_eq!(output.power, 0.0);
        assert_eq!(output.probe_temp, 80.5);
    }

    #[test]
    fn test_serialized_names_are_snake_case() {
        let output = OutputInfo {
            id: "1".to_string(),
            name: "Heater".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["name"], "Heater");
        assert!(json.get("probe_temp").is_some());
    }
}
