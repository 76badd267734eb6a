//! Sound level samples emitted by the measurement process

use serde::{Deserialize, Serialize};

/// One line of output from the measurement process.
///
/// Ephemeral: broadcast once and dropped. Fields the meter adds beyond the
/// known ones are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSample {
    /// Measured level in dB
    pub measured: f64,
    /// Meter timestamp as printed by the device tool
    pub timestamp: String,
    /// Time weighting (`fast`, `slow`)
    pub mode: String,
    /// Frequency weighting (`dBA`, `dBC`)
    pub freq_mode: String,
    /// Measurement range, e.g. `30-130`
    pub range: String,
    /// Unknown fields, passed through as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MeasurementSample {
    /// Decode a sample from a parsed JSON line
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_sample() {
        let value = json!({
            "measured": 87.4,
            "timestamp": "2024-11-02 21:14:03 UTC",
            "mode": "fast",
            "freqMode": "dBA",
            "range": "30-130"
        });

        let sample = MeasurementSample::from_value(value).unwrap();
        assert_eq!(sample.measured, 87.4);
        assert_eq!(sample.freq_mode, "dBA");
        assert!(sample.extra.is_empty());
    }

    #[test]
    fn test_extra_fields_pass_through() {
        let value = json!({
            "measured": 60,
            "timestamp": "t",
            "mode": "slow",
            "freqMode": "dBC",
            "range": "30-80",
            "peak": 71.0
        });

        let sample = MeasurementSample::from_value(value).unwrap();
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["peak"], 71.0);
        assert_eq!(json["freqMode"], "dBC");
    }

    #[test]
    fn test_reject_incomplete_sample() {
        let value = json!({ "measured": 60 });
        assert!(MeasurementSample::from_value(value).is_err());
    }
}
