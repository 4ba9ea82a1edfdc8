//! Raw vital-sign readings and their normalized feature vector.

use serde::{Deserialize, Deserializer, Serialize};

/// Width of the vector fed to the classifier.
pub const FEATURE_COUNT: usize = 8;

/// Fixed divisors, in feature order: height, weight, temperature, systolic,
/// diastolic, heart rate, respiratory rate, pulse.
pub const NORMALIZATION: [f64; FEATURE_COUNT] = [200.0, 150.0, 42.0, 200.0, 120.0, 200.0, 60.0, 200.0];

/// One set of vitals as captured by a nurse. Readings arrive either as JSON
/// numbers or as numeric strings from dashboard forms; anything unparseable
/// becomes `0.0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalSigns {
    #[serde(default, deserialize_with = "lenient_reading")]
    pub height: f64,
    #[serde(default, deserialize_with = "lenient_reading")]
    pub weight: f64,
    #[serde(default, deserialize_with = "lenient_reading")]
    pub temperature: f64,
    /// "systolic/diastolic", e.g. "120/80"
    #[serde(default)]
    pub blood_pressure: String,
    #[serde(default, deserialize_with = "lenient_reading")]
    pub heart_rate: f64,
    #[serde(default, deserialize_with = "lenient_reading")]
    pub respiratory_rate: f64,
    #[serde(default, deserialize_with = "lenient_reading")]
    pub pulse: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

impl BloodPressure {
    /// Split on `/`. A missing or malformed component is coerced to `0.0`
    /// rather than rejected, so `"abc"` reads as 0/0.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split('/');
        Self {
            systolic: parts.next().map(parse_reading).unwrap_or(0.0),
            diastolic: parts.next().map(parse_reading).unwrap_or(0.0),
        }
    }

    /// Both components present.
    pub fn is_recorded(&self) -> bool {
        self.systolic != 0.0 && self.diastolic != 0.0
    }
}

impl VitalSigns {
    pub fn blood_pressure(&self) -> BloodPressure {
        BloodPressure::parse(&self.blood_pressure)
    }

    /// Normalized classifier input.
    pub fn features(&self) -> [f32; FEATURE_COUNT] {
        let bp = self.blood_pressure();
        let raw = [
            self.height,
            self.weight,
            self.temperature,
            bp.systolic,
            bp.diastolic,
            self.heart_rate,
            self.respiratory_rate,
            self.pulse,
        ];
        let mut features = [0.0f32; FEATURE_COUNT];
        for (i, value) in raw.iter().enumerate() {
            features[i] = (value / NORMALIZATION[i]) as f32;
        }
        features
    }
}

/// Parse a single numeric reading, coercing garbage to `0.0`.
pub fn parse_reading(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Reading {
    Number(f64),
    Text(String),
}

fn lenient_reading<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Reading>::deserialize(deserializer)? {
        Some(Reading::Number(n)) if n.is_finite() => n,
        Some(Reading::Text(t)) => parse_reading(&t),
        _ => 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_blood_pressure() {
        let bp = BloodPressure::parse("120/80");
        assert_eq!(bp.systolic, 120.0);
        assert_eq!(bp.diastolic, 80.0);
        assert!(bp.is_recorded());
    }

    #[test]
    fn test_malformed_blood_pressure_coerces_to_zero() {
        let bp = BloodPressure::parse("abc");
        assert_eq!(bp, BloodPressure { systolic: 0.0, diastolic: 0.0 });
        assert!(!bp.is_recorded());

        let bp = BloodPressure::parse("130/");
        assert_eq!(bp.systolic, 130.0);
        assert_eq!(bp.diastolic, 0.0);

        let bp = BloodPressure::parse(" 118 / 76 ");
        assert_eq!(bp, BloodPressure { systolic: 118.0, diastolic: 76.0 });
    }

    #[test]
    fn test_features_use_fixed_divisors() {
        let vitals = VitalSigns {
            height: 200.0,
            weight: 75.0,
            temperature: 42.0,
            blood_pressure: "100/60".to_string(),
            heart_rate: 100.0,
            respiratory_rate: 30.0,
            pulse: 50.0,
        };
        assert_eq!(vitals.features(), [1.0, 0.5, 1.0, 0.5, 0.5, 0.5, 0.5, 0.25]);
    }

    #[test]
    fn test_readings_accept_numbers_and_strings() {
        let vitals: VitalSigns = serde_json::from_value(serde_json::json!({
            "height": "172",
            "weight": 68.5,
            "temperature": "thirty-seven",
            "bloodPressure": "120/80",
            "heartRate": null,
        }))
        .unwrap();
        assert_eq!(vitals.height, 172.0);
        assert_eq!(vitals.weight, 68.5);
        assert_eq!(vitals.temperature, 0.0);
        assert_eq!(vitals.heart_rate, 0.0);
        assert_eq!(vitals.pulse, 0.0);
    }
}
