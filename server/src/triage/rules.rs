//! Rule-based severity scoring, used whenever no model answer is available.
//!
//! Each of temperature, heart rate, blood pressure and respiratory rate adds
//! one point for a mild deviation and two for a severe one. A zero reading is
//! treated as not taken.

use super::vitals::{BloodPressure, VitalSigns};
use super::TriageLabel;

const MILD: u32 = 1;
const SEVERE: u32 = 2;

pub const RED_CUTOFF: u32 = 6;
pub const YELLOW_CUTOFF: u32 = 4;
pub const BLUE_CUTOFF: u32 = 2;

pub fn temperature_points(celsius: f64) -> u32 {
    if celsius == 0.0 {
        0
    } else if celsius >= 39.5 || celsius < 35.0 {
        SEVERE
    } else if celsius >= 38.0 || celsius < 36.0 {
        MILD
    } else {
        0
    }
}

pub fn heart_rate_points(bpm: f64) -> u32 {
    if bpm == 0.0 {
        0
    } else if bpm > 120.0 || bpm < 50.0 {
        SEVERE
    } else if bpm > 100.0 || bpm < 60.0 {
        MILD
    } else {
        0
    }
}

pub fn blood_pressure_points(bp: BloodPressure) -> u32 {
    if !bp.is_recorded() {
        0
    } else if bp.systolic >= 180.0 || bp.diastolic >= 120.0 || bp.systolic < 90.0 {
        SEVERE
    } else if bp.systolic >= 140.0 || bp.diastolic >= 90.0 || bp.systolic < 100.0 {
        MILD
    } else {
        0
    }
}

pub fn respiratory_rate_points(per_minute: f64) -> u32 {
    if per_minute == 0.0 {
        0
    } else if per_minute > 30.0 || per_minute < 8.0 {
        SEVERE
    } else if per_minute > 20.0 || per_minute < 12.0 {
        MILD
    } else {
        0
    }
}

pub fn severity_score(vitals: &VitalSigns) -> u32 {
    temperature_points(vitals.temperature)
        + heart_rate_points(vitals.heart_rate)
        + blood_pressure_points(vitals.blood_pressure())
        + respiratory_rate_points(vitals.respiratory_rate)
}

pub fn label_for_severity(severity: u32) -> TriageLabel {
    if severity >= RED_CUTOFF {
        TriageLabel::Red
    } else if severity >= YELLOW_CUTOFF {
        TriageLabel::Yellow
    } else if severity >= BLUE_CUTOFF {
        TriageLabel::Blue
    } else {
        TriageLabel::Green
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals(temperature: f64, heart_rate: f64, bp: &str, respiratory_rate: f64) -> VitalSigns {
        VitalSigns {
            height: 170.0,
            weight: 70.0,
            temperature,
            blood_pressure: bp.to_string(),
            heart_rate,
            respiratory_rate,
            pulse: heart_rate,
        }
    }

    #[test]
    fn test_normal_vitals_are_green() {
        let v = vitals(37.0, 72.0, "120/80", 16.0);
        assert_eq!(severity_score(&v), 0);
        assert_eq!(label_for_severity(severity_score(&v)), TriageLabel::Green);
    }

    #[test]
    fn test_critical_vitals_are_red() {
        let v = vitals(40.0, 130.0, "200/125", 32.0);
        let severity = severity_score(&v);
        assert!(severity >= RED_CUTOFF, "severity was {}", severity);
        assert_eq!(label_for_severity(severity), TriageLabel::Red);
    }

    #[test]
    fn test_mild_deviations_accumulate() {
        // fever + tachycardia, both mild
        let v = vitals(38.2, 105.0, "120/80", 16.0);
        assert_eq!(severity_score(&v), 2);
        assert_eq!(label_for_severity(2), TriageLabel::Blue);

        let v = vitals(38.2, 105.0, "150/95", 22.0);
        assert_eq!(severity_score(&v), 4);
        assert_eq!(label_for_severity(4), TriageLabel::Yellow);
    }

    #[test]
    fn test_low_side_bands() {
        assert_eq!(temperature_points(34.0), 2);
        assert_eq!(temperature_points(35.5), 1);
        assert_eq!(heart_rate_points(45.0), 2);
        assert_eq!(heart_rate_points(55.0), 1);
        assert_eq!(respiratory_rate_points(6.0), 2);
        assert_eq!(respiratory_rate_points(10.0), 1);
        assert_eq!(blood_pressure_points(BloodPressure::parse("85/50")), 2);
        assert_eq!(blood_pressure_points(BloodPressure::parse("95/60")), 1);
    }

    #[test]
    fn test_missing_readings_score_nothing() {
        let v = VitalSigns {
            blood_pressure: "abc".to_string(),
            ..VitalSigns::default()
        };
        assert_eq!(severity_score(&v), 0);
    }

    #[test]
    fn test_cutoff_boundaries() {
        assert_eq!(label_for_severity(0), TriageLabel::Green);
        assert_eq!(label_for_severity(1), TriageLabel::Green);
        assert_eq!(label_for_severity(3), TriageLabel::Blue);
        assert_eq!(label_for_severity(5), TriageLabel::Yellow);
        assert_eq!(label_for_severity(6), TriageLabel::Red);
        assert_eq!(label_for_severity(8), TriageLabel::Red);
    }
}
