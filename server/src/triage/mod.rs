//! Triage colour classification from a set of vitals.
//!
//! A pretrained model is consulted when one is loaded; any failure there (or
//! no model at all) falls back to the rule-based severity score in `rules`.
//! Callers always get a label.

pub mod model;
pub mod rules;
pub mod vitals;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::TriageConfig;
use model::TriageModel;
pub use vitals::{BloodPressure, VitalSigns, FEATURE_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageLabel {
    Red,
    Yellow,
    Green,
    Blue,
}

impl TriageLabel {
    /// Label for each index of a model's score vector.
    pub const MODEL_ORDER: [TriageLabel; 4] = [
        TriageLabel::Red,
        TriageLabel::Yellow,
        TriageLabel::Green,
        TriageLabel::Blue,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "red" => Some(Self::Red),
            "yellow" => Some(Self::Yellow),
            "green" => Some(Self::Green),
            "blue" => Some(Self::Blue),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::Red | Self::Yellow)
    }
}

impl fmt::Display for TriageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which path produced a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageMethod {
    Model,
    Rules,
}

impl TriageMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "model" => Some(Self::Model),
            "rules" => Some(Self::Rules),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Rules => "rules",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model returned {0} scores, expected {1}")]
    OutputShape(usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageAssessment {
    pub label: TriageLabel,
    pub method: TriageMethod,
    /// Rule-based severity; only set when the rules produced the label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<u32>,
}

pub struct TriageClassifier {
    model: Option<Box<dyn TriageModel>>,
}

impl TriageClassifier {
    pub fn rules_only() -> Self {
        Self { model: None }
    }

    pub fn with_model(model: Box<dyn TriageModel>) -> Self {
        Self { model: Some(model) }
    }

    /// Build from config. A model that fails to load is logged and the
    /// classifier runs on rules alone.
    pub fn from_config(config: &TriageConfig) -> Self {
        let Some(path) = config.model_path.as_deref() else {
            tracing::info!("No triage model configured, using rule-based scoring");
            return Self::rules_only();
        };

        match model::load_model(path, &config.input_name) {
            Ok(model) => {
                tracing::info!(model = model.name(), path = %path, "Triage model loaded");
                Self::with_model(model)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path,
                    error = %e,
                    "Failed to load triage model, using rule-based scoring"
                );
                Self::rules_only()
            }
        }
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.name())
    }

    pub fn assess(&self, vitals: &VitalSigns) -> TriageAssessment {
        if let Some(model) = self.model.as_deref() {
            let features = vitals.features();
            match model.predict(&features).and_then(|scores| pick_label(&scores)) {
                Ok(label) => {
                    return TriageAssessment {
                        label,
                        method: TriageMethod::Model,
                        severity: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        model = model.name(),
                        error = %e,
                        "Triage inference failed, falling back to rules"
                    );
                }
            }
        }

        let severity = rules::severity_score(vitals);
        TriageAssessment {
            label: rules::label_for_severity(severity),
            method: TriageMethod::Rules,
            severity: Some(severity),
        }
    }

    pub fn classify(&self, vitals: &VitalSigns) -> TriageLabel {
        self.assess(vitals).label
    }
}

/// Highest score wins; ties go to the earlier (more severe) label.
pub fn pick_label(scores: &[f32]) -> Result<TriageLabel, TriageError> {
    let expected = TriageLabel::MODEL_ORDER.len();
    if scores.len() != expected {
        return Err(TriageError::OutputShape(scores.len(), expected));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(TriageError::Inference("non-finite score".to_string()));
    }

    let mut best = 0;
    for (i, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = i;
        }
    }
    Ok(TriageLabel::MODEL_ORDER[best])
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(Result<Vec<f32>, ()>);

    impl TriageModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict(&self, _features: &[f32; FEATURE_COUNT]) -> Result<Vec<f32>, TriageError> {
            self.0
                .clone()
                .map_err(|_| TriageError::Inference("boom".to_string()))
        }
    }

    fn critical() -> VitalSigns {
        VitalSigns {
            height: 180.0,
            weight: 80.0,
            temperature: 40.0,
            blood_pressure: "200/125".to_string(),
            heart_rate: 130.0,
            respiratory_rate: 32.0,
            pulse: 130.0,
        }
    }

    #[test]
    fn test_pick_label_argmax() {
        assert_eq!(pick_label(&[0.1, 0.2, 0.6, 0.1]).unwrap(), TriageLabel::Green);
        assert_eq!(pick_label(&[0.1, 0.2, 0.3, 0.4]).unwrap(), TriageLabel::Blue);
        assert_eq!(pick_label(&[0.5, 0.5, 0.0, 0.0]).unwrap(), TriageLabel::Red);
    }

    #[test]
    fn test_pick_label_rejects_bad_output() {
        assert!(matches!(pick_label(&[1.0, 0.0]), Err(TriageError::OutputShape(2, 4))));
        assert!(pick_label(&[f32::NAN, 0.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_model_answer_is_used() {
        let classifier = TriageClassifier::with_model(Box::new(FixedModel(Ok(vec![0.0, 0.0, 1.0, 0.0]))));
        let assessment = classifier.assess(&critical());
        assert_eq!(assessment.label, TriageLabel::Green);
        assert_eq!(assessment.method, TriageMethod::Model);
        assert_eq!(assessment.severity, None);
    }

    #[test]
    fn test_inference_error_falls_back_to_rules() {
        let classifier = TriageClassifier::with_model(Box::new(FixedModel(Err(()))));
        let assessment = classifier.assess(&critical());
        assert_eq!(assessment.label, TriageLabel::Red);
        assert_eq!(assessment.method, TriageMethod::Rules);
        assert_eq!(assessment.severity, Some(8));
    }

    #[test]
    fn test_malformed_output_falls_back_to_rules() {
        let classifier = TriageClassifier::with_model(Box::new(FixedModel(Ok(vec![1.0]))));
        assert_eq!(classifier.classify(&critical()), TriageLabel::Red);
    }

    #[test]
    fn test_missing_model_file_runs_rules_only() {
        let config = TriageConfig {
            model_path: Some("/nonexistent/triage.json".to_string()),
            input_name: "float_input".to_string(),
        };
        let classifier = TriageClassifier::from_config(&config);
        assert!(classifier.model_name().is_none());
        assert_eq!(classifier.assess(&critical()).method, TriageMethod::Rules);
    }

    #[test]
    fn test_label_strings() {
        for label in TriageLabel::MODEL_ORDER {
            assert_eq!(TriageLabel::parse(label.as_str()), Some(label));
            assert_eq!(serde_json::to_value(label).unwrap(), label.as_str());
        }
        assert!(TriageLabel::Red.is_urgent());
        assert!(!TriageLabel::Blue.is_urgent());
    }
}
