//! Feature vector assembly for the blood panel classifier.
//!
//! The schema mirrors the column order the models were trained on.
//! Reordering it silently changes what the model sees, so the order here
//! is load-bearing.

use anyhow::{bail, Result};
use serde_json::{Map, Value};

/// Ordered (field name, default) schema for the 24 lab measurements.
///
/// Index i of the extracted vector is fed to the model as feature i.
/// Fields absent from a request take their default.
pub const FEATURE_SCHEMA: [(&str, f32); 24] = [
    ("Glucose", 0.0),
    ("Cholesterol", 0.0),
    ("Hemoglobin", 0.0),
    ("Platelets", 0.0),
    ("White Blood Cells", 0.0),
    ("Red Blood Cells", 0.0),
    ("Hematocrit", 0.0),
    ("Mean Corpuscular Volume", 0.0),
    ("Mean Corpuscular Hemoglobin", 0.0),
    ("Mean Corpuscular Hemoglobin Concentration", 0.0),
    ("Insulin", 0.0),
    ("BMI", 0.0),
    ("Systolic Blood Pressure", 0.0),
    ("Diastolic Blood Pressure", 0.0),
    ("Triglycerides", 0.0),
    ("HbA1c", 0.0),
    ("LDL Cholesterol", 0.0),
    ("HDL Cholesterol", 0.0),
    ("ALT", 0.0),
    ("AST", 0.0),
    ("Heart Rate", 0.0),
    ("Creatinine", 0.0),
    ("Troponin", 0.0),
    ("C-reactive Protein", 0.0),
];

/// Feature extractor that turns a request payload into model input.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the model input vector from a request payload.
    ///
    /// Fields absent from the payload take their schema default, and keys
    /// outside the schema are never read. A present value that cannot be
    /// coerced to a number fails the whole extraction.
    pub fn extract(&self, data: &Map<String, Value>) -> Result<Vec<f32>> {
        let mut features = Vec::with_capacity(FEATURE_SCHEMA.len());

        for (name, default) in &FEATURE_SCHEMA {
            let value = match data.get(*name) {
                Some(value) => coerce_numeric(name, value)?,
                None => *default,
            };
            features.push(value);
        }

        Ok(features)
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_SCHEMA.len()
    }

    /// Get feature names in schema order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        FEATURE_SCHEMA.iter().map(|(name, _)| *name).collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Coerce a JSON value to f32, accepting numbers and numeric strings.
fn coerce_numeric(field: &str, value: &Value) -> Result<f32> {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(v) => Ok(v as f32),
            None => bail!("value for field {:?} is outside the numeric range", field),
        },
        Value::String(s) => match s.trim().parse::<f32>() {
            Ok(v) => Ok(v),
            Err(_) => bail!(
                "could not convert string to float for field {:?}: {:?}",
                field,
                s
            ),
        },
        other => bail!(
            "expected a number for field {:?}, got {}",
            field,
            json_kind(other)
        ),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn test_feature_count() {
        let extractor = FeatureExtractor::new();
        assert_eq!(extractor.feature_count(), 24);
        assert_eq!(extractor.feature_names().len(), 24);
    }

    #[test]
    fn test_schema_order() {
        let names = FeatureExtractor::new().feature_names();
        assert_eq!(names[0], "Glucose");
        assert_eq!(names[2], "Hemoglobin");
        assert_eq!(names[23], "C-reactive Protein");
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let extractor = FeatureExtractor::new();
        let data = payload(json!({"Glucose": 90, "Hemoglobin": 13.5}));

        let features = extractor.extract(&data).unwrap();

        let mut expected = vec![0.0_f32; 24];
        expected[0] = 90.0;
        expected[2] = 13.5;
        assert_eq!(features, expected);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let extractor = FeatureExtractor::new();
        let data = payload(json!({"Glucose": "90.5", "BMI": " 22.1 "}));

        let features = extractor.extract(&data).unwrap();

        assert_eq!(features[0], 90.5);
        assert_eq!(features[11], 22.1);
    }

    #[test]
    fn test_non_numeric_string_is_an_error() {
        let extractor = FeatureExtractor::new();
        let data = payload(json!({"Glucose": "abc"}));

        let err = extractor.extract(&data).unwrap_err();
        assert!(err.to_string().contains("Glucose"));
    }

    #[test]
    fn test_null_and_bool_are_errors() {
        let extractor = FeatureExtractor::new();

        let data = payload(json!({"Insulin": null}));
        assert!(extractor.extract(&data).is_err());

        let data = payload(json!({"Insulin": true}));
        assert!(extractor.extract(&data).is_err());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let extractor = FeatureExtractor::new();
        let with_extra = payload(json!({"Glucose": 90, "PatientName": "x", "Unknown": 7}));
        let without_extra = payload(json!({"Glucose": 90}));

        let a = extractor.extract(&with_extra).unwrap();
        let b = extractor.extract(&without_extra).unwrap();

        assert_eq!(a.len(), 24);
        assert_eq!(a, b);
    }
}
