//! Condition label table and the screening response entity.

use anyhow::{ensure, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Conditions the classifier scores, in model output order.
///
/// Index i of the model's probability vector corresponds to entry i.
pub const CONDITIONS: [&str; 6] = [
    "Anemia",
    "Diabetes",
    "Healthy",
    "Heart Disease",
    "Thalassemia",
    "Thrombocytopenia",
];

/// Per-condition probabilities for one screening request.
///
/// Serializes as a JSON object keyed by condition name, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningReport {
    probabilities: Vec<f64>,
}

impl ScreeningReport {
    /// Zip a raw model output positionally against the condition table.
    pub fn from_probabilities(probabilities: &[f32]) -> Result<Self> {
        ensure!(
            probabilities.len() == CONDITIONS.len(),
            "model returned {} probabilities, expected {}",
            probabilities.len(),
            CONDITIONS.len()
        );

        Ok(Self {
            probabilities: probabilities.iter().map(|&p| f64::from(p)).collect(),
        })
    }

    /// Condition with the highest probability.
    pub fn top_condition(&self) -> &'static str {
        let mut top = 0;
        for (i, p) in self.probabilities.iter().enumerate() {
            if *p > self.probabilities[top] {
                top = i;
            }
        }
        CONDITIONS[top]
    }

    /// Probability for a named condition, if it is in the table.
    pub fn probability(&self, condition: &str) -> Option<f64> {
        CONDITIONS
            .iter()
            .position(|c| *c == condition)
            .map(|i| self.probabilities[i])
    }
}

impl Serialize for ScreeningReport {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(CONDITIONS.len()))?;
        for (name, prob) in CONDITIONS.iter().zip(&self.probabilities) {
            map.serialize_entry(name, prob)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_condition_table_order() {
        assert_eq!(CONDITIONS.len(), 6);
        assert_eq!(CONDITIONS[0], "Anemia");
        assert_eq!(CONDITIONS[3], "Heart Disease");
        assert_eq!(CONDITIONS[5], "Thrombocytopenia");
    }

    #[test]
    fn test_positional_mapping() {
        let report =
            ScreeningReport::from_probabilities(&[0.05, 0.1, 0.6, 0.05, 0.1, 0.1]).unwrap();

        assert!((report.probability("Healthy").unwrap() - 0.6).abs() < 1e-6);
        assert!((report.probability("Anemia").unwrap() - 0.05).abs() < 1e-6);
        assert_eq!(report.top_condition(), "Healthy");
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let err = ScreeningReport::from_probabilities(&[0.5, 0.5]).unwrap_err();
        assert!(err.to_string().contains("expected 6"));
    }

    #[test]
    fn test_serializes_as_labeled_map() {
        let report =
            ScreeningReport::from_probabilities(&[0.1, 0.2, 0.3, 0.2, 0.1, 0.1]).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 6);
        for name in CONDITIONS {
            assert!(matches!(object.get(name), Some(Value::Number(_))));
        }
    }

    #[test]
    fn test_unknown_condition_has_no_probability() {
        let report =
            ScreeningReport::from_probabilities(&[0.1, 0.2, 0.3, 0.2, 0.1, 0.1]).unwrap();
        assert_eq!(report.probability("Gout"), None);
    }
}
